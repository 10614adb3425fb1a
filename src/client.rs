// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::encode::{encode, formatted_segment, SMALLEST_VALID_LINE};
use crate::field::{Field, ToCountValue, ToGaugeValue, ToTimingValue};
use crate::pool::{BufferPool, DEFAULT_MAX_IDLE};
use crate::shard::{ErrorHandler, Shard};
use crate::transport::{Connection, Network, Transport, TransportStats};
use crate::types::{MetricError, MetricKind, MetricResult};
use std::fmt;
use std::io;
use std::num::NonZeroUsize;
use std::panic::RefUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_FLUSH_PERIOD: Duration = Duration::from_millis(100);
const DEFAULT_MAX_PACKET_SIZE: usize = 1400;

/// Trait for incrementing and decrementing counters.
///
/// Counters are simple values incremented or decremented by a client. The
/// rates at which these events occur or average values will be determined
/// by the server receiving them. Examples of counter uses include number
/// of logins to a system or requests received.
///
/// All signed and unsigned integer types are valid for counters.
///
/// The `_with_host` variant places the host tag of the client between the
/// prefix and the name of the metric.
pub trait Counted<T>
where
    T: ToCountValue,
{
    /// Increment or decrement the counter by the given amount
    fn count(&self, segments: &[Field<'_>], count: T);

    /// Increment or decrement the counter by the given amount, tagged with
    /// the host name
    fn count_with_host(&self, segments: &[Field<'_>], count: T);
}

/// Trait for convenience methods for counters
///
/// This trait specifically implements increment and decrement convenience
/// methods for counters with `i64` types.
pub trait CountedExt: Counted<i64> {
    /// Increment the counter by 1
    fn incr(&self, segments: &[Field<'_>]) {
        self.count(segments, 1);
    }

    /// Increment the counter by 1, tagged with the host name
    fn incr_with_host(&self, segments: &[Field<'_>]) {
        self.count_with_host(segments, 1);
    }

    /// Decrement the counter by 1
    fn decr(&self, segments: &[Field<'_>]) {
        self.count(segments, -1);
    }

    /// Decrement the counter by 1, tagged with the host name
    fn decr_with_host(&self, segments: &[Field<'_>]) {
        self.count_with_host(segments, -1);
    }
}

/// Trait for recording timings in milliseconds.
///
/// Timings are a positive number of milliseconds between a start and end
/// time. Examples include time taken to render a web page or time taken
/// for a database call to return.
///
/// The following types are valid for timings:
/// * `Duration`
/// * `Instant`, the start of an operation that has just completed
///
/// Either way the timing is sent as fractional milliseconds.
pub trait Timed<T>
where
    T: ToTimingValue,
{
    /// Record a timing in milliseconds
    fn timing(&self, segments: &[Field<'_>], time: T);

    /// Record a timing in milliseconds, tagged with the host name
    fn timing_with_host(&self, segments: &[Field<'_>], time: T);
}

/// Trait for convenience methods for timings measured from a start time.
pub trait TimedExt: Timed<Instant> {
    /// Record the time elapsed since `start`
    fn timing_since(&self, segments: &[Field<'_>], start: Instant) {
        self.timing(segments, start);
    }

    /// Record the time elapsed since `start`, tagged with the host name
    fn timing_since_with_host(&self, segments: &[Field<'_>], start: Instant) {
        self.timing_with_host(segments, start);
    }
}

/// Trait for recording gauge values.
///
/// Gauge values are an instantaneous measurement of a value determined
/// by the client. They do not change unless changed by the client. Examples
/// include things like load average or how many connections are active.
///
/// All integer types as well as `f32` and `f64` are valid for gauges.
pub trait Gauged<T>
where
    T: ToGaugeValue,
{
    /// Record a gauge value
    fn gauge(&self, segments: &[Field<'_>], value: T);

    /// Record a gauge value, tagged with the host name
    fn gauge_with_host(&self, segments: &[Field<'_>], value: T);
}

/// Trait that encompasses all other traits for sending metrics.
///
/// If you wish to use `Client` with a generic type or place a `Client`
/// instance behind a pointer (such as a `Box`) this will allow you to
/// reference all the implemented methods for recording metrics, while
/// using a single trait. An example of this is shown below.
///
/// ```
/// use std::time::{Duration, Instant};
/// use statsd_shard::{bucket, Client, MetricClient, NopTransport};
///
/// let client: Box<dyn MetricClient> = Box::new(
///     Client::builder("udp", "127.0.0.1:8125")
///         .build_with(|_| Ok(NopTransport))
///         .unwrap(),
/// );
///
/// client.count(&bucket!["some", "counter"], 1);
/// client.incr(&bucket!["some", "counter"]);
/// client.gauge(&bucket!["some", "gauge"], 8);
/// client.gauge(&bucket!["some", "gauge"], 0.5);
/// client.timing(&bucket!["some", "timer"], Duration::from_millis(42));
/// client.timing_since(&bucket!["some", "timer"], Instant::now());
/// ```
pub trait MetricClient:
    Counted<i64> + CountedExt + Gauged<i64> + Gauged<f64> + Timed<Duration> + Timed<Instant> + TimedExt
{
}

/// Builder for creating and customizing `Client` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `Client` struct.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use statsd_shard::prelude::*;
/// use statsd_shard::{bucket, Client, MetricError};
///
/// fn my_error_handler(err: MetricError) {
///     eprintln!("Metric error! {}", err);
/// }
///
/// let client = Client::builder("udp", "127.0.0.1:8125")
///     .prefix("my.app")
///     .flush_period(Duration::from_millis(250))
///     .shards(2)
///     .with_error_handler(my_error_handler)
///     .build()
///     .unwrap();
///
/// client.count(&bucket!["requests"], 1);
/// ```
pub struct ClientBuilder {
    network: String,
    address: String,
    prefix: String,
    host_tag: Option<String>,
    timeout: Duration,
    flush_period: Duration,
    max_packet_size: usize,
    shards: Option<usize>,
    errors: Arc<ErrorHandler>,
}

impl ClientBuilder {
    // Set the required fields and defaults for optional fields
    fn new(network: &str, address: &str) -> Self {
        ClientBuilder {
            // required
            network: network.to_owned(),
            address: address.to_owned(),

            // optional with defaults
            prefix: String::new(),
            host_tag: None,
            timeout: DEFAULT_TIMEOUT,
            flush_period: DEFAULT_FLUSH_PERIOD,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            shards: None,
            errors: Arc::new(nop_error_handler),
        }
    }

    /// Prefix prepended to the name of every metric, separated by a `.`
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_owned();
        self
    }

    /// Tag used by the `_with_host` methods, defaults to the local hostname
    /// with any `.` replaced by `_`.
    pub fn host_tag(mut self, host_tag: &str) -> Self {
        self.host_tag = Some(host_tag.to_owned());
        self
    }

    /// Time allowed to establish each connection. Also used as the write
    /// timeout of UDP and Unix datagram sockets; writes to TCP and Unix
    /// streams never time out. Defaults to five seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maximum time a metric may sit in a buffer before being sent.
    /// Defaults to 100ms.
    pub fn flush_period(mut self, period: Duration) -> Self {
        self.flush_period = period;
        self
    }

    /// Maximum size of a single packet in bytes. Defaults to 1400 which fits
    /// within the MTU of most networks.
    pub fn max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = size;
        self
    }

    /// Number of independent connections metrics are spread across.
    /// Defaults to the available parallelism of the machine.
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = Some(shards);
        self
    }

    /// Set an error handler to use for metrics that can't be written
    ///
    /// The error handler is invoked whenever a packet of buffered metrics
    /// could not be written to its connection and was dropped. It is called
    /// from whichever thread caused the write: a thread emitting a metric
    /// that filled a buffer, a background flush thread, or the thread
    /// dropping the client.
    ///
    /// The error handler should consume the error without panicking. The error
    /// may be logged, printed to stderr, discarded, etc. - this is up to the
    /// implementation.
    pub fn with_error_handler<F>(mut self, errors: F) -> Self
    where
        F: Fn(MetricError) + Sync + Send + RefUnwindSafe + 'static,
    {
        self.errors = Arc::new(errors);
        self
    }

    /// Construct a new `Client`, opening one connection for each shard.
    ///
    /// If any of the connections can't be opened, those that were are
    /// closed again and an error is returned.
    pub fn build(self) -> MetricResult<Client> {
        let network: Network = self.network.parse()?;
        let address = self.address.clone();
        let timeout = self.timeout;

        self.build_with(move |_| Connection::open(network, &address, timeout))
    }

    /// Construct a new `Client` using `connect` to create the transport of
    /// each shard instead of opening a network connection.
    ///
    /// `connect` is called with the index of each shard in turn. The network
    /// and address given to the builder are only used in error messages.
    ///
    /// ```
    /// use statsd_shard::prelude::*;
    /// use statsd_shard::{bucket, Client, SpyTransport};
    ///
    /// let (rx, transport) = SpyTransport::new();
    /// let client = Client::builder("udp", "127.0.0.1:8125")
    ///     .shards(1)
    ///     .build_with(|_| Ok(transport.clone()))
    ///     .unwrap();
    ///
    /// client.incr(&bucket!["foo"]);
    /// client.flush();
    ///
    /// assert_eq!(b"foo:1|c\n".to_vec(), rx.recv().unwrap());
    /// ```
    pub fn build_with<T, F>(self, mut connect: F) -> MetricResult<Client>
    where
        T: Transport + 'static,
        F: FnMut(usize) -> io::Result<T>,
    {
        self.validate()?;

        let num_shards = self.shards.unwrap_or_else(default_shards);
        let mut shards = Vec::with_capacity(num_shards);

        for id in 0..num_shards {
            let transport = connect(id).map_err(|source| MetricError::Connect {
                shard: id,
                network: self.network.clone(),
                address: self.address.clone(),
                source,
            })?;

            let shard = Shard::new(
                id,
                transport,
                self.max_packet_size,
                self.flush_period,
                Arc::clone(&self.errors),
            )
            .map_err(|source| MetricError::Worker { shard: id, source })?;

            debug!(shard = id, network = %self.network, address = %self.address, "Connected shard.");
            shards.push(shard);
        }

        let host_tag = self.host_tag.unwrap_or_else(default_host_tag);

        Ok(Client {
            prefix: formatted_segment(&self.prefix),
            host_tag: formatted_segment(&host_tag),
            pool: BufferPool::new(DEFAULT_MAX_IDLE),
            shards,
            next: AtomicUsize::new(0),
        })
    }

    fn validate(&self) -> MetricResult<()> {
        if self.timeout.is_zero() {
            return Err(MetricError::InvalidConfig("timeout must be greater than zero"));
        }

        if self.flush_period.is_zero() {
            return Err(MetricError::InvalidConfig("flush period must be greater than zero"));
        }

        if self.max_packet_size < SMALLEST_VALID_LINE.len() {
            return Err(MetricError::InvalidConfig("max packet size is too small for any metric"));
        }

        if self.shards == Some(0) {
            return Err(MetricError::InvalidConfig("shard count must be at least one"));
        }

        Ok(())
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("network", &self.network)
            .field("address", &self.address)
            .field("prefix", &self.prefix)
            .field("host_tag", &self.host_tag)
            .field("timeout", &self.timeout)
            .field("flush_period", &self.flush_period)
            .field("max_packet_size", &self.max_packet_size)
            .field("shards", &self.shards)
            .finish_non_exhaustive()
    }
}

/// Client for Statsd that implements various traits to record metrics.
///
/// # Traits
///
/// The client is the main entry point for users of this library. It supports
/// several traits for recording metrics of different types.
///
/// * `Counted` and `CountedExt` for emitting counters.
/// * `Timed` and `TimedExt` for emitting timings.
/// * `Gauged` for emitting gauge values.
/// * `MetricClient` for a combination of all of the above.
///
/// # Shards
///
/// The client owns a fixed number of shards, each of which is a connection
/// to the Statsd server with its own buffer, lock, and background thread
/// that flushes the buffer periodically. Each metric emitted goes to the
/// next shard in turn, so threads emitting metrics at the same time rarely
/// wait on each other.
///
/// Metrics sent to different shards may arrive at the server in any order
/// relative to each other.
///
/// # Threading
///
/// The `Client` is designed to work in a multithreaded application. All
/// parts of the client can be shared between threads (i.e. it is `Send` and
/// `Sync`). Wrap it in an `Arc` to share it.
///
/// # Shutdown
///
/// Dropping the client stops the background threads and flushes whatever
/// each shard still has buffered.
pub struct Client {
    prefix: String,
    host_tag: String,
    pool: BufferPool,
    shards: Vec<Shard>,
    next: AtomicUsize,
}

impl Client {
    /// Create a new builder for a client sending metrics to `address` over
    /// `network` (one of `udp`, `tcp`, `unix`, or `unixgram`).
    ///
    /// All other optional customizations can be set by calling methods on
    /// the returned builder. Any customizations that aren't set by the
    /// caller will use defaults.
    pub fn builder(network: &str, address: &str) -> ClientBuilder {
        ClientBuilder::new(network, address)
    }

    /// Encode a metric and hand it to the next shard.
    ///
    /// This is what all of the typed methods of the client use. Nothing is
    /// sent if `segments` is empty.
    pub fn send_metric(&self, kind: MetricKind, value: &Field<'_>, with_host: bool, segments: &[Field<'_>]) {
        let host = if with_host { self.host_tag.as_str() } else { "" };

        if let Some(line) = encode(&self.pool, kind, value, &self.prefix, host, segments) {
            self.next_shard().write(&line);
        }
    }

    /// Write out everything buffered by every shard now instead of waiting
    /// for the next flush period.
    pub fn flush(&self) {
        for shard in &self.shards {
            shard.flush();
        }
    }

    /// Counts of packets and bytes sent or dropped, summed over all shards.
    pub fn stats(&self) -> TransportStats {
        self.shards
            .iter()
            .fold(TransportStats::default(), |acc, shard| acc + shard.stats())
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Prefix of every metric, including the trailing `.` if set.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Host tag of `_with_host` metrics, including the trailing `.` if set.
    pub fn host_tag(&self) -> &str {
        &self.host_tag
    }

    fn next_shard(&self) -> &Shard {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.shards.len();
        &self.shards[index]
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Client {{ prefix: {:?}, host_tag: {:?}, shards: {:?}, pool: {:?} }}",
            self.prefix, self.host_tag, self.shards, self.pool,
        )
    }
}

impl<T> Counted<T> for Client
where
    T: ToCountValue,
{
    fn count(&self, segments: &[Field<'_>], count: T) {
        self.send_metric(MetricKind::Count, &count.to_field(), false, segments);
    }

    fn count_with_host(&self, segments: &[Field<'_>], count: T) {
        self.send_metric(MetricKind::Count, &count.to_field(), true, segments);
    }
}

impl CountedExt for Client {}

impl<T> Timed<T> for Client
where
    T: ToTimingValue,
{
    fn timing(&self, segments: &[Field<'_>], time: T) {
        self.send_metric(MetricKind::Timing, &time.to_field(), false, segments);
    }

    fn timing_with_host(&self, segments: &[Field<'_>], time: T) {
        self.send_metric(MetricKind::Timing, &time.to_field(), true, segments);
    }
}

impl TimedExt for Client {}

impl<T> Gauged<T> for Client
where
    T: ToGaugeValue,
{
    fn gauge(&self, segments: &[Field<'_>], value: T) {
        self.send_metric(MetricKind::Gauge, &value.to_field(), false, segments);
    }

    fn gauge_with_host(&self, segments: &[Field<'_>], value: T) {
        self.send_metric(MetricKind::Gauge, &value.to_field(), true, segments);
    }
}

impl MetricClient for Client {}

fn nop_error_handler(_err: MetricError) {
    // nothing
}

fn default_shards() -> usize {
    thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

fn default_host_tag() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().replace('.', "_"),
        Err(e) => {
            debug!(error = %e, "Failed to query hostname.");
            String::new()
        }
    }
}
