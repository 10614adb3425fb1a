// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A sharded, buffered Statsd client for Rust
//!
//! statsd-shard emits Statsd counters, gauges, and timings from your
//! application without making the threads that record them wait on the
//! network or on each other.
//!
//! ## Features
//!
//! * Metric lines are encoded into pooled buffers and batched into packets
//!   of up to a configurable size before being sent.
//! * Buffered metrics are flushed by a background thread at least once per
//!   flush period so they never sit around for long.
//! * Metrics are spread across several independent connections ("shards")
//!   so that threads recording metrics at the same time rarely contend.
//! * Support for UDP, TCP, and Unix stream and datagram sockets, as well as
//!   any other backend via the `Transport` trait.
//!
//! ## Install
//!
//! To make use of `statsd-shard` in your project, add it as a dependency in
//! your `Cargo.toml` file.
//!
//! ```toml
//! [dependencies]
//! statsd-shard = "x.y.z"
//! ```
//!
//! ## Usage
//!
//! ### Simple Use
//!
//! Create a client that will write to some imaginary metrics server over UDP
//! and send a few metrics. Metric names are made of segments that are joined
//! with a `.`, built with the `bucket!` macro.
//!
//! ```rust,no_run
//! use std::time::{Duration, Instant};
//! use statsd_shard::prelude::*;
//! use statsd_shard::{bucket, Client};
//!
//! // Note that you'll probably want to actually handle any errors creating
//! // the client when you use it for real in your application. We're just
//! // using .unwrap() here since this is an example!
//! let client = Client::builder("udp", "metrics.example.com:8125")
//!     .prefix("my.metrics")
//!     .build()
//!     .unwrap();
//!
//! let start = Instant::now();
//!
//! // Emit metrics!
//! client.incr(&bucket!["some", "counter"]);
//! client.count(&bucket!["bytes", "read"], 4096u64);
//! client.gauge(&bucket!["some", "gauge"], 5);
//! client.gauge_with_host(&bucket!["load"], 0.25);
//! client.timing(&bucket!["some", "timer"], Duration::from_millis(12));
//! client.timing_since(&bucket!["request"], start);
//! ```
//!
//! ### Errors
//!
//! Recording a metric never fails: encoding is infallible and writing to
//! the network happens later, in batches. If a packet can't be written it
//! is dropped and the error is passed to the handler set on the builder.
//!
//! ```rust,no_run
//! use statsd_shard::prelude::*;
//! use statsd_shard::{bucket, Client, MetricError};
//!
//! fn my_error_handler(err: MetricError) {
//!     eprintln!("Metric error! {}", err);
//! }
//!
//! let client = Client::builder("tcp", "127.0.0.1:8125")
//!     .with_error_handler(my_error_handler)
//!     .build()
//!     .unwrap();
//!
//! client.incr(&bucket!["some", "counter"]);
//! ```
//!
//! ### Custom Transports
//!
//! Any type implementing `Transport` can be used in place of a socket by
//! building the client with `build_with`. It's called once per shard.
//!
//! ```rust
//! use std::io;
//! use statsd_shard::prelude::*;
//! use statsd_shard::{bucket, Client, Transport};
//!
//! struct StdoutTransport;
//!
//! impl Transport for StdoutTransport {
//!     fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
//!         print!("{}", String::from_utf8_lossy(buf));
//!         Ok(buf.len())
//!     }
//! }
//!
//! let client = Client::builder("stdout", "-")
//!     .shards(1)
//!     .build_with(|_| Ok(StdoutTransport))
//!     .unwrap();
//!
//! client.incr(&bucket!["some", "counter"]);
//! ```

#![forbid(unsafe_code)]

pub use self::client::{Client, ClientBuilder, Counted, CountedExt, Gauged, MetricClient, Timed, TimedExt};

pub use self::field::{Field, ToCountValue, ToGaugeValue, ToTimingValue};

pub use self::pool::{BufferPool, PooledBuffer};

pub use self::transport::{Connection, Network, NopTransport, SpyTransport, Transport, TransportStats};

pub use self::types::{ErrorKind, MetricError, MetricKind, MetricResult};

mod client;
mod encode;
mod field;
mod io;
mod pool;
pub mod prelude;
mod shard;
mod sync;
mod transport;
mod types;
