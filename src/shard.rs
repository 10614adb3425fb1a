// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2020-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::PacketWriter;
use crate::sync::Worker;
use crate::transport::{SocketStats, Transport, TransportStats};
use crate::types::MetricError;
use std::fmt;
use std::io;
use std::panic::RefUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, trace};

/// Callback invoked with every error encountered writing metrics.
pub(crate) type ErrorHandler = dyn Fn(MetricError) + Sync + Send + RefUnwindSafe;

/// Packets that failed to write during a single locked operation.
///
/// Collected while the lock is held and handed to the error handler only
/// after it's released so that a slow or re-entrant handler can't stall
/// other callers of the shard.
type Failures = Vec<(usize, io::Error)>;

struct ShardState {
    id: usize,
    writer: Mutex<PacketWriter<Box<dyn Transport>>>,
    stats: SocketStats,
    errors: Arc<ErrorHandler>,
}

impl ShardState {
    fn write(&self, line: &[u8]) {
        let mut failures = Failures::new();
        self.lock().write(line, |len, res| self.record(len, res, &mut failures));
        self.report(failures);
    }

    fn flush(&self) {
        let mut failures = Failures::new();
        self.lock().flush(|len, res| self.record(len, res, &mut failures));
        self.report(failures);
    }

    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.lock().buffered()
    }

    // A panic from a transport while the lock is held leaves the buffer
    // in a consistent state (at worst one packet is lost) so a poisoned
    // lock is simply taken over.
    fn lock(&self) -> MutexGuard<'_, PacketWriter<Box<dyn Transport>>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, len: usize, res: io::Result<usize>, failures: &mut Failures) {
        self.stats.update(&res, len);
        match res {
            Ok(n) => trace!(shard = self.id, bytes = n, "Wrote packet."),
            Err(e) => failures.push((len, e)),
        }
    }

    fn report(&self, failures: Failures) {
        for (bytes, source) in failures {
            debug!(shard = self.id, bytes, error = %source, "Dropped packet after failed write.");
            (self.errors)(MetricError::Write {
                shard: self.id,
                bytes,
                source,
            });
        }
    }
}

/// One independently locked connection of a client.
///
/// Each shard owns a transport, a bounded buffer of metric lines waiting
/// to be sent over it, and a background worker that flushes the buffer
/// once per flush period. Writers only contend with other writers that
/// were routed to the same shard.
///
/// Dropping a shard stops its worker and flushes anything still buffered.
pub(crate) struct Shard {
    state: Arc<ShardState>,
    worker: Arc<Worker>,
}

impl Shard {
    /// Create a new shard writing packets of at most `capacity` bytes to
    /// `transport` and start its flush worker.
    pub(crate) fn new<T>(
        id: usize,
        transport: T,
        capacity: usize,
        flush_period: Duration,
        errors: Arc<ErrorHandler>,
    ) -> io::Result<Shard>
    where
        T: Transport + 'static,
    {
        let state = Arc::new(ShardState {
            id,
            writer: Mutex::new(PacketWriter::new(Box::new(transport), capacity)),
            stats: SocketStats::default(),
            errors,
        });

        let worker_state = Arc::clone(&state);
        let worker = Worker::spawn(format!("statsd-shard-{}", id), flush_period, move || {
            worker_state.flush()
        })?;

        debug!(shard = id, capacity, ?flush_period, "Started shard.");
        Ok(Shard { state, worker })
    }

    /// Buffer a complete metric line, writing out a packet first if the
    /// line doesn't fit in what's left of the buffer.
    pub(crate) fn write(&self, line: &[u8]) {
        self.state.write(line);
    }

    /// Write everything buffered as a single packet.
    pub(crate) fn flush(&self) {
        self.state.flush();
    }

    #[cfg(test)]
    pub(crate) fn buffered(&self) -> usize {
        self.state.buffered()
    }

    pub(crate) fn stats(&self) -> TransportStats {
        let mut stats = TransportStats::from(&self.state.stats);
        stats.worker_restarts = self.worker.panics();
        stats
    }
}

impl fmt::Debug for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard")
            .field("id", &self.state.id)
            .field("worker", &self.worker)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Drop for Shard {
    fn drop(&mut self) {
        self.worker.stop_and_wait();
        self.state.flush();
        debug!(shard = self.state.id, "Stopped shard.");
    }
}
