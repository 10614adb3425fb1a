// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::ops::{Add, AddAssign};
use std::sync::atomic::{AtomicU64, Ordering};

/// I/O telemetry for one shard, or summed over every shard of a client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub bytes_dropped: u64,
    pub packets_dropped: u64,
    pub worker_restarts: u64,
}

impl Add for TransportStats {
    type Output = TransportStats;

    fn add(mut self, rhs: TransportStats) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for TransportStats {
    fn add_assign(&mut self, rhs: TransportStats) {
        self.bytes_sent += rhs.bytes_sent;
        self.packets_sent += rhs.packets_sent;
        self.bytes_dropped += rhs.bytes_dropped;
        self.packets_dropped += rhs.packets_dropped;
        self.worker_restarts += rhs.worker_restarts;
    }
}

#[derive(Debug, Default)]
pub(crate) struct SocketStats {
    bytes_sent: AtomicU64,
    packets_sent: AtomicU64,
    bytes_dropped: AtomicU64,
    packets_dropped: AtomicU64,
}

impl SocketStats {
    pub(crate) fn incr_bytes_sent(&self, n: u64) {
        self.bytes_sent.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn incr_packets_sent(&self) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_bytes_dropped(&self, n: u64) {
        self.bytes_dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn incr_packets_dropped(&self) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of writing a packet of `len` bytes.
    pub(crate) fn update(&self, res: &io::Result<usize>, len: usize) {
        match res {
            Ok(written) => {
                self.incr_bytes_sent(*written as u64);
                self.incr_packets_sent();
            }
            Err(_) => {
                self.incr_bytes_dropped(len as u64);
                self.incr_packets_dropped();
            }
        }
    }
}

impl From<&SocketStats> for TransportStats {
    fn from(stats: &SocketStats) -> Self {
        TransportStats {
            bytes_sent: stats.bytes_sent.load(Ordering::Relaxed),
            packets_sent: stats.packets_sent.load(Ordering::Relaxed),
            bytes_dropped: stats.bytes_dropped.load(Ordering::Relaxed),
            packets_dropped: stats.packets_dropped.load(Ordering::Relaxed),
            worker_restarts: 0,
        }
    }
}

/// Trait for connections that packets of Statsd metrics are written to.
///
/// Each call to `write` is given one complete packet: one or more metric
/// lines, each terminated by a newline. Datagram transports should send
/// the packet as a single datagram, stream transports should write the
/// entire packet before returning.
///
/// Each shard of a client owns exactly one transport and only ever calls
/// it while holding the shard's lock, so implementations don't need any
/// synchronization of their own.
pub trait Transport: Send {
    /// Write a packet, returning the number of bytes written or an I/O error.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }
}

/// Implementation of a `Transport` that discards all packets.
///
/// Useful for disabling metric collection or unit tests.
#[derive(Debug, Clone)]
pub struct NopTransport;

impl Transport for NopTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }
}
