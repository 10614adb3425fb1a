// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::transport::Transport;
use std::io;

/// Bounded packet buffer in front of a `Transport`.
///
/// Complete metric lines (already newline terminated) are appended to an
/// internal buffer that never grows beyond `capacity`. When a line would
/// not fit, the buffered lines are written to the transport as a single
/// packet first. Lines that are larger than the entire buffer bypass it
/// and are written as their own packet, after anything already buffered.
///
/// The buffer is emptied after every flush whether or not the write to the
/// transport succeeded: failed packets are dropped, not retried.
#[derive(Debug)]
pub(crate) struct PacketWriter<T>
where
    T: Transport,
{
    buf: Vec<u8>,
    capacity: usize,
    inner: T,
}

impl<T> PacketWriter<T>
where
    T: Transport,
{
    pub(crate) fn new(inner: T, capacity: usize) -> PacketWriter<T> {
        PacketWriter {
            buf: Vec::with_capacity(capacity),
            capacity,
            inner,
        }
    }

    /// Gets a reference to the underlying transport.
    #[cfg(test)]
    pub(crate) fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Number of bytes currently buffered.
    pub(crate) fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Buffer `line`, flushing beforehand if it would not fit.
    ///
    /// `on_packet` is called with the length and the result of every packet
    /// written to the transport as a side effect of this call.
    pub(crate) fn write<F>(&mut self, line: &[u8], mut on_packet: F)
    where
        F: FnMut(usize, io::Result<usize>),
    {
        if line.len() > self.capacity {
            // Flush anything buffered so the oversized line doesn't jump
            // ahead of lines written before it.
            self.flush(&mut on_packet);
            on_packet(line.len(), self.inner.write(line));
            return;
        }

        if self.buf.len() + line.len() > self.capacity {
            self.flush(&mut on_packet);
        }

        self.buf.extend_from_slice(line);
    }

    /// Write all buffered lines to the transport as a single packet.
    ///
    /// Does nothing (and doesn't call `on_packet`) when the buffer is empty.
    pub(crate) fn flush<F>(&mut self, mut on_packet: F)
    where
        F: FnMut(usize, io::Result<usize>),
    {
        if self.buf.is_empty() {
            return;
        }

        let len = self.buf.len();
        let res = self.inner.write(&self.buf);
        self.buf.clear();
        on_packet(len, res);
    }
}
