// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crossbeam_queue::ArrayQueue;
use std::fmt;
use std::ops::{Deref, DerefMut};

// Initial capacity of buffers created by the pool. Large enough for
// nearly any single metric line.
pub(crate) const INITIAL_BUFFER_CAPACITY: usize = 512;

// Number of idle buffers kept around for reuse when not otherwise configured.
pub(crate) const DEFAULT_MAX_IDLE: usize = 128;

/// Pool of byte buffers used to encode metric lines.
///
/// Buffers are handed out as `PooledBuffer` guards and returned to the
/// pool (emptied, but keeping their capacity) when the guard is dropped.
/// At most `max_idle` buffers are retained; anything beyond that is
/// deallocated. An empty pool allocates a new buffer, so callers never
/// wait on it.
pub struct BufferPool {
    idle: ArrayQueue<Vec<u8>>,
}

impl BufferPool {
    pub fn new(max_idle: usize) -> Self {
        BufferPool {
            idle: ArrayQueue::new(max_idle.max(1)),
        }
    }

    /// Take an empty buffer from the pool, allocating one if none are idle.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .idle
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_BUFFER_CAPACITY));

        PooledBuffer { buf, pool: self }
    }

    /// Number of buffers currently waiting to be reused.
    pub fn idle(&self) -> usize {
        self.idle.len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        // Pool is full, let this one be deallocated.
        let _ = self.idle.push(buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(DEFAULT_MAX_IDLE)
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.idle.len())
            .field("max_idle", &self.idle.capacity())
            .finish()
    }
}

/// Buffer borrowed from a `BufferPool`, returned to it when dropped.
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl<'a> Deref for PooledBuffer<'a> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl<'a> DerefMut for PooledBuffer<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl<'a> Drop for PooledBuffer<'a> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

impl<'a> fmt::Debug for PooledBuffer<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("buf", &String::from_utf8_lossy(&self.buf))
            .finish()
    }
}
