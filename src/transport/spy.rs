// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2020-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::transport::core::Transport;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::io::{self, ErrorKind};

/// `Transport` implementation that writes every packet to the `Sender` half
/// of a channel while callers are given ownership of the `Receiver` half.
///
/// This is not a general purpose transport, rather it's meant for verifying
/// packets written during the course of tests. By default, the channel used
/// is unbounded. The channel size can be limited using `with_capacity`.
///
/// Once the `Receiver` has been dropped every write fails, which makes this
/// useful for exercising error handling as well.
///
/// The transport is `Clone` so that the same channel can be handed to every
/// shard of a client.
#[derive(Debug, Clone)]
pub struct SpyTransport {
    sender: Sender<Vec<u8>>,
}

impl SpyTransport {
    pub fn new() -> (Receiver<Vec<u8>>, Self) {
        Self::with_queue_capacity(None)
    }

    pub fn with_capacity(queue: usize) -> (Receiver<Vec<u8>>, Self) {
        Self::with_queue_capacity(Some(queue))
    }

    fn with_queue_capacity(queue: Option<usize>) -> (Receiver<Vec<u8>>, Self) {
        let (tx, rx) = match queue {
            Some(sz) => bounded(sz),
            None => unbounded(),
        };

        (rx, SpyTransport { sender: tx })
    }
}

impl Transport for SpyTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.sender.try_send(buf.to_vec()) {
            Err(TrySendError::Disconnected(_)) => Err(io::Error::new(ErrorKind::Other, "channel disconnected")),
            Err(TrySendError::Full(_)) => Err(io::Error::new(ErrorKind::Other, "channel full")),
            Ok(_) => Ok(buf.len()),
        }
    }
}
