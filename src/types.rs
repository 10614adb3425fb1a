// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::io;
use thiserror::Error;

/// Type of metric that knows how to render its wire suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Count,
    Timing,
}

impl MetricKind {
    /// Suffix written after the `|` separator of a metric line.
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKind::Gauge => "g",
            MetricKind::Count => "c",
            MetricKind::Timing => "ms",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// Broad category of a `MetricError`
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ErrorKind {
    InvalidInput,
    IoError,
}

/// Error creating a client or writing metrics to a transport.
///
/// Errors from building a client are returned to the caller. Errors from
/// writing buffered metrics happen in the background (or as a side effect
/// of emitting a metric) and are only ever passed to the error handler
/// configured on the `ClientBuilder`.
#[derive(Debug, Error)]
pub enum MetricError {
    /// The network name is not one of the supported transports.
    #[error("unsupported network {0:?}")]
    UnsupportedNetwork(String),

    /// A configuration value can't be used to build a client.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// A shard could not establish its connection.
    #[error("shard {shard} failed to connect to {network} address {address}")]
    Connect {
        shard: usize,
        network: String,
        address: String,
        #[source]
        source: io::Error,
    },

    /// Buffered metrics could not be written and were dropped.
    #[error("shard {shard} failed to write {bytes} bytes")]
    Write {
        shard: usize,
        bytes: usize,
        #[source]
        source: io::Error,
    },

    /// A shard's background flush thread could not be started.
    #[error("shard {shard} failed to start its flush worker")]
    Worker {
        shard: usize,
        #[source]
        source: io::Error,
    },
}

impl MetricError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetricError::UnsupportedNetwork(_) | MetricError::InvalidConfig(_) => ErrorKind::InvalidInput,
            MetricError::Connect { .. } | MetricError::Write { .. } | MetricError::Worker { .. } => {
                ErrorKind::IoError
            }
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;
