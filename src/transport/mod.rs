// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod core;
mod net;
mod spy;

pub(crate) use crate::transport::core::SocketStats;
pub use crate::transport::core::{NopTransport, Transport, TransportStats};
pub use crate::transport::net::{Connection, Network};
pub use crate::transport::spy::SpyTransport;
