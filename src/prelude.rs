// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Export commonly used parts of statsd-shard for easy glob imports
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use statsd_shard::prelude::*;
//! use statsd_shard::{bucket, Client, NopTransport};
//!
//! let client = Client::builder("udp", "127.0.0.1:8125")
//!     .prefix("some.prefix")
//!     .build_with(|_| Ok(NopTransport))
//!     .unwrap();
//!
//! client.count(&bucket!["some", "counter"], 1);
//! client.incr_with_host(&bucket!["some", "counter"]);
//! client.timing(&bucket!["some", "timer"], Duration::from_millis(23));
//! client.gauge(&bucket!["some", "gauge"], 45);
//! ```

pub use crate::client::{Counted, CountedExt, Gauged, MetricClient, Timed, TimedExt};
