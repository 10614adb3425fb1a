// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::field::Field;
use crate::pool::{BufferPool, PooledBuffer};
use crate::types::MetricKind;

/// Smallest line the encoder is able to produce.
pub(crate) const SMALLEST_VALID_LINE: &[u8] = b"a:0|c\n";

/// Format a metric prefix or host tag so that it can be written verbatim
/// in front of a metric name: trailing dots are trimmed and a single dot
/// is added. Empty input stays empty.
pub(crate) fn formatted_segment(segment: &str) -> String {
    let trimmed = segment.trim_end_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}.", trimmed)
    }
}

/// Render a single metric line into a buffer borrowed from `pool`.
///
/// `prefix` and `host` are written verbatim and are expected to already
/// end with a `.` if non-empty (see `formatted_segment`). The name
/// segments are joined with `.` followed by `:<value>|<kind>\n`.
///
/// Returns `None` if there are no name segments, in which case nothing
/// is emitted.
pub(crate) fn encode<'p>(
    pool: &'p BufferPool,
    kind: MetricKind,
    value: &Field<'_>,
    prefix: &str,
    host: &str,
    segments: &[Field<'_>],
) -> Option<PooledBuffer<'p>> {
    let (first, rest) = segments.split_first()?;
    let mut buf = pool.acquire();

    buf.extend_from_slice(prefix.as_bytes());
    buf.extend_from_slice(host.as_bytes());

    first.append_to(&mut buf);
    for segment in rest {
        buf.push(b'.');
        segment.append_to(&mut buf);
    }

    buf.push(b':');
    value.append_to(&mut buf);
    buf.push(b'|');
    buf.extend_from_slice(kind.as_str().as_bytes());
    buf.push(b'\n');

    Some(buf)
}

#[cfg(test)]
mod tests {
    use super::{encode, formatted_segment};
    use crate::bucket;
    use crate::field::Field;
    use crate::pool::BufferPool;
    use crate::types::MetricKind;
    use proptest::prelude::*;

    fn encode_str(
        kind: MetricKind,
        value: Field<'_>,
        prefix: &str,
        host: &str,
        segments: &[Field<'_>],
    ) -> Option<String> {
        let pool = BufferPool::new(4);
        encode(&pool, kind, &value, prefix, host, segments).map(|buf| String::from_utf8(buf.to_vec()).unwrap())
    }

    #[test]
    fn test_formatted_segment() {
        assert_eq!("", formatted_segment(""));
        assert_eq!("", formatted_segment("."));
        assert_eq!("juju.", formatted_segment("juju"));
        assert_eq!("juju.", formatted_segment("juju.."));
        assert_eq!("my.prefix.", formatted_segment("my.prefix"));
    }

    #[test]
    fn test_encode_no_segments() {
        assert_eq!(None, encode_str(MetricKind::Count, Field::I32(1), "juju.", "host.", &[]));
    }

    #[test]
    fn test_encode_single_segment() {
        let line = encode_str(MetricKind::Count, Field::I32(1), "", "", &bucket!["foo"]);
        assert_eq!(Some("foo:1|c\n".to_owned()), line);
    }

    #[test]
    fn test_encode_with_prefix() {
        let line = encode_str(MetricKind::Count, Field::I32(3), "juju.", "", &bucket!["zoo"]);
        assert_eq!(Some("juju.zoo:3|c\n".to_owned()), line);
    }

    #[test]
    fn test_encode_with_prefix_and_host() {
        let line = encode_str(MetricKind::Count, Field::I64(10), "juju.", "fake-host.", &bucket!["kong"]);
        assert_eq!(Some("juju.fake-host.kong:10|c\n".to_owned()), line);
    }

    #[test]
    fn test_encode_mixed_segments() {
        let line = encode_str(
            MetricKind::Count,
            Field::I32(1),
            "",
            "",
            &bucket![1i8, 200i16, 1000i32, 10000i64],
        );
        assert_eq!(Some("1.200.1000.10000:1|c\n".to_owned()), line);

        let line = encode_str(
            MetricKind::Count,
            Field::I32(1),
            "",
            "",
            &bucket![1u8, 200u16, 1000u32, 10000u64],
        );
        assert_eq!(Some("1.200.1000.10000:1|c\n".to_owned()), line);
    }

    #[test]
    fn test_encode_gauge_and_timing() {
        let gauge = encode_str(MetricKind::Gauge, Field::F64(4.0), "", "", &bucket!["foo", "bar"]);
        assert_eq!(Some("foo.bar:4|g\n".to_owned()), gauge);

        let timing = encode_str(MetricKind::Timing, Field::F64(10.0), "", "", &bucket!["foo"]);
        assert_eq!(Some("foo:10|ms\n".to_owned()), timing);

        let negative = encode_str(MetricKind::Gauge, Field::I32(-42), "", "", &bucket!["temp"]);
        assert_eq!(Some("temp:-42|g\n".to_owned()), negative);
    }

    #[test]
    fn test_encode_template_segment() {
        let line = encode_str(
            MetricKind::Count,
            Field::I32(1),
            "",
            "",
            &bucket![format_args!("foo.{}", "bar")],
        );
        assert_eq!(Some("foo.bar:1|c\n".to_owned()), line);
    }

    #[test]
    fn test_encode_reuses_pooled_buffer() {
        let pool = BufferPool::new(1);
        let first = encode(&pool, MetricKind::Count, &Field::I32(1), "", "", &bucket!["foo"]).unwrap();
        drop(first);
        assert_eq!(1, pool.idle());

        let second = encode(&pool, MetricKind::Count, &Field::I32(2), "", "", &bucket!["bar"]).unwrap();
        assert_eq!(0, pool.idle());
        assert_eq!(b"bar:2|c\n", &second[..]);
    }

    fn segment_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,12}"
    }

    proptest! {
        #[test]
        fn prop_encode_matches_line_grammar(
            prefix in prop::option::of(segment_strategy()),
            host in prop::option::of(segment_strategy()),
            segments in prop::collection::vec(segment_strategy(), 1..6),
            value in any::<i64>(),
        ) {
            let prefix = formatted_segment(prefix.as_deref().unwrap_or(""));
            let host = formatted_segment(host.as_deref().unwrap_or(""));
            let fields: Vec<Field<'_>> = segments.iter().map(Field::from).collect();

            let line = encode_str(MetricKind::Gauge, Field::I64(value), &prefix, &host, &fields).unwrap();
            let expected = format!("{}{}{}:{}|g\n", prefix, host, segments.join("."), value);

            prop_assert_eq!(expected, line);
        }

        #[test]
        fn prop_encode_float_round_trips(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            let line = encode_str(MetricKind::Timing, Field::F64(value), "", "", &bucket!["t"]).unwrap();
            let rendered = line.strip_prefix("t:").and_then(|l| l.strip_suffix("|ms\n")).unwrap();

            prop_assert!(!rendered.contains('e'));
            prop_assert_eq!(value, rendered.parse::<f64>().unwrap());
        }
    }
}
