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
use std::io::Write;
use std::time::{Duration, Instant};

/// Segment of a metric name or the value of a metric.
///
/// Each variant knows how to append its wire representation to a buffer
/// without any intermediate allocation. Integers are written in base 10,
/// floats using the shortest representation that round-trips at their
/// precision (never in exponential notation), and `Fmt` renders a
/// template directly into the buffer.
///
/// Fields are usually created via `From` conversions or the `bucket!`
/// macro rather than by naming variants directly.
///
/// ```
/// use statsd_shard::{bucket, Field};
///
/// let segments = bucket!["api", "status", 200u16];
/// assert_eq!(3, segments.len());
/// assert!(matches!(segments[2], Field::U16(200)));
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    Str(&'a str),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    /// Template rendered in place, equivalent to formatting it to a string
    /// first and using that string as a single `Str` segment.
    Fmt(fmt::Arguments<'a>),
}

impl<'a> Field<'a> {
    /// Append the textual form of this field to the end of `buf`.
    pub fn append_to(&self, buf: &mut Vec<u8>) {
        match *self {
            Field::Str(s) => buf.extend_from_slice(s.as_bytes()),
            Field::I8(v) => append_int(buf, v),
            Field::I16(v) => append_int(buf, v),
            Field::I32(v) => append_int(buf, v),
            Field::I64(v) => append_int(buf, v),
            Field::Isize(v) => append_int(buf, v),
            Field::U8(v) => append_int(buf, v),
            Field::U16(v) => append_int(buf, v),
            Field::U32(v) => append_int(buf, v),
            Field::U64(v) => append_int(buf, v),
            Field::Usize(v) => append_int(buf, v),
            // Writing to a Vec can't fail
            Field::F32(v) => {
                let _ = write!(buf, "{}", v);
            }
            Field::F64(v) => {
                let _ = write!(buf, "{}", v);
            }
            Field::Fmt(args) => {
                let _ = buf.write_fmt(args);
            }
        }
    }
}

fn append_int<I: itoa::Integer>(buf: &mut Vec<u8>, v: I) {
    let mut fmt = itoa::Buffer::new();
    buf.extend_from_slice(fmt.format(v).as_bytes());
}

impl<'a> From<&'a str> for Field<'a> {
    fn from(v: &'a str) -> Self {
        Field::Str(v)
    }
}

impl<'a> From<&'a String> for Field<'a> {
    fn from(v: &'a String) -> Self {
        Field::Str(v.as_str())
    }
}

impl<'a> From<fmt::Arguments<'a>> for Field<'a> {
    fn from(v: fmt::Arguments<'a>) -> Self {
        Field::Fmt(v)
    }
}

macro_rules! field_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> From<$ty> for Field<'a> {
                fn from(v: $ty) -> Self {
                    Field::$variant(v)
                }
            }
        )*
    };
}

field_from! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}

/// Build an array of `Field` name segments from anything convertible
/// into a `Field`.
///
/// Templates built with `format_args!` borrow temporaries, so they need to
/// be used within the statement that creates them.
///
/// ```
/// use statsd_shard::prelude::*;
/// use statsd_shard::{bucket, Client, NopTransport};
///
/// let client = Client::builder("udp", "127.0.0.1:8125")
///     .build_with(|_| Ok(NopTransport))
///     .unwrap();
///
/// let shard = 3;
/// let name = String::from("queries");
/// client.incr(&bucket!["db", format_args!("shard{}", shard), &name]);
/// ```
#[macro_export]
macro_rules! bucket {
    ($($segment:expr),* $(,)?) => {
        [$($crate::Field::from($segment)),*]
    };
}

/// Conversion trait for valid values for counters
///
/// Implemented for all signed and unsigned integer types. This trait is
/// internal to how values are formatted as part of metrics but is exposed
/// publicly for documentation purposes.
pub trait ToCountValue {
    fn to_field(self) -> Field<'static>;
}

/// Conversion trait for valid values for gauges
///
/// Implemented for all integer types as well as `f32` and `f64`.
pub trait ToGaugeValue {
    fn to_field(self) -> Field<'static>;
}

/// Conversion trait for valid values for timings
///
/// A `Duration` is recorded as is, an `Instant` is treated as the start of
/// the measured operation and the time elapsed since then is recorded.
/// Either way the value is sent as fractional milliseconds.
pub trait ToTimingValue {
    fn to_field(self) -> Field<'static>;
}

macro_rules! integer_values {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToCountValue for $ty {
                fn to_field(self) -> Field<'static> {
                    Field::from(self)
                }
            }

            impl ToGaugeValue for $ty {
                fn to_field(self) -> Field<'static> {
                    Field::from(self)
                }
            }
        )*
    };
}

integer_values!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToGaugeValue for f32 {
    fn to_field(self) -> Field<'static> {
        Field::F32(self)
    }
}

impl ToGaugeValue for f64 {
    fn to_field(self) -> Field<'static> {
        Field::F64(self)
    }
}

impl ToTimingValue for Duration {
    fn to_field(self) -> Field<'static> {
        Field::F64(self.as_nanos() as f64 / 1_000_000.0)
    }
}

impl ToTimingValue for Instant {
    fn to_field(self) -> Field<'static> {
        self.elapsed().to_field()
    }
}
