//! Binary format constants.

pub const MARKER_EMPTY_ARRAY: u8 = 0x01;
pub const MARKER_ARRAY_UNINDEXED: u8 = 0x02;
pub const MARKER_ARRAY_INDEXED: u8 = 0x06;
pub const MARKER_EMPTY_OBJECT: u8 = 0x0a;
pub const MARKER_OBJECT_SORTED: u8 = 0x0b;
pub const MARKER_OBJECT_UNSORTED: u8 = 0x0f;
pub const MARKER_OBJECT_UNINDEXED: u8 = 0x13;
pub const MARKER_ILLEGAL: u8 = 0x17;
pub const MARKER_NULL: u8 = 0x18;
pub const MARKER_FALSE: u8 = 0x19;
pub const MARKER_TRUE: u8 = 0x1a;
pub const MARKER_DOUBLE: u8 = 0x1b;
pub const MARKER_UTC_DATE: u8 = 0x1c;
pub const MARKER_EXTERNAL: u8 = 0x1d;
pub const MARKER_MIN_KEY: u8 = 0x1e;
pub const MARKER_MAX_KEY: u8 = 0x1f;
pub const MARKER_INT: u8 = 0x20;
pub const MARKER_UINT: u8 = 0x28;
pub const MARKER_SMALL_INT: u8 = 0x30;
pub const MARKER_SMALL_INT_NEG: u8 = 0x3a;
pub const MARKER_SHORT_STRING: u8 = 0x40;
pub const MARKER_LONG_STRING: u8 = 0xbf;
pub const MARKER_BINARY: u8 = 0xc0;

pub const MARKER_SIZE: usize = 1;
/// Payload size of doubles, UTC dates and external pointers.
pub const WORD_SIZE: usize = 8;
/// Length field size of long strings.
pub const LONG_STRING_LENGTH_SIZE: usize = 8;
/// Widest head a container header can use; reserved at open, shrunk at close.
pub const MAX_HEAD_WIDTH: usize = 8;
/// Longest string encodable in the short form (length embedded in the marker).
pub const MAX_SHORT_STRING: usize = 126;

pub const SMALL_INT_MIN: i64 = -6;
pub const SMALL_INT_MAX: i64 = 9;

/// Whether `value` is encodable with the value embedded in the marker byte.
#[inline]
pub const fn is_small_int(value: i64) -> bool {
    value >= SMALL_INT_MIN && value <= SMALL_INT_MAX
}

/// Number of header bytes of a container with head width `width`.
#[inline]
pub const fn container_header_size(width: usize, indexed: bool) -> usize {
    MARKER_SIZE + width + if indexed { width } else { 0 }
}

/// Largest byte-length representable with a head of `width` bytes.
#[inline]
pub const fn max_length_for_width(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}
