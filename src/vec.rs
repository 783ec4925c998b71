//! Vec extension.

use crate::binary::{
    MARKER_BINARY, MARKER_INT, MARKER_LONG_STRING, MARKER_SHORT_STRING, MARKER_SMALL_INT, MARKER_SMALL_INT_NEG,
    MARKER_UINT, MAX_SHORT_STRING, SMALL_INT_MAX,
};
use std::collections::TryReserveError;

/// Minimal number of bytes needed to hold `value` as an unsigned integer.
#[inline]
pub fn uint_width(value: u64) -> usize {
    match value {
        0..=0xff => 1,
        0x100..=0xffff => 2,
        0x1_0000..=0xff_ffff => 3,
        0x100_0000..=0xffff_ffff => 4,
        0x1_0000_0000..=0xff_ffff_ffff => 5,
        0x100_0000_0000..=0xffff_ffff_ffff => 6,
        0x1_0000_0000_0000..=0xff_ffff_ffff_ffff => 7,
        _ => 8,
    }
}

/// Minimal number of bytes needed to hold `value` in two's complement.
#[inline]
pub fn int_width(value: i64) -> usize {
    for n in 1..8usize {
        let half = 1i64 << (8 * n - 1);
        if value >= -half && value < half {
            return n;
        }
    }
    8
}

/// Reads an unsigned little-endian integer of `width` bytes.
///
/// The caller must ensure `bytes.len() == width <= 8`.
#[inline]
pub fn read_uint(bytes: &[u8]) -> u64 {
    debug_assert!(!bytes.is_empty() && bytes.len() <= 8);
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Reads a signed little-endian integer of `width` bytes, sign-extending.
#[inline]
pub fn read_int(bytes: &[u8]) -> i64 {
    let width = bytes.len();
    let raw = read_uint(bytes);
    if width < 8 && raw & (1 << (8 * width - 1)) != 0 {
        (raw | (u64::MAX << (8 * width))) as i64
    } else {
        raw as i64
    }
}

pub trait VecExt: Sized {
    fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError>;
    fn push_marker(&mut self, marker: u8);
    fn push_uint(&mut self, value: u64, width: usize);
    fn write_uint_at(&mut self, value: u64, width: usize, pos: usize);
    fn push_int_value(&mut self, value: i64);
    fn push_uint_value(&mut self, value: u64);
    fn push_string_value(&mut self, value: &str);
    fn push_binary_value(&mut self, value: &[u8]);
}

impl VecExt for Vec<u8> {
    #[inline]
    fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut vec = Vec::new();
        vec.try_reserve(capacity)?;
        Ok(vec)
    }

    #[inline]
    fn push_marker(&mut self, marker: u8) {
        self.push(marker);
    }

    #[inline]
    fn push_uint(&mut self, value: u64, width: usize) {
        debug_assert!(width <= 8);
        self.extend_from_slice(&value.to_le_bytes()[..width]);
    }

    #[inline]
    fn write_uint_at(&mut self, value: u64, width: usize, pos: usize) {
        debug_assert!(pos + width <= self.len());
        self[pos..pos + width].copy_from_slice(&value.to_le_bytes()[..width]);
    }

    #[inline]
    fn push_int_value(&mut self, value: i64) {
        if crate::binary::is_small_int(value) {
            if value >= 0 {
                self.push_marker(MARKER_SMALL_INT + value as u8);
            } else {
                self.push_marker(MARKER_SMALL_INT_NEG + (value + 6) as u8);
            }
            return;
        }
        let width = int_width(value);
        self.push_marker(MARKER_INT + (width - 1) as u8);
        self.extend_from_slice(&value.to_le_bytes()[..width]);
    }

    #[inline]
    fn push_uint_value(&mut self, value: u64) {
        if value <= SMALL_INT_MAX as u64 {
            self.push_marker(MARKER_SMALL_INT + value as u8);
            return;
        }
        let width = uint_width(value);
        self.push_marker(MARKER_UINT + (width - 1) as u8);
        self.push_uint(value, width);
    }

    #[inline]
    fn push_string_value(&mut self, value: &str) {
        if value.len() <= MAX_SHORT_STRING {
            self.push_marker(MARKER_SHORT_STRING + value.len() as u8);
        } else {
            self.push_marker(MARKER_LONG_STRING);
            self.push_uint(value.len() as u64, 8);
        }
        self.extend_from_slice(value.as_bytes());
    }

    #[inline]
    fn push_binary_value(&mut self, value: &[u8]) {
        let width = uint_width(value.len() as u64);
        self.push_marker(MARKER_BINARY + (width - 1) as u8);
        self.push_uint(value.len() as u64, width);
        self.extend_from_slice(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(uint_width(0), 1);
        assert_eq!(uint_width(255), 1);
        assert_eq!(uint_width(256), 2);
        assert_eq!(uint_width(u64::MAX), 8);

        assert_eq!(int_width(0), 1);
        assert_eq!(int_width(127), 1);
        assert_eq!(int_width(128), 2);
        assert_eq!(int_width(-128), 1);
        assert_eq!(int_width(-129), 2);
        assert_eq!(int_width(i64::MAX), 8);
        assert_eq!(int_width(i64::MIN), 8);
    }

    #[test]
    fn test_read_int_sign_extension() {
        let mut buf = Vec::new();
        buf.push_int_value(-300);
        assert_eq!(buf[0], MARKER_INT + 1);
        assert_eq!(read_int(&buf[1..3]), -300);

        let mut buf = Vec::new();
        buf.push_int_value(i64::MIN);
        assert_eq!(buf[0], MARKER_INT + 7);
        assert_eq!(read_int(&buf[1..9]), i64::MIN);
    }

    #[test]
    fn test_small_int_markers() {
        let mut buf = Vec::new();
        buf.push_int_value(9);
        assert_eq!(buf, [MARKER_SMALL_INT + 9]);

        let mut buf = Vec::new();
        buf.push_int_value(-1);
        assert_eq!(buf, [0x3f]);

        let mut buf = Vec::new();
        buf.push_int_value(-6);
        assert_eq!(buf, [0x3a]);
    }
}
