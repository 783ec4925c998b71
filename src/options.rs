//! Configuration.

/// Policies read by [`Builder`](crate::Builder),
/// [`Validator`](crate::Validator) and the JSON dumper.
///
/// An `Options` value is immutable once constructed and passed by copy, so
/// concurrent workers with different policies cannot interfere.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Options {
    /// Reject strings whose bytes are not well-formed UTF-8 during
    /// validation. Builder input is `&str`, so built buffers always satisfy
    /// this; the flag matters for untrusted buffers.
    pub validate_utf8_strings: bool,
    /// Reject duplicate keys within one object, at append time in the
    /// builder and during validation. With the flag unset duplicates are
    /// retained and lookups return the first occurrence in table order.
    pub check_attribute_uniqueness: bool,
    /// Dump policy: render binary values as lowercase hex strings instead of
    /// failing. Not part of the binary encoding.
    pub binary_as_hex: bool,
    /// Dump policy: render UTC dates as their raw millisecond integer
    /// instead of an ISO 8601 string. Not part of the binary encoding.
    pub dates_as_integers: bool,
    /// Container nesting depth at which the builder and the validator fail
    /// instead of going deeper.
    pub max_nesting_depth: usize,
}

pub(crate) const DEFAULT_MAX_NESTED_DEPTH: usize = 100;

impl Options {
    #[inline]
    pub const fn new() -> Self {
        Options {
            validate_utf8_strings: true,
            check_attribute_uniqueness: true,
            binary_as_hex: false,
            dates_as_integers: false,
            max_nesting_depth: DEFAULT_MAX_NESTED_DEPTH,
        }
    }
}

impl Default for Options {
    #[inline]
    fn default() -> Self {
        Options::new()
    }
}
