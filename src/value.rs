//! Value descriptors.

use crate::TypeTag;

/// An ephemeral description of a scalar to be appended to a
/// [`Builder`](crate::Builder).
///
/// A `Value` is consumed by a single `add_value` call and never outlives it;
/// containers are built structurally via `open_array`/`open_object` instead.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Double(f64),
    Int(i64),
    UInt(u64),
    /// Milliseconds since the Unix epoch.
    UTCDate(i64),
    String(&'a str),
    Binary(&'a [u8]),
    /// In-process pointer to another encoded value; written as 8 raw bytes,
    /// never copied or followed by the builder.
    External(*const u8),
    Illegal,
    MinKey,
    MaxKey,
}

impl Value<'_> {
    /// The tag the builder will emit for this descriptor. Integers in the
    /// marker-embedded range report [`TypeTag::SmallInt`].
    #[inline]
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Double(_) => TypeTag::Double,
            Value::Int(v) if crate::binary::is_small_int(*v) => TypeTag::SmallInt,
            Value::Int(_) => TypeTag::Int,
            Value::UInt(v) if *v <= crate::binary::SMALL_INT_MAX as u64 => TypeTag::SmallInt,
            Value::UInt(_) => TypeTag::UInt,
            Value::UTCDate(_) => TypeTag::UTCDate,
            Value::String(_) => TypeTag::String,
            Value::Binary(_) => TypeTag::Binary,
            Value::External(_) => TypeTag::External,
            Value::Illegal => TypeTag::Illegal,
            Value::MinKey => TypeTag::MinKey,
            Value::MaxKey => TypeTag::MaxKey,
        }
    }
}

impl From<bool> for Value<'_> {
    #[inline]
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value<'_> {
    #[inline]
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<i32> for Value<'_> {
    #[inline]
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value<'_> {
    #[inline]
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value<'_> {
    #[inline]
    fn from(v: u32) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<u64> for Value<'_> {
    #[inline]
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    #[inline]
    fn from(v: &'a str) -> Self {
        Value::String(v)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    #[inline]
    fn from(v: &'a [u8]) -> Self {
        Value::Binary(v)
    }
}
