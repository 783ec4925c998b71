//! Type tags.

use std::fmt::{Display, Formatter};

/// The kind of an encoded value, as determined by its marker byte.
///
/// Every byte value 0x00..=0xFF maps to exactly one tag; reserved marker
/// ranges map to [`TypeTag::Illegal`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TypeTag {
    Null,
    Bool,
    Double,
    SmallInt,
    Int,
    UInt,
    UTCDate,
    String,
    Binary,
    Array,
    Object,
    External,
    Illegal,
    MinKey,
    MaxKey,
    Custom,
}

impl TypeTag {
    /// Decodes the tag from a marker byte. Total: every marker maps to a tag.
    #[inline]
    pub const fn from_marker(marker: u8) -> TypeTag {
        match marker {
            0x01..=0x09 => TypeTag::Array,
            0x0a..=0x16 => TypeTag::Object,
            0x18 => TypeTag::Null,
            0x19 | 0x1a => TypeTag::Bool,
            0x1b => TypeTag::Double,
            0x1c => TypeTag::UTCDate,
            0x1d => TypeTag::External,
            0x1e => TypeTag::MinKey,
            0x1f => TypeTag::MaxKey,
            0x20..=0x27 => TypeTag::Int,
            0x28..=0x2f => TypeTag::UInt,
            0x30..=0x3f => TypeTag::SmallInt,
            0x40..=0xbf => TypeTag::String,
            0xc0..=0xc7 => TypeTag::Binary,
            0xf0..=0xf3 => TypeTag::Custom,
            _ => TypeTag::Illegal,
        }
    }

    /// Returns the total encoded size for markers whose length is implied by
    /// the marker byte alone, `None` for variable-width markers.
    #[inline]
    pub const fn fixed_size(marker: u8) -> Option<usize> {
        match marker {
            0x01 | 0x0a => Some(1),
            0x17..=0x1a | 0x1e | 0x1f | 0x30..=0x3f => Some(1),
            0x1b..=0x1d => Some(9),
            0x20..=0x27 => Some(2 + (marker - 0x20) as usize),
            0x28..=0x2f => Some(2 + (marker - 0x28) as usize),
            0x40..=0xbe => Some(1 + (marker - 0x40) as usize),
            0xf0..=0xf3 => Some(1 + (1usize << (marker - 0xf0))),
            _ => None,
        }
    }

    /// Returns the name of the tag, as used in error messages.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Double => "double",
            TypeTag::SmallInt => "small-int",
            TypeTag::Int => "int",
            TypeTag::UInt => "uint",
            TypeTag::UTCDate => "utc-date",
            TypeTag::String => "string",
            TypeTag::Binary => "binary",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::External => "external",
            TypeTag::Illegal => "illegal",
            TypeTag::MinKey => "min-key",
            TypeTag::MaxKey => "max-key",
            TypeTag::Custom => "custom",
        }
    }
}

impl Display for TypeTag {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_mapping() {
        for marker in 0u16..=0xff {
            // must not panic, every byte has a tag
            let _ = TypeTag::from_marker(marker as u8);
        }
        assert_eq!(TypeTag::from_marker(0x00), TypeTag::Illegal);
        assert_eq!(TypeTag::from_marker(0x17), TypeTag::Illegal);
        assert_eq!(TypeTag::from_marker(0xc8), TypeTag::Illegal);
        assert_eq!(TypeTag::from_marker(0xf4), TypeTag::Illegal);
        assert_eq!(TypeTag::from_marker(0xff), TypeTag::Illegal);
        assert_eq!(TypeTag::from_marker(0x01), TypeTag::Array);
        assert_eq!(TypeTag::from_marker(0x13), TypeTag::Object);
        assert_eq!(TypeTag::from_marker(0x3f), TypeTag::SmallInt);
        assert_eq!(TypeTag::from_marker(0xbf), TypeTag::String);
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(TypeTag::fixed_size(0x18), Some(1));
        assert_eq!(TypeTag::fixed_size(0x1b), Some(9));
        assert_eq!(TypeTag::fixed_size(0x20), Some(2));
        assert_eq!(TypeTag::fixed_size(0x27), Some(9));
        assert_eq!(TypeTag::fixed_size(0x40), Some(1));
        assert_eq!(TypeTag::fixed_size(0xbe), Some(127));
        assert_eq!(TypeTag::fixed_size(0xbf), None);
        assert_eq!(TypeTag::fixed_size(0x02), None);
        assert_eq!(TypeTag::fixed_size(0xf3), Some(9));
    }
}
