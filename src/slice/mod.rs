//! Zero-copy read access.

mod array;
mod object;

pub use crate::slice::array::{ArrayIter, ArraySlice};
pub use crate::slice::object::{KeyIter, ObjectIter, ObjectSlice, ValueIter};

use crate::binary::{
    LONG_STRING_LENGTH_SIZE, MARKER_ARRAY_INDEXED, MARKER_ARRAY_UNINDEXED, MARKER_EMPTY_ARRAY, MARKER_EMPTY_OBJECT,
    MARKER_FALSE, MARKER_LONG_STRING, MARKER_NULL, MARKER_OBJECT_SORTED, MARKER_OBJECT_UNINDEXED,
    MARKER_OBJECT_UNSORTED, MARKER_SHORT_STRING, MARKER_SIZE, MARKER_SMALL_INT, MARKER_TRUE, MARKER_UTC_DATE,
    WORD_SIZE,
};
use crate::vec::{read_int, read_uint};
use crate::{Options, TypeTag};
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Possible errors that can arise during read access.
#[derive(Debug, PartialEq)]
pub enum SliceError {
    /// The bytes at `offset` cannot be a valid encoded value, or a declared
    /// length exceeds the buffer.
    Malformed { offset: usize },
    /// A typed getter was invoked against a slice of a different tag.
    UnexpectedType { expected: TypeTag, actual: TypeTag },
    IndexOutOfBounds { len: usize, index: usize },
    /// The stored value does not fit the requested numeric width.
    NumericOverflow,
    InvalidUtf8 { offset: usize },
}

impl Display for SliceError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceError::Malformed { offset } => write!(f, "malformed encoding at offset {}", offset),
            SliceError::UnexpectedType { expected, actual } => {
                write!(f, "type mismatch, expect {}, but actual {}", expected, actual)
            }
            SliceError::IndexOutOfBounds { len, index } => {
                write!(f, "index out of bounds: the len is {} but the index is {}", len, index)
            }
            SliceError::NumericOverflow => write!(f, "numeric value does not fit the requested width"),
            SliceError::InvalidUtf8 { offset } => write!(f, "invalid utf-8 string at offset {}", offset),
        }
    }
}

impl Error for SliceError {}

pub type SliceResult<T> = std::result::Result<T, SliceError>;

/// A read-only, zero-copy view over one encoded value.
///
/// A slice never owns bytes; it borrows memory owned by a
/// [`Builder`](crate::Builder)'s buffer, a [`BpackBuf`] or the caller. Its
/// byte range starts at the value's marker byte; the logical end is computed
/// from the header via [`byte_size`](Slice::byte_size). All accessors are
/// bounds-checked and report [`SliceError::Malformed`] instead of reading
/// out of range, but only [`Validator`](crate::Validator) makes an untrusted
/// buffer trustworthy.
#[derive(Copy, Clone, Debug)]
pub struct Slice<'a> {
    bytes: &'a [u8],
}

impl<'a> Slice<'a> {
    /// Creates a slice over `bytes`, which must start at a marker byte.
    #[inline]
    pub fn new(bytes: &'a [u8]) -> SliceResult<Slice<'a>> {
        if bytes.is_empty() {
            return Err(SliceError::Malformed { offset: 0 });
        }
        Ok(Slice { bytes })
    }

    #[inline]
    pub(crate) fn new_trusted(bytes: &'a [u8]) -> Slice<'a> {
        debug_assert!(!bytes.is_empty());
        Slice { bytes }
    }

    /// Everything visible to this slice, from the marker byte to the end of
    /// the underlying buffer.
    #[inline]
    pub(crate) fn all_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub(crate) fn marker(&self) -> u8 {
        self.bytes[0]
    }

    /// The type tag decoded from the marker byte.
    #[inline]
    pub fn tag(&self) -> TypeTag {
        TypeTag::from_marker(self.marker())
    }

    /// Total encoded length of this value, including its header.
    #[inline]
    pub fn byte_size(&self) -> SliceResult<usize> {
        let marker = self.marker();
        let size = if let Some(size) = TypeTag::fixed_size(marker) {
            size
        } else {
            match marker {
                0x02..=0x16 => {
                    let width = container_width(marker);
                    self.read_length(MARKER_SIZE, width)?
                }
                MARKER_LONG_STRING => {
                    let len = self.read_length(MARKER_SIZE, LONG_STRING_LENGTH_SIZE)?;
                    MARKER_SIZE
                        .checked_add(LONG_STRING_LENGTH_SIZE)
                        .and_then(|n| n.checked_add(len))
                        .ok_or(SliceError::Malformed { offset: 0 })?
                }
                0xc0..=0xc7 => {
                    let width = (marker - 0xc0) as usize + 1;
                    let len = self.read_length(MARKER_SIZE, width)?;
                    MARKER_SIZE
                        .checked_add(width)
                        .and_then(|n| n.checked_add(len))
                        .ok_or(SliceError::Malformed { offset: 0 })?
                }
                _ => return Err(SliceError::Malformed { offset: 0 }),
            }
        };
        if size == 0 || size > self.bytes.len() {
            return Err(SliceError::Malformed { offset: 0 });
        }
        Ok(size)
    }

    /// The exact byte range of this value.
    #[inline]
    pub fn value_bytes(&self) -> SliceResult<&'a [u8]> {
        let size = self.byte_size()?;
        Ok(&self.bytes[..size])
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.marker() == MARKER_NULL
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.tag() == TypeTag::Array
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        self.tag() == TypeTag::Object
    }

    #[inline]
    pub fn as_bool(&self) -> SliceResult<bool> {
        match self.marker() {
            MARKER_TRUE => Ok(true),
            MARKER_FALSE => Ok(false),
            _ => Err(self.unexpected(TypeTag::Bool)),
        }
    }

    #[inline]
    pub fn as_double(&self) -> SliceResult<f64> {
        if self.tag() != TypeTag::Double {
            return Err(self.unexpected(TypeTag::Double));
        }
        let bytes = self.subslice(MARKER_SIZE, MARKER_SIZE + WORD_SIZE)?;
        Ok(f64::from_bits(read_uint(bytes)))
    }

    /// Reads an integer value. Accepts the `SmallInt`, `Int` and `UInt`
    /// tags; an unsigned value above `i64::MAX` reports `NumericOverflow`.
    #[inline]
    pub fn as_int(&self) -> SliceResult<i64> {
        let marker = self.marker();
        match marker {
            0x30..=0x39 => Ok((marker - MARKER_SMALL_INT) as i64),
            0x3a..=0x3f => Ok(marker as i64 - 0x40),
            0x20..=0x27 => {
                let width = (marker - 0x20) as usize + 1;
                Ok(read_int(self.subslice(MARKER_SIZE, MARKER_SIZE + width)?))
            }
            0x28..=0x2f => {
                let width = (marker - 0x28) as usize + 1;
                let value = read_uint(self.subslice(MARKER_SIZE, MARKER_SIZE + width)?);
                i64::try_from(value).map_err(|_| SliceError::NumericOverflow)
            }
            _ => Err(self.unexpected(TypeTag::Int)),
        }
    }

    /// Reads an unsigned integer value. Accepts the `SmallInt`, `Int` and
    /// `UInt` tags; a negative value reports `NumericOverflow`.
    #[inline]
    pub fn as_uint(&self) -> SliceResult<u64> {
        let marker = self.marker();
        match marker {
            0x28..=0x2f => {
                let width = (marker - 0x28) as usize + 1;
                Ok(read_uint(self.subslice(MARKER_SIZE, MARKER_SIZE + width)?))
            }
            0x20..=0x27 | 0x30..=0x3f => {
                let value = self.as_int()?;
                u64::try_from(value).map_err(|_| SliceError::NumericOverflow)
            }
            _ => Err(self.unexpected(TypeTag::UInt)),
        }
    }

    /// Milliseconds since the Unix epoch.
    #[inline]
    pub fn as_utc_date(&self) -> SliceResult<i64> {
        if self.marker() != MARKER_UTC_DATE {
            return Err(self.unexpected(TypeTag::UTCDate));
        }
        Ok(read_int(self.subslice(MARKER_SIZE, MARKER_SIZE + WORD_SIZE)?))
    }

    #[inline]
    pub fn as_str(&self) -> SliceResult<&'a str> {
        let (data, offset) = self.string_bytes()?;
        std::str::from_utf8(data).map_err(|_| SliceError::InvalidUtf8 { offset })
    }

    #[inline]
    pub fn as_binary(&self) -> SliceResult<&'a [u8]> {
        let marker = self.marker();
        if !(0xc0..=0xc7).contains(&marker) {
            return Err(self.unexpected(TypeTag::Binary));
        }
        let width = (marker - 0xc0) as usize + 1;
        let len = self.read_length(MARKER_SIZE, width)?;
        self.subslice(MARKER_SIZE + width, MARKER_SIZE + width + len)
    }

    /// The raw in-process pointer stored in an external value.
    ///
    /// Dereferencing the result is only sound if the process that built the
    /// buffer stored a pointer that is still live; the validator rejects
    /// external values in untrusted buffers for this reason.
    #[inline]
    pub fn as_external(&self) -> SliceResult<*const u8> {
        if self.tag() != TypeTag::External {
            return Err(self.unexpected(TypeTag::External));
        }
        let raw = read_uint(self.subslice(MARKER_SIZE, MARKER_SIZE + WORD_SIZE)?);
        Ok(raw as usize as *const u8)
    }

    /// If this slice is an array, returns its container view.
    #[inline]
    pub fn array(&self) -> SliceResult<ArraySlice<'a>> {
        if !self.is_array() {
            return Err(self.unexpected(TypeTag::Array));
        }
        ArraySlice::try_new(*self)
    }

    /// If this slice is an object, returns its container view.
    #[inline]
    pub fn object(&self) -> SliceResult<ObjectSlice<'a>> {
        if !self.is_object() {
            return Err(self.unexpected(TypeTag::Object));
        }
        ObjectSlice::try_new(*self)
    }
}

impl<'a> Slice<'a> {
    #[inline]
    fn unexpected(&self, expected: TypeTag) -> SliceError {
        SliceError::UnexpectedType {
            expected,
            actual: self.tag(),
        }
    }

    #[inline]
    pub(crate) fn subslice(&self, from: usize, to: usize) -> SliceResult<&'a [u8]> {
        self.bytes.get(from..to).ok_or(SliceError::Malformed { offset: from })
    }

    /// Reads an unsigned length field, failing if it does not fit `usize`.
    #[inline]
    pub(crate) fn read_length(&self, pos: usize, width: usize) -> SliceResult<usize> {
        let value = read_uint(self.subslice(pos, pos + width)?);
        usize::try_from(value).map_err(|_| SliceError::Malformed { offset: pos })
    }

    #[inline]
    pub(crate) fn string_bytes(&self) -> SliceResult<(&'a [u8], usize)> {
        let marker = self.marker();
        match marker {
            0x40..=0xbe => {
                let len = (marker - MARKER_SHORT_STRING) as usize;
                Ok((self.subslice(MARKER_SIZE, MARKER_SIZE + len)?, MARKER_SIZE))
            }
            MARKER_LONG_STRING => {
                let len = self.read_length(MARKER_SIZE, LONG_STRING_LENGTH_SIZE)?;
                let data = MARKER_SIZE + LONG_STRING_LENGTH_SIZE;
                Ok((self.subslice(data, data + len)?, data))
            }
            _ => Err(self.unexpected(TypeTag::String)),
        }
    }

    /// Decodes the container header. The marker must be a container marker.
    pub(crate) fn container_info(&self) -> SliceResult<ContainerInfo> {
        let marker = self.marker();
        if marker == MARKER_EMPTY_ARRAY || marker == MARKER_EMPTY_OBJECT {
            return Ok(ContainerInfo {
                width: 0,
                indexed: false,
                sorted: false,
                total: 1,
                count: Some(0),
                members_start: 1,
                members_end: 1,
            });
        }

        let width = container_width(marker);
        let indexed = matches!(marker, 0x06..=0x09 | 0x0b..=0x12);
        let sorted = (MARKER_OBJECT_SORTED..MARKER_OBJECT_UNSORTED).contains(&marker);

        let total = self.read_length(MARKER_SIZE, width)?;
        if total > self.bytes.len() {
            return Err(SliceError::Malformed { offset: 0 });
        }

        let header = MARKER_SIZE + width + if indexed { width } else { 0 };
        if total < header {
            return Err(SliceError::Malformed { offset: 0 });
        }

        let (count, members_end) = if indexed {
            let count = self.read_length(MARKER_SIZE + width, width)?;
            let table = count
                .checked_mul(width)
                .filter(|table| header + table <= total)
                .ok_or(SliceError::Malformed { offset: 0 })?;
            (Some(count), total - table)
        } else {
            (None, total)
        };

        Ok(ContainerInfo {
            width,
            indexed,
            sorted,
            total,
            count,
            members_start: header,
            members_end,
        })
    }

    /// Reads the `index`-th offset-table entry of an indexed container.
    #[inline]
    pub(crate) fn table_entry(&self, info: &ContainerInfo, index: usize) -> SliceResult<usize> {
        let pos = info.members_end + index * info.width;
        self.read_length(pos, info.width)
    }

    /// Returns the child value starting at `offset`, bounded by the
    /// container's end.
    #[inline]
    pub(crate) fn child_at(&self, offset: usize, end: usize) -> SliceResult<Slice<'a>> {
        if offset >= end {
            return Err(SliceError::Malformed { offset });
        }
        Slice::new(self.subslice(offset, end)?)
    }
}

/// Head width of a container marker (1, 2, 4 or 8 bytes).
#[inline]
pub(crate) fn container_width(marker: u8) -> usize {
    let base = match marker {
        0x02..=0x05 => MARKER_ARRAY_UNINDEXED,
        0x06..=0x09 => MARKER_ARRAY_INDEXED,
        0x0b..=0x0e => MARKER_OBJECT_SORTED,
        0x0f..=0x12 => MARKER_OBJECT_UNSORTED,
        _ => {
            debug_assert!((0x13..=0x16).contains(&marker));
            MARKER_OBJECT_UNINDEXED
        }
    };
    1usize << (marker - base)
}

#[derive(Debug)]
pub(crate) struct ContainerInfo {
    pub width: usize,
    pub indexed: bool,
    pub sorted: bool,
    /// Total byte length, header through offset table.
    pub total: usize,
    /// Declared member count; `None` for unindexed containers.
    pub count: Option<usize>,
    /// Offset of the first member, relative to the marker.
    pub members_start: usize,
    /// End of the member region: the offset table for indexed containers,
    /// the container end otherwise.
    pub members_end: usize,
}

/// An owned buffer holding one encoded value.
#[repr(transparent)]
#[derive(Clone)]
pub struct BpackBuf {
    bytes: Vec<u8>,
}

impl BpackBuf {
    /// Creates a new `BpackBuf` from `Vec<u8>`.
    ///
    /// # Safety
    ///
    /// Callers should guarantee `bytes` holds one valid encoded value.
    #[inline]
    pub unsafe fn new_unchecked(bytes: Vec<u8>) -> Self {
        debug_assert!(!bytes.is_empty());
        BpackBuf { bytes }
    }

    /// Creates a `BpackBuf` from untrusted bytes, validating them first.
    #[inline]
    pub fn from_bytes(bytes: Vec<u8>, options: Options) -> Result<Self, crate::ValidateError> {
        crate::Validator::new(options).validate(&bytes)?;
        Ok(BpackBuf { bytes })
    }

    #[inline]
    pub fn as_slice(&self) -> Slice {
        Slice::new_trusted(&self.bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl PartialEq for BpackBuf {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for BpackBuf {}

impl fmt::Debug for BpackBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BpackBuf(")?;
        for byte in &self.bytes {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl AsRef<[u8]> for BpackBuf {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
