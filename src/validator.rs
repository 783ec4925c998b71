//! Structural validation of untrusted buffers.

use crate::binary::{MARKER_EMPTY_ARRAY, MARKER_EMPTY_OBJECT, MARKER_ILLEGAL, MARKER_LONG_STRING, MARKER_SIZE};
use crate::slice::container_width;
use crate::vec::read_uint;
use crate::{Options, TypeTag};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Why a buffer was rejected, and where.
///
/// `offset` points at the start of the offending value, or at the position
/// where the buffer ran out.
#[derive(Debug, PartialEq)]
pub struct ValidateError {
    kind: ValidateErrorKind,
    offset: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ValidateErrorKind {
    /// A reserved marker byte.
    IllegalMarker(u8),
    /// A value extends past the end of the buffer.
    UnexpectedEnd,
    /// A declared length or offset is inconsistent with its container.
    LengthOutOfBounds,
    /// An offset-table entry does not point at the member it indexes.
    OffsetMismatch,
    /// An indexed container holds a different number of members than its
    /// header declares.
    CountMismatch,
    KeyNotString,
    /// A sorted object whose keys are out of byte order.
    KeysUnsorted,
    DuplicateKey,
    InvalidUtf8,
    NestedTooDeeply,
    /// Bytes remain after the end of the top-level value.
    TrailingBytes,
    /// A tag that is never accepted from untrusted input.
    DisallowedTag(TypeTag),
}

impl ValidateError {
    #[inline]
    fn new(kind: ValidateErrorKind, offset: usize) -> Self {
        ValidateError { kind, offset }
    }

    #[inline]
    pub fn kind(&self) -> &ValidateErrorKind {
        &self.kind
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidateErrorKind::IllegalMarker(marker) => {
                write!(f, "illegal marker 0x{:02x} at offset {}", marker, self.offset)
            }
            ValidateErrorKind::UnexpectedEnd => write!(f, "unexpected end of input at offset {}", self.offset),
            ValidateErrorKind::LengthOutOfBounds => write!(f, "length out of bounds at offset {}", self.offset),
            ValidateErrorKind::OffsetMismatch => write!(f, "offset table mismatch at offset {}", self.offset),
            ValidateErrorKind::CountMismatch => write!(f, "member count mismatch at offset {}", self.offset),
            ValidateErrorKind::KeyNotString => write!(f, "object key is not a string at offset {}", self.offset),
            ValidateErrorKind::KeysUnsorted => write!(f, "object keys out of order at offset {}", self.offset),
            ValidateErrorKind::DuplicateKey => write!(f, "duplicate object key at offset {}", self.offset),
            ValidateErrorKind::InvalidUtf8 => write!(f, "invalid utf-8 string at offset {}", self.offset),
            ValidateErrorKind::NestedTooDeeply => write!(f, "containers nested too deeply at offset {}", self.offset),
            ValidateErrorKind::TrailingBytes => write!(f, "trailing bytes after value at offset {}", self.offset),
            ValidateErrorKind::DisallowedTag(tag) => {
                write!(f, "disallowed value of type {} at offset {}", tag, self.offset)
            }
        }
    }
}

impl Error for ValidateError {}

type ValidateResult<T> = std::result::Result<T, ValidateError>;

/// One open container on the validation stack.
struct Frame<'a> {
    /// Absolute offset of the container marker.
    start: usize,
    width: usize,
    indexed: bool,
    sorted: bool,
    object: bool,
    /// Absolute end of the container, including the offset table.
    end: usize,
    /// Absolute end of the member region.
    members_end: usize,
    /// Declared member count; `None` for unindexed containers.
    count: Option<usize>,
    /// Members (or pairs) validated so far.
    visited: usize,
    /// Object state: a key was seen, its value is next.
    awaiting_value: bool,
    prev_key: Option<&'a [u8]>,
    seen_keys: HashSet<&'a [u8]>,
}

/// Checks that a byte buffer holds exactly one well-formed value.
///
/// Validation is iterative; container nesting is tracked on an explicit
/// stack bounded by [`Options::max_nesting_depth`], so adversarial input
/// cannot exhaust the call stack. The validator fails fast on the first
/// problem and never reads outside the buffer.
pub struct Validator {
    options: Options,
}

impl Validator {
    #[inline]
    pub fn new(options: Options) -> Self {
        Validator { options }
    }

    /// Validates `bytes` as one complete value with no trailing bytes.
    pub fn validate(&self, bytes: &[u8]) -> ValidateResult<()> {
        if bytes.is_empty() {
            return Err(ValidateError::new(ValidateErrorKind::UnexpectedEnd, 0));
        }

        let mut stack: Vec<Frame> = Vec::new();
        let mut pos = 0usize;

        loop {
            self.check_member_start(bytes, &stack, pos)?;

            let marker = match bytes.get(pos) {
                Some(marker) => *marker,
                None => return Err(ValidateError::new(ValidateErrorKind::UnexpectedEnd, pos)),
            };
            let tag = TypeTag::from_marker(marker);
            check_allowed(marker, tag, pos)?;

            let expects_key = matches!(stack.last(), Some(frame) if frame.object && !frame.awaiting_value);
            if expects_key {
                pos = self.check_key(bytes, &mut stack, pos, marker, tag)?;
                if pos < end_of_region(&stack, bytes) {
                    continue;
                }
                // dangling key, caught below
            } else if tag == TypeTag::Array || tag == TypeTag::Object {
                match self.open_container(bytes, &stack, pos, marker, tag)? {
                    Opened::Frame(frame) => {
                        pos = frame.start + container_header_len(frame.width, frame.indexed);
                        stack.push(frame);
                    }
                    Opened::Empty(end) => {
                        pos = end;
                        bump(&mut stack);
                    }
                }
            } else {
                pos = self.check_scalar(bytes, pos, marker)?;
                bump(&mut stack);
            }

            // close every container whose member region is exhausted
            loop {
                match stack.last() {
                    None => {
                        return if pos == bytes.len() {
                            Ok(())
                        } else {
                            Err(ValidateError::new(ValidateErrorKind::TrailingBytes, pos))
                        };
                    }
                    Some(frame) if pos > frame.members_end => {
                        return Err(ValidateError::new(ValidateErrorKind::LengthOutOfBounds, pos));
                    }
                    Some(frame) if pos == frame.members_end => {
                        if frame.awaiting_value {
                            return Err(ValidateError::new(ValidateErrorKind::UnexpectedEnd, pos));
                        }
                        if let Some(count) = frame.count {
                            if frame.visited != count {
                                return Err(ValidateError::new(ValidateErrorKind::CountMismatch, frame.start));
                            }
                        }
                        pos = frame.end;
                        stack.pop();
                        bump(&mut stack);
                    }
                    Some(_) => break,
                }
            }
        }
    }

    /// If the innermost container is indexed and a member starts at `pos`,
    /// the next offset-table entry must point exactly there.
    fn check_member_start(&self, bytes: &[u8], stack: &[Frame], pos: usize) -> ValidateResult<()> {
        let frame = match stack.last() {
            Some(frame) if frame.indexed && !frame.awaiting_value => frame,
            _ => return Ok(()),
        };
        let count = match frame.count {
            Some(count) => count,
            None => return Ok(()),
        };
        if frame.visited >= count {
            // more members than the header declares
            return Err(ValidateError::new(ValidateErrorKind::CountMismatch, pos));
        }
        let entry_pos = frame.members_end + frame.visited * frame.width;
        let entry = read_length(bytes, entry_pos, frame.width, pos)?;
        if frame.start.checked_add(entry) != Some(pos) {
            return Err(ValidateError::new(ValidateErrorKind::OffsetMismatch, pos));
        }
        Ok(())
    }

    /// Validates an object key, enforcing order and uniqueness policies.
    /// Returns the position after the key.
    fn check_key<'a>(
        &self,
        bytes: &'a [u8],
        stack: &mut [Frame<'a>],
        pos: usize,
        marker: u8,
        tag: TypeTag,
    ) -> ValidateResult<usize> {
        if tag != TypeTag::String {
            return Err(ValidateError::new(ValidateErrorKind::KeyNotString, pos));
        }
        let end = self.check_scalar(bytes, pos, marker)?;

        let payload = if marker == MARKER_LONG_STRING {
            &bytes[pos + MARKER_SIZE + 8..end]
        } else {
            &bytes[pos + MARKER_SIZE..end]
        };

        if let Some(frame) = stack.last_mut() {
            if frame.sorted {
                if let Some(prev) = frame.prev_key {
                    if prev > payload {
                        return Err(ValidateError::new(ValidateErrorKind::KeysUnsorted, pos));
                    }
                }
                frame.prev_key = Some(payload);
            }
            if self.options.check_attribute_uniqueness && !frame.seen_keys.insert(payload) {
                return Err(ValidateError::new(ValidateErrorKind::DuplicateKey, pos));
            }
            frame.awaiting_value = true;
        }
        Ok(end)
    }

    /// Validates one scalar value, returning the position after it. Strings
    /// are checked for UTF-8 when the options ask for it.
    fn check_scalar(&self, bytes: &[u8], pos: usize, marker: u8) -> ValidateResult<usize> {
        let (end, payload) = if let Some(size) = TypeTag::fixed_size(marker) {
            let end = pos + size;
            let payload = if (0x40..=0xbe).contains(&marker) {
                Some(pos + MARKER_SIZE)
            } else {
                None
            };
            (end, payload)
        } else if marker == MARKER_LONG_STRING {
            let len = read_length(bytes, pos + MARKER_SIZE, 8, pos)?;
            let data = pos + MARKER_SIZE + 8;
            let end = data
                .checked_add(len)
                .ok_or_else(|| ValidateError::new(ValidateErrorKind::LengthOutOfBounds, pos))?;
            (end, Some(data))
        } else {
            // binary, 0xc0..=0xc7
            let width = (marker - 0xc0) as usize + 1;
            let len = read_length(bytes, pos + MARKER_SIZE, width, pos)?;
            let data = pos + MARKER_SIZE + width;
            let end = data
                .checked_add(len)
                .ok_or_else(|| ValidateError::new(ValidateErrorKind::LengthOutOfBounds, pos))?;
            (end, None)
        };

        if end > bytes.len() {
            return Err(ValidateError::new(ValidateErrorKind::UnexpectedEnd, pos));
        }
        if let Some(data) = payload {
            if self.options.validate_utf8_strings && std::str::from_utf8(&bytes[data..end]).is_err() {
                return Err(ValidateError::new(ValidateErrorKind::InvalidUtf8, pos));
            }
        }
        Ok(end)
    }

    /// Parses a container header into a stack frame, or recognizes the
    /// one-byte empty forms.
    fn open_container<'a>(
        &self,
        bytes: &'a [u8],
        stack: &[Frame],
        pos: usize,
        marker: u8,
        tag: TypeTag,
    ) -> ValidateResult<Opened<'a>> {
        if marker == MARKER_EMPTY_ARRAY || marker == MARKER_EMPTY_OBJECT {
            return Ok(Opened::Empty(pos + 1));
        }
        if stack.len() >= self.options.max_nesting_depth {
            return Err(ValidateError::new(ValidateErrorKind::NestedTooDeeply, pos));
        }

        let width = container_width(marker);
        let indexed = matches!(marker, 0x06..=0x09 | 0x0b..=0x12);
        let sorted = matches!(marker, 0x0b..=0x0e);

        let total = read_length(bytes, pos + MARKER_SIZE, width, pos)?;
        let end = pos
            .checked_add(total)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| ValidateError::new(ValidateErrorKind::UnexpectedEnd, pos))?;

        let header = container_header_len(width, indexed);
        if total < header {
            return Err(ValidateError::new(ValidateErrorKind::LengthOutOfBounds, pos));
        }

        let (count, members_end) = if indexed {
            let count = read_length(bytes, pos + MARKER_SIZE + width, width, pos)?;
            let table = count
                .checked_mul(width)
                .filter(|table| header + table <= total)
                .ok_or_else(|| ValidateError::new(ValidateErrorKind::LengthOutOfBounds, pos))?;
            (Some(count), end - table)
        } else {
            (None, end)
        };

        Ok(Opened::Frame(Frame {
            start: pos,
            width,
            indexed,
            sorted,
            object: tag == TypeTag::Object,
            end,
            members_end,
            count,
            visited: 0,
            awaiting_value: false,
            prev_key: None,
            seen_keys: HashSet::new(),
        }))
    }
}

enum Opened<'a> {
    Frame(Frame<'a>),
    /// End position of a one-byte empty container.
    Empty(usize),
}

/// A member just completed in the innermost container.
#[inline]
fn bump(stack: &mut [Frame]) {
    if let Some(frame) = stack.last_mut() {
        frame.visited += 1;
        frame.awaiting_value = false;
    }
}

#[inline]
fn end_of_region(stack: &[Frame], bytes: &[u8]) -> usize {
    match stack.last() {
        Some(frame) => frame.members_end,
        None => bytes.len(),
    }
}

#[inline]
fn container_header_len(width: usize, indexed: bool) -> usize {
    MARKER_SIZE + width + if indexed { width } else { 0 }
}

/// Tags (and reserved markers) never accepted from untrusted input.
#[inline]
fn check_allowed(marker: u8, tag: TypeTag, pos: usize) -> ValidateResult<()> {
    match tag {
        TypeTag::Illegal if marker != MARKER_ILLEGAL => {
            Err(ValidateError::new(ValidateErrorKind::IllegalMarker(marker), pos))
        }
        TypeTag::Illegal | TypeTag::External | TypeTag::Custom => {
            Err(ValidateError::new(ValidateErrorKind::DisallowedTag(tag), pos))
        }
        _ => Ok(()),
    }
}

/// Reads a `width`-byte little-endian length field, bounds-checked.
#[inline]
fn read_length(bytes: &[u8], at: usize, width: usize, value_pos: usize) -> ValidateResult<usize> {
    let field = bytes
        .get(at..at + width)
        .ok_or_else(|| ValidateError::new(ValidateErrorKind::UnexpectedEnd, value_pos))?;
    usize::try_from(read_uint(field)).map_err(|_| ValidateError::new(ValidateErrorKind::LengthOutOfBounds, value_pos))
}
