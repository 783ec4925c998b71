//! Incremental builder.

use crate::binary::{
    container_header_size, max_length_for_width, MARKER_ARRAY_INDEXED, MARKER_ARRAY_UNINDEXED, MARKER_DOUBLE,
    MARKER_EMPTY_ARRAY, MARKER_EMPTY_OBJECT, MARKER_EXTERNAL, MARKER_FALSE, MARKER_ILLEGAL, MARKER_LONG_STRING,
    MARKER_MAX_KEY, MARKER_MIN_KEY, MARKER_NULL, MARKER_OBJECT_SORTED, MARKER_OBJECT_UNINDEXED,
    MARKER_OBJECT_UNSORTED, MARKER_SHORT_STRING, MARKER_SIZE, MARKER_TRUE, MARKER_UTC_DATE, MAX_HEAD_WIDTH,
    MAX_SHORT_STRING, WORD_SIZE,
};
use crate::slice::BpackBuf;
use crate::vec::VecExt;
use crate::{Options, Slice, Value};
use std::collections::TryReserveError;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_SIZE: usize = 128;

/// Possible errors that can arise during building.
#[derive(Debug)]
pub enum BuildError {
    TryReserveError(TryReserveError),
    /// A value was appended to an object whose next member must be a key.
    KeyExpected,
    /// A key was appended while the object still awaits the previous key's value.
    ValueExpected,
    /// A key was appended outside of an open object.
    KeyOutsideObject,
    /// `close` was called with no open container.
    UnmatchedClose,
    /// `close` was called while the innermost object still awaits a value.
    MissingValue,
    /// `slice`/`finish` was called while a container is still open.
    UnclosedContainer,
    /// A second top-level value was appended.
    MultipleTopLevelValues,
    /// `slice`/`finish` was called before any value was appended.
    EmptyBuilder,
    NestedTooDeeply,
    DuplicateKey(String),
    NonFiniteDouble,
    JsonError(serde_json::Error),
    /// A previous structural error left the builder unusable; call `clear`.
    Poisoned,
}

impl Display for BuildError {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            BuildError::TryReserveError(e) => write!(f, "{}", e),
            BuildError::KeyExpected => write!(f, "expecting an object key, not a value"),
            BuildError::ValueExpected => write!(f, "expecting a value for the previous key"),
            BuildError::KeyOutsideObject => write!(f, "key appended outside of an object"),
            BuildError::UnmatchedClose => write!(f, "no open container to close"),
            BuildError::MissingValue => write!(f, "object closed while awaiting a value"),
            BuildError::UnclosedContainer => write!(f, "a container is still open"),
            BuildError::MultipleTopLevelValues => write!(f, "only one top-level value is allowed"),
            BuildError::EmptyBuilder => write!(f, "no value has been built"),
            BuildError::NestedTooDeeply => write!(f, "containers are nested too deeply"),
            BuildError::DuplicateKey(key) => write!(f, "duplicate object key '{}'", key),
            BuildError::NonFiniteDouble => write!(f, "double value is not finite"),
            BuildError::JsonError(e) => write!(f, "{}", e),
            BuildError::Poisoned => write!(f, "builder is unusable after a previous error"),
        }
    }
}

impl Error for BuildError {}

impl From<TryReserveError> for BuildError {
    #[inline]
    fn from(e: TryReserveError) -> Self {
        BuildError::TryReserveError(e)
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;

struct OpenContainer {
    /// Buffer offset of the container's marker byte.
    start: usize,
    object: bool,
    indexed: bool,
    sorted: bool,
    /// Absolute buffer offsets of member starts (keys, for objects).
    offsets: Vec<usize>,
    /// Object state: a key has been appended, its value has not.
    awaiting_value: bool,
}

impl OpenContainer {
    #[inline]
    fn reserved_header(&self) -> usize {
        container_header_size(MAX_HEAD_WIDTH, self.indexed)
    }
}

/// Incremental writer producing a finished encoding via backpatching.
///
/// A builder owns a single growable byte buffer and a stack of open-container
/// records. Container headers are reserved at maximum head width when a
/// container opens and shrunk in place when it closes, shifting the member
/// bytes left so no space is wasted.
///
/// Structural misuse (a value where a key is expected, an unmatched `close`,
/// a duplicate key under the uniqueness policy) fails immediately and leaves
/// the builder unusable until [`clear`](Builder::clear).
pub struct Builder {
    bytes: Vec<u8>,
    stack: Vec<OpenContainer>,
    options: Options,
    sealed: bool,
    poisoned: bool,
}

impl Builder {
    /// Creates a builder with default [`Options`].
    #[inline]
    pub fn new() -> Self {
        Builder::with_options(Options::new())
    }

    #[inline]
    pub fn with_options(options: Options) -> Self {
        Builder {
            bytes: Vec::with_capacity(DEFAULT_SIZE),
            stack: Vec::new(),
            options,
            sealed: false,
            poisoned: false,
        }
    }

    /// Resets the builder to its empty state, keeping allocated capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.stack.clear();
        self.sealed = false;
        self.poisoned = false;
    }

    /// Current container nesting depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// True once a complete top-level value has been built and closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sealed && self.stack.is_empty()
    }

    /// Appends a scalar at the current write position.
    #[inline]
    pub fn add_value(&mut self, value: Value) -> BuildResult<&mut Self> {
        self.guard(|b| b.add_value_inner(value))?;
        Ok(self)
    }

    /// Appends an object key. The next append must be its value.
    #[inline]
    pub fn add_key<K: AsRef<str>>(&mut self, key: K) -> BuildResult<&mut Self> {
        let key = key.as_ref();
        self.guard(|b| b.add_key_inner(key))?;
        Ok(self)
    }

    /// Appends a key/value pair to the innermost open object.
    #[inline]
    pub fn add<K: AsRef<str>>(&mut self, key: K, value: Value) -> BuildResult<&mut Self> {
        self.add_key(key)?;
        self.add_value(value)
    }

    /// Opens an array. With `indexed` set, the closed array carries an
    /// offset table for O(1) member access.
    #[inline]
    pub fn open_array(&mut self, indexed: bool) -> BuildResult<&mut Self> {
        self.guard(|b| b.open_container(false, indexed, false))?;
        Ok(self)
    }

    /// Opens an object. With `sorted` set (only meaningful together with
    /// `indexed`), the offset table of the closed object is ordered by
    /// byte-wise key comparison and lookups use binary search.
    #[inline]
    pub fn open_object(&mut self, indexed: bool, sorted: bool) -> BuildResult<&mut Self> {
        self.guard(|b| b.open_container(true, indexed, sorted && indexed))?;
        Ok(self)
    }

    /// Closes the innermost open container, backpatching its header and
    /// appending its offset table.
    #[inline]
    pub fn close(&mut self) -> BuildResult<&mut Self> {
        self.guard(Builder::close_inner)?;
        Ok(self)
    }

    /// Returns a slice over the finished buffer.
    #[inline]
    pub fn slice(&self) -> BuildResult<Slice> {
        self.check_finished()?;
        Ok(Slice::new_trusted(&self.bytes))
    }

    /// Consumes the builder, returning the finished buffer.
    #[inline]
    pub fn finish(self) -> BuildResult<BpackBuf> {
        self.check_finished()?;
        Ok(unsafe { BpackBuf::new_unchecked(self.bytes) })
    }

    #[inline]
    fn check_finished(&self) -> BuildResult<()> {
        if self.poisoned {
            return Err(BuildError::Poisoned);
        }
        if !self.stack.is_empty() {
            return Err(BuildError::UnclosedContainer);
        }
        if !self.sealed {
            return Err(BuildError::EmptyBuilder);
        }
        Ok(())
    }

    /// Runs a mutation, poisoning the builder if it fails.
    #[inline]
    fn guard<F: FnOnce(&mut Self) -> BuildResult<()>>(&mut self, f: F) -> BuildResult<()> {
        if self.poisoned {
            return Err(BuildError::Poisoned);
        }
        f(self).map_err(|e| {
            self.poisoned = true;
            e
        })
    }
}

impl Default for Builder {
    #[inline]
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    /// Checks that a member may start here and records its offset.
    #[inline]
    fn begin_member(&mut self) -> BuildResult<()> {
        match self.stack.last_mut() {
            Some(ctx) => {
                if ctx.object {
                    if !ctx.awaiting_value {
                        return Err(BuildError::KeyExpected);
                    }
                    ctx.awaiting_value = false;
                } else {
                    let pos = self.bytes.len();
                    ctx.offsets.push(pos);
                }
            }
            None => {
                if self.sealed {
                    return Err(BuildError::MultipleTopLevelValues);
                }
            }
        }
        Ok(())
    }

    #[inline]
    fn add_value_inner(&mut self, value: Value) -> BuildResult<()> {
        if let Value::Double(v) = value {
            if !v.is_finite() {
                return Err(BuildError::NonFiniteDouble);
            }
        }
        self.begin_member()?;
        self.write_value(value)?;
        if self.stack.is_empty() {
            self.sealed = true;
        }
        Ok(())
    }

    #[inline]
    fn add_key_inner(&mut self, key: &str) -> BuildResult<()> {
        match self.stack.last() {
            Some(ctx) if ctx.object => {
                if ctx.awaiting_value {
                    return Err(BuildError::ValueExpected);
                }
                if self.options.check_attribute_uniqueness {
                    for &offset in &ctx.offsets {
                        if key_bytes_at(&self.bytes, offset) == key.as_bytes() {
                            return Err(BuildError::DuplicateKey(key.to_string()));
                        }
                    }
                }
            }
            Some(_) | None => return Err(BuildError::KeyOutsideObject),
        }

        let size = if key.len() <= MAX_SHORT_STRING {
            MARKER_SIZE + key.len()
        } else {
            MARKER_SIZE + WORD_SIZE + key.len()
        };
        self.bytes.try_reserve(size)?;

        let pos = self.bytes.len();
        self.bytes.push_string_value(key);

        if let Some(ctx) = self.stack.last_mut() {
            ctx.offsets.push(pos);
            ctx.awaiting_value = true;
        }
        Ok(())
    }

    #[inline]
    fn open_container(&mut self, object: bool, indexed: bool, sorted: bool) -> BuildResult<()> {
        if self.stack.len() >= self.options.max_nesting_depth {
            return Err(BuildError::NestedTooDeeply);
        }
        self.begin_member()?;

        let reserved = container_header_size(MAX_HEAD_WIDTH, indexed);
        self.bytes.try_reserve(reserved)?;
        let start = self.bytes.len();
        self.bytes.resize(start + reserved, 0);

        self.stack.push(OpenContainer {
            start,
            object,
            indexed,
            sorted,
            offsets: Vec::new(),
            awaiting_value: false,
        });
        Ok(())
    }

    fn close_inner(&mut self) -> BuildResult<()> {
        let mut ctx = match self.stack.pop() {
            Some(ctx) => ctx,
            None => return Err(BuildError::UnmatchedClose),
        };
        if ctx.awaiting_value {
            return Err(BuildError::MissingValue);
        }

        let count = ctx.offsets.len();
        if count == 0 {
            self.bytes.truncate(ctx.start);
            self.bytes.push_marker(if ctx.object { MARKER_EMPTY_OBJECT } else { MARKER_EMPTY_ARRAY });
        } else {
            if ctx.sorted && count > 1 {
                self.sort_object_members(&mut ctx)?;
            }
            self.patch_header(&mut ctx)?;
        }

        if self.stack.is_empty() {
            self.sealed = true;
        }
        Ok(())
    }

    /// Reorders the key/value pairs of a sorted object into byte-wise key
    /// order so that the offset table is simultaneously key-ordered and
    /// strictly increasing. Stable: equal keys keep insertion order.
    fn sort_object_members(&mut self, ctx: &mut OpenContainer) -> BuildResult<()> {
        let count = ctx.offsets.len();
        let members_start = ctx.start + ctx.reserved_header();
        let end = self.bytes.len();

        let bytes = &self.bytes[..];
        let mut order: Vec<usize> = (0..count).collect();
        order.sort_by(|&a, &b| key_bytes_at(bytes, ctx.offsets[a]).cmp(key_bytes_at(bytes, ctx.offsets[b])));

        if order.iter().enumerate().all(|(i, &m)| i == m) {
            return Ok(());
        }

        let mut tmp = <Vec<u8> as VecExt>::try_with_capacity(end - members_start)?;
        let mut new_offsets = Vec::with_capacity(count);
        for &member in &order {
            let from = ctx.offsets[member];
            let to = if member + 1 < count { ctx.offsets[member + 1] } else { end };
            new_offsets.push(members_start + tmp.len());
            tmp.extend_from_slice(&self.bytes[from..to]);
        }
        self.bytes[members_start..end].copy_from_slice(&tmp);
        ctx.offsets = new_offsets;
        Ok(())
    }

    /// Picks the minimal head width, shifts members left over the unused
    /// placeholder bytes and writes the final header and offset table.
    fn patch_header(&mut self, ctx: &mut OpenContainer) -> BuildResult<()> {
        let count = ctx.offsets.len();
        let reserved = ctx.reserved_header();
        let members_len = self.bytes.len() - ctx.start - reserved;

        let mut width = MAX_HEAD_WIDTH;
        for w in [1usize, 2, 4, 8] {
            let table = if ctx.indexed { count * w } else { 0 };
            let total = (container_header_size(w, ctx.indexed) + members_len + table) as u64;
            if total <= max_length_for_width(w) {
                width = w;
                break;
            }
        }

        let header = container_header_size(width, ctx.indexed);
        let shift = reserved - header;
        if shift > 0 {
            let members_start = ctx.start + reserved;
            self.bytes.copy_within(members_start.., members_start - shift);
            let len = self.bytes.len() - shift;
            self.bytes.truncate(len);
            for offset in &mut ctx.offsets {
                *offset -= shift;
            }
        }

        let table = if ctx.indexed { count * width } else { 0 };
        let total = (self.bytes.len() - ctx.start + table) as u64;
        let width_index = width.trailing_zeros() as u8;
        let marker = match (ctx.object, ctx.indexed, ctx.sorted) {
            (false, false, _) => MARKER_ARRAY_UNINDEXED + width_index,
            (false, true, _) => MARKER_ARRAY_INDEXED + width_index,
            (true, false, _) => MARKER_OBJECT_UNINDEXED + width_index,
            (true, true, true) => MARKER_OBJECT_SORTED + width_index,
            (true, true, false) => MARKER_OBJECT_UNSORTED + width_index,
        };

        self.bytes[ctx.start] = marker;
        self.bytes.write_uint_at(total, width, ctx.start + MARKER_SIZE);
        if ctx.indexed {
            self.bytes.write_uint_at(count as u64, width, ctx.start + MARKER_SIZE + width);
            self.bytes.try_reserve(table)?;
            for &offset in &ctx.offsets {
                self.bytes.push_uint((offset - ctx.start) as u64, width);
            }
        }
        Ok(())
    }

    fn write_value(&mut self, value: Value) -> BuildResult<()> {
        match value {
            Value::Null => {
                self.bytes.try_reserve(MARKER_SIZE)?;
                self.bytes.push_marker(MARKER_NULL);
            }
            Value::Bool(v) => {
                self.bytes.try_reserve(MARKER_SIZE)?;
                self.bytes.push_marker(if v { MARKER_TRUE } else { MARKER_FALSE });
            }
            Value::Double(v) => {
                self.bytes.try_reserve(MARKER_SIZE + WORD_SIZE)?;
                self.bytes.push_marker(MARKER_DOUBLE);
                self.bytes.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            Value::Int(v) => {
                self.bytes.try_reserve(MARKER_SIZE + WORD_SIZE)?;
                self.bytes.push_int_value(v);
            }
            Value::UInt(v) => {
                self.bytes.try_reserve(MARKER_SIZE + WORD_SIZE)?;
                self.bytes.push_uint_value(v);
            }
            Value::UTCDate(millis) => {
                self.bytes.try_reserve(MARKER_SIZE + WORD_SIZE)?;
                self.bytes.push_marker(MARKER_UTC_DATE);
                self.bytes.extend_from_slice(&millis.to_le_bytes());
            }
            Value::String(s) => {
                self.bytes.try_reserve(MARKER_SIZE + WORD_SIZE + s.len())?;
                self.bytes.push_string_value(s);
            }
            Value::Binary(b) => {
                self.bytes.try_reserve(MARKER_SIZE + WORD_SIZE + b.len())?;
                self.bytes.push_binary_value(b);
            }
            Value::External(ptr) => {
                self.bytes.try_reserve(MARKER_SIZE + WORD_SIZE)?;
                self.bytes.push_marker(MARKER_EXTERNAL);
                self.bytes.extend_from_slice(&(ptr as usize as u64).to_le_bytes());
            }
            Value::Illegal => {
                self.bytes.try_reserve(MARKER_SIZE)?;
                self.bytes.push_marker(MARKER_ILLEGAL);
            }
            Value::MinKey => {
                self.bytes.try_reserve(MARKER_SIZE)?;
                self.bytes.push_marker(MARKER_MIN_KEY);
            }
            Value::MaxKey => {
                self.bytes.try_reserve(MARKER_SIZE)?;
                self.bytes.push_marker(MARKER_MAX_KEY);
            }
        }
        Ok(())
    }
}

/// Reads the bytes of a builder-written key at `pos`.
///
/// Keys are written by `add_key` from `&str`, so the encoding is trusted.
#[inline]
fn key_bytes_at(bytes: &[u8], pos: usize) -> &[u8] {
    let marker = bytes[pos];
    if marker == MARKER_LONG_STRING {
        let len = crate::vec::read_uint(&bytes[pos + MARKER_SIZE..pos + MARKER_SIZE + WORD_SIZE]) as usize;
        let data = pos + MARKER_SIZE + WORD_SIZE;
        &bytes[data..data + len]
    } else {
        debug_assert!((MARKER_SHORT_STRING..MARKER_LONG_STRING).contains(&marker));
        let len = (marker - MARKER_SHORT_STRING) as usize;
        &bytes[pos + MARKER_SIZE..pos + MARKER_SIZE + len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors_poison() {
        let mut builder = Builder::new();
        builder.open_object(true, true).unwrap();
        assert!(matches!(builder.add_value(Value::Int(1)), Err(BuildError::KeyExpected)));
        assert!(matches!(builder.add_key("a"), Err(BuildError::Poisoned)));
        builder.clear();
        builder.open_object(true, true).unwrap();
        builder.add("a", Value::Int(1)).unwrap();
        builder.close().unwrap();
        assert!(builder.is_closed());
    }

    #[test]
    fn test_unmatched_close() {
        let mut builder = Builder::new();
        assert!(matches!(builder.close(), Err(BuildError::UnmatchedClose)));
    }

    #[test]
    fn test_multiple_top_level() {
        let mut builder = Builder::new();
        builder.add_value(Value::Null).unwrap();
        assert!(matches!(
            builder.add_value(Value::Null),
            Err(BuildError::MultipleTopLevelValues)
        ));
    }

    #[test]
    fn test_slice_while_open() {
        let mut builder = Builder::new();
        builder.open_array(true).unwrap();
        assert!(matches!(builder.slice(), Err(BuildError::UnclosedContainer)));
    }

    #[test]
    fn test_non_finite_double() {
        let mut builder = Builder::new();
        assert!(matches!(
            builder.add_value(Value::Double(f64::NAN)),
            Err(BuildError::NonFiniteDouble)
        ));
    }

    #[test]
    fn test_empty_containers_collapse() {
        let mut builder = Builder::new();
        builder.open_array(true).unwrap();
        builder.close().unwrap();
        let buf = builder.finish().unwrap();
        assert_eq!(buf.as_bytes(), &[MARKER_EMPTY_ARRAY]);

        let mut builder = Builder::new();
        builder.open_object(true, true).unwrap();
        builder.close().unwrap();
        let buf = builder.finish().unwrap();
        assert_eq!(buf.as_bytes(), &[MARKER_EMPTY_OBJECT]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut builder = Builder::new();
        builder.open_object(true, true).unwrap();
        builder.add("a", Value::Int(1)).unwrap();
        assert!(matches!(builder.add_key("a"), Err(BuildError::DuplicateKey(_))));
    }

    #[test]
    fn test_duplicate_key_retained_without_policy() {
        let mut options = Options::new();
        options.check_attribute_uniqueness = false;
        let mut builder = Builder::with_options(options);
        builder.open_object(true, true).unwrap();
        builder.add("a", Value::Int(1)).unwrap();
        builder.add("a", Value::Int(2)).unwrap();
        builder.close().unwrap();
        let buf = builder.finish().unwrap();
        let object = buf.as_slice().object().unwrap();
        assert_eq!(object.len().unwrap(), 2);
        // keep-both, lookup returns the first occurrence
        assert_eq!(object.get("a").unwrap().unwrap().as_int().unwrap(), 1);
    }

    #[test]
    fn test_depth_guard() {
        let mut options = Options::new();
        options.max_nesting_depth = 4;
        let mut builder = Builder::with_options(options);
        for _ in 0..4 {
            builder.open_array(false).unwrap();
        }
        assert!(matches!(builder.open_array(false), Err(BuildError::NestedTooDeeply)));
    }

    #[test]
    fn test_clear_reuses_buffer() {
        let mut builder = Builder::new();
        builder.open_array(true).unwrap();
        builder.add_value(Value::Int(42)).unwrap();
        builder.close().unwrap();
        let first = builder.slice().unwrap().value_bytes().unwrap().to_vec();

        builder.clear();
        builder.open_array(true).unwrap();
        builder.add_value(Value::Int(42)).unwrap();
        builder.close().unwrap();
        let second = builder.slice().unwrap().value_bytes().unwrap().to_vec();
        assert_eq!(first, second);
    }
}
