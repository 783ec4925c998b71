//! A compact, self-describing, typed binary encoding for JSON-like data.
//!
//! Values are encoded into a contiguous byte range whose first byte (the
//! *marker*) determines the type and the layout of everything that follows.
//! A [`Builder`] produces such encodings incrementally, a [`Slice`] gives
//! zero-copy random access to an encoded byte range, and a [`Validator`]
//! checks untrusted buffers before they are trusted.
//!
//! ## Optional features
//!
//! ### `serde`
//!
//! When this optional dependency is enabled, [`BpackBuf`] implements the
//! `serde::Serialize` and `serde::Deserialize` traits.
//!
//! ## Binary format
//!
//! All multi-byte integers are little-endian. `W` below is the *head width*
//! of a container (1, 2, 4 or 8 bytes), encoded in the marker.
//!
//! ```text
//! 0x00        : illegal (reserved)
//! 0x01        : empty array, total size 1
//! 0x02..=0x05 : unindexed array, W = 1/2/4/8:
//!               marker, byte-length (W), members back-to-back
//! 0x06..=0x09 : indexed array, W = 1/2/4/8:
//!               marker, byte-length (W), member count (W), members,
//!               offset table (count entries of W bytes, offsets relative
//!               to the marker byte, strictly increasing)
//! 0x0a        : empty object, total size 1
//! 0x0b..=0x0e : sorted indexed object, W = 1/2/4/8:
//!               marker, byte-length (W), count (W), key/value pairs in
//!               byte-wise key order, offset table (one entry per pair,
//!               pointing at the key)
//! 0x0f..=0x12 : unsorted indexed object, same layout, pairs and table in
//!               insertion order
//! 0x13..=0x16 : unindexed object, W = 1/2/4/8:
//!               marker, byte-length (W), key/value pairs back-to-back
//! 0x17        : illegal
//! 0x18        : null
//! 0x19        : false
//! 0x1a        : true
//! 0x1b        : double, 8-byte IEEE 754 binary64
//! 0x1c        : UTC date, 8-byte signed milliseconds since the Unix epoch
//! 0x1d        : external, 8-byte in-process pointer to another encoding
//! 0x1e        : min key sentinel
//! 0x1f        : max key sentinel
//! 0x20..=0x27 : signed int, 1-8 payload bytes, two's complement
//! 0x28..=0x2f : unsigned int, 1-8 payload bytes
//! 0x30..=0x39 : small int 0..=9, embedded in the marker
//! 0x3a..=0x3f : small int -6..=-1, value = marker - 0x40
//! 0x40..=0xbe : short string, UTF-8, length = marker - 0x40
//! 0xbf        : long string, 8-byte length then UTF-8 bytes
//! 0xc0..=0xc7 : binary, length field of 1-8 bytes then raw bytes
//! 0xc8..=0xef : illegal (reserved)
//! 0xf0..=0xf3 : custom, fixed payload of 1/2/4/8 bytes
//! 0xf4..=0xff : illegal (reserved)
//! ```
//!
//! A container's byte-length counts everything from its marker through the
//! end of its offset table, so every encoded value is self-terminating: its
//! total length is recoverable from its own header without looking at
//! siblings. The builder always emits the smallest width that represents a
//! value exactly; the reader accepts any width the table permits.
//!
//! ## Usage
//!
//! ```rust
//! use bpack::{Builder, Value};
//!
//! let mut builder = Builder::new();
//! builder.open_object(true, true).unwrap();
//! builder.add("a", Value::Int(1)).unwrap();
//! builder.add_key("b").unwrap();
//! builder.open_array(true).unwrap();
//! builder.add_value(Value::Bool(true)).unwrap();
//! builder.close().unwrap();
//! builder.close().unwrap();
//!
//! let buf = builder.finish().unwrap();
//! let object = buf.as_slice().object().unwrap();
//! assert_eq!(object.get("a").unwrap().unwrap().as_int().unwrap(), 1);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod binary;
mod builder;
mod dump;
mod hex;
mod json;
mod options;
mod slice;
mod type_tag;
mod validator;
mod value;
mod vec;

#[cfg(feature = "serde")]
mod serde;

pub use self::{
    builder::{BuildError, BuildResult, Builder},
    dump::{CompactFormatter, FormatError, FormatResult, Formatter, LazyFormat, PrettyFormatter},
    hex::HexDump,
    options::Options,
    slice::{ArrayIter, ArraySlice, BpackBuf, KeyIter, ObjectIter, ObjectSlice, Slice, SliceError, SliceResult, ValueIter},
    type_tag::TypeTag,
    validator::{ValidateError, ValidateErrorKind, Validator},
    value::Value,
};
