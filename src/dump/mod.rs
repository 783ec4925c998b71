//! JSON rendering of encoded values.
//!
//! Formatting assumes the buffer behind the slice is trusted; run a
//! [`Validator`](crate::Validator) over untrusted bytes first.

use crate::slice::{ObjectSlice, SliceError};
use crate::{Options, Slice, TypeTag};
pub use pretty::PrettyFormatter;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

mod pretty;

/// Possible errors that can arise during formatting.
#[derive(Debug)]
pub enum FormatError {
    FmtError(fmt::Error),
    SliceError(SliceError),
    /// The value has no JSON representation under the active options.
    Unrepresentable(TypeTag),
}

impl Display for FormatError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::FmtError(e) => write!(f, "{}", e),
            FormatError::SliceError(e) => write!(f, "{}", e),
            FormatError::Unrepresentable(tag) => write!(f, "value of type {} has no json representation", tag),
        }
    }
}

impl Error for FormatError {}

pub type FormatResult<T> = std::result::Result<T, FormatError>;

impl From<fmt::Error> for FormatError {
    #[inline]
    fn from(e: fmt::Error) -> Self {
        FormatError::FmtError(e)
    }
}

impl From<SliceError> for FormatError {
    #[inline]
    fn from(e: SliceError) -> Self {
        FormatError::SliceError(e)
    }
}

pub trait Formatter {
    #[inline]
    fn format<W: fmt::Write>(&mut self, slice: Slice, options: &Options, writer: &mut W) -> FormatResult<()> {
        self.write_slice(slice, options, writer)
    }

    #[inline]
    fn write_slice<W: fmt::Write>(&mut self, slice: Slice, options: &Options, writer: &mut W) -> FormatResult<()> {
        match slice.tag() {
            TypeTag::Object => self.write_object(slice.object()?, options, writer),
            TypeTag::Array => self.write_array(slice, options, writer),
            TypeTag::String => self.write_string(slice.as_str()?, writer),
            TypeTag::Double => self.write_double(slice.as_double()?, writer),
            TypeTag::Int | TypeTag::SmallInt => self.write_int(slice.as_int()?, writer),
            TypeTag::UInt => self.write_uint(slice.as_uint()?, writer),
            TypeTag::UTCDate => self.write_utc_date(slice.as_utc_date()?, options, writer),
            TypeTag::Binary => self.write_binary(slice.as_binary()?, options, writer),
            TypeTag::Bool => self.write_bool(slice.as_bool()?, writer),
            TypeTag::Null => self.write_null(writer),
            tag => Err(FormatError::Unrepresentable(tag)),
        }
    }

    #[inline]
    fn write_null<W: fmt::Write>(&mut self, writer: &mut W) -> FormatResult<()> {
        writer.write_bytes(b"null")?;
        Ok(())
    }

    #[inline]
    fn write_bool<W: fmt::Write>(&mut self, value: bool, writer: &mut W) -> FormatResult<()> {
        let s = if value { "true" } else { "false" };
        writer.write_bytes(s.as_bytes())?;
        Ok(())
    }

    #[inline]
    fn write_int<W: fmt::Write>(&mut self, value: i64, writer: &mut W) -> FormatResult<()> {
        write!(writer, "{}", value)?;
        Ok(())
    }

    #[inline]
    fn write_uint<W: fmt::Write>(&mut self, value: u64, writer: &mut W) -> FormatResult<()> {
        write!(writer, "{}", value)?;
        Ok(())
    }

    #[inline]
    fn write_double<W: fmt::Write>(&mut self, value: f64, writer: &mut W) -> FormatResult<()> {
        write!(writer, "{}", value)?;
        Ok(())
    }

    /// Renders a date either as its raw millisecond count or as an ISO 8601
    /// string, per [`Options::dates_as_integers`].
    #[inline]
    fn write_utc_date<W: fmt::Write>(&mut self, millis: i64, options: &Options, writer: &mut W) -> FormatResult<()> {
        if options.dates_as_integers {
            return self.write_int(millis, writer);
        }
        self.begin_string(writer)?;
        format_iso8601(millis, writer)?;
        self.end_string(writer)
    }

    /// Renders binary data as a lowercase hex string when
    /// [`Options::binary_as_hex`] is set, fails otherwise.
    #[inline]
    fn write_binary<W: fmt::Write>(&mut self, data: &[u8], options: &Options, writer: &mut W) -> FormatResult<()> {
        if !options.binary_as_hex {
            return Err(FormatError::Unrepresentable(TypeTag::Binary));
        }
        self.begin_string(writer)?;
        for byte in data {
            write!(writer, "{:02x}", byte)?;
        }
        self.end_string(writer)
    }

    #[inline]
    fn write_string<W: fmt::Write>(&mut self, value: &str, writer: &mut W) -> FormatResult<()> {
        self.begin_string(writer)?;
        format_escaped_str(value, writer)?;
        self.end_string(writer)
    }

    #[inline]
    fn write_object<W: fmt::Write>(
        &mut self,
        object: ObjectSlice,
        options: &Options,
        writer: &mut W,
    ) -> FormatResult<()> {
        self.begin_object(writer)?;

        let mut iter = object.iter();
        if let Some(entry) = iter.next() {
            let (key, value) = entry?;
            self.write_object_value(key, value, true, options, writer)?;
        }
        for entry in iter {
            let (key, value) = entry?;
            self.write_object_value(key, value, false, options, writer)?;
        }

        self.end_object(writer)
    }

    #[inline]
    fn write_object_value<W: fmt::Write>(
        &mut self,
        key: &str,
        value: Slice,
        first: bool,
        options: &Options,
        writer: &mut W,
    ) -> FormatResult<()> {
        self.begin_object_key(first, writer)?;
        self.write_string(key, writer)?;
        self.end_object_key(writer)?;
        self.begin_object_value(writer)?;
        self.write_slice(value, options, writer)?;
        self.end_object_value(writer)
    }

    #[inline]
    fn write_array<W: fmt::Write>(&mut self, slice: Slice, options: &Options, writer: &mut W) -> FormatResult<()> {
        self.begin_array(writer)?;

        let array = slice.array()?;
        let mut iter = array.iter();
        if let Some(member) = iter.next() {
            self.write_array_value(member?, true, options, writer)?;
        }
        for member in iter {
            self.write_array_value(member?, false, options, writer)?;
        }

        self.end_array(writer)
    }

    #[inline]
    fn write_array_value<W: fmt::Write>(
        &mut self,
        value: Slice,
        first: bool,
        options: &Options,
        writer: &mut W,
    ) -> FormatResult<()> {
        self.begin_array_value(first, writer)?;
        self.write_slice(value, options, writer)?;
        self.end_array_value(writer)
    }

    #[inline]
    fn begin_string<W: fmt::Write>(&mut self, writer: &mut W) -> FormatResult<()> {
        writer.write_bytes(b"\"")?;
        Ok(())
    }

    #[inline]
    fn end_string<W: fmt::Write>(&mut self, writer: &mut W) -> FormatResult<()> {
        writer.write_bytes(b"\"")?;
        Ok(())
    }

    #[inline]
    fn begin_array<W: fmt::Write>(&mut self, writer: &mut W) -> FormatResult<()> {
        writer.write_bytes(b"[")?;
        Ok(())
    }

    #[inline]
    fn end_array<W: fmt::Write>(&mut self, writer: &mut W) -> FormatResult<()> {
        writer.write_bytes(b"]")?;
        Ok(())
    }

    #[inline]
    fn begin_array_value<W: fmt::Write>(&mut self, first: bool, writer: &mut W) -> FormatResult<()> {
        if !first {
            writer.write_bytes(b",")?;
        }
        Ok(())
    }

    #[inline]
    fn end_array_value<W: fmt::Write>(&mut self, _writer: &mut W) -> FormatResult<()> {
        Ok(())
    }

    #[inline]
    fn begin_object<W: fmt::Write>(&mut self, writer: &mut W) -> FormatResult<()> {
        writer.write_bytes(b"{")?;
        Ok(())
    }

    #[inline]
    fn end_object<W: fmt::Write>(&mut self, writer: &mut W) -> FormatResult<()> {
        writer.write_bytes(b"}")?;
        Ok(())
    }

    #[inline]
    fn begin_object_key<W: fmt::Write>(&mut self, first: bool, writer: &mut W) -> FormatResult<()> {
        if !first {
            writer.write_bytes(b",")?;
        }
        Ok(())
    }

    #[inline]
    fn end_object_key<W: fmt::Write>(&mut self, _writer: &mut W) -> FormatResult<()> {
        Ok(())
    }

    #[inline]
    fn begin_object_value<W: fmt::Write>(&mut self, writer: &mut W) -> FormatResult<()> {
        writer.write_bytes(b":")?;
        Ok(())
    }

    #[inline]
    fn end_object_value<W: fmt::Write>(&mut self, _writer: &mut W) -> FormatResult<()> {
        Ok(())
    }
}

pub struct CompactFormatter;

impl CompactFormatter {
    #[inline]
    pub(crate) const fn new() -> Self {
        Self
    }
}

impl Formatter for CompactFormatter {}

/// Deferred rendering; formatting runs when the value is displayed.
pub struct LazyFormat<'a> {
    slice: Slice<'a>,
    options: Options,
    pretty: bool,
}

impl<'a> LazyFormat<'a> {
    #[inline]
    pub const fn new(slice: Slice<'a>, options: Options, pretty: bool) -> Self {
        Self { slice, options, pretty }
    }
}

impl fmt::Display for LazyFormat<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pretty {
            let mut fmt = PrettyFormatter::new();
            fmt.format(self.slice, &self.options, f).map_err(|_| fmt::Error)
        } else {
            let mut fmt = CompactFormatter::new();
            fmt.format(self.slice, &self.options, f).map_err(|_| fmt::Error)
        }
    }
}

impl<'a> Slice<'a> {
    /// Renders this value as compact JSON with default options.
    #[inline]
    pub fn format(&self) -> LazyFormat<'a> {
        LazyFormat::new(*self, Options::new(), false)
    }

    /// Renders this value as indented JSON with default options.
    #[inline]
    pub fn format_pretty(&self) -> LazyFormat<'a> {
        LazyFormat::new(*self, Options::new(), true)
    }

    /// Renders this value as JSON under explicit policies.
    #[inline]
    pub fn format_with(&self, options: Options, pretty: bool) -> LazyFormat<'a> {
        LazyFormat::new(*self, options, pretty)
    }

    /// Renders this value into a compact JSON string.
    #[inline]
    pub fn to_json(&self) -> FormatResult<String> {
        let mut out = String::new();
        CompactFormatter::new().format(*self, &Options::new(), &mut out)?;
        Ok(out)
    }
}

const BB: &[u8] = b"\\b"; // \x08
const TT: &[u8] = b"\\t"; // \x09
const NN: &[u8] = b"\\n"; // \x0A
const FF: &[u8] = b"\\f"; // \x0C
const RR: &[u8] = b"\\r"; // \x0D
const QU: &[u8] = b"\\\""; // \x22
const BS: &[u8] = b"\\\\"; // \x5C
const __: &[u8] = b"";

// Lookup table of two-character escape sequences. A value of b"" means the
// byte either needs no escaping or, below 0x20, the generic \u00XX form.
static ESCAPE: [&[u8]; 256] = [
    //   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
    __, __, __, __, __, __, __, __, BB, TT, NN, __, FF, RR, __, __, // 0
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 1
    __, __, QU, __, __, __, __, __, __, __, __, __, __, __, __, __, // 2
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 3
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 4
    __, __, __, __, __, __, __, __, __, __, __, __, BS, __, __, __, // 5
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 6
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 7
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 8
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 9
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // A
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // B
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // C
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // D
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // E
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // F
];

#[inline]
fn format_escaped_str<W: fmt::Write>(value: &str, writer: &mut W) -> FormatResult<()> {
    let bytes = value.as_bytes();

    let mut start = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let escape = ESCAPE[byte as usize];
        if escape == __ && byte >= 0x20 {
            continue;
        }

        if start < i {
            writer.write_bytes(&bytes[start..i])?;
        }
        if escape == __ {
            write!(writer, "\\u{:04x}", byte)?;
        } else {
            writer.write_bytes(escape)?;
        }
        start = i + 1;
    }

    if start != bytes.len() {
        writer.write_bytes(&bytes[start..])?;
    }

    Ok(())
}

/// Writes `millis` since the Unix epoch as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[inline]
fn format_iso8601<W: fmt::Write>(millis: i64, writer: &mut W) -> FormatResult<()> {
    let days = millis.div_euclid(86_400_000);
    let in_day = millis.rem_euclid(86_400_000);

    let (year, month, day) = civil_from_days(days);
    let (hour, minute) = (in_day / 3_600_000, in_day % 3_600_000 / 60_000);
    let (second, milli) = (in_day % 60_000 / 1000, in_day % 1000);

    write!(
        writer,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year, month, day, hour, minute, second, milli
    )?;
    Ok(())
}

/// Proleptic Gregorian date from days since the Unix epoch
/// (Howard Hinnant's civil_from_days).
#[inline]
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

trait WriteExt: fmt::Write {
    #[inline(always)]
    fn write_bytes(&mut self, bytes: &[u8]) -> fmt::Result {
        let s = unsafe { std::str::from_utf8_unchecked(bytes) };
        self.write_str(s)
    }
}

impl<W: fmt::Write> WriteExt for W {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_civil_from_days() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
    }

    #[test]
    fn test_iso8601() {
        let mut out = String::new();
        format_iso8601(0, &mut out).unwrap();
        assert_eq!(out, "1970-01-01T00:00:00.000Z");

        let mut out = String::new();
        format_iso8601(1_000_000_000_000, &mut out).unwrap();
        assert_eq!(out, "2001-09-09T01:46:40.000Z");
    }

    #[test]
    fn test_escaped_str() {
        let mut out = String::new();
        format_escaped_str("a\"b\\c\nd\u{1}", &mut out).unwrap();
        assert_eq!(out, "a\\\"b\\\\c\\nd\\u0001");
    }
}
