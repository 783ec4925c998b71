//! Hex dumps for diagnostics.

use crate::Slice;
use std::fmt;
use std::fmt::Display;

/// Lazy hex rendering of a byte buffer, 16 bytes per line with an offset
/// column. Formatting runs when the value is displayed.
///
/// ```
/// use bpack::HexDump;
///
/// let dump = HexDump::new(&[0x0b, 0x0f, 0x01, 0x41, 0x61, 0x31, 0x03]).to_string();
/// assert!(dump.starts_with("0x0000:"));
/// ```
pub struct HexDump<'a> {
    bytes: &'a [u8],
}

impl<'a> HexDump<'a> {
    #[inline]
    pub const fn new(bytes: &'a [u8]) -> Self {
        HexDump { bytes }
    }
}

impl Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (line, chunk) in self.bytes.chunks(16).enumerate() {
            if line > 0 {
                writeln!(f)?;
            }
            write!(f, "0x{:04x}:", line * 16)?;
            for byte in chunk {
                write!(f, " {:02x}", byte)?;
            }
        }
        Ok(())
    }
}

impl<'a> Slice<'a> {
    /// Hex dump of this value's exact byte range. A malformed header falls
    /// back to dumping everything the slice can see.
    #[inline]
    pub fn hex_dump(&self) -> HexDump<'a> {
        match self.value_bytes() {
            Ok(bytes) => HexDump::new(bytes),
            Err(_) => HexDump::new(self.all_bytes()),
        }
    }
}
