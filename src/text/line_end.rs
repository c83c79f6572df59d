//! Line end recognition.
//!
//! LF, CR and CR LF always end a line. With [`LineEndTypes::UNICODE`] the
//! UTF-8 encodings of NEL (U+0085, `C2 85`), LS (U+2028, `E2 80 A8`) and
//! PS (U+2029, `E2 80 A9`) end lines too.

use bitflags::bitflags;

bitflags! {
    /// Line ends recognised in addition to LF, CR and CR LF.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct LineEndTypes: u8 {
        /// NEL, LS and PS encoded as UTF-8.
        const UNICODE = 0x01;
    }
}

impl LineEndTypes {
    /// Only LF, CR and CR LF.
    pub const DEFAULT: Self = Self::empty();
}

/// Length of the LS and PS encodings.
pub const UTF8_SEPARATOR_LENGTH: usize = 3;
/// Length of the NEL encoding.
pub const UTF8_NEL_LENGTH: usize = 2;

/// `bytes` starts with LS or PS.
#[must_use]
pub fn utf8_is_separator(bytes: &[u8]) -> bool {
    matches!(bytes, [0xE2, 0x80, 0xA8 | 0xA9, ..])
}

/// `bytes` starts with NEL.
#[must_use]
pub fn utf8_is_nel(bytes: &[u8]) -> bool {
    matches!(bytes, [0xC2, 0x85, ..])
}

/// A multi-byte line end finishes at the last of these three bytes.
#[must_use]
pub fn utf8_is_multibyte_line_end(back3: [u8; 3]) -> bool {
    utf8_is_separator(&back3) || utf8_is_nel(&back3[1..])
}

#[must_use]
pub fn utf8_is_trail_byte(ch: u8) -> bool {
    (0x80..0xC0).contains(&ch)
}

/// Bytes that can end a line, used to size reservations before an insert.
#[must_use]
pub fn count_line_end_bytes(text: &[u8], types: LineEndTypes) -> usize {
    let unicode = types.contains(LineEndTypes::UNICODE);
    text.iter()
        .filter(|&&b| b == b'\r' || b == b'\n' || (unicode && matches!(b, 0x85 | 0xA8 | 0xA9)))
        .count()
}
