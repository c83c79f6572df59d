//! Text storage with styles, line tracking and undo.
//!
//! Key types:
//!
//! - [`CellBuffer`]: document bytes, style bytes, line index and undo history
//! - [`LineEndTypes`]: which line ends split lines
//!
//! # Examples
//!
//! ## Editing with undo
//!
//! ```
//! use gapcell::CellBuffer;
//!
//! let mut buffer = CellBuffer::new();
//! // Typing one byte at a time joins one undo step.
//! for (i, ch) in b"abc".iter().enumerate() {
//!     buffer.insert_string(i, &[*ch]).unwrap();
//! }
//! assert_eq!(buffer.undo().unwrap(), 3);
//! assert_eq!(buffer.length(), 0);
//!
//! buffer.redo().unwrap();
//! assert_eq!(buffer.text(), b"abc");
//! ```
//!
//! ## Unicode line ends
//!
//! ```
//! use gapcell::{CellBuffer, CellBufferOptions, LineEndTypes};
//!
//! let options = CellBufferOptions {
//!     line_end_types: LineEndTypes::UNICODE,
//!     ..CellBufferOptions::default()
//! };
//! let mut buffer = CellBuffer::with_options(options).unwrap();
//! buffer.insert_string(0, "one\u{2028}two".as_bytes()).unwrap();
//! assert_eq!(buffer.lines(), 2);
//! ```

mod buffer;
mod line_end;

pub use buffer::CellBuffer;
pub use line_end::{
    LineEndTypes, UTF8_NEL_LENGTH, UTF8_SEPARATOR_LENGTH, count_line_end_bytes,
    utf8_is_multibyte_line_end, utf8_is_nel, utf8_is_separator, utf8_is_trail_byte,
};
