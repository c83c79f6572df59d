//! Cell buffer configuration.

use crate::text::LineEndTypes;

/// Cell buffer configuration options.
///
/// These options are read once when creating a [`CellBuffer`](crate::CellBuffer);
/// line end types and undo collection can be changed later on the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellBufferOptions {
    /// Keep a style byte per text byte. When off, every style reads as 0.
    pub has_styles: bool,
    /// Line ends recognised beyond LF, CR and CR LF.
    pub line_end_types: LineEndTypes,
    /// Record edits in the undo history.
    pub collect_undo: bool,
    /// Bytes to allocate up front for the text.
    pub initial_capacity: usize,
}

impl Default for CellBufferOptions {
    fn default() -> Self {
        Self {
            has_styles: true,
            line_end_types: LineEndTypes::DEFAULT,
            collect_undo: true,
            initial_capacity: 0,
        }
    }
}

impl CellBufferOptions {
    /// Options for a document with no style bytes.
    #[must_use]
    pub fn without_styles() -> Self {
        Self {
            has_styles: false,
            ..Self::default()
        }
    }
}
