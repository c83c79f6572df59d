//! `gapcell` - Text storage engine for source editors
//!
//! Holds document bytes and per-byte styles in gap buffers, tracks line
//! starts with a lazily shifted partition index, stores sparse values as
//! runs, and records edits in a compact, coalescing undo history.
//!
//! The main entry point is [`CellBuffer`]. The building blocks are public
//! too: [`GapBuffer`], [`Partitioning`], [`RunStyles`], [`LineVector`] and
//! [`UndoHistory`].
//!
//! Everything here is single-threaded: one buffer belongs to one document
//! and is driven by one caller.

// Crate-level lint configuration
#![allow(clippy::cast_possible_truncation)] // Byte values and scaled widths are range checked
#![allow(clippy::cast_sign_loss)] // Partition offsets are signed internally
#![allow(clippy::cast_possible_wrap)] // Document lengths fit in isize
#![allow(clippy::module_name_repetitions)] // Allow lines::LineVector etc
#![allow(clippy::missing_errors_doc)] // Every error is an allocation failure
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests

pub mod error;
pub mod event;
pub mod gap;
pub mod lines;
pub mod options;
pub mod partition;
pub mod runs;
pub mod text;
pub mod undo;

// Re-export core types at crate root
pub use error::{Error, Result};
pub use event::{LogLevel, clear_log_callback, emit_log, set_log_callback};
pub use gap::GapBuffer;
pub use lines::{LineLevels, LineMarkers, LineState, LineVector, PerLine, PerLineRef};
pub use options::CellBufferOptions;
pub use partition::Partitioning;
pub use runs::RunStyles;
pub use text::{CellBuffer, LineEndTypes};
pub use undo::{Action, ActionType, ScaledVector, ScrapStack, UndoHistory};
