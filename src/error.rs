//! Error types for gapcell.
//!
//! Rejected edits (read-only buffer, range past the end) are not errors: the
//! mutation entry points report them through their return value. Only
//! allocation failures travel through [`Error`].

use std::collections::TryReserveError;
use std::fmt;

/// Result type alias for gapcell operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gapcell operations.
#[derive(Clone, Debug)]
pub enum Error {
    /// Growing a buffer by `requested` elements could not be satisfied.
    OutOfMemory {
        requested: usize,
        cause: TryReserveError,
    },
    /// A requested size does not fit in `usize`.
    CapacityOverflow { requested: usize, current: usize },
}

impl Error {
    pub(crate) fn out_of_memory(requested: usize, cause: TryReserveError) -> Self {
        Self::OutOfMemory { requested, cause }
    }

    pub(crate) fn capacity_overflow(requested: usize, current: usize) -> Self {
        Self::CapacityOverflow { requested, current }
    }

    /// True for failures caused by memory exhaustion rather than bad sizes.
    #[must_use]
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested, cause } => {
                write!(f, "out of memory growing by {requested} elements: {cause}")
            }
            Self::CapacityOverflow { requested, current } => {
                write!(
                    f,
                    "capacity overflow: cannot add {requested} elements to {current}"
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::OutOfMemory { cause, .. } => Some(cause),
            Self::CapacityOverflow { .. } => None,
        }
    }
}
