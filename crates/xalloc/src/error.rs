//! Errors surfaced by the fallible (`try_`) operations.
//!
//! Only resource exhaustion is ever returned to a caller. Header corruption
//! is fatal in every call form and never shows up here.

use std::error::Error;
use std::fmt;

/// The system allocator could not satisfy a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The underlying allocator returned no memory.
    OutOfMemory {
        /// Usable bytes the caller asked for.
        requested: usize,
    },
    /// `requested` plus the block header does not fit in `usize`.
    SizeOverflow {
        /// Usable bytes the caller asked for.
        requested: usize,
    },
}

impl AllocError {
    /// Usable size of the request that failed.
    pub fn requested(&self) -> usize {
        match *self {
            Self::OutOfMemory { requested } | Self::SizeOverflow { requested } => requested,
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory allocating {requested} bytes")
            }
            Self::SizeOverflow { requested } => {
                write!(f, "allocation size {requested} overflows with block header")
            }
        }
    }
}

impl Error for AllocError {}
