//! Run-terminating error kinds.

use std::io;

use thiserror::Error;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a program from running to completion.
///
/// None of these are recoverable within a run: they are detected where
/// they occur and handed straight back to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The source text contained no instruction symbols.
    #[error("File content is not BF code.")]
    NoCodeFound,

    #[error("Tape not initialized.")]
    TapeNotInitialized,

    #[error("Memory not initialized.")]
    MemNotInitialized,

    /// A data pointer move would leave the cell array.
    #[error("Memory overflow.")]
    MemOverflow { pointer: usize, size: usize },

    /// A `]` with no `[` before it.
    #[error("No matching loop start.")]
    NoMatchingLoopStart { position: usize },

    /// Reserved for a forward `[` scan, which the engine does not perform.
    #[error("No matching loop end.")]
    NoMatchingLoopEnd { position: usize },

    /// The byte input or output collaborator failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Numeric status for this error, stable across releases.
    pub fn code(&self) -> u8 {
        match self {
            Error::MemOverflow { .. } => 1,
            Error::TapeNotInitialized => 2,
            Error::MemNotInitialized => 3,
            Error::NoMatchingLoopStart { .. } => 4,
            Error::NoMatchingLoopEnd { .. } => 5,
            Error::Io(_) => 105,
            Error::NoCodeFound => 200,
        }
    }
}
