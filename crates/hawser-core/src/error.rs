//! Error types for the hawser-core library.
//!
//! This module provides error handling using the `thiserror` crate. The
//! registry itself is infallible by design; the variants here cover the
//! caller-precondition violations it can detect at its boundary.

use thiserror::Error;

/// Result type alias for hawser operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for handle tracking operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A raw value of zero was offered where a handle is required
    #[error("null handle: zero is not a valid native handle")]
    NullHandle,

    /// The handle is already tracked in the current cycle
    #[error("handle {handle:#x} is already tracked")]
    AlreadyTracked {
        /// Raw value of the offending handle
        handle: usize,
    },
}

impl Error {
    /// Creates a new already-tracked error
    pub fn already_tracked(handle: usize) -> Self {
        Self::AlreadyTracked { handle }
    }
}
