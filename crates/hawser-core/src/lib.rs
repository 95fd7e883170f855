//! # hawser-core
//!
//! A library for tracking natively allocated resource handles and releasing
//! them in bulk.
//!
//! Bridge layers between a managed runtime and a native library allocate
//! resources on behalf of objects whose lifetime they do not control. This
//! crate gives such a layer one place to record every allocation and one
//! call to free them all:
//!
//! - [`HandleRegistry`] keeps opaque [`Handle`]s in insertion order and
//!   releases each exactly once on [`release_all`](HandleRegistry::release_all)
//! - [`Releaser`] is the seam through which the native deallocation call is
//!   plugged in
//! - [`Context`] scopes a registry's contents to a lexical lifetime, so
//!   release happens deterministically instead of at the mercy of a garbage
//!   collector
//!
//! ## Example
//!
//! ```
//! use hawser_core::{Handle, HandleRegistry, RecordingReleaser};
//!
//! let mut registry = HandleRegistry::new(RecordingReleaser::new());
//!
//! registry.track(Handle::from_raw(0x7f00).unwrap());
//! registry.track(Handle::from_raw(0x7f08).unwrap());
//! assert_eq!(registry.tracked(), 2);
//!
//! registry.release_all();
//! assert_eq!(registry.releaser().release_count(), 2);
//! assert!(registry.is_empty());
//! ```
//!
//! ## Concurrency
//!
//! The registry carries no internal synchronization. `track` and
//! `release_all` take `&mut self`, so a single owner serializes all
//! lifecycle calls; embedders that share a registry across threads must
//! supply their own mutual exclusion.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod context;
pub mod error;
pub mod registry;

// Re-export primary types for convenience
pub use context::Context;
pub use error::{Error, Result};
pub use registry::{
    Handle, HandleRegistry, NullReleaser, RecordingReleaser, RegistryConfig, Releaser,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backing-storage size reserved by a registry's first `track` call
pub const DEFAULT_INITIAL_CAPACITY: usize = 128;
