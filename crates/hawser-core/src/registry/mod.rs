//! Native-handle tracking and bulk release.
//!
//! This module provides an ordered table of opaque native handles that can
//! be released exactly once, in bulk, without each allocation site having
//! to remember an individual free.
//!
//! ## Lifecycle
//!
//! 1. The bridge layer tracks a handle right after every native allocation
//!    it makes on behalf of a managed object
//! 2. At a designated cleanup point it calls
//!    [`HandleRegistry::release_all`], which frees every tracked handle
//! 3. The registry is immediately reusable for the next cycle
//!
//! ## Extensibility
//!
//! The [`Releaser`] trait decouples tracking from the actual deallocation
//! call:
//!
//! ```
//! use hawser_core::{Handle, HandleRegistry, Releaser};
//!
//! struct LoggingReleaser;
//!
//! impl Releaser for LoggingReleaser {
//!     fn release(&mut self, handle: Handle) {
//!         println!("releasing {:#x}", handle.as_raw());
//!     }
//! }
//!
//! let mut registry = HandleRegistry::new(LoggingReleaser);
//! registry.track(Handle::from_raw(0x1000).unwrap());
//! registry.release_all();
//! ```

mod releaser;

use crate::error::{Error, Result};
use crate::DEFAULT_INITIAL_CAPACITY;
use std::num::NonZeroUsize;
use tracing::{debug, trace};

pub use releaser::{NullReleaser, RecordingReleaser, Releaser};

/// An opaque reference to a natively allocated resource.
///
/// A handle is meaningful only to the subsystem that allocated it; the
/// registry never dereferences one. Zero is reserved as the null value and
/// cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(NonZeroUsize);

impl Handle {
    /// Creates a handle from a raw value, returning `None` for zero
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    /// Returns the raw value of this handle
    pub fn as_raw(self) -> usize {
        self.0.get()
    }
}

impl From<NonZeroUsize> for Handle {
    fn from(raw: NonZeroUsize) -> Self {
        Self(raw)
    }
}

impl TryFrom<usize> for Handle {
    type Error = Error;

    fn try_from(raw: usize) -> Result<Self> {
        Self::from_raw(raw).ok_or(Error::NullHandle)
    }
}

/// Configuration for a handle registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Backing-storage size reserved by the first `track` call
    pub initial_capacity: usize,
    /// Scan for duplicates on every `track` call, panicking on a hit
    pub duplicate_check: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            duplicate_check: cfg!(debug_assertions),
        }
    }
}

impl RegistryConfig {
    /// Creates a new registry config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backing-storage size reserved on first use
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets whether `track` scans for duplicate handles
    pub fn duplicate_check(mut self, check: bool) -> Self {
        self.duplicate_check = check;
        self
    }
}

/// Ordered registry of native handles with single-shot bulk release.
///
/// The registry owns the release decision for every handle it tracks: no
/// other component may free a tracked handle directly. Releasing one behind
/// the registry's back and then calling
/// [`release_all`](HandleRegistry::release_all) is a double free.
///
/// There is no internal synchronization; both operations take `&mut self`,
/// which makes the single-owner discipline a compile-time rule rather than
/// a documented convention.
#[derive(Debug)]
pub struct HandleRegistry<R: Releaser> {
    entries: Vec<Handle>,
    releaser: R,
    config: RegistryConfig,
}

impl<R: Releaser> HandleRegistry<R> {
    /// Creates a registry that releases handles through `releaser`.
    ///
    /// No storage is allocated until the first [`track`] call.
    ///
    /// [`track`]: HandleRegistry::track
    pub fn new(releaser: R) -> Self {
        Self::with_config(releaser, RegistryConfig::default())
    }

    /// Creates a registry with custom configuration
    pub fn with_config(releaser: R, config: RegistryConfig) -> Self {
        Self {
            entries: Vec::new(),
            releaser,
            config,
        }
    }

    /// Appends a handle to the registry.
    ///
    /// The first call reserves the configured initial capacity; after that
    /// the backing storage doubles when full, so tracking is amortized
    /// O(1). Growth goes through the global allocator and aborts the
    /// process if memory is exhausted.
    ///
    /// The handle must not already be tracked in the current cycle. With
    /// `duplicate_check` enabled this panics on a duplicate; otherwise the
    /// precondition is the caller's to uphold, and a violation surfaces as
    /// a double release later.
    pub fn track(&mut self, handle: Handle) {
        if self.config.duplicate_check {
            assert!(
                !self.entries.contains(&handle),
                "handle {:#x} is already tracked",
                handle.as_raw()
            );
        }
        self.push(handle);
    }

    /// Checked variant of [`track`] that reports duplicates as an error.
    ///
    /// The duplicate scan always runs here, independent of the
    /// `duplicate_check` setting. Release semantics are identical to
    /// [`track`].
    ///
    /// [`track`]: HandleRegistry::track
    pub fn try_track(&mut self, handle: Handle) -> Result<()> {
        if self.entries.contains(&handle) {
            return Err(Error::already_tracked(handle.as_raw()));
        }
        self.push(handle);
        Ok(())
    }

    fn push(&mut self, handle: Handle) {
        if self.entries.capacity() == 0 {
            self.entries.reserve(self.config.initial_capacity);
        }
        self.entries.push(handle);
        trace!(
            "Tracking handle {:#x} ({} tracked)",
            handle.as_raw(),
            self.entries.len()
        );
    }

    /// Releases every tracked handle exactly once, in tracking order, then
    /// drops the backing storage.
    ///
    /// Afterwards the registry is empty and ready for the next cycle; the
    /// next [`track`] call reserves fresh storage. Calling this on a
    /// registry that never tracked anything is a no-op.
    ///
    /// Release order is insertion order. If tracked handles have dependency
    /// ordering between them (say, a child node referencing its parent),
    /// track them in an order where releasing front-to-back is safe.
    ///
    /// [`track`]: HandleRegistry::track
    pub fn release_all(&mut self) {
        if self.entries.capacity() == 0 {
            // Nothing was ever tracked
            return;
        }

        let entries = std::mem::take(&mut self.entries);
        let count = entries.len();
        for handle in entries {
            self.releaser.release(handle);
        }
        debug!("Released {} handle(s)", count);
    }

    /// Number of currently tracked handles
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no handles are currently tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current backing-storage size.
    ///
    /// Exposed for diagnostics; not part of the release contract.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Borrows the owned releaser
    pub fn releaser(&self) -> &R {
        &self.releaser
    }

    /// Mutably borrows the owned releaser
    pub fn releaser_mut(&mut self) -> &mut R {
        &mut self.releaser
    }
}
