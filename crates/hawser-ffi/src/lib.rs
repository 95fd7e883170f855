//! C ABI surface for the hawser native-handle registry.
//!
//! A foreign bridge layer (JNI glue, cgo, or any other embedding) creates a
//! [`HawserContext`], tracks the pointer of every native allocation it makes
//! on behalf of a managed object, and frees them all with a single call at
//! its teardown point. The release itself goes through a caller-supplied
//! function pointer, so the registry works with whatever allocator the
//! native side uses.
//!
//! ```c
//! HawserContext *ctx = hawser_context_new(free);
//! hawser_context_track(ctx, node);
//! hawser_context_track(ctx, buffer);
//! /* ... */
//! hawser_context_free(ctx); /* releases node and buffer */
//! ```
//!
//! All entry points tolerate null context and handle arguments by doing
//! nothing, so call sites do not need their own guards.

use hawser_core::{Context, Handle, Releaser};
use std::os::raw::c_void;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

/// Release callback supplied by the embedding bridge.
///
/// Invoked exactly once per tracked handle during a bulk release, with the
/// same pointer value that was passed to [`hawser_context_track`].
pub type HawserReleaseFn = unsafe extern "C" fn(handle: *mut c_void);

/// Forwards releases to the caller-supplied C function pointer
struct ExternReleaser {
    release: Option<HawserReleaseFn>,
}

impl Releaser for ExternReleaser {
    fn release(&mut self, handle: Handle) {
        if let Some(release) = self.release {
            // SAFETY: the callback contract requires `release` to accept any
            // pointer previously passed to `hawser_context_track`.
            unsafe { release(handle.as_raw() as *mut c_void) };
        }
    }
}

/// Opaque registry context handed across the C boundary.
///
/// Created by [`hawser_context_new`], destroyed by [`hawser_context_free`].
/// A context must only be used from one thread at a time; it carries no
/// internal synchronization.
pub struct HawserContext {
    inner: Context<ExternReleaser>,
}

/// Creates a new tracking context.
///
/// `release` is called once per tracked handle during a bulk release. Pass
/// null to track without releasing (accounting only).
///
/// Returns an owned pointer that must be destroyed with
/// [`hawser_context_free`].
#[no_mangle]
pub extern "C" fn hawser_context_new(release: Option<HawserReleaseFn>) -> *mut HawserContext {
    let ctx = HawserContext {
        inner: Context::new(ExternReleaser { release }),
    };
    Box::into_raw(Box::new(ctx))
}

/// Tracks a native allocation for bulk release.
///
/// The handle must not already be tracked in the current cycle, and the
/// native side must not free it behind the registry's back. Null `ctx` or
/// null `handle` is a no-op.
///
/// # Safety
/// - `ctx` must be a pointer obtained from [`hawser_context_new`] that has
///   not been freed
#[no_mangle]
pub extern "C" fn hawser_context_track(ctx: *mut HawserContext, handle: *mut c_void) {
    if ctx.is_null() {
        return;
    }
    let ctx = unsafe { &mut *ctx };

    match Handle::from_raw(handle as usize) {
        Some(handle) => ctx.inner.track(handle),
        None => warn!("Ignoring null handle"),
    }
}

/// Releases every tracked handle, in tracking order, and resets the
/// context for the next cycle.
///
/// Safe to call on a context that has tracked nothing. Null `ctx` is a
/// no-op.
///
/// # Safety
/// - `ctx` must be a pointer obtained from [`hawser_context_new`] that has
///   not been freed
#[no_mangle]
pub extern "C" fn hawser_context_release_all(ctx: *mut HawserContext) {
    if ctx.is_null() {
        return;
    }
    let ctx = unsafe { &mut *ctx };
    ctx.inner.release_all();
}

/// Returns the number of currently tracked handles, or 0 for null `ctx`.
///
/// # Safety
/// - `ctx` must be a pointer obtained from [`hawser_context_new`] that has
///   not been freed
#[no_mangle]
pub extern "C" fn hawser_context_tracked(ctx: *const HawserContext) -> usize {
    if ctx.is_null() {
        return 0;
    }
    let ctx = unsafe { &*ctx };
    ctx.inner.tracked()
}

/// Destroys a context created by [`hawser_context_new`].
///
/// Any handles still tracked are released first. Null `ctx` is a no-op;
/// passing the same pointer twice is a double free.
///
/// # Safety
/// - `ctx` must be a pointer obtained from [`hawser_context_new`] that has
///   not been freed
#[no_mangle]
pub extern "C" fn hawser_context_free(ctx: *mut HawserContext) {
    if !ctx.is_null() {
        // Dropping the context releases whatever is still tracked
        let _ = unsafe { Box::from_raw(ctx) };
    }
}

/// Initializes logging for the library.
///
/// `verbosity` maps 0 to warn, 1 to info, 2 to debug, and anything higher
/// to trace, combined with the `RUST_LOG` environment filter. Calling this
/// more than once is harmless; later calls keep the first configuration.
#[no_mangle]
pub extern "C" fn hawser_init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::ptr;
    use std::sync::Mutex;

    fn fake(raw: usize) -> *mut c_void {
        raw as *mut c_void
    }

    #[test]
    fn test_null_context_is_noop() {
        hawser_context_track(ptr::null_mut(), fake(1));
        hawser_context_release_all(ptr::null_mut());
        hawser_context_free(ptr::null_mut());
        assert_eq!(hawser_context_tracked(ptr::null()), 0);
    }

    #[test]
    fn test_null_handle_is_ignored() {
        let ctx = hawser_context_new(None);
        hawser_context_track(ctx, ptr::null_mut());
        assert_eq!(hawser_context_tracked(ctx), 0);
        hawser_context_free(ctx);
    }

    #[test]
    fn test_tracked_count_without_release_fn() {
        let ctx = hawser_context_new(None);
        hawser_context_track(ctx, fake(0x10));
        hawser_context_track(ctx, fake(0x20));
        hawser_context_track(ctx, fake(0x30));
        assert_eq!(hawser_context_tracked(ctx), 3);

        hawser_context_release_all(ctx);
        assert_eq!(hawser_context_tracked(ctx), 0);
        hawser_context_free(ctx);
    }

    static RELEASED: Mutex<Vec<usize>> = Mutex::new(Vec::new());

    unsafe extern "C" fn record_release(handle: *mut c_void) {
        RELEASED.lock().unwrap().push(handle as usize);
    }

    #[test]
    fn test_full_lifecycle() {
        let ctx = hawser_context_new(Some(record_release));

        hawser_context_track(ctx, fake(1));
        hawser_context_track(ctx, fake(2));
        hawser_context_track(ctx, fake(3));
        hawser_context_release_all(ctx);
        assert_eq!(*RELEASED.lock().unwrap(), vec![1, 2, 3]);

        // Context is reusable for the next cycle
        hawser_context_track(ctx, fake(4));
        hawser_context_release_all(ctx);
        assert_eq!(*RELEASED.lock().unwrap(), vec![1, 2, 3, 4]);

        hawser_context_free(ctx);
        assert_eq!(*RELEASED.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    static RELEASED_ON_FREE: Mutex<Vec<usize>> = Mutex::new(Vec::new());

    unsafe extern "C" fn record_release_on_free(handle: *mut c_void) {
        RELEASED_ON_FREE.lock().unwrap().push(handle as usize);
    }

    #[test]
    fn test_free_releases_remaining_handles() {
        let ctx = hawser_context_new(Some(record_release_on_free));
        hawser_context_track(ctx, fake(7));
        hawser_context_track(ctx, fake(8));
        hawser_context_free(ctx);
        assert_eq!(*RELEASED_ON_FREE.lock().unwrap(), vec![7, 8]);
    }
}
