//! Scoped ownership of a handle registry.
//!
//! A [`Context`] ties a registry's contents to a lexical scope: whatever is
//! still tracked when the context goes away gets released, every time. This
//! replaces finalizer-driven cleanup, which may run late or not at all,
//! with a deterministic release point.
//!
//! Contexts are independent of each other. A bridge layer can hold one per
//! worker or per session; there is no process-global registry anywhere in
//! this crate.

use crate::error::Result;
use crate::registry::{Handle, HandleRegistry, RegistryConfig, Releaser};
use tracing::debug;

/// Scoped owner of a [`HandleRegistry`].
///
/// Release is guaranteed by `Drop` and can also be invoked mid-life with
/// [`release_all`](Context::release_all), after which the context keeps
/// accepting new handles for the next cycle.
///
/// # Example
///
/// ```
/// use hawser_core::{Context, Handle, RecordingReleaser};
///
/// let mut ctx = Context::new(RecordingReleaser::new());
/// ctx.track(Handle::from_raw(0x1000).unwrap());
/// ctx.track(Handle::from_raw(0x2000).unwrap());
/// drop(ctx); // both handles released here
/// ```
#[derive(Debug)]
pub struct Context<R: Releaser> {
    registry: HandleRegistry<R>,
}

impl<R: Releaser> Context<R> {
    /// Creates a context that releases handles through `releaser`
    pub fn new(releaser: R) -> Self {
        Self::with_config(releaser, RegistryConfig::default())
    }

    /// Creates a context with custom registry configuration
    pub fn with_config(releaser: R, config: RegistryConfig) -> Self {
        Self {
            registry: HandleRegistry::with_config(releaser, config),
        }
    }

    /// Tracks a handle for release when this context ends.
    ///
    /// See [`HandleRegistry::track`] for the duplicate-handle precondition.
    pub fn track(&mut self, handle: Handle) {
        self.registry.track(handle);
    }

    /// Checked variant of [`track`](Context::track), reporting duplicates
    /// as an error
    pub fn try_track(&mut self, handle: Handle) -> Result<()> {
        self.registry.try_track(handle)
    }

    /// Releases every tracked handle now; the context remains usable
    pub fn release_all(&mut self) {
        self.registry.release_all();
    }

    /// Number of currently tracked handles
    pub fn tracked(&self) -> usize {
        self.registry.tracked()
    }

    /// Returns true if no handles are currently tracked
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Borrows the owned releaser
    pub fn releaser(&self) -> &R {
        self.registry.releaser()
    }

    /// Mutably borrows the owned releaser
    pub fn releaser_mut(&mut self) -> &mut R {
        self.registry.releaser_mut()
    }

    /// Releases every tracked handle and consumes the context.
    ///
    /// Equivalent to dropping it; exists so teardown paths have an explicit
    /// name to call.
    pub fn close(self) {}
}

impl<R: Releaser> Drop for Context<R> {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            debug!("Context closing with {} tracked handle(s)", self.registry.tracked());
        }
        self.registry.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn h(raw: usize) -> Handle {
        Handle::from_raw(raw).unwrap()
    }

    fn sink() -> (Rc<RefCell<Vec<usize>>>, impl FnMut(Handle)) {
        let released = Rc::new(RefCell::new(Vec::new()));
        let handle_sink = Rc::clone(&released);
        (released, move |handle: Handle| {
            handle_sink.borrow_mut().push(handle.as_raw())
        })
    }

    #[test]
    fn test_drop_releases_tracked_handles() {
        let (released, releaser) = sink();
        {
            let mut ctx = Context::new(releaser);
            ctx.track(h(1));
            ctx.track(h(2));
            assert_eq!(ctx.tracked(), 2);
        }
        assert_eq!(*released.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_close_releases_tracked_handles() {
        let (released, releaser) = sink();
        let mut ctx = Context::new(releaser);
        ctx.track(h(3));
        ctx.close();
        assert_eq!(*released.borrow(), vec![3]);
    }

    #[test]
    fn test_midlife_release_and_reuse() {
        let (released, releaser) = sink();
        let mut ctx = Context::new(releaser);

        ctx.track(h(1));
        ctx.release_all();
        assert_eq!(*released.borrow(), vec![1]);
        assert!(ctx.is_empty());

        ctx.track(h(2));
        drop(ctx);
        assert_eq!(*released.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_empty_context_drop_is_noop() {
        let (released, releaser) = sink();
        let ctx = Context::new(releaser);
        drop(ctx);
        assert!(released.borrow().is_empty());
    }

    #[test]
    fn test_contexts_are_independent() {
        let (released_a, releaser_a) = sink();
        let (released_b, releaser_b) = sink();

        let mut a = Context::new(releaser_a);
        let mut b = Context::new(releaser_b);
        a.track(h(1));
        b.track(h(2));

        drop(a);
        assert_eq!(*released_a.borrow(), vec![1]);
        assert!(released_b.borrow().is_empty());

        drop(b);
        assert_eq!(*released_b.borrow(), vec![2]);
    }

    #[test]
    fn test_try_track_duplicate_through_context() {
        let mut ctx = Context::with_config(
            crate::registry::NullReleaser,
            RegistryConfig::new().duplicate_check(false),
        );
        ctx.try_track(h(5)).unwrap();
        assert!(ctx.try_track(h(5)).is_err());
        assert_eq!(ctx.tracked(), 1);
    }
}
