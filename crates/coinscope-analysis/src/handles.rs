//! Display handle registry
//!
//! A display handle is a transient reference to an in-memory image,
//! usable to render it without duplicating its bytes. Handles are a
//! scarce resource: every acquired handle must be released exactly once.
//! `release` consumes the handle, so a double release is unrepresentable;
//! `outstanding` exposes the live count so leaks are observable.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Registry of live display handles
#[derive(Clone, Default)]
pub struct HandleRegistry {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    images: Mutex<HashMap<u64, Bytes>>,
    next_id: AtomicU64,
}

/// A transient, single-owner reference to a registered image.
///
/// Deliberately not `Clone`: ownership is how "released exactly once" is
/// enforced.
#[derive(Debug)]
pub struct DisplayHandle {
    id: u64,
}

impl DisplayHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image and hand out a handle to it. The bytes are
    /// shared, not copied.
    pub fn acquire(&self, image: Bytes) -> DisplayHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.images.lock().unwrap().insert(id, image);
        DisplayHandle { id }
    }

    /// Resolve a handle to its image bytes (a cheap clone of the shared
    /// buffer). `None` only if the handle outlived its registry entry,
    /// which the orchestrator's lifecycle rules prevent.
    pub fn resolve(&self, handle: &DisplayHandle) -> Option<Bytes> {
        self.inner.images.lock().unwrap().get(&handle.id).cloned()
    }

    /// Release a handle, consuming it.
    pub fn release(&self, handle: DisplayHandle) {
        self.inner.images.lock().unwrap().remove(&handle.id);
    }

    /// Number of handles currently outstanding
    pub fn outstanding(&self) -> usize {
        self.inner.images.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_resolve_release() {
        let registry = HandleRegistry::new();
        let handle = registry.acquire(Bytes::from_static(b"image"));

        assert_eq!(registry.outstanding(), 1);
        assert_eq!(registry.resolve(&handle).unwrap(), Bytes::from_static(b"image"));

        registry.release(handle);
        assert_eq!(registry.outstanding(), 0);
    }

    #[test]
    fn test_handles_are_distinct() {
        let registry = HandleRegistry::new();
        let a = registry.acquire(Bytes::from_static(b"a"));
        let b = registry.acquire(Bytes::from_static(b"b"));

        assert_ne!(a.id(), b.id());
        assert_eq!(registry.resolve(&a).unwrap(), Bytes::from_static(b"a"));
        assert_eq!(registry.resolve(&b).unwrap(), Bytes::from_static(b"b"));
    }

    #[test]
    fn test_resolve_after_release_is_none() {
        let registry = HandleRegistry::new();
        let handle = registry.acquire(Bytes::from_static(b"image"));
        let id = handle.id();
        registry.release(handle);

        let stale = DisplayHandle { id };
        assert!(registry.resolve(&stale).is_none());
    }

    #[test]
    fn test_resolve_shares_bytes() {
        let registry = HandleRegistry::new();
        let original = Bytes::from(vec![1u8; 1024]);
        let handle = registry.acquire(original.clone());

        // Bytes clones share the same backing buffer
        let resolved = registry.resolve(&handle).unwrap();
        assert_eq!(resolved.as_ptr(), original.as_ptr());
    }
}
