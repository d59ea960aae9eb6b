//! Library-side storage for the single live unit instance.
//!
//! The export macros place one [`InstanceSlot`] in a `static` of the unit
//! library. `Create*` fills it (or hands back the existing instance) and
//! `Destroy*` drops it, so allocation and deallocation both happen with
//! the library's own allocator.

use std::ptr::NonNull;
use std::sync::Mutex;

/// Holds at most one boxed unit owned by the library that defines it.
pub struct InstanceSlot<T: ?Sized> {
    inner: Mutex<Option<NonNull<T>>>,
}

// SAFETY: the pointer is only created from and turned back into a Box
// under the mutex, and T itself is required to be Send + Sync.
unsafe impl<T: ?Sized + Send + Sync> Send for InstanceSlot<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for InstanceSlot<T> {}

impl<T: ?Sized> InstanceSlot<T> {
    /// An empty slot, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Returns the live instance, creating it first if the slot is empty.
    pub fn get_or_create(&self, create: impl FnOnce() -> Box<T>) -> NonNull<T> {
        let mut slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ptr) = *slot {
            return ptr;
        }
        let ptr = NonNull::from(Box::leak(create()));
        *slot = Some(ptr);
        ptr
    }

    /// Drops the live instance. Returns `false` when the slot was empty.
    pub fn destroy(&self) -> bool {
        let taken = self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match taken {
            Some(ptr) => {
                // SAFETY: ptr came from Box::leak in get_or_create and was
                // removed from the slot, so this is the only owner.
                drop(unsafe { Box::from_raw(ptr.as_ptr()) });
                true
            }
            None => false,
        }
    }

    /// Whether an instance currently exists.
    pub fn is_live(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl<T: ?Sized> Default for InstanceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
