//! Host-side handle to a unit object living in a loaded library.
//!
//! The object behind a [`UnitRef`] was allocated by the library and is
//! freed by the library's teardown export, never by the host. The handle
//! therefore does not own it: it holds the raw pointer plus a liveness
//! lock. Unloading takes the write side of that lock and clears the
//! pointer before the teardown export runs, so a [`UnitGuard`] can never
//! observe a destroyed object.
//!
//! A library hands out one shared instance however often its factory is
//! called. Every handle to the same object, whatever key or manager it was
//! loaded through, therefore shares one liveness cell: the process-wide
//! [`LiveUnits`] table maps object addresses to their cell, and is held
//! around every factory and teardown call.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::ptr::{self, NonNull};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, RwLock, RwLockReadGuard, Weak};

use crate::error::UnitError;
use crate::unit::{Capability, CapabilityMetadata, UnitKind};

/// Cells by object address. Zero-sized units share an address, so a bucket
/// can hold several cells told apart by their full wide pointer.
type CellTable = HashMap<usize, Vec<Weak<dyn Any + Send + Sync>>>;

static LIVE_CELLS: LazyLock<Mutex<CellTable>> = LazyLock::new(|| Mutex::new(HashMap::new()));

struct UnitCell<K: UnitKind> {
    object: NonNull<K::Unit>,
    ptr: RwLock<Option<NonNull<K::Unit>>>,
}

// SAFETY: K::Unit is Send + Sync through the Capability supertraits; the
// pointer itself is only dereferenced under the read lock.
unsafe impl<K: UnitKind> Send for UnitCell<K> {}
unsafe impl<K: UnitKind> Sync for UnitCell<K> {}

fn address<T: ?Sized>(ptr: NonNull<T>) -> usize {
    ptr.cast::<u8>().as_ptr() as usize
}

/// Exclusive access to the process-wide table of live unit objects.
pub(crate) struct LiveUnits {
    cells: MutexGuard<'static, CellTable>,
}

/// Locks the live unit table. Factory and teardown calls run under it.
pub(crate) fn live_units() -> LiveUnits {
    LiveUnits {
        cells: LIVE_CELLS.lock().unwrap_or_else(|e| e.into_inner()),
    }
}

impl LiveUnits {
    /// Wraps the object at `ptr` for `key`. If another handle already wraps
    /// the same object, the new handle shares its liveness cell.
    pub(crate) fn adopt<K: UnitKind>(&mut self, key: &str, ptr: NonNull<K::Unit>) -> UnitRef<K> {
        let bucket = self.cells.entry(address(ptr)).or_default();
        bucket.retain(|weak| weak.strong_count() > 0);

        let existing = bucket
            .iter()
            .filter_map(Weak::upgrade)
            .filter_map(|cell| cell.downcast::<UnitCell<K>>().ok())
            .find(|cell| ptr::eq(cell.object.as_ptr(), ptr.as_ptr()));

        let cell = match existing {
            Some(cell) => cell,
            None => {
                let cell = Arc::new(UnitCell {
                    object: ptr,
                    ptr: RwLock::new(Some(ptr)),
                });
                let erased: Arc<dyn Any + Send + Sync> = cell.clone();
                bucket.push(Arc::downgrade(&erased));
                cell
            }
        };

        UnitRef {
            key: Arc::from(key),
            cell,
        }
    }

    /// Forgets the object behind `unit` once its teardown has run.
    pub(crate) fn release<K: UnitKind>(&mut self, unit: &UnitRef<K>) {
        let addr = address(unit.cell.object);
        let Some(bucket) = self.cells.get_mut(&addr) else {
            return;
        };
        let cell = Arc::as_ptr(&unit.cell);
        bucket.retain(|weak| weak.strong_count() > 0 && !ptr::addr_eq(weak.as_ptr(), cell));
        if bucket.is_empty() {
            self.cells.remove(&addr);
        }
    }

    /// Number of objects currently tracked.
    #[cfg(test)]
    fn tracked(&self, addr: usize) -> usize {
        self.cells.get(&addr).map_or(0, Vec::len)
    }
}

/// Shared, non-owning reference to a loaded unit.
///
/// Clones refer to the same object. Once the unit is unloaded every clone
/// reports [`UnitRef::is_live`] as `false`.
pub struct UnitRef<K: UnitKind> {
    key: Arc<str>,
    cell: Arc<UnitCell<K>>,
}

impl<K: UnitKind> UnitRef<K> {
    /// The library name or path this unit was loaded from.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Borrows the unit, or `None` once it has been unloaded.
    ///
    /// Unloading blocks while a guard is alive, so a thread must not unload
    /// a unit while it still holds a guard to it.
    pub fn get(&self) -> Option<UnitGuard<'_, K>> {
        let guard = self.cell.ptr.read().unwrap_or_else(|e| e.into_inner());
        let ptr = (*guard)?;
        Some(UnitGuard { _guard: guard, ptr })
    }

    /// Whether the unit is still loaded.
    pub fn is_live(&self) -> bool {
        self.get().is_some()
    }

    /// Whether two handles refer to the same unit object.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.cell, &b.cell)
    }

    /// Snapshot of the unit's metadata, if still loaded.
    pub fn metadata(&self) -> Option<CapabilityMetadata> {
        self.get().map(|unit| K::metadata(&unit))
    }

    /// Runs the unit's action.
    pub fn run(&self) -> Result<(), UnitError> {
        let unit = self.get().ok_or_else(|| UnitError::Unloaded {
            name: self.key().to_string(),
        })?;
        unit.run().map_err(|message| UnitError::Run {
            name: self.key().to_string(),
            message,
        })
    }

    /// Clears the pointer, waiting for outstanding guards. Returns `false`
    /// if it was already cleared through another handle.
    pub(crate) fn retire(&self) -> bool {
        let mut ptr = self.cell.ptr.write().unwrap_or_else(|e| e.into_inner());
        ptr.take().is_some()
    }
}

impl<K: UnitKind> Clone for UnitRef<K> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<K: UnitKind> fmt::Debug for UnitRef<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRef")
            .field("kind", &K::LABEL)
            .field("key", &self.key)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Read access to a live unit. Holds off unloading while it exists.
pub struct UnitGuard<'a, K: UnitKind> {
    _guard: RwLockReadGuard<'a, Option<NonNull<K::Unit>>>,
    ptr: NonNull<K::Unit>,
}

impl<K: UnitKind> Deref for UnitGuard<'_, K> {
    type Target = K::Unit;

    fn deref(&self) -> &K::Unit {
        // SAFETY: the read lock is held, so retire() has not run, and the
        // teardown export only runs after a successful retire().
        unsafe { self.ptr.as_ref() }
    }
}
