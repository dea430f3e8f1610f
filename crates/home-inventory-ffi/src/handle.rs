use crate::callbacks::{FfiObserver, FfiPermissions};
use home_inventory_core::{Inventory, PermissionGate, ScanSessionController};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// A scanner and the observer whose queued outcomes are delivered to the
/// host once every lock has been released.
pub struct ScannerState {
    pub controller: ScanSessionController,
    pub observer: Arc<FfiObserver>,
}

pub struct GateState {
    pub gate: PermissionGate,
    pub platform: Arc<FfiPermissions>,
}

/// Handle-indexed storage for one kind of FFI object. Handles are unique
/// across all registries so a handle of the wrong kind is rejected.
///
/// Each entry has its own lock. The registry lock is only held long enough
/// to look an entry up, so work on one handle never blocks another.
pub struct Registry<T> {
    entries: Mutex<HashMap<u64, Arc<Mutex<T>>>>,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Arc<Mutex<T>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn allocate(&self, state: T) -> u64 {
        let handle = NEXT_HANDLE.fetch_add(1, Ordering::SeqCst);
        self.lock().insert(handle, Arc::new(Mutex::new(state)));
        handle
    }

    pub fn get(&self, handle: u64) -> Option<Arc<Mutex<T>>> {
        self.lock().get(&handle).cloned()
    }

    /// Run `f` under the entry's own lock. The registry lock is released
    /// before `f` runs.
    pub fn with<F, R>(&self, handle: u64, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let entry = self.get(handle)?;
        let mut state = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut state))
    }

    /// Remove the entry; the state is dropped after the registry lock is
    /// released.
    pub fn destroy(&self, handle: u64) -> bool {
        let removed = self.lock().remove(&handle);
        removed.is_some()
    }
}

lazy_static! {
    pub static ref SCANNERS: Registry<ScannerState> = Registry::new();
    pub static ref GATES: Registry<GateState> = Registry::new();
    pub static ref INVENTORIES: Registry<Inventory> = Registry::new();
}
