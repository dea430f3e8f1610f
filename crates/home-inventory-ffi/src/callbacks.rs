//! Bridges from core traits to host-supplied C function tables.

use crate::types::*;
use home_inventory_core::capture::{CapturePipeline, Feedback};
use home_inventory_core::permission::AccessCallback;
use home_inventory_core::{AuthorizationState, BarcodeFormat, Error, PermissionPlatform, ScanObserver};
use std::collections::HashMap;
use std::ffi::{c_void, CString};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

enum Outcome {
    Decoded(String),
    ConfigurationError(HiResultCode, String),
}

/// Collects scan outcomes and forwards them to C callbacks on `flush`.
/// Outcomes are raised while the scanner is locked, so they are held back
/// until the exported call has released it and the host may call in again.
pub struct FfiObserver {
    callbacks: HiScannerCallbacks,
    queued: Mutex<Vec<Outcome>>,
}

// Safety: the host promises its callbacks and user_data may be used from any thread.
unsafe impl Send for FfiObserver {}
unsafe impl Sync for FfiObserver {}

impl FfiObserver {
    pub fn new(callbacks: HiScannerCallbacks) -> Self {
        Self {
            callbacks,
            queued: Mutex::new(Vec::new()),
        }
    }

    fn queue(&self, outcome: Outcome) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome);
    }

    /// Deliver queued outcomes on the calling thread. Must not be called
    /// while the scanner's entry lock is held.
    pub fn flush(&self) {
        let outcomes = {
            let mut queued = self.queued.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *queued)
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Decoded(value) => {
                    if let Some(callback) = self.callbacks.on_decoded {
                        match CString::new(value) {
                            Ok(c_value) => callback(self.callbacks.user_data, c_value.as_ptr()),
                            Err(_) => warn!("Decoded value contains a NUL byte, not forwarded"),
                        }
                    }
                }
                Outcome::ConfigurationError(code, message) => {
                    if let Some(callback) = self.callbacks.on_configuration_error {
                        let message = CString::new(message).unwrap_or_default();
                        callback(self.callbacks.user_data, code, message.as_ptr());
                    }
                }
            }
        }
    }
}

impl ScanObserver for FfiObserver {
    fn on_barcode_decoded(&self, value: &str) {
        self.queue(Outcome::Decoded(value.to_string()));
    }

    fn on_configuration_error(&self, error: &Error) {
        self.queue(Outcome::ConfigurationError(
            crate::error::result_code(error),
            error.to_string(),
        ));
    }
}

/// Capture pipeline implemented by the host camera stack.
pub struct FfiCamera {
    vtable: HiCameraVTable,
}

// Safety: the pipeline is only ever touched from the capture worker thread.
unsafe impl Send for FfiCamera {}

impl FfiCamera {
    pub fn new(vtable: HiCameraVTable) -> Self {
        Self { vtable }
    }
}

impl CapturePipeline for FfiCamera {
    fn acquire_device(&mut self) -> Result<(), Error> {
        if (self.vtable.acquire_device)(self.vtable.context) {
            Ok(())
        } else {
            Err(Error::DeviceUnavailable)
        }
    }

    fn bind_metadata_output(&mut self, symbologies: &[BarcodeFormat]) -> Result<(), Error> {
        let codes: Vec<u32> = symbologies.iter().map(|f| f.code()).collect();
        if (self.vtable.bind_metadata_output)(self.vtable.context, codes.as_ptr(), codes.len() as u32) {
            Ok(())
        } else {
            Err(Error::ConfigurationFailed(
                "host could not attach the metadata output".to_string(),
            ))
        }
    }

    fn attach_preview(&mut self) -> Result<(), Error> {
        if (self.vtable.attach_preview)(self.vtable.context) {
            Ok(())
        } else {
            Err(Error::ConfigurationFailed(
                "host could not attach the preview surface".to_string(),
            ))
        }
    }

    fn start_running(&mut self) {
        (self.vtable.start_running)(self.vtable.context);
    }

    fn stop_running(&mut self) {
        (self.vtable.stop_running)(self.vtable.context);
    }

    fn is_running(&self) -> bool {
        (self.vtable.is_running)(self.vtable.context)
    }

    fn teardown(&mut self) {
        (self.vtable.teardown)(self.vtable.context);
    }
}

/// Acknowledgment through the camera table's optional `acknowledge` entry.
pub struct FfiFeedback {
    context: *mut c_void,
    acknowledge: Option<extern "C" fn(*mut c_void)>,
}

// Safety: only called from the capture worker thread.
unsafe impl Send for FfiFeedback {}

impl FfiFeedback {
    pub fn new(vtable: &HiCameraVTable) -> Self {
        Self {
            context: vtable.context,
            acknowledge: vtable.acknowledge,
        }
    }
}

impl Feedback for FfiFeedback {
    fn acknowledge(&mut self) {
        if let Some(acknowledge) = self.acknowledge {
            acknowledge(self.context);
        }
    }
}

/// Permission platform implemented by the host. Prompts complete when the
/// host calls `hi_gate_complete_request` with the request id it was given.
pub struct FfiPermissions {
    vtable: HiPermissionVTable,
    next_request: AtomicU64,
    pending: Mutex<HashMap<u64, AccessCallback>>,
}

// Safety: the host promises the permission table may be used from any thread.
unsafe impl Send for FfiPermissions {}
unsafe impl Sync for FfiPermissions {}

impl FfiPermissions {
    pub fn new(vtable: HiPermissionVTable) -> Self {
        Self {
            vtable,
            next_request: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve an outstanding prompt. Returns false for unknown or already
    /// completed request ids.
    pub fn complete(&self, request_id: u64, granted: bool) -> bool {
        let done = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&request_id);
        match done {
            Some(done) => {
                done(granted);
                true
            }
            None => false,
        }
    }
}

impl PermissionPlatform for FfiPermissions {
    fn authorization_status(&self) -> AuthorizationState {
        match (self.vtable.authorization_status)(self.vtable.context) {
            HiAuthorizationState::Unknown => AuthorizationState::Unknown,
            HiAuthorizationState::Granted => AuthorizationState::Granted,
            HiAuthorizationState::Denied => AuthorizationState::Denied,
        }
    }

    fn request_access(&self, done: AccessCallback) {
        let request_id = self.next_request.fetch_add(1, Ordering::SeqCst);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request_id, done);
        (self.vtable.request_access)(self.vtable.context, request_id);
    }

    fn open_settings(&self) {
        if let Some(open_settings) = self.vtable.open_settings {
            open_settings(self.vtable.context);
        }
    }
}

/// Raw host pointer that is moved into a `Send` closure.
pub struct SendPtr(*mut c_void);

// Safety: the host promises user_data may be used from any thread.
unsafe impl Send for SendPtr {}

impl SendPtr {
    pub fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn get(&self) -> *mut c_void {
        self.0
    }
}
