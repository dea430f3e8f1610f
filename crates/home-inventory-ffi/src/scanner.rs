use crate::callbacks::{FfiCamera, FfiFeedback, FfiObserver};
use crate::error::{map_core_error, set_last_error};
use crate::handle::{ScannerState, SCANNERS};
use crate::types::*;
use home_inventory_core::{
    AppConfig, BarcodeFormat, DecodedCode, MetadataListener, MetadataObject,
    ScanSessionController, SessionState,
};
use std::ffi::c_char;
use std::ptr;
use std::sync::Arc;

/// Create a scan session controller over a host camera. `formats` restricts
/// detection to the given symbology codes; pass null/0 for all of them.
/// Returns a handle or 0 on failure.
///
/// # Safety
/// `formats` must point to `format_count` values when non-null. Every
/// function pointer in `camera` must be valid for the life of the handle.
#[no_mangle]
pub unsafe extern "C" fn hi_scanner_create(
    camera: HiCameraVTable,
    callbacks: HiScannerCallbacks,
    formats: *const u32,
    format_count: u32,
) -> u64 {
    let mut config = AppConfig::default();
    if !formats.is_null() && format_count > 0 {
        let mut symbologies = Vec::new();
        for i in 0..format_count {
            let code = *formats.add(i as usize);
            match BarcodeFormat::from_code(code) {
                Some(format) => symbologies.push(format),
                None => {
                    set_last_error(format!("Unknown barcode format code {}", code));
                    return 0;
                }
            }
        }
        config.symbologies = symbologies;
    }

    let feedback = FfiFeedback::new(&camera);
    let controller =
        match ScanSessionController::new(Box::new(FfiCamera::new(camera)), Box::new(feedback), &config) {
            Ok(controller) => controller,
            Err(e) => {
                map_core_error(e);
                return 0;
            }
        };

    let observer = Arc::new(FfiObserver::new(callbacks));
    SCANNERS.allocate(ScannerState {
        controller: controller.with_observer(observer.clone()),
        observer,
    })
}

/// Run `f` against the controller, then deliver any outcomes it raised once
/// both the registry and the scanner lock are released.
fn with_scanner<F, R>(handle: u64, f: F) -> Option<R>
where
    F: FnOnce(&mut ScanSessionController) -> R,
{
    let (value, observer) = SCANNERS.with(handle, |scanner| {
        (f(&mut scanner.controller), Arc::clone(&scanner.observer))
    })?;
    observer.flush();
    Some(value)
}

/// Release the camera and free the scanner.
#[no_mangle]
pub extern "C" fn hi_scanner_destroy(handle: u64) -> HiResultCode {
    if SCANNERS.destroy(handle) {
        HiResultCode::Ok
    } else {
        set_last_error("Invalid handle".to_string());
        HiResultCode::InvalidHandle
    }
}

#[no_mangle]
pub extern "C" fn hi_scanner_activate(handle: u64) -> HiResultCode {
    let result = with_scanner(handle, |controller| match controller.activate() {
        Ok(()) => HiResultCode::Ok,
        Err(e) => map_core_error(e),
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}

#[no_mangle]
pub extern "C" fn hi_scanner_deactivate(handle: u64) -> HiResultCode {
    let result = with_scanner(handle, |controller| match controller.deactivate() {
        Ok(()) => HiResultCode::Ok,
        Err(e) => map_core_error(e),
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}

/// Tear down the capture pipeline and preview synchronously. The handle
/// stays valid for queries but can no longer be activated.
#[no_mangle]
pub extern "C" fn hi_scanner_release(handle: u64) -> HiResultCode {
    let result = with_scanner(handle, |controller| {
        controller.release();
        HiResultCode::Ok
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}

/// Block until queued capture start/stop requests have reached the host.
#[no_mangle]
pub extern "C" fn hi_scanner_settle(handle: u64) -> HiResultCode {
    let result = with_scanner(handle, |controller| match controller.settle() {
        Ok(()) => HiResultCode::Ok,
        Err(e) => map_core_error(e),
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}

/// # Safety
/// `out_state` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn hi_scanner_state(
    handle: u64,
    out_state: *mut HiSessionState,
) -> HiResultCode {
    if out_state.is_null() {
        set_last_error("out_state is null".to_string());
        return HiResultCode::InvalidArgument;
    }

    let result = with_scanner(handle, |controller| {
        *out_state = match controller.state() {
            SessionState::Idle => HiSessionState::Idle,
            SessionState::Configuring => HiSessionState::Configuring,
            SessionState::Running => HiSessionState::Running,
            SessionState::Stopped => HiSessionState::Stopped,
            SessionState::Released => HiSessionState::Released,
        };
        HiResultCode::Ok
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}

/// Whether frames are being analysed. False for unknown handles.
#[no_mangle]
pub extern "C" fn hi_scanner_is_scanning(handle: u64) -> bool {
    with_scanner(handle, |controller| controller.is_scanning()).unwrap_or(false)
}

/// The value accepted by the current or last activation, or null. Free with
/// `hi_free_string`.
#[no_mangle]
pub extern "C" fn hi_scanner_result(handle: u64) -> *mut c_char {
    with_scanner(handle, |controller| match controller.result() {
        Some(value) => rust_string_to_c(value),
        None => ptr::null_mut(),
    })
    .unwrap_or(ptr::null_mut())
}

/// Deliver one metadata batch from the host detector. Entries with a null
/// value or an unknown format code are treated as unreadable. Must be called
/// on the thread that owns the scanner (normally the main thread). An
/// accepted code is reported through `on_decoded` on this thread before the
/// call returns, after the scanner has been unlocked.
///
/// # Safety
/// `formats` and `values` must each point to `count` entries.
#[no_mangle]
pub unsafe extern "C" fn hi_scanner_deliver_codes(
    handle: u64,
    formats: *const u32,
    values: *const *const c_char,
    count: u32,
) -> HiResultCode {
    if count > 0 && (formats.is_null() || values.is_null()) {
        set_last_error("formats or values is null".to_string());
        return HiResultCode::InvalidArgument;
    }

    let mut batch = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let code = *formats.add(i);
        let value = c_string_to_rust(*values.add(i));
        let object = match (BarcodeFormat::from_code(code), value) {
            (Some(format), Some(value)) => MetadataObject::Code(DecodedCode::new(format, value)),
            (None, _) => MetadataObject::Other(format!("format {}", code)),
            (Some(format), None) => MetadataObject::Other(format!("unreadable {}", format)),
        };
        batch.push(object);
    }

    let result = with_scanner(handle, |controller| {
        controller.on_decoded(&batch);
        HiResultCode::Ok
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}
