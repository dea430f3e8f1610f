use crate::types::{rust_string_to_c, HiResultCode};
use std::cell::RefCell;
use std::ffi::c_char;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = RefCell::new(None);
}

pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some(msg);
    });
}

pub fn result_code(e: &home_inventory_core::Error) -> HiResultCode {
    use home_inventory_core::Error;
    match e {
        Error::PermissionDenied => HiResultCode::PermissionDenied,
        Error::DeviceUnavailable => HiResultCode::DeviceUnavailable,
        Error::ConfigurationFailed(_) => HiResultCode::ConfigurationFailed,
        Error::Released => HiResultCode::Released,
        Error::ItemNotFound(_) => HiResultCode::NotFound,
        Error::Config(_) => HiResultCode::InvalidArgument,
        Error::WorkerUnavailable => HiResultCode::InternalError,
    }
}

pub fn map_core_error(e: home_inventory_core::Error) -> HiResultCode {
    set_last_error(e.to_string());
    result_code(&e)
}

/// Get the last error message. Returns a C string that must be freed with `hi_free_string`.
///
/// # Safety
/// Caller must free the returned string with `hi_free_string`.
#[no_mangle]
pub extern "C" fn hi_last_error_message() -> *mut c_char {
    LAST_ERROR.with(|e| {
        let msg = e.borrow();
        match msg.as_ref() {
            Some(s) => rust_string_to_c(s),
            None => rust_string_to_c(""),
        }
    })
}

/// Free a string allocated by the FFI layer.
///
/// # Safety
/// `ptr` must have been allocated by this library (e.g., from `hi_last_error_message`).
#[no_mangle]
pub unsafe extern "C" fn hi_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(std::ffi::CString::from_raw(ptr));
    }
}
