use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;

/// Result codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiResultCode {
    Ok = 0,
    InvalidHandle = 1,
    InvalidArgument = 2,
    PermissionDenied = 3,
    DeviceUnavailable = 4,
    ConfigurationFailed = 5,
    Released = 6,
    NotFound = 7,
    InternalError = 99,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiSessionState {
    Idle = 0,
    Configuring = 1,
    Running = 2,
    Stopped = 3,
    Released = 4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiAuthorizationState {
    Unknown = 0,
    Granted = 1,
    Denied = 2,
}

/// One inventory item. Strings are owned by the caller afterwards and must
/// be released with `hi_item_free`.
#[repr(C)]
pub struct HiItem {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub barcode: *mut c_char,
    /// Seconds since the Unix epoch.
    pub date_added: i64,
    pub order: u32,
}

/// Called once per accepted barcode, on the thread that called
/// `hi_scanner_deliver_codes`, before that call returns.
pub type HiDecodedCallback = extern "C" fn(user_data: *mut c_void, value: *const c_char);

/// Called when camera setup fails, on the thread that called
/// `hi_scanner_activate`, before that call returns.
pub type HiConfigurationErrorCallback =
    extern "C" fn(user_data: *mut c_void, code: HiResultCode, message: *const c_char);

/// Called once with the user's answer to a permission prompt.
pub type HiAccessCallback = extern "C" fn(user_data: *mut c_void, granted: bool);

/// Host callbacks for a scanner. They fire after the scanner's locks are
/// released, so they may call any `hi_scanner_*` function, including on the
/// same handle.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct HiScannerCallbacks {
    pub user_data: *mut c_void,
    pub on_decoded: Option<HiDecodedCallback>,
    pub on_configuration_error: Option<HiConfigurationErrorCallback>,
}

/// Camera primitives implemented by the host. Every function runs on the
/// scanner's capture worker thread and must not call into the scanner.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct HiCameraVTable {
    pub context: *mut c_void,
    /// Return false when there is no camera.
    pub acquire_device: extern "C" fn(context: *mut c_void) -> bool,
    pub bind_metadata_output:
        extern "C" fn(context: *mut c_void, formats: *const u32, count: u32) -> bool,
    pub attach_preview: extern "C" fn(context: *mut c_void) -> bool,
    pub start_running: extern "C" fn(context: *mut c_void),
    pub stop_running: extern "C" fn(context: *mut c_void),
    pub is_running: extern "C" fn(context: *mut c_void) -> bool,
    pub teardown: extern "C" fn(context: *mut c_void),
    pub acknowledge: Option<extern "C" fn(context: *mut c_void)>,
}

/// Camera authorization primitives implemented by the host.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct HiPermissionVTable {
    pub context: *mut c_void,
    pub authorization_status: extern "C" fn(context: *mut c_void) -> HiAuthorizationState,
    /// Show the system prompt, then call `hi_gate_complete_request` with
    /// `request_id` and the answer.
    pub request_access: extern "C" fn(context: *mut c_void, request_id: u64),
    pub open_settings: Option<extern "C" fn(context: *mut c_void)>,
}

/// Helper to convert a Rust string to a C string on the heap.
pub fn rust_string_to_c(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|cs| cs.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Helper to convert a C string to a Rust string.
///
/// # Safety
/// The caller must ensure `ptr` is a valid null-terminated C string.
pub unsafe fn c_string_to_rust(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}
