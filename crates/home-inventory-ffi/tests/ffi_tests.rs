use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::Duration;

use home_inventory_ffi::error::*;
use home_inventory_ffi::gate::*;
use home_inventory_ffi::inventory::*;
use home_inventory_ffi::scanner::*;
use home_inventory_ffi::types::*;

// ── Fake host camera ─────────────────────────────────────────────────────────

struct FakeCamera {
    has_device: bool,
    running: AtomicBool,
    starts: AtomicUsize,
    teardowns: AtomicUsize,
    acknowledgments: AtomicUsize,
    bound_formats: Mutex<Vec<u32>>,
}

impl FakeCamera {
    fn new(has_device: bool) -> &'static FakeCamera {
        Box::leak(Box::new(FakeCamera {
            has_device,
            running: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            teardowns: AtomicUsize::new(0),
            acknowledgments: AtomicUsize::new(0),
            bound_formats: Mutex::new(Vec::new()),
        }))
    }
}

fn camera(context: *mut c_void) -> &'static FakeCamera {
    unsafe { &*(context as *const FakeCamera) }
}

extern "C" fn acquire_device(context: *mut c_void) -> bool {
    camera(context).has_device
}

extern "C" fn bind_metadata_output(context: *mut c_void, formats: *const u32, count: u32) -> bool {
    let formats = unsafe { std::slice::from_raw_parts(formats, count as usize) };
    *camera(context).bound_formats.lock().unwrap() = formats.to_vec();
    true
}

extern "C" fn attach_preview(_context: *mut c_void) -> bool {
    true
}

extern "C" fn start_running(context: *mut c_void) {
    let cam = camera(context);
    cam.starts.fetch_add(1, Ordering::SeqCst);
    cam.running.store(true, Ordering::SeqCst);
}

extern "C" fn stop_running(context: *mut c_void) {
    camera(context).running.store(false, Ordering::SeqCst);
}

extern "C" fn is_running(context: *mut c_void) -> bool {
    camera(context).running.load(Ordering::SeqCst)
}

extern "C" fn teardown(context: *mut c_void) {
    camera(context).teardowns.fetch_add(1, Ordering::SeqCst);
}

extern "C" fn acknowledge(context: *mut c_void) {
    camera(context).acknowledgments.fetch_add(1, Ordering::SeqCst);
}

fn vtable(cam: &'static FakeCamera) -> HiCameraVTable {
    HiCameraVTable {
        context: cam as *const FakeCamera as *mut c_void,
        acquire_device,
        bind_metadata_output,
        attach_preview,
        start_running,
        stop_running,
        is_running,
        teardown,
        acknowledge: Some(acknowledge),
    }
}

// ── Host callbacks ───────────────────────────────────────────────────────────

#[derive(Default)]
struct HostLog {
    decoded: Mutex<Vec<String>>,
    configuration_errors: Mutex<Vec<HiResultCode>>,
}

extern "C" fn on_decoded(user_data: *mut c_void, value: *const c_char) {
    let log = unsafe { &*(user_data as *const HostLog) };
    let value = unsafe { CStr::from_ptr(value) }.to_str().unwrap().to_string();
    log.decoded.lock().unwrap().push(value);
}

extern "C" fn on_configuration_error(
    user_data: *mut c_void,
    code: HiResultCode,
    _message: *const c_char,
) {
    let log = unsafe { &*(user_data as *const HostLog) };
    log.configuration_errors.lock().unwrap().push(code);
}

fn callbacks(log: &HostLog) -> HiScannerCallbacks {
    HiScannerCallbacks {
        user_data: log as *const HostLog as *mut c_void,
        on_decoded: Some(on_decoded),
        on_configuration_error: Some(on_configuration_error),
    }
}

fn create_scanner(cam: &'static FakeCamera, log: &HostLog) -> u64 {
    let handle = unsafe { hi_scanner_create(vtable(cam), callbacks(log), ptr::null(), 0) };
    assert_ne!(handle, 0, "handle should be non-zero");
    handle
}

fn deliver(handle: u64, values: &[&str]) -> HiResultCode {
    let owned: Vec<CString> = values.iter().map(|v| CString::new(*v).unwrap()).collect();
    let pointers: Vec<*const c_char> = owned.iter().map(|v| v.as_ptr()).collect();
    let formats = vec![2u32; values.len()]; // ean13
    unsafe {
        hi_scanner_deliver_codes(handle, formats.as_ptr(), pointers.as_ptr(), values.len() as u32)
    }
}

fn state(handle: u64) -> HiSessionState {
    let mut out = HiSessionState::Idle;
    assert_eq!(unsafe { hi_scanner_state(handle, &mut out) }, HiResultCode::Ok);
    out
}

fn take_string(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
    unsafe { hi_free_string(ptr) };
    Some(s)
}

// ── Scanner lifecycle ────────────────────────────────────────────────────────

#[test]
fn test_scanner_create_and_destroy() {
    let cam = FakeCamera::new(true);
    let log = HostLog::default();
    let handle = create_scanner(cam, &log);

    assert_eq!(state(handle), HiSessionState::Idle);
    assert_eq!(hi_scanner_destroy(handle), HiResultCode::Ok);
    assert_eq!(hi_scanner_destroy(handle), HiResultCode::InvalidHandle);
    assert_eq!(cam.teardowns.load(Ordering::SeqCst), 1);
}

#[test]
fn test_scan_accepts_first_code_once() {
    let cam = FakeCamera::new(true);
    let log = HostLog::default();
    let handle = create_scanner(cam, &log);

    assert_eq!(hi_scanner_activate(handle), HiResultCode::Ok);
    assert!(hi_scanner_is_scanning(handle));

    assert_eq!(deliver(handle, &["A123", "B456"]), HiResultCode::Ok);
    assert_eq!(deliver(handle, &["C789"]), HiResultCode::Ok);

    assert_eq!(state(handle), HiSessionState::Stopped);
    assert_eq!(take_string(hi_scanner_result(handle)).as_deref(), Some("A123"));
    assert_eq!(*log.decoded.lock().unwrap(), vec!["A123".to_string()]);

    assert_eq!(hi_scanner_settle(handle), HiResultCode::Ok);
    assert!(!cam.running.load(Ordering::SeqCst));
    assert_eq!(cam.acknowledgments.load(Ordering::SeqCst), 1);
    assert_eq!(cam.bound_formats.lock().unwrap().len(), 12);

    hi_scanner_destroy(handle);
}

#[test]
fn test_reactivate_clears_result() {
    let cam = FakeCamera::new(true);
    let log = HostLog::default();
    let handle = create_scanner(cam, &log);

    hi_scanner_activate(handle);
    deliver(handle, &["A123"]);
    assert_eq!(hi_scanner_deactivate(handle), HiResultCode::Ok);
    assert_eq!(hi_scanner_activate(handle), HiResultCode::Ok);

    assert!(hi_scanner_result(handle).is_null());
    assert_eq!(state(handle), HiSessionState::Running);

    hi_scanner_destroy(handle);
}

#[test]
fn test_no_device_reports_configuration_error() {
    let cam = FakeCamera::new(false);
    let log = HostLog::default();
    let handle = create_scanner(cam, &log);

    assert_eq!(hi_scanner_activate(handle), HiResultCode::DeviceUnavailable);
    assert_eq!(state(handle), HiSessionState::Idle);
    assert!(!hi_scanner_is_scanning(handle));
    assert_eq!(
        *log.configuration_errors.lock().unwrap(),
        vec![HiResultCode::DeviceUnavailable]
    );
    assert_eq!(cam.starts.load(Ordering::SeqCst), 0);

    let message = take_string(hi_last_error_message()).unwrap();
    assert!(message.contains("No camera"));

    hi_scanner_destroy(handle);
}

#[test]
fn test_release_rejects_activate() {
    let cam = FakeCamera::new(true);
    let log = HostLog::default();
    let handle = create_scanner(cam, &log);

    hi_scanner_activate(handle);
    assert_eq!(hi_scanner_release(handle), HiResultCode::Ok);
    assert_eq!(cam.teardowns.load(Ordering::SeqCst), 1);
    assert_eq!(state(handle), HiSessionState::Released);
    assert_eq!(hi_scanner_activate(handle), HiResultCode::Released);

    hi_scanner_destroy(handle);
    assert_eq!(cam.teardowns.load(Ordering::SeqCst), 1);
}

#[test]
fn test_create_with_restricted_formats() {
    let cam = FakeCamera::new(true);
    let log = HostLog::default();
    let formats = [0u32, 2];
    let handle =
        unsafe { hi_scanner_create(vtable(cam), callbacks(&log), formats.as_ptr(), 2) };

    hi_scanner_activate(handle);
    hi_scanner_settle(handle);
    assert_eq!(*cam.bound_formats.lock().unwrap(), vec![0, 2]);

    hi_scanner_destroy(handle);
}

#[test]
fn test_create_with_unknown_format_fails() {
    let cam = FakeCamera::new(true);
    let log = HostLog::default();
    let formats = [42u32];
    let handle =
        unsafe { hi_scanner_create(vtable(cam), callbacks(&log), formats.as_ptr(), 1) };
    assert_eq!(handle, 0);
}

#[test]
fn test_scanner_invalid_handle() {
    assert_eq!(hi_scanner_activate(999_999), HiResultCode::InvalidHandle);
    assert!(!hi_scanner_is_scanning(999_999));
    assert!(hi_scanner_result(999_999).is_null());
    assert_eq!(deliver(999_999, &["A"]), HiResultCode::InvalidHandle);
}

#[test]
fn test_deliver_null_arrays() {
    let result = unsafe { hi_scanner_deliver_codes(1, ptr::null(), ptr::null(), 1) };
    assert_eq!(result, HiResultCode::InvalidArgument);
}

// ── Callbacks that call back in ──────────────────────────────────────────────

/// Host whose callbacks query its own scanner and a second one.
struct ReentrantHost {
    own: AtomicU64,
    other: AtomicU64,
    seen_result: Mutex<Option<String>>,
    seen_scanning: Mutex<Vec<bool>>,
    seen_state: Mutex<Vec<HiSessionState>>,
    seen_deactivate: Mutex<Vec<HiResultCode>>,
}

impl ReentrantHost {
    fn new() -> &'static ReentrantHost {
        Box::leak(Box::new(ReentrantHost {
            own: AtomicU64::new(0),
            other: AtomicU64::new(0),
            seen_result: Mutex::new(None),
            seen_scanning: Mutex::new(Vec::new()),
            seen_state: Mutex::new(Vec::new()),
            seen_deactivate: Mutex::new(Vec::new()),
        }))
    }
}

extern "C" fn reentrant_decoded(user_data: *mut c_void, _value: *const c_char) {
    let host = unsafe { &*(user_data as *const ReentrantHost) };
    let own = host.own.load(Ordering::SeqCst);
    *host.seen_result.lock().unwrap() = take_string(hi_scanner_result(own));
    host.seen_scanning.lock().unwrap().push(hi_scanner_is_scanning(own));
    host.seen_scanning
        .lock()
        .unwrap()
        .push(hi_scanner_is_scanning(host.other.load(Ordering::SeqCst)));
    host.seen_deactivate.lock().unwrap().push(hi_scanner_deactivate(own));
}

extern "C" fn reentrant_configuration_error(
    user_data: *mut c_void,
    _code: HiResultCode,
    _message: *const c_char,
) {
    let host = unsafe { &*(user_data as *const ReentrantHost) };
    let mut out = HiSessionState::Released;
    unsafe { hi_scanner_state(host.own.load(Ordering::SeqCst), &mut out) };
    host.seen_state.lock().unwrap().push(out);
}

fn reentrant_scanner(cam: &'static FakeCamera, host: &'static ReentrantHost) -> u64 {
    let callbacks = HiScannerCallbacks {
        user_data: host as *const ReentrantHost as *mut c_void,
        on_decoded: Some(reentrant_decoded),
        on_configuration_error: Some(reentrant_configuration_error),
    };
    let handle = unsafe { hi_scanner_create(vtable(cam), callbacks, ptr::null(), 0) };
    assert_ne!(handle, 0);
    host.own.store(handle, Ordering::SeqCst);
    handle
}

/// Runs `f` on another thread and fails instead of hanging if it blocks.
fn within_timeout<R: Send + 'static>(f: impl FnOnce() -> R + Send + 'static) -> R {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(Duration::from_secs(3))
        .expect("call blocked while a host callback re-entered the scanner API")
}

#[test]
fn test_decoded_callback_can_query_scanners() {
    let host = ReentrantHost::new();
    let handle = reentrant_scanner(FakeCamera::new(true), host);

    let other_log: &'static HostLog = Box::leak(Box::new(HostLog::default()));
    let other = create_scanner(FakeCamera::new(true), other_log);
    host.other.store(other, Ordering::SeqCst);
    assert_eq!(hi_scanner_activate(other), HiResultCode::Ok);

    assert_eq!(hi_scanner_activate(handle), HiResultCode::Ok);
    let rc = within_timeout(move || deliver(handle, &["A123"]));
    assert_eq!(rc, HiResultCode::Ok);

    assert_eq!(host.seen_result.lock().unwrap().as_deref(), Some("A123"));
    assert_eq!(*host.seen_scanning.lock().unwrap(), vec![false, true]);
    assert_eq!(*host.seen_deactivate.lock().unwrap(), vec![HiResultCode::Ok]);
    assert_eq!(state(handle), HiSessionState::Stopped);

    hi_scanner_destroy(handle);
    hi_scanner_destroy(other);
}

#[test]
fn test_configuration_error_callback_can_query_scanner() {
    let host = ReentrantHost::new();
    let handle = reentrant_scanner(FakeCamera::new(false), host);

    let rc = within_timeout(move || hi_scanner_activate(handle));
    assert_eq!(rc, HiResultCode::DeviceUnavailable);
    assert_eq!(*host.seen_state.lock().unwrap(), vec![HiSessionState::Idle]);

    hi_scanner_destroy(handle);
}

// ── Permission gate ──────────────────────────────────────────────────────────

struct FakePlatform {
    status: Mutex<HiAuthorizationState>,
    last_request: AtomicU64,
    prompts: AtomicUsize,
}

fn platform(context: *mut c_void) -> &'static FakePlatform {
    unsafe { &*(context as *const FakePlatform) }
}

extern "C" fn authorization_status(context: *mut c_void) -> HiAuthorizationState {
    *platform(context).status.lock().unwrap()
}

extern "C" fn request_access(context: *mut c_void, request_id: u64) {
    let p = platform(context);
    p.prompts.fetch_add(1, Ordering::SeqCst);
    p.last_request.store(request_id, Ordering::SeqCst);
}

extern "C" fn access_answered(user_data: *mut c_void, granted: bool) {
    let answers = unsafe { &*(user_data as *const Mutex<Vec<bool>>) };
    answers.lock().unwrap().push(granted);
}

fn create_gate(status: HiAuthorizationState) -> (u64, &'static FakePlatform) {
    let p: &'static FakePlatform = Box::leak(Box::new(FakePlatform {
        status: Mutex::new(status),
        last_request: AtomicU64::new(0),
        prompts: AtomicUsize::new(0),
    }));
    let handle = hi_gate_create(HiPermissionVTable {
        context: p as *const FakePlatform as *mut c_void,
        authorization_status,
        request_access,
        open_settings: None,
    });
    (handle, p)
}

fn gate_status(handle: u64) -> HiAuthorizationState {
    let mut out = HiAuthorizationState::Unknown;
    assert_eq!(unsafe { hi_gate_query_status(handle, &mut out) }, HiResultCode::Ok);
    out
}

#[test]
fn test_gate_prompt_completes_once() {
    let (handle, p) = create_gate(HiAuthorizationState::Unknown);
    let answers: Mutex<Vec<bool>> = Mutex::new(Vec::new());
    let user_data = &answers as *const Mutex<Vec<bool>> as *mut c_void;

    let mut prompted = false;
    let rc = unsafe { hi_gate_request_access(handle, access_answered, user_data, &mut prompted) };
    assert_eq!(rc, HiResultCode::Ok);
    assert!(prompted);
    assert_eq!(p.prompts.load(Ordering::SeqCst), 1);

    let request_id = p.last_request.load(Ordering::SeqCst);
    assert_eq!(hi_gate_complete_request(handle, request_id, true), HiResultCode::Ok);
    assert_eq!(hi_gate_complete_request(handle, request_id, true), HiResultCode::NotFound);
    assert_eq!(*answers.lock().unwrap(), vec![true]);
    assert_eq!(gate_status(handle), HiAuthorizationState::Granted);

    let rc = unsafe { hi_gate_request_access(handle, access_answered, user_data, &mut prompted) };
    assert_eq!(rc, HiResultCode::Ok);
    assert!(!prompted);
    assert_eq!(p.prompts.load(Ordering::SeqCst), 1);
    assert_eq!(answers.lock().unwrap().len(), 1);

    assert_eq!(hi_gate_destroy(handle), HiResultCode::Ok);
}

#[test]
fn test_gate_denied_skips_prompt() {
    let (handle, p) = create_gate(HiAuthorizationState::Denied);
    let mut prompted = true;
    let rc = unsafe {
        hi_gate_request_access(handle, access_answered, ptr::null_mut(), &mut prompted)
    };
    assert_eq!(rc, HiResultCode::Ok);
    assert!(!prompted);
    assert_eq!(p.prompts.load(Ordering::SeqCst), 0);
    assert_eq!(hi_gate_open_settings(handle), HiResultCode::Ok);

    hi_gate_destroy(handle);
}

// ── Inventory ────────────────────────────────────────────────────────────────

#[test]
fn test_inventory_add_get_rename_remove() {
    let handle = hi_inventory_create(false);
    assert_eq!(hi_inventory_count(handle), 0);

    let barcode = CString::new("4006381333931").unwrap();
    let mut added = false;
    assert_eq!(
        unsafe { hi_inventory_add(handle, barcode.as_ptr(), &mut added) },
        HiResultCode::Ok
    );
    assert!(added);
    unsafe { hi_inventory_add(handle, barcode.as_ptr(), &mut added) };
    assert!(!added);
    assert_eq!(hi_inventory_count(handle), 1);

    let name = CString::new("Coffee grinder").unwrap();
    assert_eq!(
        unsafe { hi_inventory_rename(handle, 0, name.as_ptr()) },
        HiResultCode::Ok
    );

    let mut item = HiItem {
        id: ptr::null_mut(),
        name: ptr::null_mut(),
        barcode: ptr::null_mut(),
        date_added: 0,
        order: 0,
    };
    assert_eq!(unsafe { hi_inventory_get(handle, 0, &mut item) }, HiResultCode::Ok);
    assert_eq!(unsafe { CStr::from_ptr(item.name) }.to_str().unwrap(), "Coffee grinder");
    assert_eq!(unsafe { CStr::from_ptr(item.barcode) }.to_str().unwrap(), "4006381333931");
    assert!(item.date_added > 0);
    unsafe { hi_item_free(&mut item) };
    assert!(item.name.is_null());

    assert_eq!(unsafe { hi_inventory_get(handle, 5, &mut item) }, HiResultCode::NotFound);

    let indices = [0u32];
    let mut removed = 0u32;
    assert_eq!(
        unsafe { hi_inventory_remove_at(handle, indices.as_ptr(), 1, &mut removed) },
        HiResultCode::Ok
    );
    assert_eq!(removed, 1);
    assert_eq!(hi_inventory_count(handle), 0);

    assert_eq!(hi_inventory_destroy(handle), HiResultCode::Ok);
}

#[test]
fn test_inventory_demo_seed_and_move() {
    let handle = hi_inventory_create(true);
    assert_eq!(hi_inventory_count(handle), 3);
    assert_eq!(hi_inventory_move(handle, 0, 2), HiResultCode::Ok);
    assert_eq!(hi_inventory_move(handle, 0, 3), HiResultCode::InvalidArgument);
    hi_inventory_destroy(handle);
}

#[test]
fn test_inventory_add_rejects_null_barcode() {
    let handle = hi_inventory_create(false);
    let rc = unsafe { hi_inventory_add(handle, ptr::null(), ptr::null_mut()) };
    assert_eq!(rc, HiResultCode::InvalidArgument);
    hi_inventory_destroy(handle);
}
