use crate::callbacks::{FfiPermissions, SendPtr};
use crate::error::set_last_error;
use crate::handle::{GateState, GATES};
use crate::types::*;
use home_inventory_core::{AuthorizationState, PermissionGate};
use std::ffi::c_void;
use std::sync::Arc;

/// Create a permission gate over the host platform and perform the first
/// status query. Returns a handle.
#[no_mangle]
pub extern "C" fn hi_gate_create(platform: HiPermissionVTable) -> u64 {
    let platform = Arc::new(FfiPermissions::new(platform));
    let gate = PermissionGate::init(platform.clone());
    GATES.allocate(GateState { gate, platform })
}

#[no_mangle]
pub extern "C" fn hi_gate_destroy(handle: u64) -> HiResultCode {
    if GATES.destroy(handle) {
        HiResultCode::Ok
    } else {
        set_last_error("Invalid handle".to_string());
        HiResultCode::InvalidHandle
    }
}

/// # Safety
/// `out_state` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn hi_gate_query_status(
    handle: u64,
    out_state: *mut HiAuthorizationState,
) -> HiResultCode {
    if out_state.is_null() {
        set_last_error("out_state is null".to_string());
        return HiResultCode::InvalidArgument;
    }

    let Some(gate) = GATES.with(handle, |state| state.gate.clone()) else {
        return HiResultCode::InvalidHandle;
    };

    *out_state = match gate.query_status() {
        AuthorizationState::Unknown => HiAuthorizationState::Unknown,
        AuthorizationState::Granted => HiAuthorizationState::Granted,
        AuthorizationState::Denied => HiAuthorizationState::Denied,
    };
    HiResultCode::Ok
}

/// Prompt for camera access if the status is still undetermined.
/// `callback` fires exactly once when a prompt was issued and never
/// otherwise; `out_prompted` (optional) reports which happened.
///
/// # Safety
/// `out_prompted` must be null or a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn hi_gate_request_access(
    handle: u64,
    callback: HiAccessCallback,
    user_data: *mut c_void,
    out_prompted: *mut bool,
) -> HiResultCode {
    // Call outside the registry lock: the host may complete the request
    // synchronously from inside its prompt function.
    let Some(gate) = GATES.with(handle, |state| state.gate.clone()) else {
        return HiResultCode::InvalidHandle;
    };

    let user_data = SendPtr::new(user_data);
    let prompted = gate.request_access(move |granted| callback(user_data.get(), granted));

    if !out_prompted.is_null() {
        *out_prompted = prompted;
    }
    HiResultCode::Ok
}

/// Report the user's answer for a prompt started through the platform
/// table's `request_access`.
#[no_mangle]
pub extern "C" fn hi_gate_complete_request(
    handle: u64,
    request_id: u64,
    granted: bool,
) -> HiResultCode {
    let Some(platform) = GATES.with(handle, |state| Arc::clone(&state.platform)) else {
        return HiResultCode::InvalidHandle;
    };

    if platform.complete(request_id, granted) {
        HiResultCode::Ok
    } else {
        set_last_error(format!("No pending permission request {}", request_id));
        HiResultCode::NotFound
    }
}

#[no_mangle]
pub extern "C" fn hi_gate_open_settings(handle: u64) -> HiResultCode {
    let Some(gate) = GATES.with(handle, |state| state.gate.clone()) else {
        return HiResultCode::InvalidHandle;
    };
    gate.open_settings();
    HiResultCode::Ok
}
