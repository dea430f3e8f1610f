use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    Unknown,
    Granted,
    Denied,
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthorizationState::Unknown => "unknown",
            AuthorizationState::Granted => "granted",
            AuthorizationState::Denied => "denied",
        };
        f.write_str(name)
    }
}

pub type AccessCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Process-wide camera authorization owned by the host platform.
pub trait PermissionPlatform: Send + Sync {
    /// Current status without prompting. Restricted maps to `Denied`.
    fn authorization_status(&self) -> AuthorizationState;

    /// Show the one-time system prompt and call `done` exactly once when the
    /// user answers, from any thread.
    fn request_access(&self, done: AccessCallback);

    /// Send the user to the system settings page for this app.
    fn open_settings(&self) {}
}

const UNRESOLVED: u8 = 0;
const GRANTED: u8 = 1;
const DENIED: u8 = 2;

/// Thin read/request façade over the platform authorization state.
///
/// Once the platform reports `Granted` or `Denied` the gate pins that answer
/// for the rest of the process.
#[derive(Clone)]
pub struct PermissionGate {
    platform: Arc<dyn PermissionPlatform>,
    resolved: Arc<AtomicU8>,
    pending: Arc<AtomicBool>,
}

impl PermissionGate {
    /// Create the gate and perform the first status query.
    pub fn init(platform: Arc<dyn PermissionPlatform>) -> Self {
        let gate = Self {
            platform,
            resolved: Arc::new(AtomicU8::new(UNRESOLVED)),
            pending: Arc::new(AtomicBool::new(false)),
        };
        let status = gate.query_status();
        debug!("Camera authorization at startup: {}", status);
        gate
    }

    pub fn query_status(&self) -> AuthorizationState {
        match self.resolved.load(Ordering::Acquire) {
            GRANTED => AuthorizationState::Granted,
            DENIED => AuthorizationState::Denied,
            _ => {
                let status = self.platform.authorization_status();
                pin(&self.resolved, status);
                status
            }
        }
    }

    /// Prompt the user if, and only if, the status is still `Unknown` and no
    /// prompt is outstanding. `callback` fires exactly once, asynchronously,
    /// when a prompt was issued, and never otherwise. Returns whether a
    /// prompt was issued.
    pub fn request_access<F>(&self, callback: F) -> bool
    where
        F: FnOnce(bool) + Send + 'static,
    {
        if self.query_status() != AuthorizationState::Unknown {
            return false;
        }
        if self.pending.swap(true, Ordering::AcqRel) {
            debug!("Camera permission prompt already outstanding");
            return false;
        }

        info!("Requesting camera access");
        let resolved = Arc::clone(&self.resolved);
        let pending = Arc::clone(&self.pending);
        self.platform.request_access(Box::new(move |granted| {
            let status = if granted {
                AuthorizationState::Granted
            } else {
                AuthorizationState::Denied
            };
            pin(&resolved, status);
            pending.store(false, Ordering::Release);
            info!("Camera access {}", status);
            callback(granted);
        }));
        true
    }

    pub fn is_request_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn open_settings(&self) {
        self.platform.open_settings();
    }
}

fn pin(resolved: &AtomicU8, status: AuthorizationState) {
    let value = match status {
        AuthorizationState::Granted => GRANTED,
        AuthorizationState::Denied => DENIED,
        AuthorizationState::Unknown => return,
    };
    let _ = resolved.compare_exchange(UNRESOLVED, value, Ordering::AcqRel, Ordering::Acquire);
}
