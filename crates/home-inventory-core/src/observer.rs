use crate::error::Error;

/// Host callbacks for a scan session.
///
/// The CLI implements this with tracing and a spinner, the FFI layer forwards
/// to C function pointers. All methods have default no-op implementations.
/// Calls always arrive on the thread that drives the controller.
pub trait ScanObserver: Send + Sync {
    fn on_barcode_decoded(&self, _value: &str) {}
    fn on_configuration_error(&self, _error: &Error) {}
    fn on_permission_denied(&self) {}
}

/// No-op observer for silent operation.
pub struct SilentObserver;

impl ScanObserver for SilentObserver {}
