//! Scanner screen logic: permission check, session activation and
//! UI-thread event handling, without any UI.

use crate::error::Error;
use crate::inbox::{UiEvent, UiInbox, UiSender};
use crate::observer::ScanObserver;
use crate::permission::{AuthorizationState, PermissionGate};
use crate::session::{MetadataListener, ScanSessionController, SessionState};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Hidden,
    AwaitingPermission,
    PermissionRequired,
    Scanning,
    Scanned,
    Failed,
}

pub struct ScanFlow {
    gate: PermissionGate,
    controller: ScanSessionController,
    inbox: UiInbox,
    observer: Arc<dyn ScanObserver>,
    status: FlowStatus,
}

impl ScanFlow {
    pub fn new(
        gate: PermissionGate,
        controller: ScanSessionController,
        observer: Arc<dyn ScanObserver>,
    ) -> Self {
        Self {
            gate,
            controller: controller.with_observer(Arc::clone(&observer)),
            inbox: UiInbox::new(),
            observer,
            status: FlowStatus::Hidden,
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.controller.result()
    }

    pub fn controller(&self) -> &ScanSessionController {
        &self.controller
    }

    /// Sender for camera delegates and other background producers.
    pub fn sender(&self) -> UiSender {
        self.inbox.sender()
    }

    /// The scanner became visible: check permission and start scanning if
    /// allowed, prompting when the status is still undetermined.
    pub fn appear(&mut self) -> Result<FlowStatus, Error> {
        match self.gate.query_status() {
            AuthorizationState::Granted => self.start_scanning()?,
            AuthorizationState::Denied => return Err(self.deny()),
            AuthorizationState::Unknown => {
                let sender = self.inbox.sender();
                let prompted = self.gate.request_access(move |granted| {
                    sender.post(UiEvent::AccessResolved(granted));
                });
                if prompted || self.gate.is_request_pending() {
                    self.status = FlowStatus::AwaitingPermission;
                } else if self.gate.query_status() == AuthorizationState::Granted {
                    self.start_scanning()?;
                } else {
                    return Err(self.deny());
                }
            }
        }
        Ok(self.status)
    }

    /// Apply every event already queued for the UI thread.
    pub fn pump(&mut self) -> Result<FlowStatus, Error> {
        for event in self.inbox.drain() {
            self.handle(event)?;
        }
        Ok(self.status)
    }

    /// Wait up to `timeout` for at least one event, then pump.
    pub fn pump_timeout(&mut self, timeout: Duration) -> Result<FlowStatus, Error> {
        if let Some(event) = self.inbox.next_timeout(timeout) {
            self.handle(event)?;
        }
        self.pump()
    }

    /// The scanner was dismissed.
    pub fn disappear(&mut self) -> Result<(), Error> {
        self.controller.deactivate()?;
        self.status = FlowStatus::Hidden;
        Ok(())
    }

    pub fn open_settings(&self) {
        self.gate.open_settings();
    }

    pub fn release(&mut self) {
        self.controller.release();
        self.status = FlowStatus::Hidden;
    }

    fn handle(&mut self, event: UiEvent) -> Result<(), Error> {
        match event {
            UiEvent::AccessResolved(true) => {
                if self.status == FlowStatus::AwaitingPermission {
                    self.start_scanning()?;
                } else {
                    debug!("Access granted while {:?}, not starting", self.status);
                }
            }
            UiEvent::AccessResolved(false) => return Err(self.deny()),
            UiEvent::Metadata(batch) => {
                self.controller.on_decoded(&batch);
                if self.status == FlowStatus::Scanning
                    && self.controller.state() == SessionState::Stopped
                    && self.controller.result().is_some()
                {
                    self.status = FlowStatus::Scanned;
                }
            }
        }
        Ok(())
    }

    fn start_scanning(&mut self) -> Result<(), Error> {
        match self.controller.activate() {
            Ok(()) => {
                self.status = FlowStatus::Scanning;
                Ok(())
            }
            Err(err) => {
                self.status = FlowStatus::Failed;
                Err(err)
            }
        }
    }

    fn deny(&mut self) -> Error {
        info!("Camera permission denied, scanner needs settings");
        self.status = FlowStatus::PermissionRequired;
        self.observer.on_permission_denied();
        Error::PermissionDenied
    }
}
