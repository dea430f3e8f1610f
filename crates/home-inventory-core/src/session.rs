//! Scan session lifecycle.
//!
//! ```text
//! Idle -> Configuring -> Running -> Stopped -> (activate) -> Running ...
//!   any state -> release() -> Released
//! ```
//!
//! The controller is driven from a single thread (the UI thread). Metadata
//! batches reach it through [`MetadataListener::on_decoded`]; the first
//! readable code of an active session wins, the session flips to `Stopped`
//! before anything else happens, and the host hears about it exactly once.

use crate::capture::{CapturePipeline, CaptureWorker, Feedback};
use crate::config::AppConfig;
use crate::error::Error;
use crate::observer::{ScanObserver, SilentObserver};
use crate::symbology::{BarcodeFormat, MetadataObject};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Configuring,
    Running,
    Stopped,
    Released,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Configuring => "configuring",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
            SessionState::Released => "released",
        };
        f.write_str(name)
    }
}

/// Receiver of detector output. Implementations must be called on the thread
/// that owns the controller.
pub trait MetadataListener {
    fn on_decoded(&mut self, batch: &[MetadataObject]);
}

pub struct ScanSessionController {
    state: SessionState,
    result: Option<String>,
    configured: bool,
    activations: u64,
    symbologies: Vec<BarcodeFormat>,
    haptic_feedback: bool,
    worker: CaptureWorker,
    observer: Arc<dyn ScanObserver>,
}

impl ScanSessionController {
    pub fn new(
        pipeline: Box<dyn CapturePipeline>,
        feedback: Box<dyn Feedback>,
        config: &AppConfig,
    ) -> Result<Self, Error> {
        let worker = CaptureWorker::spawn(pipeline, feedback)?;
        Ok(Self {
            state: SessionState::Idle,
            result: None,
            configured: false,
            activations: 0,
            symbologies: config.symbologies.clone(),
            haptic_feedback: config.haptic_feedback,
            worker,
            observer: Arc::new(SilentObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == SessionState::Running
    }

    /// The value accepted by the current (or last) activation.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Number of activations that reached `Running`.
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Start a new activation. A no-op while already running.
    ///
    /// Any result from a previous activation is cleared before frames are
    /// analysed again. The capture pipeline is configured on first use; if
    /// that fails the controller returns to `Idle`, the observer is told
    /// once, and capture never starts.
    pub fn activate(&mut self) -> Result<(), Error> {
        match self.state {
            SessionState::Released => return Err(Error::Released),
            SessionState::Running | SessionState::Configuring => {
                trace!("activate ignored, session already {}", self.state);
                return Ok(());
            }
            SessionState::Idle | SessionState::Stopped => {}
        }

        if let Some(stale) = self.result.take() {
            debug!("Cleared result '{}' from previous activation", stale);
        }

        self.transition(SessionState::Configuring);
        if !self.configured {
            if let Err(err) = self.worker.configure(&self.symbologies) {
                return Err(self.fail_configuration(err));
            }
            self.configured = true;
        }

        if let Err(err) = self.worker.start() {
            self.configured = false;
            return Err(self.fail_configuration(err));
        }

        self.activations += 1;
        self.transition(SessionState::Running);
        Ok(())
    }

    /// Stop analysing frames. Idempotent; stays `Idle` if never started.
    pub fn deactivate(&mut self) -> Result<(), Error> {
        match self.state {
            SessionState::Released => Err(Error::Released),
            SessionState::Idle | SessionState::Stopped => Ok(()),
            SessionState::Configuring | SessionState::Running => {
                self.transition(SessionState::Stopped);
                self.request_stop();
                Ok(())
            }
        }
    }

    /// Tear the pipeline and preview down synchronously. Terminal.
    pub fn release(&mut self) {
        if self.state == SessionState::Released {
            return;
        }
        self.worker.shutdown();
        self.configured = false;
        self.transition(SessionState::Released);
    }

    /// Block until queued start/stop requests have reached the pipeline.
    pub fn settle(&self) -> Result<(), Error> {
        if self.state == SessionState::Released {
            return Err(Error::Released);
        }
        self.worker.settle()
    }

    fn accept(&mut self, format: BarcodeFormat, value: String) {
        // Flip state first so nothing queued behind this batch can re-enter.
        self.transition(SessionState::Stopped);
        self.request_stop();
        if self.haptic_feedback {
            if let Err(e) = self.worker.acknowledge() {
                warn!("Could not schedule scan acknowledgment: {}", e);
            }
        }

        info!("Accepted {} barcode '{}'", format, value);
        self.result = Some(value);
        if let Some(value) = self.result.as_deref() {
            self.observer.on_barcode_decoded(value);
        }
    }

    fn request_stop(&self) {
        if let Err(e) = self.worker.stop() {
            warn!("Could not request capture stop: {}", e);
        }
    }

    fn fail_configuration(&mut self, err: Error) -> Error {
        warn!("Camera configuration failed: {}", err);
        self.transition(SessionState::Idle);
        self.observer.on_configuration_error(&err);
        err
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!("Scan session {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

impl MetadataListener for ScanSessionController {
    fn on_decoded(&mut self, batch: &[MetadataObject]) {
        if self.state != SessionState::Running {
            trace!("Dropping metadata batch of {} while {}", batch.len(), self.state);
            return;
        }

        let accepted = batch
            .iter()
            .filter_map(MetadataObject::readable)
            .find(|code| self.symbologies.contains(&code.format))
            .map(|code| (code.format, code.value.clone()));

        match accepted {
            Some((format, value)) => self.accept(format, value),
            None => trace!("No readable code among {} metadata objects", batch.len()),
        }
    }
}

impl Drop for ScanSessionController {
    fn drop(&mut self) {
        self.release();
    }
}
