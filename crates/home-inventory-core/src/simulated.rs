//! In-process stand-ins for the camera and the permission platform.
//!
//! Used by the desktop CLI and by tests; a native host replaces both through
//! the FFI layer.

use crate::capture::{CapturePipeline, Feedback};
use crate::error::Error;
use crate::inbox::{UiEvent, UiSender};
use crate::permission::{AccessCallback, AuthorizationState, PermissionPlatform};
use crate::symbology::{BarcodeFormat, MetadataObject};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraCall {
    AcquireDevice,
    BindMetadataOutput(Vec<BarcodeFormat>),
    AttachPreview,
    StartRunning,
    StopRunning,
    Teardown,
}

#[derive(Debug)]
struct CameraInner {
    has_device: bool,
    output_fails: bool,
    running: bool,
    calls: Vec<CameraCall>,
}

/// Capture pipeline that records every call made to it.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    inner: Arc<Mutex<CameraInner>>,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CameraInner {
                has_device: true,
                output_fails: false,
                running: false,
                calls: Vec::new(),
            })),
        }
    }

    /// Behave like hardware without a camera.
    pub fn without_device(self) -> Self {
        self.lock().has_device = false;
        self
    }

    /// Refuse the metadata output, as under resource contention.
    pub fn with_failing_output(self) -> Self {
        self.lock().output_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<CameraCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CameraInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: CameraCall) -> MutexGuard<'_, CameraInner> {
        let mut inner = self.lock();
        inner.calls.push(call);
        inner
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CapturePipeline for SimulatedCamera {
    fn acquire_device(&mut self) -> Result<(), Error> {
        if self.record(CameraCall::AcquireDevice).has_device {
            Ok(())
        } else {
            Err(Error::DeviceUnavailable)
        }
    }

    fn bind_metadata_output(&mut self, symbologies: &[BarcodeFormat]) -> Result<(), Error> {
        let inner = self.record(CameraCall::BindMetadataOutput(symbologies.to_vec()));
        if inner.output_fails {
            Err(Error::ConfigurationFailed(
                "metadata output could not be added to the session".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn attach_preview(&mut self) -> Result<(), Error> {
        self.record(CameraCall::AttachPreview);
        Ok(())
    }

    fn start_running(&mut self) {
        self.record(CameraCall::StartRunning).running = true;
    }

    fn stop_running(&mut self) {
        self.record(CameraCall::StopRunning).running = false;
    }

    fn is_running(&self) -> bool {
        self.lock().running
    }

    fn teardown(&mut self) {
        self.record(CameraCall::Teardown).running = false;
    }
}

/// Counts acknowledgments instead of vibrating.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHaptics {
    count: Arc<AtomicUsize>,
}

impl SimulatedHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Feedback for SimulatedHaptics {
    fn acknowledge(&mut self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Posts scripted metadata batches into the UI inbox from a background
/// thread, the way a camera delegate would.
pub struct FrameFeeder;

impl FrameFeeder {
    pub fn spawn(
        sender: UiSender,
        batches: Vec<Vec<MetadataObject>>,
        interval: Duration,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            for batch in batches {
                thread::sleep(interval);
                if !sender.post(UiEvent::Metadata(batch)) {
                    break;
                }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAnswer {
    Grant,
    Deny,
}

#[derive(Debug)]
struct PermissionsInner {
    status: Mutex<AuthorizationState>,
    answer: UserAnswer,
    prompts: AtomicUsize,
    settings_opened: AtomicUsize,
}

/// Authorization state shared by every clone, answering prompts on a
/// background thread with a scripted user answer.
#[derive(Debug, Clone)]
pub struct SimulatedPermissions {
    inner: Arc<PermissionsInner>,
    delay: Duration,
}

impl SimulatedPermissions {
    pub fn new(status: AuthorizationState, answer: UserAnswer) -> Self {
        Self {
            inner: Arc::new(PermissionsInner {
                status: Mutex::new(status),
                answer,
                prompts: AtomicUsize::new(0),
                settings_opened: AtomicUsize::new(0),
            }),
            delay: Duration::from_millis(10),
        }
    }

    /// How long the simulated user takes to answer a prompt.
    pub fn with_answer_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Change the platform status behind the gate's back.
    pub fn set_status(&self, status: AuthorizationState) {
        *self.status() = status;
    }

    pub fn prompt_count(&self) -> usize {
        self.inner.prompts.load(Ordering::SeqCst)
    }

    pub fn settings_opened(&self) -> usize {
        self.inner.settings_opened.load(Ordering::SeqCst)
    }

    fn status(&self) -> MutexGuard<'_, AuthorizationState> {
        self.inner.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PermissionPlatform for SimulatedPermissions {
    fn authorization_status(&self) -> AuthorizationState {
        *self.status()
    }

    fn request_access(&self, done: AccessCallback) {
        self.inner.prompts.fetch_add(1, Ordering::SeqCst);
        let this = self.clone();
        thread::spawn(move || {
            thread::sleep(this.delay);
            let granted = this.inner.answer == UserAnswer::Grant;
            this.set_status(if granted {
                AuthorizationState::Granted
            } else {
                AuthorizationState::Denied
            });
            debug!("Simulated user answered camera prompt: granted={}", granted);
            done(granted);
        });
    }

    fn open_settings(&self) {
        self.inner.settings_opened.fetch_add(1, Ordering::SeqCst);
    }
}
