//! Platform camera seam and the background worker that drives it.
//!
//! A [`CapturePipeline`] wraps whatever the host platform uses for device
//! enumeration, capture sessions and metadata detection. The
//! [`CaptureWorker`] owns the pipeline on its own thread so starting and
//! stopping capture never blocks the thread that owns UI state.

use crate::error::Error;
use crate::symbology::BarcodeFormat;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Camera capture primitives supplied by the host platform.
pub trait CapturePipeline: Send {
    /// Acquire the default video input. `Error::DeviceUnavailable` when the
    /// device has no camera.
    fn acquire_device(&mut self) -> Result<(), Error>;

    /// Attach a metadata detection output limited to `symbologies`.
    fn bind_metadata_output(&mut self, symbologies: &[BarcodeFormat]) -> Result<(), Error>;

    fn attach_preview(&mut self) -> Result<(), Error>;

    fn start_running(&mut self);

    fn stop_running(&mut self);

    fn is_running(&self) -> bool;

    /// Release the device, the output and the preview surface.
    fn teardown(&mut self);
}

/// Haptic/audio acknowledgment played when a code is accepted.
pub trait Feedback: Send {
    fn acknowledge(&mut self);
}

pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn acknowledge(&mut self) {}
}

enum Request {
    Configure {
        symbologies: Vec<BarcodeFormat>,
        reply: Sender<Result<(), Error>>,
    },
    Start,
    Stop,
    Acknowledge,
    Settle(Sender<()>),
    Teardown(Sender<()>),
}

/// Serial background executor that exclusively owns a capture pipeline.
///
/// Configure and teardown are synchronous round trips. Start, stop and
/// acknowledge are fire-and-forget and run in submission order.
pub struct CaptureWorker {
    tx: Option<Sender<Request>>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    pub fn spawn(
        pipeline: Box<dyn CapturePipeline>,
        feedback: Box<dyn Feedback>,
    ) -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("capture-worker".to_string())
            .spawn(move || run(pipeline, feedback, rx))
            .map_err(|e| {
                warn!("Failed to spawn capture worker: {}", e);
                Error::WorkerUnavailable
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn configure(&self, symbologies: &[BarcodeFormat]) -> Result<(), Error> {
        let (reply, response) = mpsc::channel();
        self.send(Request::Configure {
            symbologies: symbologies.to_vec(),
            reply,
        })?;
        response.recv().map_err(|_| Error::WorkerUnavailable)?
    }

    pub fn start(&self) -> Result<(), Error> {
        self.send(Request::Start)
    }

    /// Stopping a pipeline that is not running is a no-op.
    pub fn stop(&self) -> Result<(), Error> {
        self.send(Request::Stop)
    }

    pub fn acknowledge(&self) -> Result<(), Error> {
        self.send(Request::Acknowledge)
    }

    /// Block until every request queued so far has been executed.
    pub fn settle(&self) -> Result<(), Error> {
        let (reply, done) = mpsc::channel();
        self.send(Request::Settle(reply))?;
        done.recv().map_err(|_| Error::WorkerUnavailable)
    }

    /// Tear the pipeline down and join the worker. Safe to call twice.
    pub fn shutdown(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };

        let (reply, done) = mpsc::channel();
        if tx.send(Request::Teardown(reply)).is_ok() {
            let _ = done.recv();
        }
        drop(tx);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Capture worker panicked during shutdown");
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.tx.is_none()
    }

    fn send(&self, request: Request) -> Result<(), Error> {
        let tx = self.tx.as_ref().ok_or(Error::WorkerUnavailable)?;
        tx.send(request).map_err(|_| Error::WorkerUnavailable)
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    mut pipeline: Box<dyn CapturePipeline>,
    mut feedback: Box<dyn Feedback>,
    rx: Receiver<Request>,
) {
    while let Ok(request) = rx.recv() {
        match request {
            Request::Configure { symbologies, reply } => {
                let result = configure(pipeline.as_mut(), &symbologies);
                if result.is_err() {
                    // Never leave a half-attached session behind.
                    pipeline.teardown();
                }
                let _ = reply.send(result);
            }
            Request::Start => {
                if !pipeline.is_running() {
                    debug!("Starting capture");
                    pipeline.start_running();
                }
            }
            Request::Stop => {
                if pipeline.is_running() {
                    debug!("Stopping capture");
                    pipeline.stop_running();
                } else {
                    trace!("Stop requested on idle pipeline");
                }
            }
            Request::Acknowledge => feedback.acknowledge(),
            Request::Settle(reply) => {
                let _ = reply.send(());
            }
            Request::Teardown(reply) => {
                if pipeline.is_running() {
                    pipeline.stop_running();
                }
                pipeline.teardown();
                let _ = reply.send(());
                break;
            }
        }
    }
}

fn configure(pipeline: &mut dyn CapturePipeline, symbologies: &[BarcodeFormat]) -> Result<(), Error> {
    pipeline.acquire_device()?;
    pipeline.bind_metadata_output(symbologies)?;
    pipeline.attach_preview()
}
