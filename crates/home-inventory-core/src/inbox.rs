//! Single-consumer event queue owned by the UI thread.
//!
//! Camera delegates and permission completions fire on arbitrary threads.
//! They post into a [`UiSender`]; the UI thread drains the [`UiInbox`] and
//! applies each event to the controller, so controller state is only ever
//! touched from one thread.

use crate::symbology::MetadataObject;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Metadata(Vec<MetadataObject>),
    AccessResolved(bool),
}

#[derive(Debug, Clone)]
pub struct UiSender {
    tx: Sender<UiEvent>,
}

impl UiSender {
    /// Post an event. Returns false once the inbox has been dropped.
    pub fn post(&self, event: UiEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

#[derive(Debug)]
pub struct UiInbox {
    rx: Receiver<UiEvent>,
    tx: Sender<UiEvent>,
}

impl UiInbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { rx, tx }
    }

    pub fn sender(&self) -> UiSender {
        UiSender {
            tx: self.tx.clone(),
        }
    }

    /// Take every event that is already queued.
    pub fn drain(&self) -> Vec<UiEvent> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<UiEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Default for UiInbox {
    fn default() -> Self {
        Self::new()
    }
}
