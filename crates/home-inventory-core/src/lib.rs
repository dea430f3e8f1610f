pub mod capture;
pub mod config;
pub mod error;
pub mod flow;
pub mod inbox;
pub mod inventory;
pub mod observer;
pub mod permission;
pub mod session;
pub mod simulated;
pub mod symbology;

pub use crate::config::AppConfig;
pub use error::Error;
pub use flow::{FlowStatus, ScanFlow};
pub use inbox::{UiEvent, UiInbox, UiSender};
pub use inventory::{Inventory, Item};
pub use observer::{ScanObserver, SilentObserver};
pub use permission::{AuthorizationState, PermissionGate, PermissionPlatform};
pub use session::{MetadataListener, ScanSessionController, SessionState};
pub use symbology::{BarcodeFormat, DecodedCode, MetadataObject};
