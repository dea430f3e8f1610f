//! C ABI for native hosts. The host supplies the camera and permission
//! platform as function tables and receives scan results through callbacks.

#[macro_use]
extern crate lazy_static;

pub mod callbacks;
pub mod error;
pub mod gate;
pub mod handle;
pub mod inventory;
pub mod scanner;
pub mod types;
