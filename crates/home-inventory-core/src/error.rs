use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Camera access was denied")]
    PermissionDenied,

    #[error("No camera device is available")]
    DeviceUnavailable,

    #[error("Capture session could not be configured: {0}")]
    ConfigurationFailed(String),

    #[error("Scan session has been released")]
    Released,

    #[error("Capture worker is not running")]
    WorkerUnavailable,

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("No inventory item with id {0}")]
    ItemNotFound(uuid::Uuid),
}

impl Error {
    /// Whether this error belongs to the camera setup path reported through
    /// `ScanObserver::on_configuration_error`.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::DeviceUnavailable | Error::ConfigurationFailed(_) | Error::WorkerUnavailable
        )
    }
}
