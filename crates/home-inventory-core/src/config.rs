use crate::symbology::BarcodeFormat;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_symbologies")]
    pub symbologies: Vec<BarcodeFormat>,
    #[serde(default = "default_true")]
    pub haptic_feedback: bool,
    #[serde(default = "default_dismiss_delay_ms")]
    pub dismiss_delay_ms: u64,
    #[serde(default = "default_true")]
    pub seed_demo_items: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbologies: default_symbologies(),
            haptic_feedback: true,
            dismiss_delay_ms: default_dismiss_delay_ms(),
            seed_demo_items: true,
        }
    }
}

impl AppConfig {
    pub fn accepts(&self, format: BarcodeFormat) -> bool {
        self.symbologies.contains(&format)
    }
}

fn default_symbologies() -> Vec<BarcodeFormat> {
    BarcodeFormat::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

fn default_dismiss_delay_ms() -> u64 {
    1000
}

/// Load `Config.*` from the working directory (optional) with
/// `HOME_INVENTORY_*` environment overrides.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("HOME_INVENTORY").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::from(path))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
