use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "home-inventory")]
#[command(about = "Scan barcodes into a home inventory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one scan session against the simulated camera
    Scan {
        /// Codes the simulated camera sees, one frame each, in order
        #[arg(long = "code", value_name = "VALUE")]
        codes: Vec<String>,

        /// Symbology reported for the simulated codes
        #[arg(long, default_value = "ean13")]
        format: String,

        /// Camera permission state and how the simulated user answers the prompt
        #[arg(long, value_enum, default_value_t = PermissionMode::Grant)]
        permission: PermissionMode,

        /// Simulate hardware without a camera
        #[arg(long)]
        no_camera: bool,

        /// Give up after this many milliseconds without a result
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
    /// Print the inventory list
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the barcode symbologies the scanner recognises
    Symbologies,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionMode {
    /// Undetermined; the user allows camera access when prompted
    Grant,
    /// Undetermined; the user refuses camera access when prompted
    Deny,
    /// Already granted
    Granted,
    /// Already denied or restricted
    Denied,
}
