mod commands;
mod logging;
mod progress;

use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, PermissionMode};
use dotenv::dotenv;
use home_inventory_core::simulated::{
    FrameFeeder, SimulatedCamera, SimulatedPermissions, UserAnswer,
};
use home_inventory_core::{
    AppConfig, AuthorizationState, BarcodeFormat, DecodedCode, Error, FlowStatus, Inventory,
    PermissionGate, ScanFlow, ScanSessionController,
};
use progress::{CliObserver, TerminalBell};
use tracing::{error, info, warn};

const FRAME_INTERVAL: Duration = Duration::from_millis(150);
const PUMP_INTERVAL: Duration = Duration::from_millis(50);

struct ScanArgs {
    codes: Vec<String>,
    format: BarcodeFormat,
    permission: PermissionMode,
    no_camera: bool,
    timeout: Duration,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match home_inventory_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Scan {
            codes,
            format,
            permission,
            no_camera,
            timeout_ms,
        }) => {
            let format: BarcodeFormat = format.parse()?;
            let scan = ScanArgs {
                codes,
                format,
                permission,
                no_camera,
                timeout: Duration::from_millis(timeout_ms),
            };
            if let Err(err) = run_scan(&config, scan) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::List { json }) => {
            let inventory = starting_inventory(&config);
            if json {
                println!("{}", serde_json::to_string_pretty(inventory.items())?);
            } else {
                print_inventory(&inventory);
            }
        }
        Some(Commands::Symbologies) => {
            for format in BarcodeFormat::ALL {
                let marker = if config.accepts(format) { "✓".green() } else { "·".dimmed() };
                println!("{} {}", marker, format);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_scan(config: &AppConfig, args: ScanArgs) -> Result<(), Error> {
    let (status, answer) = match args.permission {
        PermissionMode::Grant => (AuthorizationState::Unknown, UserAnswer::Grant),
        PermissionMode::Deny => (AuthorizationState::Unknown, UserAnswer::Deny),
        PermissionMode::Granted => (AuthorizationState::Granted, UserAnswer::Grant),
        PermissionMode::Denied => (AuthorizationState::Denied, UserAnswer::Deny),
    };
    let gate = PermissionGate::init(Arc::new(SimulatedPermissions::new(status, answer)));

    let camera = if args.no_camera {
        SimulatedCamera::new().without_device()
    } else {
        SimulatedCamera::new()
    };
    let controller = ScanSessionController::new(Box::new(camera), Box::new(TerminalBell), config)?;

    let observer = Arc::new(CliObserver::new(starting_inventory(config)));
    let mut flow = ScanFlow::new(gate, controller, observer.clone());

    let outcome = drive(&mut flow, &observer, &args);
    observer.finish_spinner();

    match outcome {
        Ok(FlowStatus::Scanned) => {
            thread::sleep(Duration::from_millis(config.dismiss_delay_ms));
            flow.disappear()?;
        }
        Ok(status) => {
            warn!("Scanner closed without a result ({:?})", status);
            flow.disappear()?;
        }
        Err(Error::PermissionDenied) => {
            info!("Opening settings so camera access can be enabled");
            flow.open_settings();
        }
        Err(err) if err.is_configuration_error() => {
            // Already reported to the user by the observer.
        }
        Err(err) => return Err(err),
    }
    flow.release();

    println!();
    print_inventory(&observer.inventory());
    Ok(())
}

fn drive(flow: &mut ScanFlow, observer: &CliObserver, args: &ScanArgs) -> Result<FlowStatus, Error> {
    let deadline = Instant::now() + args.timeout;

    let mut status = flow.appear()?;
    if status == FlowStatus::AwaitingPermission {
        observer.start_spinner("Waiting for camera permission...");
        while status == FlowStatus::AwaitingPermission && Instant::now() < deadline {
            status = flow.pump_timeout(PUMP_INTERVAL)?;
        }
    }
    if status != FlowStatus::Scanning {
        return Ok(status);
    }

    observer.start_spinner("Point the camera at a barcode...");
    let batches = args
        .codes
        .iter()
        .map(|value| vec![DecodedCode::new(args.format, value.clone()).into()])
        .collect();
    // Detached: the feeder stops once the flow and its inbox are dropped.
    let _feeder = FrameFeeder::spawn(flow.sender(), batches, FRAME_INTERVAL);

    while status == FlowStatus::Scanning && Instant::now() < deadline {
        status = flow.pump_timeout(PUMP_INTERVAL)?;
    }
    Ok(status)
}

fn starting_inventory(config: &AppConfig) -> Inventory {
    if config.seed_demo_items {
        Inventory::with_demo_items()
    } else {
        Inventory::new()
    }
}

fn print_inventory(inventory: &Inventory) {
    if inventory.is_empty() {
        println!("Inventory is empty. Scan a barcode to add an item.");
        return;
    }

    println!("{}", "Inventory".bold());
    for item in inventory.items() {
        let name = if item.name.is_empty() {
            "(unnamed)".dimmed().to_string()
        } else {
            item.name.clone()
        };
        println!(
            "{:>3}. {:<24} {}  {}",
            item.order + 1,
            name,
            item.barcode.cyan(),
            item.date_added.format("%Y-%m-%d %H:%M").to_string().dimmed(),
        );
    }
}
