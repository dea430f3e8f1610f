use colored::*;
use home_inventory_core::capture::Feedback;
use home_inventory_core::{Error, Inventory, ScanObserver};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Terminal host for a scan session: a spinner while waiting, one line per
/// outcome, and the in-memory inventory that scanned codes land in.
pub struct CliObserver {
    bar: Mutex<Option<ProgressBar>>,
    inventory: Mutex<Inventory>,
}

impl CliObserver {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            bar: Mutex::new(None),
            inventory: Mutex::new(inventory),
        }
    }

    pub fn start_spinner(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));

        let mut guard = lock(&self.bar);
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    pub fn finish_spinner(&self) {
        if let Some(pb) = lock(&self.bar).take() {
            pb.finish_and_clear();
        }
    }

    pub fn inventory(&self) -> MutexGuard<'_, Inventory> {
        lock(&self.inventory)
    }
}

impl ScanObserver for CliObserver {
    fn on_barcode_decoded(&self, value: &str) {
        self.finish_spinner();
        eprintln!("  {} Scanned: {}", "✓".green(), value.bold());
        if self.inventory().add_item(value).is_none() {
            eprintln!("  {} {} is already in the inventory", "!".yellow(), value);
        }
    }

    fn on_configuration_error(&self, error: &Error) {
        self.finish_spinner();
        eprintln!("  {} Camera unavailable: {}", "✗".red(), error);
    }

    fn on_permission_denied(&self) {
        self.finish_spinner();
        eprintln!(
            "  {} Camera access is required to scan barcodes. Enable it in Settings.",
            "✗".red()
        );
    }
}

/// Rings the terminal bell in place of a vibration.
pub struct TerminalBell;

impl Feedback for TerminalBell {
    fn acknowledge(&mut self) {
        let mut stderr = io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
