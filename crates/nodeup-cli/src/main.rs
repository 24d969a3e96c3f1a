//! `nodeup-cli` – host runner for the node bring-up
//!
//! Boots a complete node against the sim layer:
//!
//! 1. Sets up logging ([`nodeup_runtime::init_tracing`]).
//! 2. Loads `~/.nodeup/config.toml` (see [`config`]) for the app name,
//!    event queue depth and injected faults.
//! 3. Runs the process entry point: vendor platform init, application
//!    init, bring-up, then the scheduler.
//! 4. Keeps the scheduler running until **Ctrl-C**, then reports how the
//!    boot went. The exit status is always 0.

mod config;

use std::sync::Arc;

use colored::Colorize;
use tokio::sync::Notify;
use tracing::{info, warn};

use nodeup_middleware::Scheduler;
use nodeup_runtime::{AppFeatures, BuildConfig, EntryOutcome, SimNodeBuilder};

fn main() {
    let guard = nodeup_runtime::init_tracing("nodeup");

    print_banner(&BuildConfig::CURRENT, &AppFeatures::CURRENT);

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };
    info!(?cfg, "configuration loaded");

    let scheduler = match Scheduler::new() {
        Ok(s) => s,
        Err(e) => {
            println!("{}: {}", "Scheduler error".red(), e);
            return;
        }
    };

    // ── Ctrl-C stops the scheduler ────────────────────────────────────────
    let stop = Arc::new(Notify::new());
    let stop_handler = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || stop_handler.notify_one()) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the scheduler will run until killed");
    }

    let (entry, _hw) = SimNodeBuilder::new()
        .app_name(cfg.app_name.clone())
        .event_queue_capacity(cfg.event_queue_capacity)
        .faults(cfg.fault_plan())
        .build_entry(scheduler);

    println!("  Node running. Press {} to stop.\n", "Ctrl-C".bold());
    let outcome = entry.run(async move { stop.notified().await });

    println!();
    println!("  {}", outcome_line(&outcome));
    let code = outcome.exit_code();
    drop(outcome);
    drop(guard);
    std::process::exit(code);
}

fn outcome_line(outcome: &EntryOutcome) -> colored::ColoredString {
    match outcome {
        EntryOutcome::SchedulerStopped { boot: Some(Ok(_)) } => {
            format!("✓ {outcome}").green().bold()
        }
        EntryOutcome::SchedulerStopped { .. } => format!("⚠ {outcome}").yellow().bold(),
        EntryOutcome::VendorInitFailed { .. } => format!("✗ {outcome}").red().bold(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner(build: &BuildConfig, features: &AppFeatures) {
    println!();
    println!(
        "  {} {}",
        "nodeup".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Thread node bring-up (host simulation)");
    println!();
    println!("  Role:   {}", build.role.to_string().bold());
    println!("  Stages: {}", plan_summary(build));
    println!(
        "  App:    {:?} (crypto: {}, power-cycle counting: {}, clearbox: {})",
        <nodeup_runtime::SelectedAppTask as nodeup_runtime::ApplicationTask>::VARIANT,
        features.psa_crypto,
        features.power_cycle_counting,
        features.clearbox_hook,
    );
    println!();
}

fn plan_summary(build: &BuildConfig) -> String {
    build
        .plan()
        .iter()
        .map(|stage| stage.label())
        .collect::<Vec<_>>()
        .join(" → ")
}
