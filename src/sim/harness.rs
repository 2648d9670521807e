//! CLI entry point for the conformance harness: runs the device scenarios
//! against an in-process virtual bus and reports pass/fail.

use clap::{Parser, Subcommand};
use ds1621_sim::bus::VirtualBus;
use ds1621_sim::config::{self, Config};
use ds1621_sim::device::Ds1621;
use ds1621_sim::sim::Scenario;
use std::path::PathBuf;
use std::process::ExitCode;

/// Simulation Harness CLI
#[derive(Parser, Debug)]
#[command(name = "sim-harness", about = "Conformance scenarios for the virtual DS1621.")]
pub struct Cli {
    /// Path to a TOML config file; the first configured device is tested
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario to run (all when omitted)
    #[arg(long)]
    scenario: Option<String>,

    /// Log every bus event
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available built-in scenarios
    ListScenarios,
    /// Run the selected scenarios (default)
    Run,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    if let Some(Commands::ListScenarios) = cli.command {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
        return ExitCode::SUCCESS;
    }

    // 1. Load config (default or from file)
    let config = match &cli.config {
        Some(path) => match config::load_config(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    let Some(device) = config.devices.first() else {
        eprintln!("No device configured");
        return ExitCode::FAILURE;
    };

    // 2. Select scenarios
    let scenarios: Vec<Scenario> = match cli.scenario.as_deref() {
        Some(name) => match Scenario::from_name(name) {
            Some(scenario) => vec![scenario],
            None => {
                eprintln!("Unknown scenario '{name}', try list-scenarios");
                return ExitCode::FAILURE;
            }
        },
        None => Scenario::ALL.to_vec(),
    };

    // 3. Attach a fresh chip and run
    let mut bus = VirtualBus::new();
    let sensor = match Ds1621::attach(&mut bus, device.address, device.initial_temperature) {
        Ok(sensor) => sensor,
        Err(e) => {
            eprintln!("Failed to attach device: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0;
    for scenario in &scenarios {
        match scenario.run(&mut bus, device.address, &sensor) {
            Ok(()) => println!("PASS {}", scenario.name()),
            Err(e) => {
                println!("FAIL {}: {}", scenario.name(), e);
                failed += 1;
            }
        }
    }
    println!("{} passed, {} failed", scenarios.len() - failed, failed);

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
