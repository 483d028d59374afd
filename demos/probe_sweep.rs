//! Probe Sweep Example
//!
//! Reads the energy and P-value profiles of every probe on the bus and prints
//! a short summary. The exit code follows the sweep outcome:
//! 0 when every probe answered, 1 for a partial sweep, 2 when none answered.
//!
//! Usage:
//!   cargo run --example probe_sweep                  # Interactive mode
//!   cargo run --example probe_sweep -- /dev/ttyUSB0
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=trace cargo run --example probe_sweep   # Show every frame

use inquire::{InquireError, Select};
use ks236_protocol::constants::EXIT_CANCELLED;
use ks236_protocol::{Ks236, Result, SweepReport, SweepStatus};
use log::{error, info};
use std::fmt::Display;
use std::process;

/// Interactive serial port selection using inquire
fn select_port() -> Result<String> {
    let ports = Ks236::list_ports()?;

    if ports.is_empty() {
        eprintln!("No serial ports found!");
        process::exit(1);
    }

    let port_names: Vec<String> = ports
        .iter()
        .map(|p| format!("{} - {:?}", p.port_name, p.port_type))
        .collect();

    let selection = match Select::new("Select the RS485 adapter:", port_names).prompt() {
        Ok(selection) => selection,
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            process::exit(EXIT_CANCELLED)
        }
        Err(e) => {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()).into())
        }
    };

    // Port name is everything before " - "
    let port_name = selection.split(" - ").next().unwrap_or(&selection).to_string();
    Ok(port_name)
}

fn print_report<T: Display>(title: &str, report: &SweepReport<T>) {
    println!("{} (started {})", title, report.started.format("%Y-%m-%d %H:%M:%S"));
    for result in &report.results {
        match &result.outcome {
            Ok(profile) => println!("  Probe {}: {}", result.probe, profile),
            Err(e) => println!("  Probe {}: {}", result.probe, e),
        }
    }
}

/// The worse of the two sweeps decides the exit code
fn combined(a: SweepStatus, b: SweepStatus) -> SweepStatus {
    match (a, b) {
        (SweepStatus::Complete, SweepStatus::Complete) => SweepStatus::Complete,
        (SweepStatus::Failed, SweepStatus::Failed) => SweepStatus::Failed,
        _ => SweepStatus::Partial,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port_name = std::env::args()
        .nth(1)
        .map(Ok)
        .unwrap_or_else(select_port)?;

    info!("Opening KS236 bus on {}...", port_name);
    let mut bus = Ks236::new(&port_name)?;

    let energy = bus.read_all_energy();
    let p_values = bus.read_all_p_values();

    print_report("Energy profiles", &energy);
    print_report("P-value profiles", &p_values);

    let status = combined(energy.status(), p_values.status());
    match status {
        SweepStatus::Complete => info!("All probes answered"),
        SweepStatus::Partial => {
            let mut missing = energy.failed_probes();
            missing.extend(p_values.failed_probes());
            missing.sort_unstable();
            missing.dedup();
            error!("No answer from probes {:?}", missing);
        }
        SweepStatus::Failed => error!("No probe answered"),
    }

    process::exit(status.exit_code())
}
