//! Apply Preset Example
//!
//! Writes a beam-angle preset to one probe and reads it back.
//!
//! Usage:
//!   cargo run --example apply_preset -- <port> <probe> <preset> [--permanent]
//!   cargo run --example apply_preset -- /dev/ttyUSB0 1 narrow
//!
//! Without a preset name the catalog is offered interactively.

use inquire::{InquireError, Select};
use ks236_protocol::constants::EXIT_CANCELLED;
use ks236_protocol::{Ks236, Ks236Error, Preset, Result, Verification, WriteMode};
use log::{error, info, warn};
use std::process;

fn select_preset() -> Result<Preset> {
    let labels: Vec<String> = Preset::ALL
        .iter()
        .map(|p| format!("{} - {} ({})", p.key, p.name, p.description))
        .collect();

    match Select::new("Select a preset:", labels).prompt() {
        Ok(selection) => {
            let key = selection.split(" - ").next().unwrap_or(&selection);
            Preset::from_name(key)
        }
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            process::exit(EXIT_CANCELLED)
        }
        Err(e) => Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()).into()),
    }
}

fn usage() -> ! {
    eprintln!("Usage: apply_preset <port> <probe> [preset] [--permanent]");
    process::exit(2)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let permanent = args.iter().any(|a| a == "--permanent");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let port_name = positional.first().map(|s| s.as_str()).unwrap_or_else(|| usage());
    let probe: u8 = match positional.get(1).map(|s| s.parse()) {
        Some(Ok(probe)) => probe,
        _ => usage(),
    };
    let preset = match positional.get(2) {
        Some(name) => Preset::from_name(name)?,
        None => select_preset()?,
    };
    let mode = if permanent {
        WriteMode::Permanent
    } else {
        WriteMode::Temporary
    };

    info!("Applying {} to probe {} ({})", preset.name, probe, mode);
    let mut bus = Ks236::new(port_name)?;

    match bus.apply_preset(probe, &preset, mode, true) {
        Ok(Verification::Confirmed) => info!("Probe {} confirmed {}", probe, preset.key),
        Ok(Verification::ReadBackFailed(fault)) => {
            warn!("Write acknowledged but read-back failed: {}", fault)
        }
        Ok(Verification::Skipped) => {}
        Err(e @ Ks236Error::VerificationMismatch { .. }) => {
            error!("{}", e);
            process::exit(1)
        }
        Err(e) => {
            error!("{}", e);
            process::exit(2)
        }
    }

    Ok(())
}
