//! # KS236 Protocol Library
//!
//! A Rust library for configuring and querying KS236 ultrasonic probes over a
//! shared RS485 bus. Probes are selected by a parameter code embedded in each
//! frame rather than by a bus address.
//!
//! ## Features
//!
//! - Query energy profiles (energy/time/threshold for three ranges)
//! - Query P-value profiles (17 phase/beam-angle values)
//! - Temporary or permanent writes, with optional read-back verification
//! - Partial updates of a single range or a few P slots
//! - Beam-angle presets
//! - Retries with progressive backoff for an unreliable half-duplex link
//!
//! ## Example
//!
//! ```no_run
//! use ks236_protocol::{Ks236, Preset, WriteMode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut bus = Ks236::new("/dev/ttyUSB0")?;
//!     let energy = bus.query_energy(3)?;
//!     println!("Probe 3: {}", energy);
//!     bus.apply_preset(1, &Preset::NARROW, WriteMode::Temporary, true)?;
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod codec;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod params;
pub mod profile;
pub mod protocol;
pub mod transport;
pub mod types;

pub use config::{Backoff, Config, Timing};
pub use engine::RetryOutcome;
pub use error::{Fault, Ks236Error, Result};
pub use params::{Family, Operation, WriteMode};
pub use protocol::Ks236;
pub use transport::{SerialTransport, Sleep, ThreadSleep, Transport};
pub use types::*;
