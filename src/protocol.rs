//! The bus session and its single-probe and sweep operations.

use crate::codec::{
    decode_energy_payload, decode_p_value_payload, encode_energy_payload, encode_p_value_payload,
};
use crate::config::Config;
use crate::constants::*;
use crate::error::Result;
use crate::params::{Family, WriteMode};
use crate::transport::{SerialTransport, Sleep, ThreadSleep, Transport};
use crate::types::*;
use chrono::Utc;

/// Main KS236 bus interface
///
/// Owns the transport for the duration of a session. Every operation takes
/// `&mut self`, so at most one exchange is ever in flight on the bus.
pub struct Ks236<T = SerialTransport, S = ThreadSleep> {
    pub(crate) transport: T,
    pub(crate) sleeper: S,
    pub(crate) config: Config,
}

impl Ks236 {
    /// Open `port_name` with default settings
    pub fn new(port_name: &str) -> Result<Self> {
        Self::open(port_name, Config::default())
    }

    /// Open `port_name` with the given settings
    pub fn open(port_name: &str, config: Config) -> Result<Self> {
        let transport =
            SerialTransport::open(port_name, config.baud_rate, config.timing.read_timeout())?;
        Ok(Ks236::with_transport(transport, ThreadSleep, config))
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        SerialTransport::list_ports()
    }
}

impl<T: Transport, S: Sleep> Ks236<T, S> {
    pub fn with_transport(transport: T, sleeper: S, config: Config) -> Self {
        Ks236 {
            transport,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn into_parts(self) -> (T, S) {
        (self.transport, self.sleeper)
    }

    /// Read the energy profile of one probe
    pub fn query_energy(&mut self, probe: u8) -> Result<EnergyProfile> {
        let payload = self.query_exchange(Family::Energy, probe)?;
        decode_energy_payload(&payload)
    }

    /// Read the P-value profile of one probe
    pub fn query_p_values(&mut self, probe: u8) -> Result<PValueProfile> {
        let payload = self.query_exchange(Family::PValue, probe)?;
        decode_p_value_payload(&payload)
    }

    /// Write a complete energy profile, without read-back
    pub fn write_energy(
        &mut self,
        probe: u8,
        profile: &EnergyProfile,
        mode: WriteMode,
    ) -> Result<()> {
        profile.validate()?;
        self.write_exchange(Family::Energy, mode, probe, &encode_energy_payload(profile))
    }

    /// Write a complete P-value profile, without read-back
    pub fn write_p_values(
        &mut self,
        probe: u8,
        profile: &PValueProfile,
        mode: WriteMode,
    ) -> Result<()> {
        profile.validate()?;
        self.write_exchange(Family::PValue, mode, probe, &encode_p_value_payload(profile))
    }

    /// Query the energy profile of each probe in turn
    pub fn sweep_energy<I>(&mut self, probes: I) -> SweepReport<EnergyProfile>
    where
        I: IntoIterator<Item = u8>,
    {
        self.sweep(probes, Self::query_energy)
    }

    /// Query the P-value profile of each probe in turn
    pub fn sweep_p_values<I>(&mut self, probes: I) -> SweepReport<PValueProfile>
    where
        I: IntoIterator<Item = u8>,
    {
        self.sweep(probes, Self::query_p_values)
    }

    /// Energy sweep over the default probe set
    pub fn read_all_energy(&mut self) -> SweepReport<EnergyProfile> {
        self.sweep_energy(ENERGY_SWEEP_PROBES)
    }

    /// P-value sweep over the default probe set
    pub fn read_all_p_values(&mut self) -> SweepReport<PValueProfile> {
        self.sweep_p_values(P_VALUE_SWEEP_PROBES)
    }

    fn sweep<I, P>(&mut self, probes: I, query: fn(&mut Self, u8) -> Result<P>) -> SweepReport<P>
    where
        I: IntoIterator<Item = u8>,
    {
        let started = Utc::now();
        let mut results = Vec::new();

        for probe in probes {
            let outcome = query(self, probe);
            match &outcome {
                Ok(_) => log::info!("Probe {}: success", probe),
                Err(e) => log::warn!("Probe {}: {}", probe, e),
            }
            results.push(ProbeResult { probe, outcome });

            // Let the bus settle before addressing the next probe
            self.sleeper.sleep(self.config.timing.inter_probe());
        }

        SweepReport { started, results }
    }
}
