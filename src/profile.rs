//! Full-replace and partial-update flows.
//!
//! The wire protocol has no field-level write: every write carries a whole
//! profile. Changing one field therefore means reading the current profile,
//! overlaying the change and writing the result back.

use crate::error::{Ks236Error, Result};
use crate::params::WriteMode;
use crate::protocol::Ks236;
use crate::transport::{Sleep, Transport};
use crate::types::*;

/// `current` with one range's energy (and optionally time/threshold) replaced.
pub fn overlay_range(current: &EnergyProfile, update: &RangeUpdate) -> Result<EnergyProfile> {
    update.validate()?;

    let mut next = *current;
    let range = &mut next.ranges[update.range.index()];
    range.energy = update.energy;
    if let Some(time) = update.time {
        range.time = time;
    }
    if let Some(threshold) = update.threshold {
        range.threshold = threshold;
    }
    Ok(next)
}

/// `current` with the listed slots replaced.
pub fn overlay_p_values(current: &PValueProfile, updates: &[(PSlot, u8)]) -> Result<PValueProfile> {
    validate_slot_updates(updates)?;

    let mut next = *current;
    for &(slot, value) in updates {
        next.set(slot, value);
    }
    Ok(next)
}

fn validate_slot_updates(updates: &[(PSlot, u8)]) -> Result<()> {
    for &(slot, value) in updates {
        if value > crate::constants::P_VALUE_MAX {
            return Err(Ks236Error::out_of_range(
                slot.to_string(),
                value as i64,
                crate::constants::P_VALUE_MAX,
            ));
        }
    }
    Ok(())
}

impl<T: Transport, S: Sleep> Ks236<T, S> {
    /// Replace the whole energy profile, optionally reading it back.
    pub fn apply_energy(
        &mut self,
        probe: u8,
        profile: &EnergyProfile,
        mode: WriteMode,
        verify: bool,
    ) -> Result<Verification> {
        self.write_energy(probe, profile, mode)?;
        if !verify {
            log::debug!("Probe {}: verification skipped", probe);
            return Ok(Verification::Skipped);
        }
        self.read_back(probe, profile, Self::query_energy, EnergyProfile::to_bytes)
    }

    /// Replace the whole P-value profile, optionally reading it back.
    pub fn apply_p_values(
        &mut self,
        probe: u8,
        profile: &PValueProfile,
        mode: WriteMode,
        verify: bool,
    ) -> Result<Verification> {
        self.write_p_values(probe, profile, mode)?;
        if !verify {
            log::debug!("Probe {}: verification skipped", probe);
            return Ok(Verification::Skipped);
        }
        self.read_back(probe, profile, Self::query_p_values, |p: &PValueProfile| {
            p.values().to_vec()
        })
    }

    /// Write a catalog preset to one probe.
    pub fn apply_preset(
        &mut self,
        probe: u8,
        preset: &Preset,
        mode: WriteMode,
        verify: bool,
    ) -> Result<Verification> {
        log::info!("Applying preset '{}' to probe {}", preset.name, probe);
        self.apply_p_values(probe, &preset.profile(), mode, verify)
    }

    /// Change one range and leave everything else as the probe reports it.
    pub fn set_range(
        &mut self,
        probe: u8,
        update: &RangeUpdate,
        mode: WriteMode,
        verify: bool,
    ) -> Result<Verification> {
        update.validate()?;

        let current = self.query_energy(probe)?;
        log::info!("Probe {} current energy: {}", probe, current);

        let next = overlay_range(&current, update)?;
        self.apply_energy(probe, &next, mode, verify)
    }

    /// Change the listed P slots and leave the others as the probe reports them.
    pub fn set_p_values(
        &mut self,
        probe: u8,
        updates: &[(PSlot, u8)],
        mode: WriteMode,
        verify: bool,
    ) -> Result<Verification> {
        validate_slot_updates(updates)?;

        let current = self.query_p_values(probe)?;
        for &(slot, value) in updates {
            log::info!(
                "  {}: {} -> {} ({})",
                slot,
                current.get(slot),
                value,
                slot.band()
            );
        }

        let next = overlay_p_values(&current, updates)?;
        self.apply_p_values(probe, &next, mode, verify)
    }

    fn read_back<P: PartialEq>(
        &mut self,
        probe: u8,
        expected: &P,
        query: fn(&mut Self, u8) -> Result<P>,
        to_bytes: fn(&P) -> Vec<u8>,
    ) -> Result<Verification> {
        self.sleeper.sleep(self.config.timing.verify_delay());

        match query(self, probe) {
            Ok(actual) if actual == *expected => {
                log::info!("Probe {}: verified", probe);
                Ok(Verification::Confirmed)
            }
            Ok(actual) => Err(Ks236Error::VerificationMismatch {
                probe,
                expected: to_bytes(expected),
                actual: to_bytes(&actual),
            }),
            Err(Ks236Error::ExchangeFailed { last, .. }) => {
                log::warn!("Probe {}: setting succeeded but verification read failed", probe);
                Ok(Verification::ReadBackFailed(last))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_range_touches_only_that_range() {
        let current = EnergyProfile::default();
        let next = overlay_range(&current, &RangeUpdate::energy(Range::Second, 6)).unwrap();

        assert_eq!(next.range(Range::Second), RangeSettings::new(6, 0, 2));
        assert_eq!(next.range(Range::First), current.range(Range::First));
        assert_eq!(next.range(Range::Third), current.range(Range::Third));
    }

    #[test]
    fn overlay_range_with_time_and_threshold() {
        let current = EnergyProfile::default();
        let update = RangeUpdate::energy(Range::Third, 4).with_time(5).with_threshold(1);
        let next = overlay_range(&current, &update).unwrap();
        assert_eq!(next.range(Range::Third), RangeSettings::new(4, 5, 1));
        assert_eq!(next.ranges[..2], current.ranges[..2]);
    }

    #[test]
    fn overlay_range_rejects_out_of_range() {
        let current = EnergyProfile::default();
        let first = RangeUpdate::energy(Range::First, 1);
        assert!(overlay_range(&current, &RangeUpdate::energy(Range::First, 8)).is_err());
        assert!(overlay_range(&current, &first.with_time(8)).is_err());
        assert!(overlay_range(&current, &first.with_threshold(4)).is_err());
    }

    #[test]
    fn overlay_p_values_changes_only_named_slots() {
        let current = Preset::MEDIUM.profile();
        let p1: PSlot = "P1".parse().unwrap();
        let p13: PSlot = "P13".parse().unwrap();
        let next = overlay_p_values(&current, &[(p1, 15), (p13, 2)]).unwrap();

        for (i, (&before, &after)) in current.values().iter().zip(next.values()).enumerate() {
            match i {
                0 => assert_eq!(after, 15),
                12 => assert_eq!(after, 2),
                _ => assert_eq!(before, after, "slot P{} changed", i + 1),
            }
        }
    }

    #[test]
    fn overlay_p_values_rejects_32() {
        let slot = PSlot::new(4).unwrap();
        let err = overlay_p_values(&PValueProfile::default(), &[(slot, 32)]).unwrap_err();
        assert!(matches!(err, Ks236Error::ValidationRange { max: 31, value: 32, .. }));
    }

    #[test]
    fn empty_overlay_is_identity() {
        let current = Preset::WIDE.profile();
        assert_eq!(overlay_p_values(&current, &[]).unwrap(), current);
    }
}
