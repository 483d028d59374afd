use crate::constants::*;
use crate::error::{Ks236Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Energy, blind-zone time and threshold for one detection range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RangeSettings {
    pub energy: u8,
    pub time: u8,
    pub threshold: u8,
}

impl RangeSettings {
    pub const fn new(energy: u8, time: u8, threshold: u8) -> Self {
        RangeSettings {
            energy,
            time,
            threshold,
        }
    }

    /// Check each field against its protocol range. `label` prefixes field names in errors.
    pub fn validate(&self, label: &str) -> Result<()> {
        check(format!("{label} energy"), self.energy, ENERGY_MAX)?;
        check(format!("{label} time"), self.time, TIME_MAX)?;
        check(format!("{label} threshold"), self.threshold, THRESHOLD_MAX)
    }
}

impl fmt::Display for RangeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}/T{}/Th{}", self.energy, self.time, self.threshold)
    }
}

fn check(field: String, value: u8, max: u8) -> Result<()> {
    if value > max {
        return Err(Ks236Error::out_of_range(field, value as i64, max));
    }
    Ok(())
}

/// Detection range, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Range {
    /// Nominal 2.5 m
    First,
    /// Nominal 1.5 m
    Second,
    /// Nominal 6.5 m
    Third,
}

impl Range {
    pub const ALL: [Range; 3] = [Range::First, Range::Second, Range::Third];

    pub fn index(self) -> usize {
        match self {
            Range::First => 0,
            Range::Second => 1,
            Range::Third => 2,
        }
    }

    pub fn nominal_metres(self) -> f32 {
        RANGE_METRES[self.index()]
    }

    /// Range whose nominal distance is `metres` (2.5, 1.5 or 6.5).
    pub fn from_metres(metres: f32) -> Option<Range> {
        Range::ALL
            .into_iter()
            .find(|r| (r.nominal_metres() - metres).abs() < 0.01)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.nominal_metres())
    }
}

/// Energy settings for the three ranges of one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyProfile {
    pub ranges: [RangeSettings; 3],
}

impl EnergyProfile {
    pub fn range(&self, range: Range) -> RangeSettings {
        self.ranges[range.index()]
    }

    pub fn validate(&self) -> Result<()> {
        for range in Range::ALL {
            self.range(range).validate(&range.to_string())?;
        }
        Ok(())
    }

    /// Configurable bytes in wire order, without the fixed trailer.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.ranges
            .iter()
            .flat_map(|r| [r.energy, r.time, r.threshold])
            .collect()
    }
}

impl Default for EnergyProfile {
    /// Factory settings.
    fn default() -> Self {
        EnergyProfile {
            ranges: [
                RangeSettings::new(3, 2, 2),
                RangeSettings::new(1, 0, 2),
                RangeSettings::new(5, 6, 2),
            ],
        }
    }
}

impl fmt::Display for EnergyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Range::ALL
            .iter()
            .map(|&r| format!("{}: {}", r, self.range(r)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Replacement of one range's energy, optionally with time and threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeUpdate {
    pub range: Range,
    pub energy: u8,
    pub time: Option<u8>,
    pub threshold: Option<u8>,
}

impl RangeUpdate {
    pub fn energy(range: Range, energy: u8) -> Self {
        RangeUpdate {
            range,
            energy,
            time: None,
            threshold: None,
        }
    }

    pub fn with_time(mut self, time: u8) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let label = self.range.to_string();
        check(format!("{label} energy"), self.energy, ENERGY_MAX)?;
        if let Some(time) = self.time {
            check(format!("{label} time"), time, TIME_MAX)?;
        }
        if let Some(threshold) = self.threshold {
            check(format!("{label} threshold"), threshold, THRESHOLD_MAX)?;
        }
        Ok(())
    }
}

/// Distance band controlled by each P slot
const SLOT_BANDS: [&str; P_VALUE_COUNT] = [
    "22.5 ~ 42.5 cm",
    "42.5 ~ 59.5 cm",
    "59.5 ~ 76.5 cm",
    "76.5 ~ 110 cm",
    "110 ~ 144 cm",
    "144 ~ 178 cm",
    "178 ~ 212 cm",
    "212 ~ 246 cm",
    "246 ~ 280 cm",
    "280 ~ 348 cm",
    "348 ~ 416 cm",
    "416 cm+",
    "Auxiliary param 13",
    "Auxiliary param 14",
    "Auxiliary param 15",
    "Auxiliary param 16",
    "Auxiliary param 17",
];

/// Defaults for P13-P17
pub const AUX_DEFAULTS: [u8; P_VALUE_COUNT - MAIN_PHASE_COUNT] = [0x00, 0x03, 0x01, 0x00, 0x01];

/// P-value slot number, 1-17
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PSlot(u8);

impl PSlot {
    pub fn new(number: u8) -> Result<Self> {
        if (1..=P_VALUE_COUNT as u8).contains(&number) {
            Ok(PSlot(number))
        } else {
            Err(Ks236Error::InvalidSlot(format!("P{number}")))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn band(self) -> &'static str {
        SLOT_BANDS[self.index()]
    }

    pub fn is_auxiliary(self) -> bool {
        self.index() >= MAIN_PHASE_COUNT
    }
}

impl FromStr for PSlot {
    type Err = Ks236Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let number = trimmed
            .strip_prefix('P')
            .or_else(|| trimmed.strip_prefix('p'))
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(|| Ks236Error::InvalidSlot(s.to_string()))?;
        PSlot::new(number).map_err(|_| Ks236Error::InvalidSlot(s.to_string()))
    }
}

impl fmt::Display for PSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// The 17 phase/beam-angle values of one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PValueProfile([u8; P_VALUE_COUNT]);

impl PValueProfile {
    /// Wrap raw values. Call [`validate`](Self::validate) before sending.
    pub const fn new(values: [u8; P_VALUE_COUNT]) -> Self {
        PValueProfile(values)
    }

    /// Build from a decoded wire payload; only the length is checked.
    pub fn from_slice(values: &[u8]) -> Result<Self> {
        let array: [u8; P_VALUE_COUNT] =
            values
                .try_into()
                .map_err(|_| Ks236Error::InvalidProfileLength {
                    expected: P_VALUE_COUNT,
                    actual: values.len(),
                })?;
        Ok(PValueProfile(array))
    }

    /// Build from untrusted integers, checking length and range.
    pub fn from_values(values: &[i64]) -> Result<Self> {
        if values.len() != P_VALUE_COUNT {
            return Err(Ks236Error::InvalidProfileLength {
                expected: P_VALUE_COUNT,
                actual: values.len(),
            });
        }
        let mut array = [0u8; P_VALUE_COUNT];
        for (i, &value) in values.iter().enumerate() {
            if !(0..=P_VALUE_MAX as i64).contains(&value) {
                return Err(Ks236Error::out_of_range(format!("P{}", i + 1), value, P_VALUE_MAX));
            }
            array[i] = value as u8;
        }
        Ok(PValueProfile(array))
    }

    pub fn values(&self) -> &[u8; P_VALUE_COUNT] {
        &self.0
    }

    pub fn get(&self, slot: PSlot) -> u8 {
        self.0[slot.index()]
    }

    pub fn set(&mut self, slot: PSlot, value: u8) {
        self.0[slot.index()] = value;
    }

    /// P1-P12
    pub fn main_phase(&self) -> &[u8] {
        &self.0[..MAIN_PHASE_COUNT]
    }

    /// P13-P17
    pub fn auxiliary(&self) -> &[u8] {
        &self.0[MAIN_PHASE_COUNT..]
    }

    pub fn auxiliary_is_default(&self) -> bool {
        self.auxiliary() == AUX_DEFAULTS
    }

    pub fn validate(&self) -> Result<()> {
        for (i, &value) in self.0.iter().enumerate() {
            check(format!("P{}", i + 1), value, P_VALUE_MAX)?;
        }
        Ok(())
    }
}

impl Default for PValueProfile {
    /// Factory settings.
    fn default() -> Self {
        Preset::DEFAULT.profile()
    }
}

impl fmt::Display for PValueProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "main {:?}, aux {:?}", self.main_phase(), self.auxiliary())
    }
}

/// Named beam-angle configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    /// Catalog key, e.g. `"narrow"`
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub values: [u8; P_VALUE_COUNT],
}

impl Preset {
    pub const NARROW: Preset = Preset {
        key: "narrow",
        name: "Narrow Beam (50°x16°)",
        description: "Maximum range, narrow field of view",
        values: [31, 31, 31, 30, 26, 21, 16, 16, 13, 0, 0, 0, 0, 3, 1, 0, 1],
    };

    pub const MEDIUM: Preset = Preset {
        key: "medium",
        name: "Medium Beam (90°x44°)",
        description: "Balanced range and coverage",
        values: [24, 24, 23, 21, 18, 13, 10, 10, 6, 0, 0, 0, 0, 3, 1, 0, 1],
    };

    pub const WIDE: Preset = Preset {
        key: "wide",
        name: "Wide Beam (100°x50°)",
        description: "Good coverage, moderate range",
        values: [15, 15, 15, 15, 10, 10, 5, 5, 0, 0, 0, 0, 0, 3, 1, 0, 1],
    };

    pub const ULTRA_WIDE: Preset = Preset {
        key: "ultra_wide",
        name: "Ultra Wide Beam (135°x64°)",
        description: "Maximum coverage, shorter range",
        values: [10, 10, 7, 7, 6, 3, 2, 0, 0, 0, 0, 0, 0, 3, 1, 0, 1],
    };

    pub const DEFAULT: Preset = Preset {
        key: "default",
        name: "Default Configuration",
        description: "Factory default P values",
        values: [19, 19, 19, 31, 31, 31, 31, 31, 31, 31, 31, 31, 0, 3, 1, 0, 1],
    };

    pub const ALL: [Preset; 5] = [
        Preset::NARROW,
        Preset::MEDIUM,
        Preset::WIDE,
        Preset::ULTRA_WIDE,
        Preset::DEFAULT,
    ];

    pub fn from_name(name: &str) -> Result<Preset> {
        Preset::ALL
            .into_iter()
            .find(|p| p.key.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Ks236Error::UnknownPreset(name.to_string()))
    }

    pub fn profile(&self) -> PValueProfile {
        PValueProfile::new(self.values)
    }
}

/// Outcome of the read-back that follows a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// No read-back was requested
    Skipped,
    /// Read-back matched what was written
    Confirmed,
    /// Write was acknowledged but the read-back got no valid response
    ReadBackFailed(crate::error::Fault),
}

/// Result for one probe in a sweep
#[derive(Debug)]
pub struct ProbeResult<T> {
    pub probe: u8,
    pub outcome: Result<T>,
}

/// Per-probe outcomes of a sequential sweep
#[derive(Debug)]
pub struct SweepReport<T> {
    pub started: DateTime<Utc>,
    pub results: Vec<ProbeResult<T>>,
}

impl<T> SweepReport<T> {
    pub fn successes(&self) -> impl Iterator<Item = (u8, &T)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|v| (r.probe, v)))
    }

    pub fn failed_probes(&self) -> Vec<u8> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_err())
            .map(|r| r.probe)
            .collect()
    }

    pub fn status(&self) -> SweepStatus {
        let succeeded = self.successes().count();
        if succeeded == 0 {
            SweepStatus::Failed
        } else if succeeded == self.results.len() {
            SweepStatus::Complete
        } else {
            SweepStatus::Partial
        }
    }
}

/// Overall sweep result, for exit-code mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStatus {
    Complete,
    Partial,
    Failed,
}

impl SweepStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            SweepStatus::Complete => 0,
            SweepStatus::Partial => 1,
            SweepStatus::Failed => 2,
        }
    }
}

/// P-value profile as stored in a profile file.
///
/// Only `p_values` is required. `created` is local wall-clock time written as
/// `YYYY-MM-DD HH:MM:SS`; RFC 3339 timestamps are accepted on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub p_values: Vec<i64>,
    #[serde(default, with = "created_format")]
    pub created: Option<NaiveDateTime>,
}

impl ProfileRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        profile: &PValueProfile,
    ) -> Self {
        let now = Local::now().naive_local();
        ProfileRecord {
            name: name.into(),
            description: description.into(),
            p_values: profile.values().iter().map(|&v| v as i64).collect(),
            // Stored at whole-second precision
            created: Some(now.with_nanosecond(0).unwrap_or(now)),
        }
    }

    pub fn to_profile(&self) -> Result<PValueProfile> {
        PValueProfile::from_values(&self.p_values)
    }
}

mod created_format {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(created: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match created {
            Some(t) => serializer.serialize_str(&t.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        NaiveDateTime::parse_from_str(&text, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(&text).map(|t| t.naive_local()))
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid created time {:?}: {}", text, e)))
    }
}
