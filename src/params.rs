//! Parameter-code tables.
//!
//! A probe is never addressed directly on the bus. Instead the third frame
//! byte selects both the probe and the operation, and each (family,
//! operation) pair has its own table with its own probe domain.

use crate::constants::*;
use crate::error::{Ks236Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Parameter family carried by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Energy,
    PValue,
}

/// Operation selected by the parameter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Query,
    TemporaryWrite,
    PermanentWrite,
}

/// Volatile or non-volatile write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    /// Reverts on power cycle
    #[default]
    Temporary,
    /// Persisted to EEPROM
    Permanent,
}

impl From<WriteMode> for Operation {
    fn from(mode: WriteMode) -> Self {
        match mode {
            WriteMode::Temporary => Operation::TemporaryWrite,
            WriteMode::Permanent => Operation::PermanentWrite,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Energy => write!(f, "energy"),
            Family::PValue => write!(f, "P-value"),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Query => write!(f, "query"),
            Operation::TemporaryWrite => write!(f, "temporary write"),
            Operation::PermanentWrite => write!(f, "permanent write"),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Temporary => write!(f, "temporary"),
            WriteMode::Permanent => write!(f, "permanent"),
        }
    }
}

fn table(family: Family, kind: Operation) -> &'static [u8] {
    match (family, kind) {
        (Family::Energy, Operation::Query) => &ENERGY_QUERY_CODES,
        (Family::Energy, Operation::TemporaryWrite) => &ENERGY_TEMP_CODES,
        (Family::Energy, Operation::PermanentWrite) => &ENERGY_PERM_CODES,
        (Family::PValue, Operation::Query) => &P_VALUE_QUERY_CODES,
        (Family::PValue, Operation::TemporaryWrite) => &P_VALUE_TEMP_CODES,
        (Family::PValue, Operation::PermanentWrite) => &P_VALUE_PERM_CODES,
    }
}

/// Probe numbers accepted by the table for `family` and `kind`.
pub fn probe_range(family: Family, kind: Operation) -> RangeInclusive<u8> {
    1..=table(family, kind).len() as u8
}

/// Parameter code selecting `probe` for the given family and operation.
pub fn lookup(family: Family, kind: Operation, probe: u8) -> Result<u8> {
    let codes = table(family, kind);
    probe
        .checked_sub(1)
        .and_then(|index| codes.get(index as usize))
        .copied()
        .ok_or(Ks236Error::InvalidProbeNumber {
            family,
            kind,
            probe,
            max: codes.len() as u8,
        })
}
