//! Error types for KS236 protocol operations.

use crate::params::{Family, Operation};
use thiserror::Error;

/// Result type alias for KS236 operations.
pub type Result<T> = std::result::Result<T, Ks236Error>;

/// Communication fault observed during a single exchange attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Nothing came back before the read timeout
    #[error("no response")]
    NoResponse,

    /// Fewer bytes than the frame length arrived
    #[error("incomplete response ({0} bytes)")]
    Incomplete(usize),

    /// Wrong length, header or echoed parameter
    #[error("invalid response format")]
    Malformed,

    /// BCC did not match the frame contents
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// The transport accepted fewer bytes than the frame length
    #[error("only sent {sent}/{expected} bytes")]
    ShortWrite {
        /// Bytes reported written
        sent: usize,
        /// Frame length
        expected: usize,
    },

    /// Serial or I/O error raised by the transport
    #[error("transport error: {0}")]
    Transport(String),
}

/// Error types for KS236 probe communication.
#[derive(Error, Debug)]
pub enum Ks236Error {
    /// Serial port communication error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Probe number outside the parameter table for this family and operation
    #[error("Invalid probe number {probe} for {family} {kind} (must be 1-{max})")]
    InvalidProbeNumber {
        /// Parameter family
        family: Family,
        /// Operation kind
        kind: Operation,
        /// Rejected probe number
        probe: u8,
        /// Highest probe number in the table
        max: u8,
    },

    /// Field value outside its protocol range
    #[error("{field} value {value} out of range (0-{max})")]
    ValidationRange {
        /// Name of the offending field
        field: String,
        /// Rejected value
        value: i64,
        /// Inclusive upper bound
        max: u8,
    },

    /// Profile vector has the wrong number of elements
    #[error("Must provide exactly {expected} values, got {actual}")]
    InvalidProfileLength {
        /// Required number of elements
        expected: usize,
        /// Number of elements provided
        actual: usize,
    },

    /// P-value slot name or number not in P1-P17
    #[error("Invalid P parameter: {0}")]
    InvalidSlot(String),

    /// Preset name not in the catalog
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Retry budget exhausted without a valid response
    #[error("Probe {probe}: exchange failed after {attempts} attempts ({last})")]
    ExchangeFailed {
        /// Probe number
        probe: u8,
        /// Attempts made
        attempts: u32,
        /// Fault seen on the final attempt
        last: Fault,
    },

    /// Probe answered the write with a parameter error status
    #[error("Probe {probe}: parameter error")]
    ParameterRejected {
        /// Probe number
        probe: u8,
    },

    /// Probe answered the write with a failure status
    #[error("Probe {probe}: setting failed")]
    DeviceWriteFailed {
        /// Probe number
        probe: u8,
    },

    /// Probe answered the write with a status this library does not know
    #[error("Probe {probe}: unknown status {status:#04x}")]
    UnknownStatus {
        /// Probe number
        probe: u8,
        /// Raw status byte
        status: u8,
    },

    /// Write was acknowledged but the read-back differs
    #[error("Probe {probe}: read-back differs (expected {expected:?}, got {actual:?})")]
    VerificationMismatch {
        /// Probe number
        probe: u8,
        /// Values written
        expected: Vec<u8>,
        /// Values read back
        actual: Vec<u8>,
    },
}

impl Ks236Error {
    /// True for errors raised before any bytes were sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Ks236Error::InvalidProbeNumber { .. }
                | Ks236Error::ValidationRange { .. }
                | Ks236Error::InvalidProfileLength { .. }
                | Ks236Error::InvalidSlot(_)
                | Ks236Error::UnknownPreset(_)
        )
    }

    /// True when the probe itself answered the write with a non-success status.
    pub fn is_device_rejection(&self) -> bool {
        matches!(
            self,
            Ks236Error::ParameterRejected { .. }
                | Ks236Error::DeviceWriteFailed { .. }
                | Ks236Error::UnknownStatus { .. }
        )
    }

    pub(crate) fn out_of_range(field: impl Into<String>, value: i64, max: u8) -> Self {
        Ks236Error::ValidationRange {
            field: field.into(),
            value,
            max,
        }
    }
}
