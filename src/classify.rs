//! Response classification.

use crate::codec::verify_checksum;
use crate::constants::*;
use crate::error::Fault;

/// What a well-formed response to a given request looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseShape {
    /// Exact frame length
    pub length: usize,
    /// Parameter code the probe must echo at offset 2
    pub echo: Option<u8>,
    /// Whether the trailing BCC is checked
    pub checksum: bool,
}

impl ResponseShape {
    /// 15-byte energy query response echoing `code`.
    pub fn energy(code: u8) -> Self {
        ResponseShape {
            length: ENERGY_RESPONSE_LEN,
            echo: Some(code),
            checksum: true,
        }
    }

    /// 21-byte P-value query response echoing `code`.
    pub fn p_values(code: u8) -> Self {
        ResponseShape {
            length: P_VALUE_RESPONSE_LEN,
            echo: Some(code),
            checksum: true,
        }
    }

    /// 5-byte write acknowledgement.
    ///
    /// Offset 2 may echo the parameter or repeat the status, and probes in
    /// the field do not reliably fill in the BCC, so neither is checked.
    pub fn ack() -> Self {
        ResponseShape {
            length: ACK_LEN,
            echo: None,
            checksum: false,
        }
    }
}

/// Classification of one raw read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Data region between header and BCC
    Valid(Vec<u8>),
    NoResponse,
    Incomplete(usize),
    Malformed,
    ChecksumMismatch,
}

impl Classification {
    /// The payload, or the fault that prevented one.
    pub fn into_result(self) -> Result<Vec<u8>, Fault> {
        match self {
            Classification::Valid(payload) => Ok(payload),
            Classification::NoResponse => Err(Fault::NoResponse),
            Classification::Incomplete(n) => Err(Fault::Incomplete(n)),
            Classification::Malformed => Err(Fault::Malformed),
            Classification::ChecksumMismatch => Err(Fault::ChecksumMismatch),
        }
    }
}

/// Classify `raw` against `shape`.
pub fn classify(raw: &[u8], shape: &ResponseShape) -> Classification {
    if raw.is_empty() {
        return Classification::NoResponse;
    }
    if raw.len() < shape.length {
        return Classification::Incomplete(raw.len());
    }
    // Over-long reads are never truncated into a valid frame
    if raw.len() > shape.length || shape.length < 4 {
        return Classification::Malformed;
    }
    if raw[0] != ADDR_CODE || raw[1] != CMD_CODE {
        return Classification::Malformed;
    }
    if let Some(echo) = shape.echo {
        if raw[2] != echo {
            return Classification::Malformed;
        }
    }
    if shape.checksum && !verify_checksum(raw) {
        return Classification::ChecksumMismatch;
    }

    Classification::Valid(raw[3..raw.len() - 1].to_vec())
}
