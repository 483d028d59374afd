//! Frame construction and BCC checksum.
//!
//! Every frame is `[ADDR, CMD, PARAM, payload..., BCC]` where BCC is the XOR
//! of all preceding bytes.

use crate::constants::*;
use crate::error::{Ks236Error, Result};
use crate::types::{EnergyProfile, PValueProfile, RangeSettings};

/// XOR of every byte, folded left to right.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |bcc, &b| bcc ^ b)
}

/// True when the last byte of `frame` is the checksum of the rest.
pub fn verify_checksum(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((&bcc, body)) => checksum(body) == bcc,
        None => false,
    }
}

/// Build a 4-byte query frame.
pub fn build_query(address: u8, command: u8, parameter: u8) -> [u8; QUERY_FRAME_LEN] {
    [address, command, parameter, address ^ command ^ parameter]
}

/// Build a write frame carrying `payload`.
pub fn build_write(address: u8, command: u8, parameter: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.extend_from_slice(&[address, command, parameter]);
    frame.extend_from_slice(payload);
    frame.push(checksum(&frame));
    frame
}

/// Encode an energy profile as the 11-byte write payload.
pub fn encode_energy_payload(profile: &EnergyProfile) -> [u8; ENERGY_PAYLOAD_LEN] {
    let mut payload = [0u8; ENERGY_PAYLOAD_LEN];
    for (i, range) in profile.ranges.iter().enumerate() {
        payload[i * 3..i * 3 + 3].copy_from_slice(&[range.energy, range.time, range.threshold]);
    }
    payload[ENERGY_RANGE_BYTES..].copy_from_slice(&ENERGY_FIXED_PARAMS);
    payload
}

/// Encode a P-value profile as the 17-byte write payload.
pub fn encode_p_value_payload(profile: &PValueProfile) -> [u8; P_VALUE_COUNT] {
    *profile.values()
}

/// Decode the data region of an energy response.
///
/// The region is nine range bytes followed by the two fixed bytes. The
/// fixed bytes are not part of the profile.
pub fn decode_energy_payload(payload: &[u8]) -> Result<EnergyProfile> {
    if payload.len() != ENERGY_PAYLOAD_LEN {
        return Err(Ks236Error::InvalidProfileLength {
            expected: ENERGY_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }

    let mut ranges = [RangeSettings::default(); 3];
    for (i, range) in ranges.iter_mut().enumerate() {
        let triple = &payload[i * 3..i * 3 + 3];
        *range = RangeSettings::new(triple[0], triple[1], triple[2]);
    }

    let trailer = &payload[ENERGY_RANGE_BYTES..];
    if trailer != ENERGY_FIXED_PARAMS {
        log::debug!("unexpected fixed bytes {} in energy response", hex_dump(trailer));
    }

    Ok(EnergyProfile { ranges })
}

/// Decode the data region of a P-value response.
pub fn decode_p_value_payload(payload: &[u8]) -> Result<PValueProfile> {
    PValueProfile::from_slice(payload)
}

/// Space-separated uppercase hex, used for frame logging.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
