//! Protocol constants for KS236 probe communication.
//!
//! This module defines the fixed frame bytes, parameter-code tables, timing
//! parameters and serial port defaults used by the RS485 protocol.

use std::ops::RangeInclusive;

/// Address byte leading every frame on the bus
pub const ADDR_CODE: u8 = 0xE8;

/// Command byte following the address
pub const CMD_CODE: u8 = 0x99;

/// Length of a query command frame
pub const QUERY_FRAME_LEN: usize = 4;

/// Length of an energy query response
pub const ENERGY_RESPONSE_LEN: usize = 15;

/// Length of a P-value query response
pub const P_VALUE_RESPONSE_LEN: usize = 21;

/// Length of a write acknowledgement
pub const ACK_LEN: usize = 5;

/// Offset of the status byte inside a write acknowledgement
pub const ACK_STATUS_OFFSET: usize = 3;

/// Trailing bytes carried in every energy write frame
pub const ENERGY_FIXED_PARAMS: [u8; 2] = [0x2C, 0x40];

/// Range bytes in an energy payload: three energy/time/threshold triples
pub const ENERGY_RANGE_BYTES: usize = 9;

/// Energy payload: the range bytes plus the fixed trailer
pub const ENERGY_PAYLOAD_LEN: usize = ENERGY_RANGE_BYTES + ENERGY_FIXED_PARAMS.len();

/// Number of P-value slots in a profile
pub const P_VALUE_COUNT: usize = 17;

/// Slots P1-P12 are main phase parameters, the rest are auxiliary
pub const MAIN_PHASE_COUNT: usize = 12;

/// Write acknowledgement status: accepted
pub const STATUS_OK: u8 = 0x00;

/// Write acknowledgement status: parameter error
pub const STATUS_PARAM_ERROR: u8 = 0x02;

/// Write acknowledgement status: write failed
pub const STATUS_FAILED: u8 = 0xFF;

/// Upper bounds (inclusive) of the configurable fields
pub const ENERGY_MAX: u8 = 7;
pub const TIME_MAX: u8 = 7;
pub const THRESHOLD_MAX: u8 = 3;
pub const P_VALUE_MAX: u8 = 31;

/// Energy query codes for probes 1-12
pub const ENERGY_QUERY_CODES: [u8; 12] = [
    0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB, 0xDC,
];

/// Energy temporary-write codes for probes 1-12
pub const ENERGY_TEMP_CODES: [u8; 12] = [
    0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xBB, 0xBC,
];

/// Energy permanent-write codes for probes 1-12
pub const ENERGY_PERM_CODES: [u8; 12] = [
    0x71, 0x72, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7A, 0x7B, 0x7C,
];

/// P-value query codes for probes 1-9
pub const P_VALUE_QUERY_CODES: [u8; 9] = [0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9];

/// P-value temporary-write codes for probes 1-9
pub const P_VALUE_TEMP_CODES: [u8; 9] = [0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9];

/// P-value permanent-write codes for probes 1-9
pub const P_VALUE_PERM_CODES: [u8; 9] = [0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89];

/// Probes visited by a default energy sweep
pub const ENERGY_SWEEP_PROBES: RangeInclusive<u8> = 1..=9;

/// Probes visited by a default P-value sweep
pub const P_VALUE_SWEEP_PROBES: RangeInclusive<u8> = 1..=9;

/// Nominal range distances in metres, in wire order
pub const RANGE_METRES: [f32; 3] = [2.5, 1.5, 6.5];

/// Baud rate (115200 bps)
pub const BAUD_RATE: u32 = 115_200;

/// Read timeout in milliseconds
pub const TIMEOUT_MS: u64 = 3000;

/// Default number of attempts per exchange
pub const MAX_RETRIES: u32 = 3;

/// Pre-read delay before the first energy query read
pub const ENERGY_PRE_READ_BASE_MS: u64 = 100;

/// Added to the energy pre-read delay for every further attempt
pub const ENERGY_PRE_READ_STEP_MS: u64 = 100;

/// Pre-read delay before the first P-value query read
pub const P_VALUE_PRE_READ_BASE_MS: u64 = 100;

/// Added to the P-value pre-read delay for every further attempt
pub const P_VALUE_PRE_READ_STEP_MS: u64 = 50;

/// Delay between failed query attempts
pub const QUERY_RETRY_DELAY_MS: u64 = 200;

/// Settle time between a write frame and its acknowledgement
pub const WRITE_SETTLE_MS: u64 = 500;

/// Delay between failed write attempts
pub const WRITE_RETRY_DELAY_MS: u64 = 300;

/// Delay before the verification read after a write
pub const VERIFY_DELAY_MS: u64 = 500;

/// Bus settle time between probes during a sweep
pub const INTER_PROBE_DELAY_MS: u64 = 100;

/// Exit code a front end reports when the user cancels
pub const EXIT_CANCELLED: i32 = 130;
