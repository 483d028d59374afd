//! Query and write exchanges with bounded retries.
//!
//! One attempt is: clear input, write the whole frame, flush, wait, read,
//! classify. Communication faults are retried up to `Config::retries`
//! attempts; a definitive write status is never retried.

use crate::classify::{classify, ResponseShape};
use crate::codec::{build_query, build_write, hex_dump};
use crate::constants::*;
use crate::error::{Fault, Ks236Error, Result};
use crate::params::{self, Family, Operation, WriteMode};
use crate::protocol::Ks236;
use crate::transport::{Sleep, Transport};
use std::time::Duration;

/// Result of a single exchange attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Data region of a valid response
    Success(Vec<u8>),
    Failed(Fault),
}

/// Map an acknowledgement status byte to the write result.
pub fn interpret_status(probe: u8, status: u8) -> Result<()> {
    match status {
        STATUS_OK => Ok(()),
        STATUS_PARAM_ERROR => Err(Ks236Error::ParameterRejected { probe }),
        STATUS_FAILED => Err(Ks236Error::DeviceWriteFailed { probe }),
        other => Err(Ks236Error::UnknownStatus {
            probe,
            status: other,
        }),
    }
}

impl<T: Transport, S: Sleep> Ks236<T, S> {
    /// Run one query exchange and return the response data region.
    pub(crate) fn query_exchange(&mut self, family: Family, probe: u8) -> Result<Vec<u8>> {
        let code = params::lookup(family, Operation::Query, probe)?;
        let frame = build_query(ADDR_CODE, CMD_CODE, code);
        let timing = self.config.timing;
        let (shape, backoff) = match family {
            Family::Energy => (ResponseShape::energy(code), timing.energy_pre_read),
            Family::PValue => (ResponseShape::p_values(code), timing.p_value_pre_read),
        };

        self.retry(probe, timing.query_retry(), |engine, attempt| {
            engine.attempt(&frame, backoff.delay(attempt), &shape)
        })
    }

    /// Send a write frame and interpret the acknowledgement.
    pub(crate) fn write_exchange(
        &mut self,
        family: Family,
        mode: WriteMode,
        probe: u8,
        payload: &[u8],
    ) -> Result<()> {
        let code = params::lookup(family, mode.into(), probe)?;
        let frame = build_write(ADDR_CODE, CMD_CODE, code, payload);
        let timing = self.config.timing;
        let shape = ResponseShape::ack();

        log::info!("Setting {} on probe {} ({}): {}", family, probe, mode, hex_dump(&frame));

        let ack = self.retry(probe, timing.write_retry(), |engine, _| {
            match engine.attempt(&frame, timing.write_settle(), &shape) {
                RetryOutcome::Success(payload) if payload.is_empty() => {
                    RetryOutcome::Failed(Fault::Malformed)
                }
                outcome => outcome,
            }
        })?;

        interpret_status(probe, ack[0])
    }

    fn retry<F>(&mut self, probe: u8, retry_delay: Duration, mut attempt_fn: F) -> Result<Vec<u8>>
    where
        F: FnMut(&mut Self, u32) -> RetryOutcome,
    {
        let attempts = self.config.retries.max(1);
        let mut last = Fault::NoResponse;

        for attempt in 0..attempts {
            match attempt_fn(self, attempt) {
                RetryOutcome::Success(payload) => return Ok(payload),
                RetryOutcome::Failed(fault) => {
                    log::warn!(
                        "Probe {} attempt {}/{} - {}",
                        probe,
                        attempt + 1,
                        attempts,
                        fault
                    );
                    // A short write retries straight away
                    let short = matches!(fault, Fault::ShortWrite { .. });
                    last = fault;
                    if !short && attempt + 1 < attempts {
                        self.sleeper.sleep(retry_delay);
                    }
                }
            }
        }

        Err(Ks236Error::ExchangeFailed {
            probe,
            attempts,
            last,
        })
    }

    fn attempt(&mut self, frame: &[u8], pre_read: Duration, shape: &ResponseShape) -> RetryOutcome {
        match self.try_attempt(frame, pre_read, shape) {
            Ok(outcome) => outcome,
            Err(e) => RetryOutcome::Failed(Fault::Transport(e.to_string())),
        }
    }

    fn try_attempt(
        &mut self,
        frame: &[u8],
        pre_read: Duration,
        shape: &ResponseShape,
    ) -> Result<RetryOutcome> {
        self.transport.clear_input_buffer()?;

        log::trace!("Sending:  {}", hex_dump(frame));
        let sent = self.transport.write(frame)?;
        self.transport.flush()?;

        if sent != frame.len() {
            return Ok(RetryOutcome::Failed(Fault::ShortWrite {
                sent,
                expected: frame.len(),
            }));
        }

        self.sleeper.sleep(pre_read);

        let raw = self
            .transport
            .read(shape.length, self.config.timing.read_timeout())?;
        log::trace!("Received: {}", hex_dump(&raw));

        Ok(match classify(&raw, shape).into_result() {
            Ok(payload) => RetryOutcome::Success(payload),
            Err(fault) => RetryOutcome::Failed(fault),
        })
    }
}
