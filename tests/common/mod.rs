//! Common test utilities: a scripted bus and a sleeper that records waits.

// Not every test file uses every helper
#![allow(dead_code)]

use ks236_protocol::codec::checksum;
use ks236_protocol::{Config, Ks236, Ks236Error, Result, Sleep, Transport};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

pub const ADDR: u8 = 0xE8;
pub const CMD: u8 = 0x99;

/// What the bus does in answer to the next write
#[derive(Debug, Clone)]
pub enum Step {
    /// Probe answers with these bytes
    Reply(Vec<u8>),
    /// Nothing comes back
    Silent,
    /// Transport accepts one byte less than the frame
    ShortWrite,
    /// Write raises an I/O error
    WriteFault,
    /// Write succeeds, the following read raises an I/O error
    ReadFault,
}

/// In-memory bus driven by a script of [`Step`]s, one per write.
/// Once the script runs out the bus stays silent.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: VecDeque<Step>,
    pending: VecDeque<u8>,
    read_fault: bool,
    pub writes: Vec<Vec<u8>>,
    pub clears: usize,
    pub reads: Vec<usize>,
}

impl MockTransport {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        MockTransport {
            script: script.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Frames of the given length that were sent
    pub fn writes_of_len(&self, len: usize) -> Vec<&Vec<u8>> {
        self.writes.iter().filter(|w| w.len() == len).collect()
    }
}

fn io_error(msg: &str) -> Ks236Error {
    Ks236Error::Io(io::Error::new(io::ErrorKind::Other, msg.to_string()))
}

impl Transport for MockTransport {
    fn clear_input_buffer(&mut self) -> Result<()> {
        self.clears += 1;
        self.pending.clear();
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.writes.push(bytes.to_vec());
        match self.script.pop_front().unwrap_or(Step::Silent) {
            Step::Reply(reply) => {
                self.pending = reply.into();
                Ok(bytes.len())
            }
            Step::Silent => Ok(bytes.len()),
            Step::ShortWrite => Ok(bytes.len() - 1),
            Step::WriteFault => Err(io_error("write failed")),
            Step::ReadFault => {
                self.read_fault = true;
                Ok(bytes.len())
            }
        }
    }

    fn read(&mut self, max: usize, _timeout: Duration) -> Result<Vec<u8>> {
        self.reads.push(max);
        if std::mem::take(&mut self.read_fault) {
            return Err(io_error("read failed"));
        }
        let n = max.min(self.pending.len());
        Ok(self.pending.drain(..n).collect())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Records every requested wait instead of sleeping
#[derive(Debug, Default)]
pub struct RecordingSleep {
    pub sleeps: Vec<Duration>,
}

impl RecordingSleep {
    pub fn millis(&self) -> Vec<u64> {
        self.sleeps.iter().map(|d| d.as_millis() as u64).collect()
    }
}

impl Sleep for RecordingSleep {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}

pub fn bus(script: impl IntoIterator<Item = Step>) -> Ks236<MockTransport, RecordingSleep> {
    Ks236::with_transport(MockTransport::new(script), RecordingSleep::default(), Config::default())
}

/// Append the BCC to `body`
pub fn frame(body: &[u8]) -> Vec<u8> {
    let mut frame = body.to_vec();
    frame.push(checksum(body));
    frame
}

/// 15-byte energy query response
pub fn energy_response(code: u8, ranges: [u8; 9]) -> Vec<u8> {
    let mut body = vec![ADDR, CMD, code];
    body.extend_from_slice(&ranges);
    body.extend_from_slice(&[0x2C, 0x40]);
    frame(&body)
}

/// 21-byte P-value query response
pub fn p_value_response(code: u8, values: &[u8; 17]) -> Vec<u8> {
    let mut body = vec![ADDR, CMD, code];
    body.extend_from_slice(values);
    frame(&body)
}

/// 5-byte write acknowledgement
pub fn ack(code: u8, status: u8) -> Vec<u8> {
    frame(&[ADDR, CMD, code, status])
}
