//! Byte channel to the RS485 bus, and the blocking waits between exchanges.

use crate::error::Result;
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

/// Half-duplex byte channel shared by all probes on the bus.
pub trait Transport {
    /// Discard anything left in the receive buffer.
    fn clear_input_buffer(&mut self) -> Result<()>;

    /// Send `bytes`, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Read up to `max` bytes. Returns fewer when `timeout` elapses first.
    fn read(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>>;

    fn flush(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn clear_input_buffer(&mut self) -> Result<()> {
        (**self).clear_input_buffer()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        (**self).write(bytes)
    }

    fn read(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>> {
        (**self).read(max, timeout)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn clear_input_buffer(&mut self) -> Result<()> {
        (**self).clear_input_buffer()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        (**self).write(bytes)
    }

    fn read(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>> {
        (**self).read(max, timeout)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Serial port configured 8N1 for the probe bus
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open `port_name` at `baud_rate`.
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .open()?;

        log::info!("Connected to {} at {} baud", port_name, baud_rate);
        Ok(SerialTransport { port })
    }

    /// Wrap an already opened port.
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        SerialTransport { port }
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }
}

impl Transport for SerialTransport {
    fn clear_input_buffer(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        Ok(Write::write(&mut self.port, bytes)?)
    }

    fn read(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; max];
        let mut filled = 0;
        // A timeout too large for the clock means no deadline
        let deadline = Instant::now().checked_add(timeout);

        while filled < max {
            let remaining = time_left(deadline, timeout);
            if remaining.is_zero() {
                break;
            }
            self.port.set_timeout(remaining)?;
            match Read::read(&mut self.port, &mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }

        buf.truncate(filled);
        Ok(buf)
    }

    fn flush(&mut self) -> Result<()> {
        Write::flush(&mut self.port)?;
        Ok(())
    }
}

fn time_left(deadline: Option<Instant>, timeout: Duration) -> Duration {
    match deadline {
        Some(deadline) => deadline.saturating_duration_since(Instant::now()),
        None => timeout,
    }
}

/// Blocking wait used between bus operations
pub trait Sleep {
    fn sleep(&mut self, duration: Duration);
}

impl<S: Sleep + ?Sized> Sleep for &mut S {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Sleeps the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}
