//! # Serial Communication Module
//!
//! Drives S.Port bus lines from the main loop.
//!
//! This module handles:
//! - Opening the serial port at 57,600 baud, 8N1
//! - Reading whatever has been received without blocking
//! - Feeding bytes through the slot arbiter and writing any frame it returns
//! - Draining the echo of written bytes on single-wire (half-duplex) lines
//! - Polling several bus lines in turn

pub mod port_trait;

use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Result, SportError};
use crate::exchange::SportExchange;
use crate::sport::arbiter::BusArbiter;
use crate::sport::encoder::encode_frame_into;
use crate::sport::protocol::{Frame, SPORT_MAX_WIRE_SIZE};
pub use port_trait::{NativeSerialPort, SerialPortIO};

/// Bytes read from the port per pass
const RX_BUFFER_SIZE: usize = 64;

/// Bits per byte on the wire with 8N1 framing, rounded down from 10 so the
/// timeout stays tight
const BITS_PER_BYTE: u64 = 9;

/// Default multiple of the byte time to wait for each echoed byte
pub const DEFAULT_ECHO_TIMEOUT_FACTOR: u32 = 4;

/// How long to wait for one echoed byte
///
/// # Arguments
///
/// * `baud_rate` - Line speed
/// * `factor` - Multiple of the time it takes to send one byte
///
/// # Examples
///
/// ```
/// use sport_telemetry::serial::echo_timeout;
/// use std::time::Duration;
///
/// assert_eq!(echo_timeout(57_600, 4), Duration::from_micros(625));
/// ```
pub fn echo_timeout(baud_rate: u32, factor: u32) -> Duration {
    let nanos = BITS_PER_BYTE * factor as u64 * 1_000_000_000 / baud_rate.max(1) as u64;
    Duration::from_nanos(nanos)
}

/// Open a serial port for an S.Port line
///
/// # Arguments
///
/// * `path` - Device path (e.g., "/dev/ttyUSB0")
/// * `baud_rate` - Line speed, normally 57,600
/// * `timeout` - Blocking read timeout, used while draining the echo
///
/// # Errors
///
/// Returns `SportError::Serial` if the port cannot be opened
pub fn open_port(path: &str, baud_rate: u32, timeout: Duration) -> Result<NativeSerialPort> {
    let port = tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .timeout(timeout)
        .open()
        .map_err(|e| SportError::Serial(format!("Failed to open {}: {}", path, e)))?;

    info!("Opened {} at {} baud", path, baud_rate);
    Ok(NativeSerialPort::new(port))
}

/// A bus line the main loop polls
pub trait BusLine {
    /// Whether received bytes are waiting
    fn available(&self) -> bool;

    /// Process everything received so far
    ///
    /// Never fails; errors are logged.
    fn pump(&mut self);
}

/// An S.Port line: serial port, slot arbiter and exchange
pub struct SportLine<P: SerialPortIO> {
    port: P,
    arbiter: BusArbiter,
    exchange: SportExchange,
    rx_buffer: [u8; RX_BUFFER_SIZE],
    tx_buffer: Vec<u8>,
    echo: bool,
}

impl<P: SerialPortIO> std::fmt::Debug for SportLine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SportLine")
            .field("arbiter", &self.arbiter.state())
            .field("exchange", &self.exchange)
            .field("echo", &self.echo)
            .finish_non_exhaustive()
    }
}

impl<P: SerialPortIO> SportLine<P> {
    /// Create a line
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port, opened with the echo timeout if `echo` is set
    /// * `exchange` - Handles the slots this device uses
    /// * `echo` - Whether written bytes are read back (single-wire wiring)
    pub fn new(port: P, exchange: SportExchange, echo: bool) -> Self {
        let mut arbiter = BusArbiter::new();
        exchange.register(&mut arbiter);

        Self {
            port,
            arbiter,
            exchange,
            rx_buffer: [0u8; RX_BUFFER_SIZE],
            tx_buffer: Vec::with_capacity(SPORT_MAX_WIRE_SIZE),
            echo,
        }
    }

    pub fn exchange(&self) -> &SportExchange {
        &self.exchange
    }

    fn write_frame(&mut self, frame: &Frame) {
        encode_frame_into(frame, &mut self.tx_buffer);

        if let Err(e) = self.port.write_all(&self.tx_buffer) {
            error!("Failed to write frame: {}", e);
            return;
        }
        if let Err(e) = self.port.flush() {
            error!("Failed to flush serial port: {}", e);
            return;
        }

        trace!("Sent frame {:02X?}", self.tx_buffer);

        if self.echo {
            self.drain_echo();
        }
    }

    /// Read back the bytes just written so they are not taken for bus traffic
    fn drain_echo(&mut self) {
        let mut received = [0u8; 1];

        for (i, &expected) in self.tx_buffer.iter().enumerate() {
            match self.port.read(&mut received) {
                Ok(1) if received[0] == expected => {}
                Ok(1) => {
                    warn!(
                        "Echo mismatch at byte {}: expected 0x{:02X}, got 0x{:02X}",
                        i, expected, received[0]
                    );
                    return;
                }
                Ok(_) => {
                    warn!("Echo missing at byte {} of {}", i, self.tx_buffer.len());
                    return;
                }
                Err(e) => {
                    warn!("Echo missing at byte {} of {}: {}", i, self.tx_buffer.len(), e);
                    return;
                }
            }
        }
    }
}

impl<P: SerialPortIO> BusLine for SportLine<P> {
    fn available(&self) -> bool {
        match self.port.bytes_available() {
            Ok(count) => count > 0,
            Err(e) => {
                error!("Failed to query serial port: {}", e);
                false
            }
        }
    }

    fn pump(&mut self) {
        let available = match self.port.bytes_available() {
            Ok(0) => return,
            Ok(count) => count.min(RX_BUFFER_SIZE),
            Err(e) => {
                error!("Failed to query serial port: {}", e);
                return;
            }
        };

        let count = match self.port.read(&mut self.rx_buffer[..available]) {
            Ok(0) => return,
            Ok(count) => count,
            Err(e) => {
                error!("Failed to read serial port: {}", e);
                return;
            }
        };

        let last = count - 1;

        for i in 0..count {
            let byte = self.rx_buffer[i];
            let port = &self.port;
            let is_clear = || i == last && matches!(port.bytes_available(), Ok(0));

            if let Some(frame) = self.arbiter.consume(byte, is_clear, &mut self.exchange) {
                self.write_frame(&frame);
            }
        }
    }
}

/// Polls every registered bus line in turn
#[derive(Default)]
pub struct PumpMaster {
    lines: Vec<Box<dyn BusLine>>,
}

impl PumpMaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line to the polling rotation
    pub fn register(&mut self, line: Box<dyn BusLine>) {
        self.lines.push(line);
        debug!("Registered bus line ({} total)", self.lines.len());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Pump each line that has received data
    pub fn pump_all(&mut self) {
        for line in self.lines.iter_mut() {
            if line.available() {
                line.pump();
            }
        }
    }
}
