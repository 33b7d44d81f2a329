//! Trait abstraction for serial port operations to enable testing

use std::io::{self, Read, Write};

/// Trait for serial port I/O operations
///
/// Reads use the timeout the port was opened with. Callers that must not
/// block check [`SerialPortIO::bytes_available`] first.
pub trait SerialPortIO: Send {
    /// Number of received bytes waiting to be read
    fn bytes_available(&self) -> io::Result<usize>;

    /// Read up to `buf.len()` bytes
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all data to the port
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    fn flush(&mut self) -> io::Result<()>;
}

/// Wrapper around a native serial port that implements SerialPortIO
pub struct NativeSerialPort {
    port: Box<dyn tokio_serial::SerialPort>,
}

impl NativeSerialPort {
    pub fn new(port: Box<dyn tokio_serial::SerialPort>) -> Self {
        Self { port }
    }
}

impl std::fmt::Debug for NativeSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeSerialPort")
            .field("name", &self.port.name())
            .finish_non_exhaustive()
    }
}

impl SerialPortIO for NativeSerialPort {
    fn bytes_available(&self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(&mut self.port, buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.port, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.port)
    }
}
