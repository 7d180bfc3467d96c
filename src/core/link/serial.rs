//! Serial port link implementation

use super::{LinkError, LinkOpener, LinkSettings, SerialLink};
use serialport::SerialPort;
use std::io::{Read, Write};
use tracing::debug;

/// Link backed by an OS serial port
pub struct NativeLink {
    name: String,
    port: Box<dyn SerialPort>,
}

impl SerialLink for NativeLink {
    fn write(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        let written = self.port.write(data)?;
        Ok(written)
    }

    fn bytes_to_read(&mut self) -> Result<u32, LinkError> {
        self.port
            .bytes_to_read()
            .map_err(|e| LinkError::Io(e.into()))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let n = self.port.read(buf)?;
        Ok(n)
    }
}

impl Drop for NativeLink {
    fn drop(&mut self) {
        debug!(port = %self.name, "serial port closed");
    }
}

/// Opens OS serial ports through `serialport`
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOpener;

impl LinkOpener for NativeOpener {
    fn open(&self, port: &str, settings: &LinkSettings) -> Result<Box<dyn SerialLink>, LinkError> {
        // serialport carries one timeout per port; it governs reads. Writes
        // are a single call with no retry loop.
        let handle = serialport::new(port, settings.baud_rate)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => LinkError::PortNotFound(port.to_string()),
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                    LinkError::PermissionDenied(port.to_string())
                }
                _ => LinkError::Open {
                    port: port.to_string(),
                    reason: e.to_string(),
                },
            })?;

        Ok(Box::new(NativeLink {
            name: port.to_string(),
            port: handle,
        }))
    }

    fn available_ports(&self) -> Result<Vec<String>, LinkError> {
        serialport::available_ports()
            .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
            .map_err(|e| LinkError::Enumerate(e.to_string()))
    }
}
