//! Serial link layer
//!
//! A link is the byte channel to the sensor. The connection manager talks to
//! it through [`SerialLink`] and obtains it through a [`LinkOpener`], so the
//! handshake logic can run against a real port or a scripted device.

mod serial;

pub use serial::{NativeLink, NativeOpener};

use std::time::Duration;
use thiserror::Error;

/// Fixed link parameters for the HR/RR sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    /// Baud rate
    pub baud_rate: u32,
    /// Write timeout (zero means a send never waits)
    pub write_timeout: Duration,
    /// Read timeout
    pub read_timeout: Duration,
}

impl LinkSettings {
    /// Parameters of the only supported device class
    pub const SENSOR: Self = Self {
        baud_rate: 9600,
        write_timeout: Duration::ZERO,
        read_timeout: Duration::from_millis(2000),
    };
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self::SENSOR
    }
}

/// Link error types
#[derive(Error, Debug)]
pub enum LinkError {
    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Opening the device failed for another reason
    #[error("Could not open {port}: {reason}")]
    Open {
        /// Port name
        port: String,
        /// Underlying error text
        reason: String,
    },

    /// I/O error after the link was opened
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port enumeration failed
    #[error("Could not enumerate serial ports: {0}")]
    Enumerate(String),
}

/// An open serial link
///
/// Dropping the link closes it.
#[cfg_attr(test, mockall::automock)]
pub trait SerialLink: Send {
    /// Write bytes, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, LinkError>;

    /// Number of bytes currently buffered for reading
    fn bytes_to_read(&mut self) -> Result<u32, LinkError>;

    /// Read into `buf`, returning the number of bytes read
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;
}

/// Opens links and enumerates candidate ports
#[cfg_attr(test, mockall::automock)]
pub trait LinkOpener: Send + Sync {
    /// Open `port` with the given settings
    fn open(&self, port: &str, settings: &LinkSettings) -> Result<Box<dyn SerialLink>, LinkError>;

    /// Port names currently available, in enumeration order
    fn available_ports(&self) -> Result<Vec<String>, LinkError>;
}
