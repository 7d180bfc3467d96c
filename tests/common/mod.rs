//! Scripted serial devices for integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use sensorlink_core::{LinkError, LinkOpener, LinkSettings, SerialLink};
use std::collections::HashMap;
use std::sync::Arc;

/// How a fake port behaves
#[derive(Debug, Clone)]
pub enum Device {
    /// Answers the handshake with the sensor identity
    Sensor,
    /// Answers the handshake with these bytes
    Reply(Vec<u8>),
    /// Opening the port fails
    Missing,
}

/// A set of fake ports plus a record of what was opened
#[derive(Default)]
pub struct FakeBus {
    ports: Vec<(String, Device)>,
    opened: Mutex<Vec<String>>,
    written: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, name: &str, device: Device) -> Self {
        self.ports.push((name.to_string(), device));
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    pub fn written(&self, port: &str) -> Vec<u8> {
        self.written.lock().get(port).cloned().unwrap_or_default()
    }
}

impl LinkOpener for FakeBus {
    fn open(&self, port: &str, settings: &LinkSettings) -> Result<Box<dyn SerialLink>, LinkError> {
        assert_eq!(*settings, LinkSettings::SENSOR);
        self.opened.lock().push(port.to_string());

        let device = self
            .ports
            .iter()
            .find(|(name, _)| name == port)
            .map(|(_, device)| device.clone())
            .ok_or_else(|| LinkError::PortNotFound(port.to_string()))?;

        let reply = match device {
            Device::Sensor => b"HR/RR sensor".to_vec(),
            Device::Reply(bytes) => bytes,
            Device::Missing => return Err(LinkError::PortNotFound(port.to_string())),
        };

        Ok(Box::new(FakeLink {
            port: port.to_string(),
            reply,
            inbox: Vec::new(),
            written: Arc::clone(&self.written),
        }))
    }

    fn available_ports(&self) -> Result<Vec<String>, LinkError> {
        Ok(self.ports.iter().map(|(name, _)| name.clone()).collect())
    }
}

struct FakeLink {
    port: String,
    reply: Vec<u8>,
    inbox: Vec<u8>,
    written: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl SerialLink for FakeLink {
    fn write(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        self.written
            .lock()
            .entry(self.port.clone())
            .or_default()
            .extend_from_slice(data);
        if data.contains(&b't') {
            self.inbox.extend_from_slice(&self.reply);
        }
        Ok(data.len())
    }

    fn bytes_to_read(&mut self) -> Result<u32, LinkError> {
        Ok(self.inbox.len() as u32)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let n = buf.len().min(self.inbox.len());
        buf[..n].copy_from_slice(&self.inbox[..n]);
        self.inbox.drain(..n);
        Ok(n)
    }
}
