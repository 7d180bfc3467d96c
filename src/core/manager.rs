//! Connection manager
//!
//! Owns one serial link for the lifetime of a single connection attempt:
//! opens it, runs the identity handshake, claims the process-wide
//! [`ConnectionState`] and reports the outcome over its event channel.
//!
//! Teardown never closes the link underneath the worker. Marking the manager
//! killed cancels its token, which the worker checks before every I/O step
//! and while waiting for the device to settle; [`ConnectionManager::request_teardown`]
//! then joins the worker before it touches the link.

use crate::core::events::{
    AttemptFailure, DeviceClosedEvent, EventSender, LinkEvent, StatusEvent, StatusOutcome,
};
use crate::core::executor::{Executor, TaskHandle};
use crate::core::link::{LinkError, LinkOpener, LinkSettings, SerialLink};
use crate::core::protocol::{decode_reply, is_expected_identity, HANDSHAKE_REQUEST, SETTLE_DELAY};
use crate::core::state::ConnectionState;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on bytes drained by a single read
const MAX_READ_BYTES: usize = 4096;

/// Runs one connection attempt against one port
pub struct ConnectionManager {
    port: String,
    settings: LinkSettings,
    opener: Arc<dyn LinkOpener>,
    state: Arc<ConnectionState>,
    events: EventSender,
    link: Mutex<Option<Box<dyn SerialLink>>>,
    cancel: CancellationToken,
    killed: AtomicBool,
    status_sent: AtomicBool,
    acquired: AtomicBool,
    worker: Mutex<Option<TaskHandle>>,
}

impl ConnectionManager {
    /// Create a manager bound to `port`
    pub fn new(
        port: impl Into<String>,
        opener: Arc<dyn LinkOpener>,
        state: Arc<ConnectionState>,
        events: EventSender,
    ) -> Self {
        Self {
            port: port.into(),
            settings: LinkSettings::SENSOR,
            opener,
            state,
            events,
            link: Mutex::new(None),
            cancel: CancellationToken::new(),
            killed: AtomicBool::new(false),
            status_sent: AtomicBool::new(false),
            acquired: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    /// Port this manager is bound to
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Whether a link handle is currently held
    pub fn is_link_open(&self) -> bool {
        self.link.lock().is_some()
    }

    /// Submit [`Self::attempt_connect`] to the executor
    pub fn start(self: &Arc<Self>, executor: &Executor) {
        let this = Arc::clone(self);
        let handle = executor.spawn(async move { this.attempt_connect().await });
        *self.worker.lock() = Some(handle);
    }

    /// Open the link, run the handshake and report the outcome
    ///
    /// Emits at most one [`StatusEvent`]. A reply that does not match the
    /// expected identity closes the link and emits nothing.
    pub async fn attempt_connect(&self) {
        if self.port.is_empty() {
            warn!("connection attempt without a port name");
            self.emit_status(StatusOutcome::Failure(AttemptFailure::InvalidPort));
            return;
        }

        if self.state.is_connected() {
            info!(port = %self.port, "another link is already connected");
            self.emit_status(StatusOutcome::Failure(AttemptFailure::Busy));
            return;
        }

        if self.cancelled("open") {
            return;
        }

        let link = match self.opener.open(&self.port, &self.settings) {
            Ok(link) => link,
            Err(e) => {
                info!(port = %self.port, error = %e, "error with port");
                self.emit_status(StatusOutcome::Failure(AttemptFailure::LinkOpen(e.to_string())));
                return;
            }
        };
        *self.link.lock() = Some(link);
        info!(port = %self.port, baud = self.settings.baud_rate, "port opened");

        if self.cancelled("handshake request") {
            self.close_link();
            return;
        }
        self.send(HANDSHAKE_REQUEST);

        tokio::select! {
            () = self.cancel.cancelled() => {
                debug!(port = %self.port, "cancelled while waiting for the device");
                self.close_link();
                return;
            }
            () = tokio::time::sleep(SETTLE_DELAY) => {}
        }

        if self.cancelled("handshake reply") {
            self.close_link();
            return;
        }
        let reply = self.read();

        if !is_expected_identity(&reply) {
            warn!(port = %self.port, reply = ?reply, "unexpected handshake reply");
            self.close_link();
            return;
        }

        if !self.state.try_acquire(&self.port) {
            info!(port = %self.port, "connection taken by another link");
            self.close_link();
            self.emit_status(StatusOutcome::Failure(AttemptFailure::Busy));
            return;
        }
        self.acquired.store(true, Ordering::SeqCst);

        info!(port = %self.port, "device identified");
        self.emit_status(StatusOutcome::Success);
    }

    /// Write a single byte; failures are logged and swallowed
    pub fn send(&self, byte: u8) {
        let mut guard = self.link.lock();
        let Some(link) = guard.as_mut() else {
            info!(port = %self.port, byte = %char::from(byte), "could not write, link closed");
            return;
        };

        match link.write(&[byte]) {
            Ok(_) => info!(port = %self.port, byte = %char::from(byte), "written"),
            Err(e) => {
                info!(port = %self.port, byte = %char::from(byte), error = %e, "could not write");
            }
        }
    }

    /// Drain buffered bytes as text; failures yield an empty string
    pub fn read(&self) -> String {
        let mut guard = self.link.lock();
        let Some(link) = guard.as_mut() else {
            info!(port = %self.port, "could not receive, link closed");
            return String::new();
        };

        match drain(link.as_mut()) {
            Ok(bytes) => {
                let text = decode_reply(&bytes);
                info!(port = %self.port, received = %text, "received");
                text
            }
            Err(e) => {
                info!(port = %self.port, error = %e, "could not receive");
                String::new()
            }
        }
    }

    /// Flag the manager for teardown and cancel any in-flight attempt
    pub fn mark_killed(&self) {
        self.killed.store(true, Ordering::SeqCst);
        self.cancel.cancel();
    }

    /// Whether [`Self::mark_killed`] was called
    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    /// Close the link if this manager is killed and acquired the connection
    ///
    /// Joins the worker first, so no read or write is in progress when the
    /// link is dropped. Emits [`DeviceClosedEvent`] only when a connected
    /// link was actually closed. Call from the controller thread, never from
    /// an executor worker.
    pub fn request_teardown(&self) {
        info!(port = %self.port, killed = self.is_killed(), "teardown requested");
        if !self.is_killed() {
            return;
        }

        self.cancel.cancel();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.join();
        }

        if self.acquired.swap(false, Ordering::SeqCst) && self.state.is_owned_by(&self.port) {
            self.close_link();
            self.state.release(&self.port);
            info!(port = %self.port, "device closed");
            self.events.send(LinkEvent::DeviceClosed(DeviceClosedEvent {
                port: self.port.clone(),
            }));
        } else if self.is_link_open() {
            self.close_link();
        }
    }

    fn cancelled(&self, step: &str) -> bool {
        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            debug!(port = %self.port, step, "attempt cancelled");
        }
        cancelled
    }

    fn close_link(&self) {
        let link = self.link.lock().take();
        if link.is_some() {
            debug!(port = %self.port, "link released");
        }
    }

    fn emit_status(&self, outcome: StatusOutcome) {
        if self.status_sent.swap(true, Ordering::SeqCst) {
            debug!(port = %self.port, ?outcome, "status already reported");
            return;
        }
        self.events.send(LinkEvent::Status(StatusEvent {
            port: self.port.clone(),
            outcome,
        }));
    }
}

fn drain(link: &mut dyn SerialLink) -> Result<Vec<u8>, LinkError> {
    let mut received = Vec::new();
    while received.len() < MAX_READ_BYTES {
        let waiting = link.bytes_to_read()? as usize;
        if waiting == 0 {
            break;
        }
        let mut buf = vec![0u8; waiting.min(MAX_READ_BYTES - received.len())];
        let n = link.read(&mut buf)?;
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
    Ok(received)
}
