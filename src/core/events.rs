//! Lifecycle events delivered from a connection worker to the controller
//!
//! Each connection attempt gets its own FIFO channel. The worker side only
//! sends; the controller drains the receiver on its own thread.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// Why an attempt ended without a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AttemptFailure {
    /// The port name was empty
    InvalidPort,
    /// Another link already holds the connection
    Busy,
    /// The serial device could not be opened
    LinkOpen(String),
}

/// Outcome of a connection attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StatusOutcome {
    /// Handshake completed and the connection was acquired
    Success,
    /// The attempt failed
    Failure(AttemptFailure),
}

/// Result of one connection attempt, sent at most once per attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    /// Port the attempt ran on
    pub port: String,
    /// Outcome
    pub outcome: StatusOutcome,
}

impl StatusEvent {
    /// Whether the attempt connected
    pub fn is_success(&self) -> bool {
        self.outcome == StatusOutcome::Success
    }
}

/// A connected link was torn down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceClosedEvent {
    /// Port that was closed
    pub port: String,
}

/// Any event a connection manager can emit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LinkEvent {
    /// Attempt finished
    Status(StatusEvent),
    /// Link closed after teardown
    DeviceClosed(DeviceClosedEvent),
}

impl LinkEvent {
    /// Port the event refers to
    pub fn port(&self) -> &str {
        match self {
            Self::Status(ev) => &ev.port,
            Self::DeviceClosed(ev) => &ev.port,
        }
    }
}

/// Create a connected sender/receiver pair
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EventSender { tx }, EventReceiver { rx })
}

/// Sending half, held by a connection manager
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<LinkEvent>,
}

impl EventSender {
    /// Deliver an event; a dropped receiver is logged and otherwise ignored
    pub fn send(&self, event: LinkEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!(port = %e.0.port(), "event receiver dropped, event discarded");
        }
    }
}

/// Receiving half, drained on the controller thread
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<LinkEvent>,
}

impl EventReceiver {
    /// Next queued event, if any
    pub fn try_recv(&self) -> Option<LinkEvent> {
        match self.rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LinkEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// All currently queued events, oldest first
    pub fn drain(&self) -> Vec<LinkEvent> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(port: &str, outcome: StatusOutcome) -> LinkEvent {
        LinkEvent::Status(StatusEvent {
            port: port.to_string(),
            outcome,
        })
    }

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = event_channel();
        tx.send(status("COM3", StatusOutcome::Success));
        tx.send(LinkEvent::DeviceClosed(DeviceClosedEvent {
            port: "COM3".to_string(),
        }));

        let events = rx.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LinkEvent::Status(_)));
        assert!(matches!(events[1], LinkEvent::DeviceClosed(_)));
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = event_channel();
        drop(rx);
        tx.send(status("COM3", StatusOutcome::Failure(AttemptFailure::Busy)));
    }

    #[test]
    fn test_recv_timeout_empty() {
        let (_tx, rx) = event_channel();
        assert!(rx.recv_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_json_shape() {
        let ev = status("COM3", StatusOutcome::Success);
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "status");
        assert_eq!(json["port"], "COM3");
        assert_eq!(json["outcome"], "Success");
    }
}
