//! Process-wide connection guard
//!
//! Records whether a sensor link is connected and which port owns it. The
//! flag is only reachable through [`ConnectionState::try_acquire`] and
//! [`ConnectionState::release`], both serialized by a mutex, so at most one
//! link can hold the connection at a time.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Point-in-time copy of the connection state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionSnapshot {
    /// Whether a link is connected
    pub connected: bool,
    /// Port that owns the connection
    pub owning_port: Option<String>,
}

/// Connection guard shared by every connection manager
#[derive(Debug, Default)]
pub struct ConnectionState {
    inner: Mutex<ConnectionSnapshot>,
}

static GLOBAL: OnceLock<Arc<ConnectionState>> = OnceLock::new();

impl ConnectionState {
    /// Create an unconnected state
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance shared by the whole process
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Mark `port` as connected if nothing else is
    ///
    /// Returns `false` without touching the state when a connection exists.
    pub fn try_acquire(&self, port: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.connected {
            debug!(port, owner = ?inner.owning_port, "connection already held");
            return false;
        }
        inner.connected = true;
        inner.owning_port = Some(port.to_string());
        true
    }

    /// Clear the state if `port` owns it
    pub fn release(&self, port: &str) {
        let mut inner = self.inner.lock();
        if inner.owning_port.as_deref() == Some(port) {
            *inner = ConnectionSnapshot::default();
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.inner.lock().clone()
    }

    /// Whether any link is connected
    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    /// Whether `port` owns the connection
    pub fn is_owned_by(&self, port: &str) -> bool {
        let inner = self.inner.lock();
        inner.connected && inner.owning_port.as_deref() == Some(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_starts_unconnected() {
        let state = ConnectionState::new();
        assert_eq!(state.snapshot(), ConnectionSnapshot::default());
        assert!(!state.is_connected());
    }

    #[test]
    fn test_acquire_then_reject_second() {
        let state = ConnectionState::new();
        assert!(state.try_acquire("COM3"));
        assert!(!state.try_acquire("COM5"));

        let snap = state.snapshot();
        assert!(snap.connected);
        assert_eq!(snap.owning_port.as_deref(), Some("COM3"));
    }

    #[test]
    fn test_release_requires_owner() {
        let state = ConnectionState::new();
        assert!(state.try_acquire("COM3"));

        state.release("COM5");
        assert!(state.is_owned_by("COM3"));

        state.release("COM3");
        assert_eq!(state.snapshot(), ConnectionSnapshot::default());
        assert!(state.try_acquire("COM5"));
    }

    #[test]
    fn test_concurrent_acquire_has_one_winner() {
        let state = Arc::new(ConnectionState::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = Arc::clone(&state);
                thread::spawn(move || state.try_acquire(&format!("COM{i}")))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(state.is_connected());
    }

    #[test]
    fn test_global_is_shared() {
        let a = ConnectionState::global();
        let b = ConnectionState::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
