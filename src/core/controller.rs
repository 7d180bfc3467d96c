//! Connect/disconnect toggle state machine
//!
//! The controller runs on a single thread (the UI thread, or the main thread
//! of the CLI). User actions go through [`Controller::dispatch`], which maps
//! them onto transitions through a fixed table; lifecycle events from the
//! active connection attempt are applied by [`Controller::pump`].
//!
//! ```text
//! Disconnected --engage--> Searching --Success--> Connected
//!                              |                      |
//!                           Failure               disengage
//!                              v                      v
//!                         Disconnected           Disconnected
//! ```

use crate::config::AppConfig;
use crate::core::events::{event_channel, EventReceiver, LinkEvent, StatusOutcome};
use crate::core::executor::{Executor, ExecutorError};
use crate::core::link::{LinkError, LinkOpener};
use crate::core::manager::ConnectionManager;
use crate::core::state::{ConnectionSnapshot, ConnectionState};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Toggle label while idle
pub const LABEL_IDLE: &str = "Device search";

/// Toggle label while a connection attempt is running
pub const LABEL_SEARCHING: &str = "Searching device...";

/// Toggle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToggleState {
    /// No attempt and no connection
    Disconnected,
    /// Attempt in progress
    Searching,
    /// Handshake succeeded
    Connected,
}

impl ToggleState {
    /// Whether the toggle control is engaged
    pub fn is_checked(self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

/// Telemetry view selection
///
/// Stored by the controller; no telemetry is streamed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TelemetryMode {
    /// Nothing selected
    #[default]
    None,
    /// Heart rate only
    HrOnly,
    /// Respiration rate only
    RrOnly,
    /// Heart and respiration rate
    Both,
}

impl TelemetryMode {
    /// All modes in display order
    pub const ALL: [Self; 4] = [Self::None, Self::HrOnly, Self::RrOnly, Self::Both];

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::HrOnly => "HR only",
            Self::RrOnly => "RR only",
            Self::Both => "Both",
        }
    }
}

impl fmt::Display for TelemetryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Actions coming from the user interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    /// Toggle control changed to the given checked state
    Toggled(bool),
    /// Telemetry mode picked
    ModeSelected(TelemetryMode),
    /// Application is exiting
    Exit,
}

/// Transition selected for an action in a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Engage,
    Disengage,
    SelectMode(TelemetryMode),
    Shutdown,
    Ignore,
}

fn route(state: ToggleState, action: UiAction) -> Command {
    match (state, action) {
        (ToggleState::Disconnected, UiAction::Toggled(true)) => Command::Engage,
        (ToggleState::Searching | ToggleState::Connected, UiAction::Toggled(false)) => {
            Command::Disengage
        }
        (_, UiAction::ModeSelected(mode)) => Command::SelectMode(mode),
        (_, UiAction::Exit) => Command::Shutdown,
        _ => Command::Ignore,
    }
}

/// Controller errors
#[derive(Error, Debug)]
pub enum ControllerError {
    /// No serial ports to try
    #[error("No serial ports available")]
    NoPorts,

    /// Port enumeration failed
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Executor could not be started
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

struct Attempt {
    manager: Arc<ConnectionManager>,
    events: EventReceiver,
    started: Instant,
}

/// Owns the toggle state and the active connection attempt
pub struct Controller {
    executor: Executor,
    opener: Arc<dyn LinkOpener>,
    state: Arc<ConnectionState>,
    search_timeout: Option<Duration>,
    toggle: ToggleState,
    mode: TelemetryMode,
    attempt: Option<Attempt>,
    notices: Vec<LinkEvent>,
}

impl Controller {
    /// Create a controller
    pub fn new(
        executor: Executor,
        opener: Arc<dyn LinkOpener>,
        state: Arc<ConnectionState>,
        search_timeout: Option<Duration>,
    ) -> Self {
        Self {
            executor,
            opener,
            state,
            search_timeout,
            toggle: ToggleState::Disconnected,
            mode: TelemetryMode::default(),
            attempt: None,
            notices: Vec::new(),
        }
    }

    /// Create a controller over the process-wide connection state
    pub fn from_config(
        config: &AppConfig,
        opener: Arc<dyn LinkOpener>,
    ) -> Result<Self, ControllerError> {
        let executor = Executor::new(config.worker_threads)?;
        Ok(Self::new(
            executor,
            opener,
            ConnectionState::global(),
            config.search_timeout(),
        ))
    }

    /// Apply a user action
    pub fn dispatch(&mut self, action: UiAction) -> Result<(), ControllerError> {
        let command = route(self.toggle, action);
        debug!(state = ?self.toggle, ?action, ?command, "dispatch");

        match command {
            Command::Engage => self.engage()?,
            Command::Disengage => self.disengage(),
            Command::SelectMode(mode) => self.mode = mode,
            Command::Shutdown => self.shutdown(),
            Command::Ignore => {}
        }
        Ok(())
    }

    /// Apply every queued lifecycle event, returning how many were applied
    ///
    /// Also enforces the search timeout when one is configured.
    pub fn pump(&mut self) -> usize {
        let events = self
            .attempt
            .as_ref()
            .map(|a| a.events.drain())
            .unwrap_or_default();
        let count = events.len();
        for event in events {
            self.apply(event);
        }
        self.check_search_timeout();
        count
    }

    /// Block up to `timeout` for the next event, then pump
    ///
    /// Returns `true` if at least one event was applied.
    pub fn wait_for_event(&mut self, timeout: Duration) -> bool {
        let first = self
            .attempt
            .as_ref()
            .and_then(|a| a.events.recv_timeout(timeout));
        match first {
            Some(event) => {
                self.apply(event);
                self.pump();
                true
            }
            None => self.pump() > 0,
        }
    }

    /// Current toggle state
    pub fn toggle_state(&self) -> ToggleState {
        self.toggle
    }

    /// Whether the toggle control should be shown engaged
    pub fn is_checked(&self) -> bool {
        self.toggle.is_checked()
    }

    /// Text for the toggle control
    pub fn label(&self) -> String {
        match (self.toggle, self.active_port()) {
            (ToggleState::Connected, Some(port)) => format!("Disconnect from port {port}"),
            (ToggleState::Searching, _) => LABEL_SEARCHING.to_string(),
            _ => LABEL_IDLE.to_string(),
        }
    }

    /// Port of the running or connected attempt
    pub fn active_port(&self) -> Option<&str> {
        self.attempt.as_ref().map(|a| a.manager.port())
    }

    /// Selected telemetry mode
    pub fn telemetry_mode(&self) -> TelemetryMode {
        self.mode
    }

    /// Process-wide connection state
    pub fn connection(&self) -> ConnectionSnapshot {
        self.state.snapshot()
    }

    /// Events applied since the last call, oldest first
    pub fn drain_notices(&mut self) -> Vec<LinkEvent> {
        std::mem::take(&mut self.notices)
    }

    fn engage(&mut self) -> Result<(), ControllerError> {
        self.toggle = ToggleState::Searching;

        let ports = match self.opener.available_ports() {
            Ok(ports) => ports,
            Err(e) => {
                warn!(error = %e, "could not list serial ports");
                self.toggle = ToggleState::Disconnected;
                return Err(e.into());
            }
        };

        let Some(port) = ports.into_iter().next() else {
            warn!("no serial ports available");
            self.toggle = ToggleState::Disconnected;
            return Err(ControllerError::NoPorts);
        };

        let (tx, rx) = event_channel();
        let manager = Arc::new(ConnectionManager::new(
            port,
            Arc::clone(&self.opener),
            Arc::clone(&self.state),
            tx,
        ));
        info!(port = %manager.port(), "searching device");
        manager.start(&self.executor);

        self.attempt = Some(Attempt {
            manager,
            events: rx,
            started: Instant::now(),
        });
        Ok(())
    }

    fn disengage(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            attempt.manager.mark_killed();
            attempt.manager.request_teardown();
            for event in attempt.events.drain() {
                if let LinkEvent::DeviceClosed(ref closed) = event {
                    info!(port = %closed.port, "port closed");
                }
                self.notices.push(event);
            }
        }
        self.toggle = ToggleState::Disconnected;
    }

    fn shutdown(&mut self) {
        if self.attempt.is_none() {
            info!("exit requested, nothing to tear down");
        }
        self.disengage();
    }

    fn apply(&mut self, event: LinkEvent) {
        let current = self.active_port().map(str::to_owned);
        if current.as_deref() != Some(event.port()) {
            debug!(port = %event.port(), "event for inactive port ignored");
            return;
        }

        match (&event, self.toggle) {
            (LinkEvent::Status(status), ToggleState::Searching) => match status.outcome {
                StatusOutcome::Success => {
                    info!(port = %status.port, "connected");
                    self.toggle = ToggleState::Connected;
                }
                StatusOutcome::Failure(ref reason) => {
                    info!(port = %status.port, ?reason, "connection attempt failed");
                    self.attempt = None;
                    self.toggle = ToggleState::Disconnected;
                }
            },
            (LinkEvent::DeviceClosed(closed), _) => {
                info!(port = %closed.port, "port closed");
            }
            (LinkEvent::Status(_), state) => {
                debug!(?state, "status event outside of search ignored");
            }
        }
        self.notices.push(event);
    }

    fn check_search_timeout(&mut self) {
        let Some(limit) = self.search_timeout else {
            return;
        };
        let expired = self.toggle == ToggleState::Searching
            && self
                .attempt
                .as_ref()
                .is_some_and(|a| a.started.elapsed() >= limit);
        if expired {
            warn!(timeout_secs = limit.as_secs(), "device search timed out");
            self.disengage();
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.attempt.is_some() {
            self.shutdown();
        }
    }
}
