//! # Sensorlink Core Library
//!
//! Connection lifecycle for a single HR/RR sensor on a serial link:
//! - Opening the link with the sensor's fixed parameters
//! - Identity handshake (`t` -> `"HR/RR sensor"`)
//! - A process-wide guard allowing one connected link at a time
//! - Lifecycle events delivered to a single-threaded controller
//! - Orderly teardown that cancels and joins in-flight I/O first
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sensorlink_core::{AppConfig, Controller, NativeOpener, UiAction};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::default();
//!     let mut controller = Controller::from_config(&config, Arc::new(NativeOpener))?;
//!
//!     controller.dispatch(UiAction::Toggled(true))?;
//!     while controller.wait_for_event(Duration::from_secs(5)) {
//!         println!("{}", controller.label());
//!     }
//!
//!     controller.dispatch(UiAction::Exit)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;
pub mod logging;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes};
pub use crate::config::{AppConfig, ConfigArgs, ConfigError, LoggingConfig};
pub use crate::core::controller::{
    Controller, ControllerError, TelemetryMode, ToggleState, UiAction,
};
pub use crate::core::events::{
    event_channel, AttemptFailure, DeviceClosedEvent, EventReceiver, EventSender, LinkEvent,
    StatusEvent, StatusOutcome,
};
pub use crate::core::executor::{Executor, ExecutorError, TaskHandle};
pub use crate::core::link::{LinkError, LinkOpener, LinkSettings, NativeOpener, SerialLink};
pub use crate::core::manager::ConnectionManager;
pub use crate::core::state::{ConnectionSnapshot, ConnectionState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
