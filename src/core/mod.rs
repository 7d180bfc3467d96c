//! Core module containing the connection lifecycle
//!
//! This module provides:
//! - Serial link abstraction and the native `serialport` backend
//! - Identity handshake constants and reply decoding
//! - Process-wide connection guard
//! - Lifecycle event channel
//! - Background executor for connection attempts
//! - Connection manager running one attempt against one port
//! - Toggle controller driving the user-facing state machine

pub mod controller;
pub mod events;
pub mod executor;
pub mod link;
pub mod manager;
pub mod protocol;
pub mod state;
