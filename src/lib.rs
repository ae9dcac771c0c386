//! # RadarPresence
//!
//! Firmware glue between a vendor radar presence-sensing engine, the board
//! peripherals and a serial console.
//!
//! ## Architecture
//!
//! Two long-running tasks share one engine handle and one console gate:
//! - [`bridge`]: pumps the engine every 2 ms and turns presence events into
//!   indicator changes plus best-effort console lines
//! - [`configurator`]: reads keystrokes and edits the two engine parameters
//!
//! All text output goes through the [`gate::ConsoleGate`] so the tasks never
//! interleave characters. The processing loop never waits on the gate.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod bridge;
pub mod cancel;
pub mod config;
pub mod configurator;
pub mod engine;
pub mod fault;
pub mod gate;
pub mod indicator;
pub mod terminal;

#[cfg(feature = "std")]
pub mod app;
#[cfg(feature = "std")]
pub mod sim;

#[cfg(all(feature = "std", target_os = "espidf"))]
pub mod hal;

pub use bridge::{BridgeError, BridgeState, Clock, PresenceHandler, SensingBridge};
pub use cancel::CancelToken;
pub use config::{Parameter, Sensitivity};
pub use configurator::Configurator;
pub use engine::{EngineError, EventMask, PresenceEvent, PresenceListener, SensingEngine};
pub use fault::{FaultCode, FaultState};
pub use gate::{ConsoleGate, GateError, GateGuard, Timeout};
pub use indicator::Indicators;
pub use terminal::{Terminal, TerminalError};
