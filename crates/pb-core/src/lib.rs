//! Core types for the palm-bridge frontend
//!
//! This crate provides the configuration, error handling, logging
//! infrastructure, and the engine/host trait seam the rest of the
//! bridge is built on.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;

pub use config::Config;
pub use engine::{
    EmulationEngine, HostPort, NullEngine, ResetKind, ScreenBuffer, SessionSpec,
    INITIAL_SCREEN_HEIGHT, INITIAL_SCREEN_WIDTH, POWER_BUTTON_ID,
};
pub use error::{BridgeError, Result};
