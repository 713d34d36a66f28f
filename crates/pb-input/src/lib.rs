//! Touch input handling for palm-bridge
//!
//! Turns raw pointer events from the UI into the pen events the emulated
//! OS expects: mapped to emulated-screen coordinates, thinned to
//! mouse-grade density, and kept consistent across region exits and
//! re-entries.

pub mod touch;

pub use touch::{DisplayRegion, PenAction, PointerEvent, TouchDispatcher};
