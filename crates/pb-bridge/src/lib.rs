//! Engine bridge for palm-bridge
//!
//! Coordinates the UI with the thread-affine emulator core: one dedicated
//! worker thread owns the engine and runs both marshaled calls and the
//! periodic idle polling, a double-buffered screen handoff carries frames
//! to the UI, a blocking modal protocol lets the engine demand decisions
//! mid-call, and background operations keep slow session work off the UI
//! thread.

pub mod bridge;
pub mod clipboard;
pub mod modal;
pub mod ops;
pub mod screen;
mod worker;

pub use bridge::{
    clear_crash_flag, crash_flag_present, ClipboardPort, EngineBridge, NullClipboard,
    CRASH_CLOSE_ID, CRASH_REPORT_ID,
};
pub use modal::{
    DialogHost, ModalBridge, ModalButton, ModalRequest, ModalResponder, UNAVAILABLE_RESPONSE,
    UNSUPPORTED_BUTTON_LABEL,
};
pub use ops::{CancelToken, Operation};
pub use screen::{DisplayHandle, DisplaySurface, FrameSink};
