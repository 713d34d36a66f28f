//! Background session operations
//!
//! Session work (booting a ROM, loading or saving a snapshot, installing
//! program files) can take seconds; each runs as a one-shot named thread
//! that marshals its engine calls through the bridge like everyone else.
//! Cancellation is cooperative and only observed between engine calls: a
//! call already running on the worker always completes.

use crate::bridge::EngineBridge;
use pb_core::engine::SessionSpec;
use pb_core::{BridgeError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Shared cancellation flag for one operation
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Handle to a running background operation
///
/// Dropping the handle detaches the operation; it runs to completion and
/// reports through its callback. `cancel` asks it to stop at the next
/// step boundary.
pub struct Operation {
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
}

impl Operation {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the operation has finished and its callback has run.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("background operation panicked");
            }
        }
    }
}

fn spawn<R, W, D>(name: &str, work: W, on_done: D) -> Operation
where
    R: Send + 'static,
    W: FnOnce(&CancelToken) -> Result<R> + Send + 'static,
    D: FnOnce(Result<R>) + Send + 'static,
{
    let cancel = CancelToken::new();
    let work_cancel = cancel.clone();
    let thread = std::thread::Builder::new()
        .name(name.into())
        .spawn(move || on_done(work(&work_cancel)))
        .expect("failed to spawn operation thread");
    Operation {
        cancel,
        thread: Some(thread),
    }
}

/// Boot a fresh session from a ROM in the background.
pub fn start_session<D>(bridge: Arc<EngineBridge>, spec: SessionSpec, on_done: D) -> Operation
where
    D: FnOnce(Result<()>) + Send + 'static,
{
    spawn(
        "op-new-session",
        move |cancel| {
            bridge.call_unless_cancelled(cancel, move |handle| handle.engine.new_session(&spec))?;
            bridge.resume();
            Ok(())
        },
        on_done,
    )
}

/// Resume a saved session in the background.
pub fn load_session<D>(bridge: Arc<EngineBridge>, psf_file: PathBuf, on_done: D) -> Operation
where
    D: FnOnce(Result<()>) + Send + 'static,
{
    spawn(
        "op-load-session",
        move |cancel| {
            bridge.set_session_file(psf_file.clone());
            bridge.call_unless_cancelled(cancel, move |handle| {
                handle.engine.restart_session(&psf_file)
            })?;
            bridge.resume();
            Ok(())
        },
        on_done,
    )
}

/// Snapshot the running session in the background.
pub fn save_session<D>(bridge: Arc<EngineBridge>, psf_file: PathBuf, on_done: D) -> Operation
where
    D: FnOnce(Result<()>) + Send + 'static,
{
    spawn(
        "op-save-session",
        move |cancel| {
            if !bridge.is_active() {
                tracing::debug!("background save ignored, no active session");
                return Ok(());
            }
            bridge
                .call_unless_cancelled(cancel, move |handle| handle.engine.save_session(&psf_file))
        },
        on_done,
    )
}

/// Install program files one at a time; stops at the first failure or at
/// the next file boundary after cancellation.
pub fn install_files<D>(bridge: Arc<EngineBridge>, paths: Vec<PathBuf>, on_done: D) -> Operation
where
    D: FnOnce(Result<()>) + Send + 'static,
{
    spawn(
        "op-install",
        move |cancel| {
            for path in paths {
                let shown = path.display().to_string();
                let code = bridge
                    .call_unless_cancelled(cancel, move |handle| handle.engine.install_file(&path))?;
                if code != 0 {
                    return Err(BridgeError::Install { path: shown, code });
                }
                tracing::info!("installed {}", shown);
            }
            Ok(())
        },
        on_done,
    )
}
