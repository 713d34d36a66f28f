//! Bridge front-end between the UI and the engine worker
//!
//! `EngineBridge` is the only way the rest of the program talks to the
//! emulator core. Every engine call is marshaled onto the worker thread;
//! the engine's callbacks come back through `Host`, which translates them
//! into dialog requests, sound commands, clipboard traffic, and worker
//! state changes.

use crate::clipboard;
use crate::modal::{ModalBridge, ModalButton, ModalRequest};
use crate::ops::CancelToken;
use crate::screen::{DisplayHandle, DisplaySurface, FrameSink};
use crate::worker::{self, EngineHandle, WorkerShared};
use parking_lot::Mutex;
use pb_audio::{SoundCommand, SoundQueue};
use pb_core::config::{Codepage, Config};
use pb_core::engine::{
    EmulationEngine, HostPort, ResetKind, SessionSpec, INITIAL_SCREEN_HEIGHT, INITIAL_SCREEN_WIDTH,
};
use pb_core::{BridgeError, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

/// Button ids of the crash prompt
pub const CRASH_CLOSE_ID: i32 = 0;
pub const CRASH_REPORT_ID: i32 = 1;

/// Host-side system clipboard access
pub trait ClipboardPort: Send + Sync {
    fn get_text(&self) -> String;
    fn set_text(&self, text: &str);
}

/// Clipboard stub for headless use
#[derive(Debug, Default)]
pub struct NullClipboard {
    text: Mutex<String>,
}

impl ClipboardPort for NullClipboard {
    fn get_text(&self) -> String {
        self.text.lock().clone()
    }

    fn set_text(&self, text: &str) {
        *self.text.lock() = text.to_string();
    }
}

/// The engine's view of its host. One per bridge; the engine keeps a
/// reference for its whole life, so everything here is callable from the
/// engine thread at any time.
struct Host {
    shared: Arc<WorkerShared>,
    modal: Arc<ModalBridge>,
    sounds: Option<SoundQueue>,
    clipboard: Arc<dyn ClipboardPort>,
    codepage: Codepage,
    crash_flag: PathBuf,
}

impl Host {
    /// Persist the crash marker before anything user-visible happens, so
    /// the next launch knows even if the user force-kills the prompt.
    fn write_crash_flag(&self) {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.crash_flag.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = std::fs::File::create(&self.crash_flag)?;
            file.write_all(b"1\n")?;
            file.sync_all()
        };
        if let Err(e) = write() {
            tracing::error!("failed to persist crash flag {:?}: {}", self.crash_flag, e);
        }
    }
}

impl HostPort for Host {
    fn on_resize(&self, width: usize, height: usize) {
        // Called from inside an engine call; the actual reallocation is
        // deferred to the worker loop once the call returns.
        tracing::info!("engine requested screen size {}x{}", width, height);
        self.shared.request_resize(width, height);
        self.shared.set_active(true);
    }

    fn on_common_dialog(&self, ids: &[i32], labels: &[String], props: &[bool]) -> i32 {
        let request = ModalRequest::from_raw("Emulator Alert", ids, labels, props);
        self.modal.request(&request)
    }

    fn on_reset_dialog(&self, ids: &[i32], labels: &[String], props: &[bool]) -> i32 {
        let mut request = ModalRequest::from_raw("Emulator Reset", ids, labels, props);
        if request.message.is_empty() {
            request.message = "Choose reset type".to_string();
        }
        self.modal.request(&request)
    }

    fn on_queue_sound(&self, freq_hz: u32, duration_ms: u32, amplitude: u8) {
        if let Some(sounds) = &self.sounds {
            sounds.enqueue(SoundCommand {
                freq_hz,
                duration_ms,
                amplitude,
            });
        }
    }

    fn on_crash(&self) {
        tracing::error!("engine crashed");
        // Stop idle ticks before the prompt is visible; nothing may call
        // into the core after a fault.
        self.shared.pause();
        self.shared.set_active(false);
        self.write_crash_flag();

        let request = ModalRequest {
            title: "Emulator Crash".to_string(),
            message: "The emulated system hit an unrecoverable fault. \
                      The session was not saved."
                .to_string(),
            buttons: vec![
                ModalButton {
                    id: CRASH_REPORT_ID,
                    label: "Report".to_string(),
                    visible: true,
                    enabled: true,
                },
                ModalButton {
                    id: CRASH_CLOSE_ID,
                    label: "Close".to_string(),
                    visible: true,
                    enabled: true,
                },
            ],
        };
        let answer = self.modal.request(&request);
        tracing::info!("crash prompt dismissed with {}", answer);
    }

    fn set_clipboard(&self, bytes: &[u8]) {
        self.clipboard
            .set_text(&clipboard::decode(bytes, self.codepage));
    }

    fn get_clipboard(&self) -> Vec<u8> {
        clipboard::encode(&self.clipboard.get_text(), self.codepage)
    }
}

/// Owner of the engine worker thread and the UI-facing call surface
///
/// Input and idle calls on an inactive session are logged no-ops; a
/// session becomes active when the engine announces its screen size and
/// inactive again on shutdown or crash.
pub struct EngineBridge {
    shared: Arc<WorkerShared>,
    modal: Arc<ModalBridge>,
    display: DisplayHandle,
    session_path: Mutex<PathBuf>,
    worker: Option<JoinHandle<()>>,
}

impl EngineBridge {
    /// Spawn the engine worker. `make_engine` runs on the worker thread
    /// and receives the host port the engine should call back through.
    pub fn new<F>(
        config: &Config,
        sink: Arc<dyn FrameSink>,
        clip: Arc<dyn ClipboardPort>,
        sounds: Option<SoundQueue>,
        make_engine: F,
    ) -> Self
    where
        F: FnOnce(Arc<dyn HostPort>) -> Box<dyn EmulationEngine> + Send + 'static,
    {
        let shared = Arc::new(WorkerShared::new(std::time::Duration::from_millis(
            config.poll.interval_ms,
        )));
        let modal = Arc::new(ModalBridge::new());
        let display: DisplayHandle = Arc::new(Mutex::new(DisplaySurface::new(
            INITIAL_SCREEN_WIDTH,
            INITIAL_SCREEN_HEIGHT,
        )));

        let host: Arc<dyn HostPort> = Arc::new(Host {
            shared: Arc::clone(&shared),
            modal: Arc::clone(&modal),
            sounds,
            clipboard: clip,
            codepage: config.clipboard.codepage,
            crash_flag: config.paths.crash_flag.clone(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker_display = Arc::clone(&display);
        let worker = std::thread::Builder::new()
            .name("engine".into())
            .spawn(move || {
                worker::run(
                    worker_shared,
                    worker_display,
                    sink,
                    Box::new(move || make_engine(host)),
                )
            })
            .expect("failed to spawn engine worker");

        Self {
            shared,
            modal,
            display,
            session_path: Mutex::new(config.session_path()),
            worker: Some(worker),
        }
    }

    /// Fire-and-forget engine call
    fn call(&self, f: impl FnOnce(&mut EngineHandle) + Send + 'static) {
        self.shared.push_task(Box::new(f));
    }

    /// Engine call whose result the caller waits for. `None` only if the
    /// worker is gone.
    fn call_wait<R: Send + 'static>(
        &self,
        f: impl FnOnce(&mut EngineHandle) -> R + Send + 'static,
    ) -> Option<R> {
        let (tx, rx) = mpsc::channel();
        self.shared.push_task(Box::new(move |handle| {
            let _ = tx.send(f(handle));
        }));
        rx.recv().ok()
    }

    // Session lifecycle

    /// Boot a fresh session from a ROM, then start idle polling.
    pub fn new_session(&self, spec: SessionSpec) {
        self.call_wait(move |handle| handle.engine.new_session(&spec));
        self.resume();
    }

    /// Resume a previously saved session, then start idle polling.
    pub fn restart_session(&self, psf_file: PathBuf) {
        *self.session_path.lock() = psf_file.clone();
        self.call_wait(move |handle| handle.engine.restart_session(&psf_file));
        self.resume();
    }

    /// Snapshot the running session to a file.
    pub fn save_session(&self, psf_file: PathBuf) {
        if !self.guard_active("save session") {
            return;
        }
        self.call_wait(move |handle| handle.engine.save_session(&psf_file));
    }

    /// Save to the current session file and deactivate. Safe to call more
    /// than once; the engine only sees the first call per active session.
    pub fn shutdown(&self) {
        self.shared.pause();
        if !self.guard_active("shutdown") {
            return;
        }
        let psf_file = self.session_path.lock().clone();
        self.call_wait(move |handle| handle.engine.shutdown(&psf_file));
        self.shared.set_active(false);
    }

    /// Install a program file into the emulated device.
    pub fn install_file(&self, path: PathBuf) -> Result<()> {
        let shown = path.display().to_string();
        let code = self
            .call_wait(move |handle| handle.engine.install_file(&path))
            .ok_or(BridgeError::Cancelled)?;
        if code == 0 {
            Ok(())
        } else {
            Err(BridgeError::Install { path: shown, code })
        }
    }

    pub fn reset(&self, kind: ResetKind) {
        self.call(move |handle| handle.engine.reset(kind));
    }

    pub fn session_info(&self) -> Vec<String> {
        self.call_wait(|handle| handle.engine.session_info())
            .unwrap_or_default()
    }

    // Input

    pub fn pen_down(&self, x: i32, y: i32) {
        if !self.guard_active("pen down") {
            return;
        }
        self.call(move |handle| {
            let reset = handle.engine.pen_down(x, y);
            handle.note_reset(reset);
        });
    }

    pub fn pen_move(&self, x: i32, y: i32) {
        if !self.guard_active("pen move") {
            return;
        }
        self.call(move |handle| {
            let reset = handle.engine.pen_move(x, y);
            handle.note_reset(reset);
        });
    }

    pub fn pen_up(&self, x: i32, y: i32) {
        if !self.guard_active("pen up") {
            return;
        }
        self.call(move |handle| {
            let reset = handle.engine.pen_up(x, y);
            handle.note_reset(reset);
        });
    }

    /// Deliver a character key. Code 0 carries no character and is never
    /// forwarded.
    pub fn key_event(&self, code: i32) {
        if code == 0 || !self.guard_active("key event") {
            return;
        }
        self.call(move |handle| {
            let reset = handle.engine.key_event(code);
            handle.note_reset(reset);
        });
    }

    /// Deliver a hardware button edge (press or release).
    pub fn button_event(&self, button: i32, down: bool) {
        if !self.guard_active("button event") {
            return;
        }
        self.call(move |handle| {
            let reset = handle.engine.button_event(button, down);
            handle.note_reset(reset);
        });
    }

    /// Tap the power button: press, one idle step, release, all within the
    /// next idle tick so the emulated OS sees a plausible hold time.
    pub fn power_button(&self) {
        if !self.guard_active("power button") {
            return;
        }
        self.shared.request_power_tap();
    }

    fn guard_active(&self, what: &str) -> bool {
        if self.shared.is_active() {
            true
        } else {
            tracing::debug!("{} ignored, no active session", what);
            false
        }
    }

    // Polling control

    /// Stop idle ticks, e.g. while the app is backgrounded. A tick already
    /// running finishes first.
    pub fn pause(&self) {
        tracing::debug!("idle polling paused");
        self.shared.pause();
    }

    /// Start (or restart) idle ticks: one immediately, then one per
    /// configured interval.
    pub fn resume(&self) {
        tracing::debug!("idle polling resumed");
        self.shared.resume();
    }

    pub fn is_polling(&self) -> bool {
        self.shared.is_polling()
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    // Wiring

    /// Shared surface the UI draws from
    pub fn display(&self) -> DisplayHandle {
        Arc::clone(&self.display)
    }

    /// Modal entry point, for installing and removing the UI dialog host
    pub fn modal(&self) -> &ModalBridge {
        &self.modal
    }

    /// Redirect subsequent shutdowns to a different session file
    pub fn set_session_file(&self, psf_file: PathBuf) {
        *self.session_path.lock() = psf_file;
    }

    /// Run `op` with the engine on the worker thread unless `cancel` has
    /// already fired. Used by background operations between their steps.
    pub(crate) fn call_unless_cancelled<R: Send + 'static>(
        &self,
        cancel: &CancelToken,
        op: impl FnOnce(&mut EngineHandle) -> R + Send + 'static,
    ) -> Result<R> {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }
        self.call_wait(op).ok_or(BridgeError::Cancelled)
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        self.shutdown();
        self.shared.stop();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("engine worker panicked");
            }
        }
    }
}

/// Whether the previous run ended in an engine crash
pub fn crash_flag_present(config: &Config) -> bool {
    config.paths.crash_flag.exists()
}

/// Clear the crash marker once the user has acknowledged it
pub fn clear_crash_flag(config: &Config) -> Result<()> {
    match std::fs::remove_file(&config.paths.crash_flag) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
