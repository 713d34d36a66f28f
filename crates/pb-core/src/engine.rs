//! Engine trait seam
//!
//! The emulator core is thread-affine native code in spirit: it must only
//! ever be driven from one thread, and it calls back into its host for
//! screen resizes, blocking dialogs, sounds, the clipboard, and crashes.
//! Both directions are modeled as traits here so the bridge's concurrency
//! protocol can be exercised against a fake engine.

use std::path::Path;

/// Hardware button id of the power button on the emulated device
pub const POWER_BUTTON_ID: i32 = 6;

/// Screen dimensions before the first resize notification arrives
pub const INITIAL_SCREEN_WIDTH: usize = 332;
pub const INITIAL_SCREEN_HEIGHT: usize = 452;

/// Bytes per pixel of the emulated screen (RGB565)
pub const BYTES_PER_PIXEL: usize = 2;

/// Raw emulated-screen pixel buffer
///
/// Owned by the engine worker thread and written only by `idle_step`.
/// The buffer is reallocated exclusively through `resize`, never grown or
/// shrunk piecemeal, so `pixels.len() == width * height * 2` always holds.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl ScreenBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * BYTES_PER_PIXEL],
        }
    }

    /// Replace the buffer with a fresh allocation for the new dimensions
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width * height * BYTES_PER_PIXEL];
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::new(INITIAL_SCREEN_WIDTH, INITIAL_SCREEN_HEIGHT)
    }
}

/// Parameters for starting a fresh emulation session
#[derive(Debug, Clone)]
pub struct SessionSpec {
    pub rom_file: std::path::PathBuf,
    pub ram_size: String,
    pub device: String,
    pub skin: String,
}

/// Reset flavors understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    Soft,
    /// Soft reset with system extensions disabled
    NoExtensions,
    Hard,
}

/// Calls the bridge makes into the engine
///
/// All methods must be invoked from the single engine worker thread. Input
/// and idle calls return `true` when the emulated OS is mid-boot and
/// swallowed the event, which the UI reports as a transient warning.
pub trait EmulationEngine: Send {
    fn new_session(&mut self, spec: &SessionSpec);

    fn restart_session(&mut self, psf_file: &Path);

    fn save_session(&mut self, psf_file: &Path);

    /// Save to the given file and release session resources. The bridge
    /// guarantees at most one call per active session.
    fn shutdown(&mut self, psf_file: &Path);

    /// Give the emulated system a time slice; returns true when the screen
    /// buffer now holds a new frame.
    fn idle_step(&mut self, buffer: &mut ScreenBuffer) -> bool;

    fn pen_down(&mut self, x: i32, y: i32) -> bool;

    fn pen_move(&mut self, x: i32, y: i32) -> bool;

    fn pen_up(&mut self, x: i32, y: i32) -> bool;

    fn key_event(&mut self, code: i32) -> bool;

    fn button_event(&mut self, button: i32, down: bool) -> bool;

    /// Install a program file into the emulated device; 0 on success,
    /// an engine-defined error code otherwise.
    fn install_file(&mut self, path: &Path) -> i32;

    fn reset(&mut self, kind: ResetKind);

    /// Human-readable device/ROM/session description lines
    fn session_info(&self) -> Vec<String>;
}

/// Calls the engine makes back into its host
///
/// The dialog calls block the calling (engine) thread until the UI answers.
/// Everything else is fire-and-forget. Clipboard payloads are in the
/// emulated OS's single-byte codepage.
pub trait HostPort: Send + Sync {
    /// The emulated screen changed dimensions; the host must reallocate its
    /// buffers to `width * height * 2` bytes and treat the session as live.
    fn on_resize(&self, width: usize, height: usize);

    /// Blocking alert. `labels[3]`, when present, carries the message body;
    /// `props` holds (visible, enabled, ..) per button at stride 4.
    fn on_common_dialog(&self, ids: &[i32], labels: &[String], props: &[bool]) -> i32;

    /// Blocking reset-type choice, same wire shape as `on_common_dialog`.
    fn on_reset_dialog(&self, ids: &[i32], labels: &[String], props: &[bool]) -> i32;

    fn on_queue_sound(&self, freq_hz: u32, duration_ms: u32, amplitude: u8);

    /// Fatal engine fault. Blocks until the user has seen the prompt.
    fn on_crash(&self);

    fn set_clipboard(&self, bytes: &[u8]);

    fn get_clipboard(&self) -> Vec<u8>;
}

/// Engine stub that emulates nothing
///
/// Useful for wiring the frontend without a real core and as a base for
/// test doubles.
#[derive(Debug, Default)]
pub struct NullEngine;

impl EmulationEngine for NullEngine {
    fn new_session(&mut self, spec: &SessionSpec) {
        tracing::info!("null engine: new session for {:?}", spec.rom_file);
    }

    fn restart_session(&mut self, psf_file: &Path) {
        tracing::info!("null engine: restart from {:?}", psf_file);
    }

    fn save_session(&mut self, psf_file: &Path) {
        tracing::info!("null engine: save to {:?}", psf_file);
    }

    fn shutdown(&mut self, psf_file: &Path) {
        tracing::info!("null engine: shutdown, save to {:?}", psf_file);
    }

    fn idle_step(&mut self, _buffer: &mut ScreenBuffer) -> bool {
        false
    }

    fn pen_down(&mut self, _x: i32, _y: i32) -> bool {
        false
    }

    fn pen_move(&mut self, _x: i32, _y: i32) -> bool {
        false
    }

    fn pen_up(&mut self, _x: i32, _y: i32) -> bool {
        false
    }

    fn key_event(&mut self, _code: i32) -> bool {
        false
    }

    fn button_event(&mut self, _button: i32, _down: bool) -> bool {
        false
    }

    fn install_file(&mut self, _path: &Path) -> i32 {
        0
    }

    fn reset(&mut self, _kind: ResetKind) {}

    fn session_info(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_invariant() {
        let buf = ScreenBuffer::default();
        assert_eq!(buf.width(), INITIAL_SCREEN_WIDTH);
        assert_eq!(buf.height(), INITIAL_SCREEN_HEIGHT);
        assert_eq!(
            buf.pixels().len(),
            INITIAL_SCREEN_WIDTH * INITIAL_SCREEN_HEIGHT * 2
        );
    }

    #[test]
    fn test_resize_reallocates_exactly() {
        let mut buf = ScreenBuffer::default();
        buf.pixels_mut()[0] = 0xff;

        buf.resize(160, 160);
        assert_eq!(buf.pixels().len(), 160 * 160 * 2);
        // Fresh allocation, not a retained prefix
        assert_eq!(buf.pixels()[0], 0);
    }

    #[test]
    fn test_null_engine_is_inert() {
        let mut engine = NullEngine;
        let mut buf = ScreenBuffer::default();
        assert!(!engine.idle_step(&mut buf));
        assert!(!engine.pen_down(10, 10));
        assert_eq!(engine.install_file(Path::new("x.prc")), 0);
    }
}
