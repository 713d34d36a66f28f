//! Screen handoff between the engine worker and the UI
//!
//! The engine renders into its own `ScreenBuffer` on the worker thread;
//! after a dirty idle tick the worker copies those bytes into the shared
//! `DisplaySurface` under its lock and asks the UI to redraw. The UI only
//! ever reads the surface, also under the lock, so the copy and the read
//! cannot race.

use parking_lot::Mutex;
use pb_core::engine::{ScreenBuffer, BYTES_PER_PIXEL};
use std::sync::Arc;

/// Shared handle to the UI-side pixel surface
pub type DisplayHandle = Arc<Mutex<DisplaySurface>>;

/// UI-side copy of the emulated screen, RGB565
#[derive(Debug)]
pub struct DisplaySurface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    /// Bumped on every refresh so the UI can skip redundant redraws
    frame_counter: u64,
}

impl DisplaySurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * BYTES_PER_PIXEL],
            frame_counter: 0,
        }
    }

    /// Throw away the surface and allocate for new dimensions.
    /// Only the resize protocol calls this; refresh never does.
    pub fn recreate(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width * height * BYTES_PER_PIXEL];
        self.frame_counter = 0;
    }

    /// Copy a finished frame in. A dimension mismatch means a resize is
    /// still in flight; the frame is dropped rather than written out of
    /// bounds.
    pub fn refresh(&mut self, buffer: &ScreenBuffer) {
        if buffer.width() != self.width || buffer.height() != self.height {
            tracing::warn!(
                "dropping {}x{} frame, surface is {}x{}",
                buffer.width(),
                buffer.height(),
                self.width,
                self.height
            );
            return;
        }
        self.pixels.copy_from_slice(buffer.pixels());
        self.frame_counter += 1;
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

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }
}

/// UI notifications emitted by the engine worker.
///
/// Implementations must be cheap and non-blocking; they run on the worker
/// thread between engine calls.
pub trait FrameSink: Send + Sync {
    /// A new frame is in the display surface; schedule a redraw.
    fn frame_ready(&self);

    /// The emulated screen changed dimensions and the surface was
    /// reallocated; rebuild whatever the UI derives from it.
    fn surface_resized(&self, width: usize, height: usize);

    /// The emulated OS is mid-boot and swallowed an input event; show a
    /// transient warning.
    fn reset_warning(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_copies_and_counts() {
        let mut surface = DisplaySurface::new(4, 4);
        let mut buffer = ScreenBuffer::new(4, 4);
        buffer.pixels_mut()[0] = 0xab;

        surface.refresh(&buffer);
        assert_eq!(surface.pixels()[0], 0xab);
        assert_eq!(surface.frame_counter(), 1);
    }

    #[test]
    fn test_mismatched_frame_is_dropped() {
        let mut surface = DisplaySurface::new(4, 4);
        let mut buffer = ScreenBuffer::new(8, 8);
        buffer.pixels_mut()[0] = 0xab;

        surface.refresh(&buffer);
        assert_eq!(surface.pixels()[0], 0);
        assert_eq!(surface.frame_counter(), 0);
        assert_eq!(surface.pixels().len(), 4 * 4 * 2);
    }

    #[test]
    fn test_recreate_sizes_exactly() {
        let mut surface = DisplaySurface::new(4, 4);
        surface.recreate(320, 320);
        assert_eq!(surface.pixels().len(), 320 * 320 * 2);

        let buffer = ScreenBuffer::new(320, 320);
        surface.refresh(&buffer);
        assert_eq!(surface.frame_counter(), 1);
    }
}
