//! Touch event smoothing state machine
//!
//! There is a fair amount of jitter in a raw touch stream, and the
//! emulated OS was written with mice in mind. Moves that arrive too fast
//! and too close together are suppressed; crossing the edge of the
//! emulator region synthesizes the pen-up/pen-down pair the engine would
//! otherwise never see.

use pb_core::config::InputConfig;
use std::time::{Duration, Instant};

/// Raw pointer event kinds delivered by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down,
    Move,
    Up,
}

/// Pen event to forward to the engine, in emulated-screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenAction {
    Down(i32, i32),
    Move(i32, i32),
    Up(i32, i32),
}

/// Where the emulated screen sits inside the host view, plus the emulated
/// dimensions events are mapped onto
#[derive(Debug, Clone, Copy)]
pub struct DisplayRegion {
    pub left: f32,
    pub top: f32,
    pub display_width: f32,
    pub display_height: f32,
    pub engine_width: u32,
    pub engine_height: u32,
}

impl DisplayRegion {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left
            && x < self.left + self.display_width
            && y >= self.top
            && y < self.top + self.display_height
    }

    /// Map a host coordinate to the nearest emulated pixel
    pub fn map(&self, x: f32, y: f32) -> (i32, i32) {
        let px = ((x - self.left) * self.engine_width as f32 / self.display_width + 0.5) as i32;
        let py = ((y - self.top) * self.engine_height as f32 / self.display_height + 0.5) as i32;
        (px, py)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TouchPhase {
    Idle,
    /// A touch is in progress inside the region
    Active,
    /// The pointer is outside the region; the next in-bounds move starts a
    /// fresh touch with a synthesized pen-down
    OutOfBounds,
}

/// Smoothing and forwarding state. UI-thread only.
#[derive(Debug)]
pub struct TouchDispatcher {
    smooth_pixels: u32,
    smooth_period: Duration,
    phase: TouchPhase,
    last_time: Option<Instant>,
    last_x: i32,
    last_y: i32,
}

impl TouchDispatcher {
    pub fn new(smooth_pixels: u32, smooth_period_ms: u64) -> Self {
        Self {
            smooth_pixels,
            smooth_period: Duration::from_millis(smooth_period_ms),
            phase: TouchPhase::Idle,
            last_time: None,
            last_x: 0,
            last_y: 0,
        }
    }

    /// Build from the `[input]` config section
    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.smooth_pixels, config.smooth_period_ms)
    }

    /// Feed one pointer event; returns the pen event to forward, if any.
    ///
    /// `now` is injected so the filter window is testable.
    pub fn on_pointer(
        &mut self,
        event: PointerEvent,
        x: f32,
        y: f32,
        region: &DisplayRegion,
        now: Instant,
    ) -> Option<PenAction> {
        if region.contains(x, y) {
            let (px, py) = region.map(x, y);
            match event {
                PointerEvent::Down => {
                    self.record(px, py, now);
                    self.phase = TouchPhase::Active;
                    Some(PenAction::Down(px, py))
                }
                PointerEvent::Move => self.in_bounds_move(px, py, now),
                PointerEvent::Up => {
                    self.record(px, py, now);
                    self.phase = TouchPhase::Idle;
                    Some(PenAction::Up(px, py))
                }
            }
        } else {
            self.out_of_bounds(event)
        }
    }

    fn in_bounds_move(&mut self, px: i32, py: i32, now: Instant) -> Option<PenAction> {
        if !self.passes_filter(px, py, now) {
            tracing::trace!("suppressing move x:{} y:{}", px, py);
            return None;
        }
        self.record(px, py, now);
        if self.phase == TouchPhase::OutOfBounds {
            // Moved back onto the emulator screen from outside; the engine
            // last saw a pen-up, so this must start a new touch.
            self.phase = TouchPhase::Active;
            Some(PenAction::Down(px, py))
        } else {
            Some(PenAction::Move(px, py))
        }
    }

    fn out_of_bounds(&mut self, event: PointerEvent) -> Option<PenAction> {
        let was_active = self.phase == TouchPhase::Active;
        self.phase = TouchPhase::OutOfBounds;
        match event {
            PointerEvent::Move if was_active => {
                // The touch left the emulator screen. Synthesize exactly one
                // pen-up at the last position the engine was given.
                Some(PenAction::Up(self.last_x, self.last_y))
            }
            // Down/up outside the region are never forwarded.
            _ => None,
        }
    }

    /// A move is forwarded iff it traveled far enough or enough time has
    /// passed since the last forwarded event.
    fn passes_filter(&self, px: i32, py: i32, now: Instant) -> bool {
        let Some(last) = self.last_time else {
            return true;
        };
        let dist = pixel_distance(self.last_x, self.last_y, px, py);
        let elapsed = now.saturating_duration_since(last);
        dist > self.smooth_pixels || elapsed > self.smooth_period
    }

    fn record(&mut self, px: i32, py: i32, now: Instant) {
        self.last_x = px;
        self.last_y = py;
        self.last_time = Some(now);
    }
}

/// Euclidean distance between two emulated pixels, rounded to nearest
fn pixel_distance(old_x: i32, old_y: i32, new_x: i32, new_y: i32) -> u32 {
    let dx = (new_x - old_x) as f64;
    let dy = (new_y - old_y) as f64;
    ((dx * dx + dy * dy).sqrt() + 0.5) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> DisplayRegion {
        // Emulated 320x320 screen displayed 1:1 at (100, 50)
        DisplayRegion {
            left: 100.0,
            top: 50.0,
            display_width: 320.0,
            display_height: 320.0,
            engine_width: 320,
            engine_height: 320,
        }
    }

    fn dispatcher() -> TouchDispatcher {
        TouchDispatcher::new(4, 250)
    }

    #[test]
    fn test_coordinate_mapping_rounds_to_nearest() {
        let r = DisplayRegion {
            left: 0.0,
            top: 0.0,
            display_width: 640.0,
            display_height: 640.0,
            engine_width: 320,
            engine_height: 320,
        };
        assert_eq!(r.map(0.0, 0.0), (0, 0));
        assert_eq!(r.map(639.0, 639.0), (320, 320));
        // 101 host px at half scale = 50.5 emulated px, rounds up
        assert_eq!(r.map(101.0, 0.0).0, 51);
    }

    #[test]
    fn test_down_move_up_forwarded() {
        let mut d = dispatcher();
        let r = region();
        let t0 = Instant::now();

        assert_eq!(
            d.on_pointer(PointerEvent::Down, 110.0, 60.0, &r, t0),
            Some(PenAction::Down(10, 10))
        );
        assert_eq!(
            d.on_pointer(PointerEvent::Move, 130.0, 60.0, &r, t0),
            Some(PenAction::Move(30, 10))
        );
        assert_eq!(
            d.on_pointer(PointerEvent::Up, 130.0, 60.0, &r, t0),
            Some(PenAction::Up(30, 10))
        );
    }

    #[test]
    fn test_dense_small_moves_are_rate_limited() {
        let mut d = dispatcher();
        let r = region();
        let t0 = Instant::now();

        d.on_pointer(PointerEvent::Down, 110.0, 60.0, &r, t0);

        // 1px jitter every 10ms for 500ms: distance never clears the 4px
        // threshold, so only the elapsed-time rule can let a move through,
        // at most once per 250ms window.
        let mut forwarded = 0;
        for i in 1..=50 {
            let t = t0 + Duration::from_millis(10 * i);
            let x = if i % 2 == 0 { 110.0 } else { 111.0 };
            if d.on_pointer(PointerEvent::Move, x, 60.0, &r, t).is_some() {
                forwarded += 1;
            }
        }
        assert!(forwarded >= 1);
        assert!(forwarded <= 2, "forwarded {} moves", forwarded);
    }

    #[test]
    fn test_large_jump_forwards_immediately() {
        let mut d = dispatcher();
        let r = region();
        let t0 = Instant::now();

        d.on_pointer(PointerEvent::Down, 110.0, 60.0, &r, t0);
        // 10px jump 1ms later passes on distance alone
        assert_eq!(
            d.on_pointer(
                PointerEvent::Move,
                120.0,
                60.0,
                &r,
                t0 + Duration::from_millis(1)
            ),
            Some(PenAction::Move(20, 10))
        );
    }

    #[test]
    fn test_slow_small_move_passes_on_time() {
        let mut d = dispatcher();
        let r = region();
        let t0 = Instant::now();

        d.on_pointer(PointerEvent::Down, 110.0, 60.0, &r, t0);
        // 1px after 300ms passes on elapsed time alone
        assert_eq!(
            d.on_pointer(
                PointerEvent::Move,
                111.0,
                60.0,
                &r,
                t0 + Duration::from_millis(300)
            ),
            Some(PenAction::Move(11, 10))
        );
    }

    #[test]
    fn test_region_exit_synthesizes_single_pen_up() {
        let mut d = dispatcher();
        let r = region();
        let t0 = Instant::now();

        d.on_pointer(PointerEvent::Down, 110.0, 60.0, &r, t0);
        // Leave the region: one pen-up at the last in-bounds position
        assert_eq!(
            d.on_pointer(PointerEvent::Move, 10.0, 60.0, &r, t0),
            Some(PenAction::Up(10, 10))
        );
        // Further outside moves forward nothing
        assert_eq!(d.on_pointer(PointerEvent::Move, 5.0, 60.0, &r, t0), None);
        assert_eq!(d.on_pointer(PointerEvent::Up, 5.0, 60.0, &r, t0), None);
    }

    #[test]
    fn test_reentry_synthesizes_pen_down_not_move() {
        let mut d = dispatcher();
        let r = region();
        let t0 = Instant::now();

        d.on_pointer(PointerEvent::Down, 110.0, 60.0, &r, t0);
        d.on_pointer(PointerEvent::Move, 10.0, 60.0, &r, t0); // exit
        let t1 = t0 + Duration::from_millis(300);
        assert_eq!(
            d.on_pointer(PointerEvent::Move, 150.0, 60.0, &r, t1),
            Some(PenAction::Down(50, 10))
        );
        // Now an ordinary move again
        let t2 = t1 + Duration::from_millis(300);
        assert_eq!(
            d.on_pointer(PointerEvent::Move, 160.0, 60.0, &r, t2),
            Some(PenAction::Move(60, 10))
        );
    }

    #[test]
    fn test_down_outside_forwards_nothing() {
        let mut d = dispatcher();
        let r = region();
        let t0 = Instant::now();

        assert_eq!(d.on_pointer(PointerEvent::Down, 10.0, 10.0, &r, t0), None);
        assert_eq!(d.on_pointer(PointerEvent::Up, 10.0, 10.0, &r, t0), None);
    }

    #[test]
    fn test_touch_starting_outside_enters_with_pen_down() {
        let mut d = dispatcher();
        let r = region();
        let t0 = Instant::now();

        d.on_pointer(PointerEvent::Down, 10.0, 10.0, &r, t0);
        let t1 = t0 + Duration::from_millis(300);
        assert_eq!(
            d.on_pointer(PointerEvent::Move, 110.0, 60.0, &r, t1),
            Some(PenAction::Down(10, 10))
        );
    }
}
