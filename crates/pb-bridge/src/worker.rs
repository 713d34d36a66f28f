//! The dedicated engine worker thread
//!
//! The emulator core is thread-affine and non-reentrant: every call into
//! it must come from the same thread for the core's whole life. This
//! module owns that thread. All engine calls are marshaled onto it as
//! queued tasks, and the same loop runs the periodic idle polling, so
//! serialization of engine access falls out of the design instead of a
//! lock discipline every caller has to remember.
//!
//! Pausing the polling only clears a flag; the thread itself is never
//! torn down, because rebinding the core to a new thread is not possible.

use crate::screen::{DisplayHandle, FrameSink};
use parking_lot::{Condvar, Mutex};
use pb_core::engine::{EmulationEngine, ScreenBuffer, POWER_BUTTON_ID};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A call marshaled onto the engine thread
pub(crate) type EngineTask = Box<dyn FnOnce(&mut EngineHandle) + Send>;

/// Engine-side session state, owned exclusively by the worker thread
pub struct EngineHandle {
    pub(crate) engine: Box<dyn EmulationEngine>,
    pub(crate) screen: ScreenBuffer,
    pub(crate) sink: Arc<dyn FrameSink>,
}

impl EngineHandle {
    /// Forward an input result: `true` from the engine means the event was
    /// swallowed during emulated-OS boot and the user should be told.
    pub(crate) fn note_reset(&self, reset_occurred: bool) {
        if reset_occurred {
            self.sink.reset_warning();
        }
    }
}

struct PollState {
    running: bool,
    interval: Duration,
    next_due: Instant,
}

/// State shared between the worker thread, the bridge front-end, and the
/// host callbacks
pub(crate) struct WorkerShared {
    queue: Mutex<VecDeque<EngineTask>>,
    condvar: Condvar,
    poll: Mutex<PollState>,
    active: AtomicBool,
    power_pending: AtomicBool,
    stop: AtomicBool,
    /// Resize requested by the engine mid-call; applied by the worker
    /// before the next engine call or frame publish
    pending_resize: Mutex<Option<(usize, usize)>>,
}

impl WorkerShared {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            poll: Mutex::new(PollState {
                running: false,
                interval,
                next_due: Instant::now(),
            }),
            active: AtomicBool::new(false),
            power_pending: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            pending_resize: Mutex::new(None),
        }
    }

    pub(crate) fn push_task(&self, task: EngineTask) {
        let mut queue = self.queue.lock();
        if self.stop.load(Ordering::Acquire) {
            tracing::warn!("engine worker stopped, dropping task");
            return;
        }
        queue.push_back(task);
        self.condvar.notify_one();
    }

    /// Resume polling: one immediate tick, then one per interval.
    pub(crate) fn resume(&self) {
        {
            let mut poll = self.poll.lock();
            poll.running = true;
            poll.next_due = Instant::now();
        }
        let _queue = self.queue.lock();
        self.condvar.notify_one();
    }

    /// Pause polling. An in-flight tick completes; the thread stays up.
    pub(crate) fn pause(&self) {
        self.poll.lock().running = false;
    }

    pub(crate) fn is_polling(&self) -> bool {
        self.poll.lock().running
    }

    /// Ask the next idle tick to wrap its step in a power-button tap
    pub(crate) fn request_power_tap(&self) {
        self.power_pending.store(true, Ordering::Release);
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn request_resize(&self, width: usize, height: usize) {
        *self.pending_resize.lock() = Some((width, height));
    }

    pub(crate) fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        let _queue = self.queue.lock();
        self.condvar.notify_all();
    }
}

enum Job {
    Task(EngineTask),
    Tick,
    Stop,
}

/// Run the worker loop. `make_engine` runs on this thread, so a core that
/// binds to its constructing thread is created in the right place.
pub(crate) fn run(
    shared: Arc<WorkerShared>,
    surface: DisplayHandle,
    sink: Arc<dyn FrameSink>,
    make_engine: Box<dyn FnOnce() -> Box<dyn EmulationEngine> + Send>,
) {
    let mut handle = EngineHandle {
        engine: make_engine(),
        screen: ScreenBuffer::default(),
        sink,
    };
    tracing::info!("engine worker started");

    loop {
        match next_job(&shared) {
            Job::Task(task) => {
                task(&mut handle);
                apply_pending_resize(&shared, &surface, &mut handle);
            }
            Job::Tick => tick(&shared, &surface, &mut handle),
            Job::Stop => break,
        }
    }
    tracing::info!("engine worker stopped");
}

fn next_job(shared: &WorkerShared) -> Job {
    let mut queue = shared.queue.lock();
    loop {
        // Pending tasks run even after stop is requested so a final
        // shutdown call is never lost.
        if let Some(task) = queue.pop_front() {
            return Job::Task(task);
        }
        if shared.stop.load(Ordering::Acquire) {
            return Job::Stop;
        }

        let deadline = {
            let poll = shared.poll.lock();
            poll.running.then_some(poll.next_due)
        };
        match deadline {
            Some(due) => {
                let now = Instant::now();
                if now >= due {
                    // Reschedule before running so a long tick delays
                    // rather than bunches subsequent ticks.
                    let mut poll = shared.poll.lock();
                    poll.next_due = now + poll.interval;
                    return Job::Tick;
                }
                let _ = shared.condvar.wait_for(&mut queue, due - now);
            }
            None => {
                shared.condvar.wait(&mut queue);
            }
        }
    }
}

/// One idle tick. Runs entirely on the engine thread, so it can never
/// overlap another tick or a marshaled call.
fn tick(shared: &WorkerShared, surface: &DisplayHandle, handle: &mut EngineHandle) {
    if !shared.is_active() {
        tracing::trace!("idle tick skipped, no active session");
        return;
    }

    // The emulated device must see the power button go down, then an idle
    // step, then the release, as one atomic sequence.
    let power_tap = shared.power_pending.load(Ordering::Acquire);
    if power_tap {
        let reset = handle.engine.button_event(POWER_BUTTON_ID, true);
        handle.note_reset(reset);
    }

    let dirty = handle.engine.idle_step(&mut handle.screen);

    if power_tap {
        let reset = handle.engine.button_event(POWER_BUTTON_ID, false);
        handle.note_reset(reset);
        shared.power_pending.store(false, Ordering::Release);
    }

    let resized = apply_pending_resize(shared, surface, handle);
    if dirty && !resized {
        surface.lock().refresh(&handle.screen);
        handle.sink.frame_ready();
    }
}

/// Apply a resize the engine requested mid-call: reallocate the engine
/// buffer, recreate the display surface, and tell the UI. Returns true if
/// a resize happened (any frame from before it is stale).
fn apply_pending_resize(
    shared: &WorkerShared,
    surface: &DisplayHandle,
    handle: &mut EngineHandle,
) -> bool {
    let Some((width, height)) = shared.pending_resize.lock().take() else {
        return false;
    };
    tracing::debug!("resizing emulated screen to {}x{}", width, height);
    handle.screen.resize(width, height);
    surface.lock().recreate(width, height);
    handle.sink.surface_resized(width, height);
    true
}
