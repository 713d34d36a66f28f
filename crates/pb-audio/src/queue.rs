//! Serialized sound-command queue
//!
//! The engine fires sound requests asynchronously from its own thread;
//! they are queued here and drained by one worker so tones play in order
//! and never overlap.

use crate::backend::TonePlayer;
use crate::tone;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

/// One tone request from the engine. Immutable once enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundCommand {
    pub freq_hz: u32,
    pub duration_ms: u32,
    /// Device amplitude, 0..=64
    pub amplitude: u8,
}

struct QueueState {
    pending: VecDeque<SoundCommand>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    condvar: Condvar,
}

/// Single-worker tone playback pipeline
pub struct SoundQueue {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl SoundQueue {
    /// Spawn the playback worker around the given player
    pub fn new(player: Box<dyn TonePlayer>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                shutdown: false,
            }),
            condvar: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("sound".into())
            .spawn(move || run_worker(worker_shared, player))
            .expect("failed to spawn sound worker");

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Queue a tone. Dropped with an error log if the queue is shut down;
    /// silence is an acceptable failure mode.
    pub fn enqueue(&self, cmd: SoundCommand) {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            tracing::error!("sound queue is shut down, dropping {:?}", cmd);
            return;
        }
        tracing::debug!(
            "queueing tone f:{} d:{} a:{}",
            cmd.freq_hz,
            cmd.duration_ms,
            cmd.amplitude
        );
        state.pending.push_back(cmd);
        self.shared.condvar.notify_one();
    }

    /// Stop accepting commands, finish what is queued, and join the worker.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            self.shared.condvar.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("sound worker panicked");
            }
        }
    }
}

impl Drop for SoundQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(shared: Arc<Shared>, mut player: Box<dyn TonePlayer>) {
    loop {
        let cmd = {
            let mut state = shared.state.lock();
            loop {
                if let Some(cmd) = state.pending.pop_front() {
                    break cmd;
                }
                if state.shutdown {
                    return;
                }
                shared.condvar.wait(&mut state);
            }
        };

        // Playback happens without the queue lock held so enqueues from the
        // engine never block on audio output.
        let samples = tone::synthesize(cmd.freq_hz, cmd.duration_ms, cmd.amplitude);
        if let Err(e) = player.play(&samples, tone::SAMPLE_RATE) {
            tracing::error!("tone playback failed: {}", e);
        }
    }
}
