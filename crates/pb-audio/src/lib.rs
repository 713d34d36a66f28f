//! Sound playback for palm-bridge
//!
//! The emulated device has a single audio channel, so tones queued by the
//! engine are played strictly one at a time by a single worker thread.

pub mod backend;
pub mod queue;
pub mod tone;

pub use backend::{CpalTonePlayer, NullTonePlayer, TonePlayer};
pub use queue::{SoundCommand, SoundQueue};
pub use tone::{synthesize, SAMPLE_RATE};
