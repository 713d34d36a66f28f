//! Tone playback backends

pub mod cpal_backend;
pub mod null;

pub use cpal_backend::CpalTonePlayer;
pub use null::NullTonePlayer;

use pb_core::Result;

/// Plays one tone to completion.
///
/// `play` must not return until the last sample has been consumed; the
/// sound worker relies on this to keep tones from overlapping.
pub trait TonePlayer: Send {
    fn play(&mut self, samples: &[i16], sample_rate: u32) -> Result<()>;
}
