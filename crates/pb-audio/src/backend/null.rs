//! Null tone player

use super::TonePlayer;
use pb_core::Result;

/// Discards tones without touching any audio device.
///
/// Used when sound is disabled in the config and in headless tests.
#[derive(Debug, Default)]
pub struct NullTonePlayer;

impl TonePlayer for NullTonePlayer {
    fn play(&mut self, samples: &[i16], sample_rate: u32) -> Result<()> {
        tracing::trace!(
            "null player: dropping {} samples at {}Hz",
            samples.len(),
            sample_rate
        );
        Ok(())
    }
}
