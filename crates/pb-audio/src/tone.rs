//! Tone synthesis
//!
//! Generates the simple sine tones the emulated OS plays through its
//! single-channel speaker.

/// Playback sample rate in Hz
pub const SAMPLE_RATE: u32 = 8000;

/// Maximum amplitude value the emulated OS can request
pub const MAX_AMPLITUDE: u8 = 64;

/// Generate a sine tone as signed 16-bit samples.
///
/// Sample count is `ceil(duration_ms / 1000 * 8000)`; amplitude is scaled
/// from the device's 0..=64 range onto the full i16 range.
pub fn synthesize(freq_hz: u32, duration_ms: u32, amplitude: u8) -> Vec<i16> {
    let num_samples = (f64::from(duration_ms) / 1000.0 * f64::from(SAMPLE_RATE)).ceil() as usize;
    let amp = f64::from(amplitude.min(MAX_AMPLITUDE)) / f64::from(MAX_AMPLITUDE);

    let mut samples = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let phase = f64::from(freq_hz) * 2.0 * std::f64::consts::PI * i as f64
            / f64::from(SAMPLE_RATE);
        samples.push((phase.sin() * amp * 32767.0) as i16);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count() {
        // 100ms at 8000Hz is exactly 800 samples
        assert_eq!(synthesize(440, 100, 32).len(), 800);
        // Fractional counts round up
        assert_eq!(synthesize(440, 1, 32).len(), 8);
        assert_eq!(synthesize(1000, 0, 32).len(), 0);
    }

    #[test]
    fn test_half_amplitude_peak() {
        // 440Hz at 8000Hz has period 200/11 samples, so the sampled phases
        // land on every multiple of 2*pi/200 and the sine peak is hit
        // exactly.
        let samples = synthesize(440, 100, 32);
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert_eq!(peak, 16383);
    }

    #[test]
    fn test_full_amplitude_peak() {
        let samples = synthesize(440, 100, 64);
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert_eq!(peak, 32767);
    }

    #[test]
    fn test_amplitude_clamped() {
        let loud = synthesize(440, 10, 200);
        let max = synthesize(440, 10, 64);
        assert_eq!(loud, max);
    }

    #[test]
    fn test_zero_amplitude_is_silence() {
        assert!(synthesize(440, 50, 0).iter().all(|&s| s == 0));
    }
}
