//! cpal tone player
//!
//! Plays a synthesized tone through the default output device using cpal
//! (Cross-Platform Audio Library). A fresh stream is built per tone, sized
//! to that tone's sample buffer, and released once the last sample has
//! been consumed.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleRate, StreamConfig};
use parking_lot::{Condvar, Mutex};
use pb_core::{BridgeError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Playback progress shared with the stream callback
struct Playback {
    samples: Vec<f32>,
    position: usize,
    done: bool,
}

/// cpal-backed tone player
pub struct CpalTonePlayer {
    host: Host,
    device: Option<Device>,
    volume: f32,
}

impl CpalTonePlayer {
    pub fn new(volume: f32) -> Result<Self> {
        let host = cpal::default_host();

        Ok(Self {
            host,
            device: None,
            volume,
        })
    }

    /// Look up the default output device
    pub fn init(&mut self) -> Result<()> {
        let device = self
            .host
            .default_output_device()
            .ok_or_else(|| BridgeError::Audio("no output device available".into()))?;

        tracing::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        self.device = Some(device);
        Ok(())
    }
}

impl super::TonePlayer for CpalTonePlayer {
    fn play(&mut self, samples: &[i16], sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let device = self
            .device
            .as_ref()
            .ok_or_else(|| BridgeError::Audio("device not initialized".into()))?;

        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let volume = self.volume;
        let playback = Arc::new((
            Mutex::new(Playback {
                samples: samples
                    .iter()
                    .map(|&s| f32::from(s) / 32768.0 * volume)
                    .collect(),
                position: 0,
                done: false,
            }),
            Condvar::new(),
        ));
        let cb_playback = Arc::clone(&playback);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let (lock, condvar) = &*cb_playback;
                    let mut pb = lock.lock();
                    let remaining = pb.samples.len() - pb.position;
                    let n = remaining.min(data.len());
                    let start = pb.position;
                    data[..n].copy_from_slice(&pb.samples[start..start + n]);
                    data[n..].fill(0.0);
                    pb.position += n;
                    if pb.position >= pb.samples.len() && !pb.done {
                        pb.done = true;
                        condvar.notify_all();
                    }
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| BridgeError::Audio(format!("failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| BridgeError::Audio(format!("failed to play stream: {}", e)))?;

        // Wait until the callback has consumed every sample. The timeout is
        // a safety margin over the tone's own duration so a stalled device
        // cannot wedge the sound worker.
        let tone_ms = samples.len() as u64 * 1000 / u64::from(sample_rate);
        let deadline = Duration::from_millis(tone_ms + 500);
        let (lock, condvar) = &*playback;
        let mut pb = lock.lock();
        while !pb.done {
            if condvar.wait_for(&mut pb, deadline).timed_out() {
                tracing::warn!("tone playback timed out after {}ms", tone_ms + 500);
                break;
            }
        }
        drop(pb);

        // Dropping the stream releases the device resource.
        drop(stream);
        Ok(())
    }
}
