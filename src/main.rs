//! palm-bridge headless runner
//!
//! Brings up the whole bridge stack (engine worker, sound queue, modal
//! protocol, configuration) against the null engine so it can be smoke
//! tested without a UI attached. Real frontends embed `EngineBridge` and
//! install their own `FrameSink` and `DialogHost`.

use anyhow::Context;
use pb_audio::{CpalTonePlayer, NullTonePlayer, SoundQueue, TonePlayer};
use pb_bridge::{EngineBridge, FrameSink, NullClipboard};
use pb_core::config::{AudioBackend, Config};
use pb_core::engine::NullEngine;
use pb_input::{DisplayRegion, PenAction, PointerEvent, TouchDispatcher};
use std::sync::Arc;
use std::time::Instant;

/// Frame sink that just logs what a UI would redraw
struct LogSink;

impl FrameSink for LogSink {
    fn frame_ready(&self) {
        tracing::trace!("frame ready");
    }

    fn surface_resized(&self, width: usize, height: usize) {
        tracing::info!("display surface is now {}x{}", width, height);
    }

    fn reset_warning(&self) {
        tracing::warn!("input arrived while the emulated OS was booting");
    }
}

fn build_sound_queue(config: &Config) -> Option<SoundQueue> {
    if !config.audio.enable {
        return None;
    }
    let player: Box<dyn TonePlayer> = match config.audio.backend {
        AudioBackend::Null => Box::new(NullTonePlayer),
        AudioBackend::Auto => {
            let mut player = match CpalTonePlayer::new(config.audio.volume) {
                Ok(player) => player,
                Err(e) => {
                    tracing::warn!("audio unavailable, tones disabled: {}", e);
                    return None;
                }
            };
            if let Err(e) = player.init() {
                tracing::warn!("no audio output device, tones disabled: {}", e);
                return None;
            }
            Box::new(player)
        }
    };
    Some(SoundQueue::new(player))
}

fn main() -> anyhow::Result<()> {
    pb_core::logging::init();
    tracing::info!("starting palm-bridge");

    let config = Config::load().context("loading configuration")?;

    if pb_bridge::crash_flag_present(&config) {
        tracing::warn!("previous session ended in an engine crash");
        pb_bridge::clear_crash_flag(&config).context("clearing crash flag")?;
    }

    let sounds = build_sound_queue(&config);
    let bridge = EngineBridge::new(
        &config,
        Arc::new(LogSink),
        Arc::new(NullClipboard::default()),
        sounds,
        |_host| Box::new(NullEngine),
    );

    for line in bridge.session_info() {
        tracing::info!("{}", line);
    }

    bridge.resume();

    // Drive one synthetic tap through the input path. The null engine
    // never activates a session, so the bridge drops these as no-ops;
    // a real frontend feeds its pointer events through here the same way.
    let (width, height) = {
        let display = bridge.display();
        let surface = display.lock();
        (surface.width(), surface.height())
    };
    let region = DisplayRegion {
        left: 0.0,
        top: 0.0,
        display_width: width as f32,
        display_height: height as f32,
        engine_width: width as u32,
        engine_height: height as u32,
    };
    let mut touch = TouchDispatcher::from_config(&config.input);
    let now = Instant::now();
    let tap = [
        (PointerEvent::Down, 10.0, 10.0),
        (PointerEvent::Move, 40.0, 10.0),
        (PointerEvent::Up, 40.0, 10.0),
    ];
    for (event, x, y) in tap {
        match touch.on_pointer(event, x, y, &region, now) {
            Some(PenAction::Down(px, py)) => bridge.pen_down(px, py),
            Some(PenAction::Move(px, py)) => bridge.pen_move(px, py),
            Some(PenAction::Up(px, py)) => bridge.pen_up(px, py),
            None => {}
        }
    }

    std::thread::sleep(std::time::Duration::from_secs(1));
    bridge.shutdown();

    tracing::info!("palm-bridge exiting");
    Ok(())
}
