//! Sound playback for alerts.
//!
//! This module provides:
//!
//! - The [`SoundPlayer`] capability the engine plays alerts through
//! - A rodio-backed implementation with a built-in fallback tone
//! - A mock player whose clips run on tokio's clock, for engine tests
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   AlertEngine    │
//! └────────┬─────────┘
//!          │ play / stop / is_playing
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ RodioSoundPlayer │────▶│   Sound file     │
//! │                  │     ├──────────────────┤
//! │                  │────▶│ Built-in tone    │
//! └──────────────────┘     │  (fallback)      │
//!                          └──────────────────┘
//! ```

mod error;
mod player;
mod source;
mod tone;

pub use error::SoundError;
pub use player::RodioSoundPlayer;
pub use source::{is_supported_format, SoundSource, BUILTIN_TONE_NAME};
pub use tone::{alert_tone_duration, append_alert_tone, ToneStep, ALERT_TONE, TONE_AMPLITUDE};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// What the sound is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Usage {
    #[default]
    Alarm,
    Notification,
    Media,
}

/// What kind of sound it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Sonification,
    Music,
    Speech,
}

/// Routing hints handed to the sound player once, when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioAttributes {
    pub usage: Usage,
    pub content_type: ContentType,
}

impl AudioAttributes {
    /// Attributes of an alarm sound.
    #[must_use]
    pub fn alarm() -> Self {
        Self {
            usage: Usage::Alarm,
            content_type: ContentType::Sonification,
        }
    }
}

/// Capability to play the alert sound.
///
/// The engine only needs to start one iteration, halt it and ask whether it
/// is still audible. There is no completion callback; the engine polls.
pub trait SoundPlayer: Send + Sync {
    /// Starts one iteration of the sound. Non-blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if playback could not start.
    fn play(&self) -> Result<(), SoundError>;

    /// Halts playback. A no-op when nothing is playing.
    fn stop(&self);

    /// Returns true while the current iteration is audible.
    fn is_playing(&self) -> bool;

    /// Sets routing hints for subsequent playback. Players that cannot route
    /// by usage may ignore them.
    fn set_audio_attributes(&self, attributes: AudioAttributes);
}

/// Creates the engine's sound player on first use.
pub type SoundFactory =
    Box<dyn Fn() -> Result<Arc<dyn SoundPlayer>, SoundError> + Send + Sync>;

/// A factory producing a [`RodioSoundPlayer`] for `source`.
#[must_use]
pub fn rodio_factory(source: SoundSource) -> SoundFactory {
    Box::new(move || {
        let player: Arc<dyn SoundPlayer> = Arc::new(RodioSoundPlayer::new(source.clone())?);
        Ok(player)
    })
}

/// Mock sound player for testing.
///
/// Each `play()` makes the player report playing for `clip_duration` on
/// tokio's clock, so paused-clock tests can advance through clips.
#[derive(Debug)]
pub struct MockSoundPlayer {
    clip_duration: Duration,
    playing_until: Mutex<Option<Instant>>,
    play_count: AtomicUsize,
    attempt_count: AtomicUsize,
    stop_count: AtomicUsize,
    attributes: Mutex<Vec<AudioAttributes>>,
    should_fail: AtomicBool,
}

impl Default for MockSoundPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSoundPlayer {
    /// Creates a mock with one-second clips.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clip_duration(Duration::from_secs(1))
    }

    #[must_use]
    pub fn with_clip_duration(clip_duration: Duration) -> Self {
        Self {
            clip_duration,
            playing_until: Mutex::new(None),
            play_count: AtomicUsize::new(0),
            attempt_count: AtomicUsize::new(0),
            stop_count: AtomicUsize::new(0),
            attributes: Mutex::new(Vec::new()),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Ends the current clip as if it played to the end.
    pub fn finish_now(&self) {
        *self.playing_until.lock().unwrap() = None;
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.play_count.load(Ordering::SeqCst)
    }

    /// Number of `play()` calls, including failed ones.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempt_count.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn attributes(&self) -> Vec<AudioAttributes> {
        self.attributes.lock().unwrap().clone()
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play(&self) -> Result<(), SoundError> {
        self.attempt_count.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        *self.playing_until.lock().unwrap() = Some(Instant::now() + self.clip_duration);
        self.play_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        *self.playing_until.lock().unwrap() = None;
        self.stop_count.fetch_add(1, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.playing_until
            .lock()
            .unwrap()
            .is_some_and(|until| Instant::now() < until)
    }

    fn set_audio_attributes(&self, attributes: AudioAttributes) {
        self.attributes.lock().unwrap().push(attributes);
    }
}
