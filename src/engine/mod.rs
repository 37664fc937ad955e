//! Alert playback engine.
//!
//! The engine owns the single current alert. Every [`start`](AlertEngine::start)
//! mints a new generation id; a monitor task bound to that generation drives
//! completion and looping, and stops acting as soon as the generation is
//! superseded or the engine is stopped.
//!
//! # State machine
//!
//! ```text
//!          start (audible)              complete / stop
//!   Idle ─────────────────▶ Playing{g} ─────────────────▶ Stopped
//!    │                        │    ▲                        │
//!    │ start (silent)         └────┘ start (supersedes g)   │ start
//!    └────────────────────────────────────▶ Stopped ◀───────┘
//! ```
//!
//! `start` and `stop` are synchronous and never block on playback. A short
//! transition lock serializes them with a monitor's natural-completion stop,
//! so a stale monitor can never stop a newer generation.

mod event;
mod monitor;

pub use event::{AlertEvent, EngineState};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::device::{AudioDevice, RingerMode};
use crate::guard::{AudioStateGuard, AudioStateSnapshot};
use crate::sound::{AudioAttributes, SoundFactory, SoundPlayer};
use crate::types::{AlertSettings, EngineConfig};

use monitor::PlaybackMonitor;

// ============================================================================
// EngineError
// ============================================================================

/// Errors building an [`AlertEngine`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No tokio runtime was given and none is running on this thread.
    #[error("tokioランタイムが見つかりません。ランタイム内で作成するか runtime() で指定してください")]
    NoRuntime,

    /// The configuration failed validation.
    #[error("エンジン設定が不正です: {0}")]
    InvalidConfig(String),
}

// ============================================================================
// Shared
// ============================================================================

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the engine handle and its monitor tasks.
struct Shared {
    config: EngineConfig,
    device: Arc<dyn AudioDevice>,
    sound_factory: SoundFactory,
    sound: Mutex<Option<Arc<dyn SoundPlayer>>>,
    guard: OnceLock<AudioStateGuard>,
    generation: AtomicU64,
    stopped: AtomicBool,
    settings: Mutex<Option<Arc<AlertSettings>>>,
    transition: Mutex<()>,
    wake_tx: watch::Sender<u64>,
    events: Option<mpsc::UnboundedSender<AlertEvent>>,
    runtime: Handle,
}

impl Shared {
    fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn is_active(&self, generation: u64) -> bool {
        self.current_generation() == generation && !self.is_stopped()
    }

    fn subscribe_wake(&self) -> watch::Receiver<u64> {
        self.wake_tx.subscribe()
    }

    /// Wakes every monitor so it re-checks its generation.
    fn wake(&self) {
        self.wake_tx.send_modify(|count| *count = count.wrapping_add(1));
    }

    fn emit(&self, event: AlertEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn audio_guard(&self) -> &AudioStateGuard {
        self.guard
            .get_or_init(|| AudioStateGuard::capture(self.device.clone(), self.config.stream))
    }

    fn current_sound(&self) -> Option<Arc<dyn SoundPlayer>> {
        lock(&self.sound).clone()
    }

    /// Returns the sound player, creating it on first use.
    fn sound_player(&self) -> Option<Arc<dyn SoundPlayer>> {
        let mut sound = lock(&self.sound);
        if let Some(player) = sound.as_ref() {
            return Some(player.clone());
        }

        match (self.sound_factory)() {
            Ok(player) => {
                player.set_audio_attributes(AudioAttributes::alarm());
                *sound = Some(player.clone());
                Some(player)
            }
            Err(e) => {
                warn!(error = %e, suggestion = e.suggestion(), "Sound player unavailable");
                None
            }
        }
    }

    fn apply_override(&self, guard: &AudioStateGuard, settings: &AlertSettings) {
        match guard.max_level() {
            Ok(max_level) => {
                let level = settings.level_for(max_level);
                if let Err(e) = guard.apply_override(level) {
                    warn!(error = %e, level, "Skipped alert volume change");
                }
            }
            Err(e) => warn!(error = %e, "Skipped alert volume change"),
        }

        if let Err(e) = guard.apply_ringer_mode(RingerMode::Normal) {
            warn!(error = %e, "Skipped ringer mode change");
        }
    }

    /// Marks the engine stopped, halts the sound and restores device state.
    ///
    /// Returns true if an alert was playing. Caller holds the transition lock.
    fn halt(&self) -> bool {
        let was_playing = !self.stopped.swap(true, Ordering::SeqCst);
        self.wake();

        if let Some(sound) = self.current_sound() {
            sound.stop();
        }
        if let Some(guard) = self.guard.get() {
            guard.restore();
        }
        was_playing
    }

    /// Natural completion of a non-looping generation.
    fn complete(&self, generation: u64) -> bool {
        let _transition = lock(&self.transition);
        if !self.is_active(generation) {
            return false;
        }

        self.halt();
        info!(generation, "Alert completed");
        self.emit(AlertEvent::Completed { generation });
        true
    }

    /// Replays a looping generation if it is still current.
    fn replay(&self, generation: u64, sound: &dyn SoundPlayer) -> ReplayOutcome {
        let _transition = lock(&self.transition);
        if !self.is_active(generation) {
            return ReplayOutcome::Inactive;
        }

        match sound.play() {
            Ok(()) => {
                debug!(generation, "Alert replayed");
                ReplayOutcome::Played
            }
            Err(e) => {
                warn!(generation, error = %e, "Failed to replay alert sound");
                ReplayOutcome::Failed
            }
        }
    }
}

/// Result of one replay attempt by a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ReplayOutcome {
    Played,
    /// The generation is current but the sound did not start.
    Failed,
    /// The generation was stopped or superseded.
    Inactive,
}

// ============================================================================
// AlertEngineBuilder
// ============================================================================

/// Builder for [`AlertEngine`].
pub struct AlertEngineBuilder {
    config: EngineConfig,
    device: Arc<dyn AudioDevice>,
    sound_factory: SoundFactory,
    events: Option<mpsc::UnboundedSender<AlertEvent>>,
    runtime: Option<Handle>,
}

impl AlertEngineBuilder {
    /// Reports transitions on `tx`.
    #[must_use]
    pub fn events(mut self, tx: mpsc::UnboundedSender<AlertEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Runs monitor tasks on `handle` instead of the current runtime.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or if no runtime was
    /// given and none is running.
    pub fn build(self) -> Result<AlertEngine, EngineError> {
        self.config.validate().map_err(EngineError::InvalidConfig)?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| EngineError::NoRuntime)?,
        };
        let (wake_tx, _) = watch::channel(0);

        Ok(AlertEngine {
            shared: Arc::new(Shared {
                config: self.config,
                device: self.device,
                sound_factory: self.sound_factory,
                sound: Mutex::new(None),
                guard: OnceLock::new(),
                generation: AtomicU64::new(0),
                stopped: AtomicBool::new(true),
                settings: Mutex::new(None),
                transition: Mutex::new(()),
                wake_tx,
                events: self.events,
                runtime,
            }),
        })
    }
}

// ============================================================================
// AlertEngine
// ============================================================================

/// Plays one alert at a time, overriding and restoring device audio state.
///
/// Dropping the engine stops the current alert.
pub struct AlertEngine {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for AlertEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEngine")
            .field("state", &self.state())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl AlertEngine {
    /// Starts building an engine over `device`, creating its sound player
    /// with `sound_factory` on the first start.
    pub fn builder(
        config: EngineConfig,
        device: Arc<dyn AudioDevice>,
        sound_factory: SoundFactory,
    ) -> AlertEngineBuilder {
        AlertEngineBuilder {
            config,
            device,
            sound_factory,
            events: None,
            runtime: None,
        }
    }

    /// Starts an alert, superseding any alert already playing.
    ///
    /// `settings` are re-normalized against the engine's volume limits.
    /// Returns the generation minted for this request. A disabled or
    /// zero-volume request, or one without a usable sound player, halts the
    /// previous alert and stays silent.
    pub fn start(&self, settings: &AlertSettings) -> u64 {
        let shared = &self.shared;
        let _transition = lock(&shared.transition);

        let sound = shared.sound_player();
        let settings = Arc::new(AlertSettings::copy_from(shared.config.volume, settings));
        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&shared.settings) = Some(settings.clone());

        if let Some(sound) = &sound {
            sound.stop();
        }
        shared.wake();
        if !shared.is_stopped() {
            info!(generation = generation - 1, "Alert superseded");
            shared.emit(AlertEvent::Superseded {
                generation: generation - 1,
            });
        }

        let sound = match sound {
            Some(sound) if !settings.is_silent() => sound,
            _ => {
                shared.stopped.store(true, Ordering::SeqCst);
                info!(
                    generation,
                    enabled = settings.is_enabled(),
                    volume = settings.volume(),
                    "Alert started silently"
                );
                shared.emit(AlertEvent::Silent { generation });
                return generation;
            }
        };

        let guard = shared.audio_guard();
        shared.stopped.store(false, Ordering::SeqCst);
        if !settings.uses_default_volume() {
            shared.apply_override(guard, &settings);
        }

        if let Err(e) = sound.play() {
            warn!(generation, error = %e, "Failed to start alert sound");
        }
        info!(
            generation,
            volume = settings.volume(),
            looping = settings.is_looping(),
            interval_seconds = settings.interval_seconds(),
            "Alert started"
        );
        shared.emit(AlertEvent::Started {
            generation,
            looping: settings.is_looping(),
        });

        let monitor = PlaybackMonitor::new(shared.clone(), generation, settings, sound);
        shared.runtime.spawn(monitor.run());
        generation
    }

    /// Stops the current alert and restores device audio state.
    ///
    /// Idempotent; a no-op when the engine was never started.
    pub fn stop(&self) {
        let shared = &self.shared;
        let _transition = lock(&shared.transition);

        if shared.halt() {
            let generation = shared.current_generation();
            info!(generation, "Alert stopped");
            shared.emit(AlertEvent::Stopped { generation });
        }
    }

    /// Current engine state.
    pub fn state(&self) -> EngineState {
        let shared = &self.shared;
        let generation = shared.current_generation();
        if !shared.is_stopped() {
            EngineState::Playing { generation }
        } else if generation == 0 {
            EngineState::Idle
        } else {
            EngineState::Stopped
        }
    }

    /// Most recently minted generation; 0 before the first start.
    pub fn current_generation(&self) -> u64 {
        self.shared.current_generation()
    }

    /// Settings of the most recent start, as normalized by the engine.
    pub fn current_settings(&self) -> Option<Arc<AlertSettings>> {
        lock(&self.shared.settings).clone()
    }

    /// Device state captured before the first audible alert.
    pub fn baseline(&self) -> Option<AudioStateSnapshot> {
        self.shared.guard.get().map(AudioStateGuard::baseline)
    }

    /// Returns true if an applied override has not been restored yet.
    pub fn has_pending_restore(&self) -> bool {
        self.shared
            .guard
            .get()
            .is_some_and(AudioStateGuard::has_pending_restore)
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }
}

impl Drop for AlertEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Tests
// ============================================================================
