//! Alert Player Library
//!
//! This library provides an alarm-style alert playback engine. It includes:
//! - Alert settings with volume and loop-interval normalization
//! - An audio/ringer state guard that overrides device state subject to
//!   Do-Not-Disturb policy and restores it exactly once
//! - The alert engine: generation-tracked playback with looping monitors
//! - Sound playback through rodio with a built-in fallback tone
//! - Device and sound capability traits with recording test doubles
//! - CLI command parsing and display utilities

pub mod cli;
pub mod device;
pub mod engine;
pub mod guard;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    default_config_path, AlertSettings, EngineConfig, VolumeLimits, MAX_INTERVAL_SECONDS,
    NO_VOLUME_CHANGE,
};

// Re-export engine types
pub use engine::{AlertEngine, AlertEngineBuilder, AlertEvent, EngineError, EngineState};

// Re-export guard types
pub use guard::{AudioStateGuard, AudioStateSnapshot, GuardError, RestoreReport};

// Re-export device types
pub use device::{
    AudioDevice, AudioStream, DeviceCall, DeviceError, DeviceOperation, DndApi,
    InterruptionFilter, MockAudioDevice, RingerMode, ZenMode,
};

// Re-export sound types
pub use sound::{
    rodio_factory, AudioAttributes, ContentType, MockSoundPlayer, RodioSoundPlayer, SoundError,
    SoundFactory, SoundPlayer, SoundSource, Usage,
};
