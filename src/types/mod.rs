//! Core data types for the alert player.
//!
//! This module defines:
//! - Volume limits used to normalize alert volumes
//! - Alert settings describing one playback request
//! - Engine configuration with validation and JSON loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::device::AudioStream;

/// Longest pause between loop iterations, in seconds.
pub const MAX_INTERVAL_SECONDS: u32 = 120;

/// Volume value meaning "leave the device volume alone".
pub const NO_VOLUME_CHANGE: f32 = -1.0;

// ============================================================================
// VolumeLimits
// ============================================================================

fn default_default_volume() -> f32 {
    0.5
}

fn default_max_volume() -> f32 {
    1.0
}

/// Default and maximum alert volume, as fractions of the device maximum.
///
/// An alert requested at exactly `default_volume` leaves the device volume
/// and ringer mode untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeLimits {
    /// Volume used when the request is negative ("no change").
    #[serde(default = "default_default_volume")]
    pub default_volume: f32,
    /// Upper bound for requested volumes.
    #[serde(default = "default_max_volume")]
    pub max_volume: f32,
}

impl Default for VolumeLimits {
    fn default() -> Self {
        Self {
            default_volume: default_default_volume(),
            max_volume: default_max_volume(),
        }
    }
}

impl VolumeLimits {
    /// Creates limits from a default and a maximum volume.
    pub fn new(default_volume: f32, max_volume: f32) -> Self {
        Self {
            default_volume,
            max_volume,
        }
    }

    /// Validates the limits.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_volume > 0.0 && self.max_volume <= 1.0) {
            return Err("最大音量は0より大きく1.0以下で指定してください".to_string());
        }
        if !(self.default_volume >= 0.0 && self.default_volume <= self.max_volume) {
            return Err("既定音量は0から最大音量の範囲で指定してください".to_string());
        }
        Ok(())
    }

    /// Normalizes a requested volume.
    ///
    /// Values above `max_volume` are clamped to it; negative values (and NaN)
    /// become `default_volume`.
    #[must_use]
    pub fn normalize(&self, volume: f32) -> f32 {
        if volume.is_nan() {
            return self.default_volume;
        }
        let volume = volume.min(self.max_volume);
        if volume < 0.0 {
            self.default_volume
        } else {
            volume
        }
    }
}

// ============================================================================
// AlertSettings
// ============================================================================

/// One alert playback request.
///
/// Out-of-range input is clamped rather than rejected: an alert that plays at
/// a slightly different volume beats one that does not play at all.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSettings {
    enabled: bool,
    volume: f32,
    looping: bool,
    interval_seconds: u32,
    limits: VolumeLimits,
}

impl AlertSettings {
    /// Creates enabled settings, normalizing `volume` and `interval_seconds`.
    pub fn new(limits: VolumeLimits, volume: f32, looping: bool, interval_seconds: i64) -> Self {
        let mut settings = Self {
            enabled: true,
            volume: limits.default_volume,
            looping: false,
            interval_seconds: 0,
            limits,
        };
        settings.set_volume(volume);
        settings.set_looping(looping);
        settings.set_interval(interval_seconds);
        settings
    }

    /// Copies `other` under `limits`, re-normalizing through the same setters.
    pub fn copy_from(limits: VolumeLimits, other: &AlertSettings) -> Self {
        let mut settings = Self::new(limits, 0.0, false, 0);
        settings.set_enabled(other.enabled);
        settings.set_volume(other.volume);
        settings.set_looping(other.looping);
        settings.set_interval(i64::from(other.interval_seconds));
        settings
    }

    /// Returns these settings with the enabled flag replaced.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn interval_seconds(&self) -> u32 {
        self.interval_seconds
    }

    /// Pause between loop iterations.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_seconds))
    }

    pub fn limits(&self) -> VolumeLimits {
        self.limits
    }

    /// Returns true if starting these settings must not make a sound.
    pub fn is_silent(&self) -> bool {
        !self.enabled || self.volume == 0.0
    }

    /// Returns true if the device volume should be left alone.
    pub fn uses_default_volume(&self) -> bool {
        self.volume == self.limits.default_volume
    }

    /// Device volume level for this request on a stream with `max_level` steps.
    pub fn level_for(&self, max_level: u32) -> u32 {
        let level = (max_level as f32 * self.volume).floor();
        (level.max(0.0) as u32).min(max_level)
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = self.limits.normalize(volume);
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_interval(&mut self, seconds: i64) {
        self.interval_seconds = seconds.clamp(0, i64::from(MAX_INTERVAL_SECONDS)) as u32;
    }
}

// ============================================================================
// EngineConfig
// ============================================================================

fn default_poll_interval_ms() -> u64 {
    100
}

/// Configuration for the alert engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Volume normalization limits
    #[serde(default)]
    pub volume: VolumeLimits,
    /// How often a playing sound is polled for completion (1-1000 ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Volume channel the alert plays on
    #[serde(default)]
    pub stream: AudioStream,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            volume: VolumeLimits::default(),
            poll_interval_ms: default_poll_interval_ms(),
            stream: AudioStream::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with the specified volume limits.
    pub fn with_volume_limits(mut self, limits: VolumeLimits) -> Self {
        self.volume = limits;
        self
    }

    /// Creates a new configuration with the specified poll interval.
    pub fn with_poll_interval_ms(mut self, millis: u64) -> Self {
        self.poll_interval_ms = millis;
        self
    }

    /// Creates a new configuration with the specified stream.
    pub fn with_stream(mut self, stream: AudioStream) -> Self {
        self.stream = stream;
        self
    }

    /// Poll interval as a `Duration`, never zero.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        self.volume.validate()?;
        if self.poll_interval_ms < 1 || self.poll_interval_ms > 1000 {
            return Err("ポーリング間隔は1-1000ミリ秒の範囲で指定してください".to_string());
        }
        Ok(())
    }

    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("設定ファイルを読み込めません: {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("設定ファイルの形式が不正です: {}", path.display()))?;
        config.validate().map_err(|e| anyhow!(e))?;
        Ok(config)
    }

    /// Loads `explicit` if given, else the default config file if it exists,
    /// else the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be loaded.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Default config file location: `<config dir>/alert-player/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("alert-player").join("config.json"))
}

// ============================================================================
// Tests
// ============================================================================
