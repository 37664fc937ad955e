//! Device-global audio state capabilities.
//!
//! The alert engine never talks to the platform directly. Everything that
//! reads or mutates device-wide volume, ringer mode or Do-Not-Disturb state
//! goes through the [`AudioDevice`] trait, so the engine and the
//! [`AudioStateGuard`](crate::guard::AudioStateGuard) can be driven by
//! [`MockAudioDevice`] in tests and in the CLI.
//!
//! # Do-Not-Disturb APIs
//!
//! Two generations of DND control are modeled:
//!
//! - [`DndApi::ZenModeSetting`]: a read-only global setting ([`ZenMode`]).
//!   The only decision it supports is "is this total silence?".
//! - [`DndApi::InterruptionFilter`]: a readable and writable
//!   [`InterruptionFilter`], where writes require notification policy access.

mod error;
mod mock;

pub use error::DeviceError;
pub use mock::{DeviceCall, DeviceOperation, MockAudioDevice};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// ============================================================================
// AudioStream
// ============================================================================

/// Volume channel the alert is played on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AudioStream {
    /// Alarm stream (default for alerts).
    #[default]
    Alarm,
    /// Phone ring stream.
    Ring,
    /// Notification stream.
    Notification,
    /// Media stream.
    Music,
}

impl AudioStream {
    /// Returns the string representation of the stream.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioStream::Alarm => "alarm",
            AudioStream::Ring => "ring",
            AudioStream::Notification => "notification",
            AudioStream::Music => "music",
        }
    }
}

// ============================================================================
// RingerMode
// ============================================================================

/// Device ringer mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum RingerMode {
    /// Ringer muted, no vibration.
    Silent,
    /// Ringer muted, vibration on.
    Vibrate,
    /// Audible ringer.
    #[default]
    Normal,
}

// ============================================================================
// InterruptionFilter
// ============================================================================

/// Interruption filter controlling which interruptions reach the user.
///
/// Filters are ordered by how much they block; [`level`](Self::level) gives
/// the numeric ranking used to decide whether a saved filter was elevated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionFilter {
    /// The filter could not be determined.
    Unknown,
    /// All interruptions are allowed (DND off).
    #[default]
    All,
    /// Only priority interruptions are allowed.
    Priority,
    /// No interruptions are allowed (total silence).
    Silence,
    /// Only alarms are allowed.
    Alarms,
}

impl InterruptionFilter {
    /// Numeric ranking of the filter: `Unknown` 0, `All` 1, `Priority` 2,
    /// `Silence` 3, `Alarms` 4.
    #[must_use]
    pub fn level(&self) -> u8 {
        match self {
            InterruptionFilter::Unknown => 0,
            InterruptionFilter::All => 1,
            InterruptionFilter::Priority => 2,
            InterruptionFilter::Silence => 3,
            InterruptionFilter::Alarms => 4,
        }
    }

    /// Returns true if the filter ranks above [`InterruptionFilter::All`].
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        self.level() > InterruptionFilter::All.level()
    }

    /// Returns true if the filter would block an alert volume change.
    #[must_use]
    pub fn blocks_alerts(&self) -> bool {
        matches!(self, InterruptionFilter::Silence | InterruptionFilter::Unknown)
    }
}

// ============================================================================
// ZenMode / DndApi
// ============================================================================

/// Legacy global Do-Not-Disturb setting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ZenMode {
    /// DND off.
    #[default]
    Off,
    /// Important interruptions only.
    ImportantInterruptions,
    /// Total silence.
    TotalSilence,
    /// Alarms only.
    AlarmsOnly,
}

impl ZenMode {
    /// Returns true if the setting means total silence.
    #[must_use]
    pub fn is_total_silence(&self) -> bool {
        matches!(self, ZenMode::TotalSilence)
    }
}

/// Which Do-Not-Disturb API the device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DndApi {
    /// Read-only zen mode lookup.
    ZenModeSetting,
    /// Read/write interruption filter guarded by policy access.
    #[default]
    InterruptionFilter,
}

// ============================================================================
// AudioDevice
// ============================================================================

/// Capability over device-wide volume, ringer and Do-Not-Disturb state.
///
/// Implementations must be cheap to call and safe to share across threads;
/// the engine calls them from its owner's thread and from monitor tasks.
pub trait AudioDevice: Send + Sync {
    /// Current volume level of `stream`.
    fn stream_volume(&self, stream: AudioStream) -> Result<u32, DeviceError>;

    /// Maximum volume level of `stream`.
    fn max_stream_volume(&self, stream: AudioStream) -> Result<u32, DeviceError>;

    /// Sets the volume level of `stream`.
    fn set_stream_volume(&self, stream: AudioStream, level: u32) -> Result<(), DeviceError>;

    /// Current ringer mode.
    fn ringer_mode(&self) -> Result<RingerMode, DeviceError>;

    /// Sets the ringer mode.
    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), DeviceError>;

    /// Current interruption filter.
    fn interruption_filter(&self) -> Result<InterruptionFilter, DeviceError>;

    /// Sets the interruption filter. Requires policy access.
    fn set_interruption_filter(&self, filter: InterruptionFilter) -> Result<(), DeviceError>;

    /// Returns true if the caller may change notification policy.
    fn has_policy_access(&self) -> bool;

    /// The Do-Not-Disturb API this device exposes.
    fn dnd_api(&self) -> DndApi;

    /// Legacy Do-Not-Disturb setting lookup.
    fn zen_mode(&self) -> Result<ZenMode, DeviceError>;
}
