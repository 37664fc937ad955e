//! Audio/ringer state guard.
//!
//! The guard captures the device's volume and ringer mode once, applies an
//! alert's override subject to Do-Not-Disturb policy, and puts the device back
//! afterwards. Only the steps that actually changed the device are undone, and
//! each one is undone exactly once.
//!
//! # Policy gate
//!
//! Before the stream volume is changed:
//!
//! - zen-mode API: unreadable or "total silence" skips the change.
//! - interruption-filter API: a filter that blocks alerts (`Silence`,
//!   `Unknown`) is relaxed to `All` when policy access is held; otherwise the
//!   change is skipped.
//!
//! Before the ringer mode is changed the same zen-mode rule applies, while the
//! interruption-filter API needs policy access outright and relaxes any filter
//! other than `All`.

mod error;

pub use error::GuardError;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::device::{AudioDevice, AudioStream, DndApi, InterruptionFilter, RingerMode};

/// Device state captured before any alert touched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioStateSnapshot {
    pub original_volume: u32,
    pub original_ringer_mode: RingerMode,
}

/// Outcome of [`AudioStateGuard::restore`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub volume_restored: bool,
    pub ringer_restored: bool,
    pub filter_restored: bool,
    pub failures: Vec<GuardError>,
}

impl RestoreReport {
    /// Returns true if nothing was pending or everything was restored.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns true if any device state was written back.
    #[must_use]
    pub fn restored_anything(&self) -> bool {
        self.volume_restored || self.ringer_restored || self.filter_restored
    }
}

/// Steps applied since the last restore.
#[derive(Debug, Default)]
struct AppliedOverride {
    volume: bool,
    ringer: bool,
    /// Filter in effect before the first relaxation to `All`.
    relaxed_filter: Option<InterruptionFilter>,
}

impl AppliedOverride {
    fn is_pending(&self) -> bool {
        self.volume || self.ringer || self.relaxed_filter.is_some()
    }
}

/// Captures, overrides and restores device-global audio state.
pub struct AudioStateGuard {
    device: Arc<dyn AudioDevice>,
    stream: AudioStream,
    baseline: AudioStateSnapshot,
    applied: Mutex<AppliedOverride>,
}

impl std::fmt::Debug for AudioStateGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStateGuard")
            .field("stream", &self.stream)
            .field("baseline", &self.baseline)
            .field("applied", &*self.applied())
            .finish()
    }
}

impl AudioStateGuard {
    /// Reads the current stream volume and ringer mode of `device`.
    ///
    /// A read that fails falls back to volume 0 or ringer `Normal`.
    pub fn capture(device: Arc<dyn AudioDevice>, stream: AudioStream) -> Self {
        let original_volume = device.stream_volume(stream).unwrap_or_else(|e| {
            warn!(stream = stream.as_str(), error = %e, "Failed to read stream volume, assuming 0");
            0
        });
        let original_ringer_mode = device.ringer_mode().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read ringer mode, assuming normal");
            RingerMode::Normal
        });

        let baseline = AudioStateSnapshot {
            original_volume,
            original_ringer_mode,
        };
        debug!(?baseline, stream = stream.as_str(), "Captured audio baseline");

        Self {
            device,
            stream,
            baseline,
            applied: Mutex::new(AppliedOverride::default()),
        }
    }

    pub fn baseline(&self) -> AudioStateSnapshot {
        self.baseline
    }

    pub fn stream(&self) -> AudioStream {
        self.stream
    }

    /// Maximum volume level of the guarded stream.
    pub fn max_level(&self) -> Result<u32, GuardError> {
        Ok(self.device.max_stream_volume(self.stream)?)
    }

    /// Sets the guarded stream to `level` if DND policy allows it.
    ///
    /// # Errors
    ///
    /// Returns the reason the step was skipped. The device is unchanged in
    /// that case, apart from a filter relaxation that already succeeded.
    pub fn apply_override(&self, level: u32) -> Result<(), GuardError> {
        let mut applied = self.applied();
        self.allow_volume_change(&mut applied)?;
        self.device.set_stream_volume(self.stream, level)?;
        applied.volume = true;
        info!(stream = self.stream.as_str(), level, "Applied alert volume");
        Ok(())
    }

    /// Sets the ringer mode if DND policy allows it.
    ///
    /// # Errors
    ///
    /// Returns the reason the step was skipped.
    pub fn apply_ringer_mode(&self, mode: RingerMode) -> Result<(), GuardError> {
        let mut applied = self.applied();
        self.allow_ringer_change(&mut applied)?;
        self.device.set_ringer_mode(mode)?;
        applied.ringer = true;
        info!(?mode, "Applied alert ringer mode");
        Ok(())
    }

    /// Undoes every applied step: volume, then ringer mode, then the
    /// interruption filter if it was elevated above `All`.
    ///
    /// Consumes the applied-step record, so calling it again is a no-op.
    pub fn restore(&self) -> RestoreReport {
        let applied = std::mem::take(&mut *self.applied());
        let mut report = RestoreReport::default();

        if applied.volume {
            match self
                .device
                .set_stream_volume(self.stream, self.baseline.original_volume)
            {
                Ok(()) => report.volume_restored = true,
                Err(e) => report.failures.push(e.into()),
            }
        }

        if applied.ringer {
            match self
                .device
                .set_ringer_mode(self.baseline.original_ringer_mode)
            {
                Ok(()) => report.ringer_restored = true,
                Err(e) => report.failures.push(e.into()),
            }
        }

        if let Some(filter) = applied.relaxed_filter.filter(InterruptionFilter::is_elevated) {
            if !self.device.has_policy_access() {
                report.failures.push(GuardError::PolicyAccessDenied);
            } else {
                match self.device.set_interruption_filter(filter) {
                    Ok(()) => report.filter_restored = true,
                    Err(e) => report.failures.push(e.into()),
                }
            }
        }

        for failure in &report.failures {
            warn!(error = %failure, "Failed to restore audio state");
        }
        if report.restored_anything() {
            info!(
                volume = report.volume_restored,
                ringer = report.ringer_restored,
                filter = report.filter_restored,
                "Restored audio state"
            );
        }
        report
    }

    /// Returns true if some applied step has not been restored yet.
    pub fn has_pending_restore(&self) -> bool {
        self.applied().is_pending()
    }

    fn allow_volume_change(&self, applied: &mut AppliedOverride) -> Result<(), GuardError> {
        match self.device.dnd_api() {
            DndApi::ZenModeSetting => self.check_zen_mode(),
            DndApi::InterruptionFilter => {
                let filter = self.read_filter()?;
                if !filter.blocks_alerts() {
                    return Ok(());
                }
                if !self.device.has_policy_access() {
                    return Err(GuardError::PolicyAccessDenied);
                }
                self.relax_filter(filter, applied)
            }
        }
    }

    fn allow_ringer_change(&self, applied: &mut AppliedOverride) -> Result<(), GuardError> {
        match self.device.dnd_api() {
            DndApi::ZenModeSetting => self.check_zen_mode(),
            DndApi::InterruptionFilter => {
                if !self.device.has_policy_access() {
                    return Err(GuardError::PolicyAccessDenied);
                }
                let filter = self.read_filter()?;
                if filter == InterruptionFilter::All {
                    return Ok(());
                }
                self.relax_filter(filter, applied)
            }
        }
    }

    fn check_zen_mode(&self) -> Result<(), GuardError> {
        let zen_mode = self
            .device
            .zen_mode()
            .map_err(|e| GuardError::DndUnreadable(e.to_string()))?;
        if zen_mode.is_total_silence() {
            return Err(GuardError::TotalSilence);
        }
        Ok(())
    }

    fn read_filter(&self) -> Result<InterruptionFilter, GuardError> {
        self.device
            .interruption_filter()
            .map_err(|e| GuardError::DndUnreadable(e.to_string()))
    }

    fn relax_filter(
        &self,
        current: InterruptionFilter,
        applied: &mut AppliedOverride,
    ) -> Result<(), GuardError> {
        self.device
            .set_interruption_filter(InterruptionFilter::All)?;
        if applied.relaxed_filter.is_none() {
            applied.relaxed_filter = Some(current);
        }
        info!(from = ?current, "Relaxed interruption filter for alert");
        Ok(())
    }

    fn applied(&self) -> MutexGuard<'_, AppliedOverride> {
        self.applied.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
