//! In-memory audio device.
//!
//! `MockAudioDevice` keeps volume, ringer and DND state in memory and records
//! every mutation that succeeds. Tests use it to assert on exactly which
//! device calls the engine made; the CLI uses it as a simulated device so the
//! engine's DND and permission handling can be exercised by hand.
//!
//! Permission checks follow what a real device enforces: changing the
//! interruption filter needs policy access, and changing the ringer mode while
//! a filter other than `All` is active needs it too.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{
    AudioDevice, AudioStream, DeviceError, DndApi, InterruptionFilter, RingerMode, ZenMode,
};

/// Default maximum level for every stream.
const DEFAULT_MAX_LEVEL: u32 = 7;

/// Default current level for every stream.
const DEFAULT_LEVEL: u32 = 3;

/// Device operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOperation {
    ReadVolume,
    ReadMaxVolume,
    SetVolume,
    ReadRingerMode,
    SetRingerMode,
    ReadInterruptionFilter,
    SetInterruptionFilter,
    ReadZenMode,
}

/// A successful mutation of device state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    SetVolume { stream: AudioStream, level: u32 },
    SetRingerMode(RingerMode),
    SetInterruptionFilter(InterruptionFilter),
}

#[derive(Debug)]
struct MockDeviceState {
    volumes: HashMap<AudioStream, u32>,
    max_level: u32,
    ringer_mode: RingerMode,
    interruption_filter: InterruptionFilter,
    zen_mode: ZenMode,
    dnd_api: DndApi,
    policy_access: bool,
    failing: HashSet<DeviceOperation>,
    calls: Vec<DeviceCall>,
}

impl MockDeviceState {
    fn check(&self, operation: DeviceOperation) -> Result<(), DeviceError> {
        if self.failing.contains(&operation) {
            return Err(DeviceError::Platform(format!("mock failure: {:?}", operation)));
        }
        Ok(())
    }
}

/// Recording in-memory [`AudioDevice`].
#[derive(Debug)]
pub struct MockAudioDevice {
    state: Mutex<MockDeviceState>,
}

impl Default for MockAudioDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAudioDevice {
    /// Creates a device with every stream at level 3 of 7, ringer `Normal`,
    /// filter `All`, policy access granted and the interruption-filter API.
    #[must_use]
    pub fn new() -> Self {
        let volumes = [
            AudioStream::Alarm,
            AudioStream::Ring,
            AudioStream::Notification,
            AudioStream::Music,
        ]
        .into_iter()
        .map(|stream| (stream, DEFAULT_LEVEL))
        .collect();

        Self {
            state: Mutex::new(MockDeviceState {
                volumes,
                max_level: DEFAULT_MAX_LEVEL,
                ringer_mode: RingerMode::Normal,
                interruption_filter: InterruptionFilter::All,
                zen_mode: ZenMode::Off,
                dnd_api: DndApi::InterruptionFilter,
                policy_access: true,
                failing: HashSet::new(),
                calls: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub fn with_stream_volume(self, stream: AudioStream, level: u32) -> Self {
        self.state.lock().unwrap().volumes.insert(stream, level);
        self
    }

    #[must_use]
    pub fn with_max_level(self, max_level: u32) -> Self {
        self.state.lock().unwrap().max_level = max_level;
        self
    }

    #[must_use]
    pub fn with_ringer_mode(self, mode: RingerMode) -> Self {
        self.state.lock().unwrap().ringer_mode = mode;
        self
    }

    #[must_use]
    pub fn with_interruption_filter(self, filter: InterruptionFilter) -> Self {
        self.state.lock().unwrap().interruption_filter = filter;
        self
    }

    /// Switches the device to the legacy zen-mode API with the given setting.
    #[must_use]
    pub fn with_zen_mode(self, zen_mode: ZenMode) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.zen_mode = zen_mode;
            state.dnd_api = DndApi::ZenModeSetting;
        }
        self
    }

    #[must_use]
    pub fn with_policy_access(self, granted: bool) -> Self {
        self.set_policy_access(granted);
        self
    }

    #[must_use]
    pub fn with_failure(self, operation: DeviceOperation) -> Self {
        self.set_failure(operation, true);
        self
    }

    pub fn set_policy_access(&self, granted: bool) {
        self.state.lock().unwrap().policy_access = granted;
    }

    pub fn set_failure(&self, operation: DeviceOperation, failing: bool) {
        let mut state = self.state.lock().unwrap();
        if failing {
            state.failing.insert(operation);
        } else {
            state.failing.remove(&operation);
        }
    }

    /// Changes the filter as if the user toggled DND, without recording a call.
    pub fn set_user_interruption_filter(&self, filter: InterruptionFilter) {
        self.state.lock().unwrap().interruption_filter = filter;
    }

    #[must_use]
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Levels passed to successful volume changes on `stream`, in order.
    #[must_use]
    pub fn volume_calls(&self, stream: AudioStream) -> Vec<u32> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::SetVolume { stream: s, level } if *s == stream => Some(*level),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn ringer_mode_calls(&self) -> Vec<RingerMode> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::SetRingerMode(mode) => Some(*mode),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn filter_calls(&self) -> Vec<InterruptionFilter> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::SetInterruptionFilter(filter) => Some(*filter),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn current_volume(&self, stream: AudioStream) -> u32 {
        let state = self.state.lock().unwrap();
        state.volumes.get(&stream).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn current_ringer_mode(&self) -> RingerMode {
        self.state.lock().unwrap().ringer_mode
    }

    #[must_use]
    pub fn current_interruption_filter(&self) -> InterruptionFilter {
        self.state.lock().unwrap().interruption_filter
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

impl AudioDevice for MockAudioDevice {
    fn stream_volume(&self, stream: AudioStream) -> Result<u32, DeviceError> {
        let state = self.state.lock().unwrap();
        state.check(DeviceOperation::ReadVolume)?;
        Ok(state.volumes.get(&stream).copied().unwrap_or(0))
    }

    fn max_stream_volume(&self, _stream: AudioStream) -> Result<u32, DeviceError> {
        let state = self.state.lock().unwrap();
        state.check(DeviceOperation::ReadMaxVolume)?;
        Ok(state.max_level)
    }

    fn set_stream_volume(&self, stream: AudioStream, level: u32) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.check(DeviceOperation::SetVolume)?;
        let level = level.min(state.max_level);
        state.volumes.insert(stream, level);
        state.calls.push(DeviceCall::SetVolume { stream, level });
        Ok(())
    }

    fn ringer_mode(&self) -> Result<RingerMode, DeviceError> {
        let state = self.state.lock().unwrap();
        state.check(DeviceOperation::ReadRingerMode)?;
        Ok(state.ringer_mode)
    }

    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.check(DeviceOperation::SetRingerMode)?;
        if state.dnd_api == DndApi::InterruptionFilter
            && state.interruption_filter != InterruptionFilter::All
            && !state.policy_access
        {
            return Err(DeviceError::PermissionDenied(
                "set_ringer_mode while do-not-disturb is active".to_string(),
            ));
        }
        state.ringer_mode = mode;
        state.calls.push(DeviceCall::SetRingerMode(mode));
        Ok(())
    }

    fn interruption_filter(&self) -> Result<InterruptionFilter, DeviceError> {
        let state = self.state.lock().unwrap();
        state.check(DeviceOperation::ReadInterruptionFilter)?;
        if state.dnd_api == DndApi::ZenModeSetting {
            return Err(DeviceError::Unsupported("interruption_filter".to_string()));
        }
        Ok(state.interruption_filter)
    }

    fn set_interruption_filter(&self, filter: InterruptionFilter) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.check(DeviceOperation::SetInterruptionFilter)?;
        if state.dnd_api == DndApi::ZenModeSetting {
            return Err(DeviceError::Unsupported(
                "set_interruption_filter".to_string(),
            ));
        }
        if !state.policy_access {
            return Err(DeviceError::PermissionDenied(
                "set_interruption_filter".to_string(),
            ));
        }
        state.interruption_filter = filter;
        state.calls.push(DeviceCall::SetInterruptionFilter(filter));
        Ok(())
    }

    fn has_policy_access(&self) -> bool {
        self.state.lock().unwrap().policy_access
    }

    fn dnd_api(&self) -> DndApi {
        self.state.lock().unwrap().dnd_api
    }

    fn zen_mode(&self) -> Result<ZenMode, DeviceError> {
        let state = self.state.lock().unwrap();
        state.check(DeviceOperation::ReadZenMode)?;
        Ok(state.zen_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let device = MockAudioDevice::new();
        assert_eq!(device.stream_volume(AudioStream::Alarm).unwrap(), 3);
        assert_eq!(device.max_stream_volume(AudioStream::Alarm).unwrap(), 7);
        assert_eq!(device.ringer_mode().unwrap(), RingerMode::Normal);
        assert_eq!(
            device.interruption_filter().unwrap(),
            InterruptionFilter::All
        );
        assert!(device.has_policy_access());
        assert_eq!(device.dnd_api(), DndApi::InterruptionFilter);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_set_volume_is_recorded_and_clamped() {
        let device = MockAudioDevice::new().with_max_level(5);
        device.set_stream_volume(AudioStream::Alarm, 9).unwrap();

        assert_eq!(device.current_volume(AudioStream::Alarm), 5);
        assert_eq!(device.volume_calls(AudioStream::Alarm), vec![5]);
        assert!(device.volume_calls(AudioStream::Ring).is_empty());
    }

    #[test]
    fn test_failure_injection() {
        let device = MockAudioDevice::new().with_failure(DeviceOperation::SetVolume);
        assert!(device.set_stream_volume(AudioStream::Alarm, 1).is_err());
        assert!(device.calls().is_empty());

        device.set_failure(DeviceOperation::SetVolume, false);
        assert!(device.set_stream_volume(AudioStream::Alarm, 1).is_ok());
        assert_eq!(device.calls().len(), 1);
    }

    #[test]
    fn test_filter_change_requires_policy_access() {
        let device = MockAudioDevice::new().with_policy_access(false);
        let err = device
            .set_interruption_filter(InterruptionFilter::Silence)
            .unwrap_err();
        assert!(err.is_permission_denied());

        device.set_policy_access(true);
        device
            .set_interruption_filter(InterruptionFilter::Silence)
            .unwrap();
        assert_eq!(
            device.current_interruption_filter(),
            InterruptionFilter::Silence
        );
        assert_eq!(device.filter_calls(), vec![InterruptionFilter::Silence]);
    }

    #[test]
    fn test_ringer_change_blocked_by_dnd_without_access() {
        let device = MockAudioDevice::new()
            .with_interruption_filter(InterruptionFilter::Priority)
            .with_policy_access(false);
        assert!(device.set_ringer_mode(RingerMode::Silent).is_err());
        assert_eq!(device.current_ringer_mode(), RingerMode::Normal);
    }

    #[test]
    fn test_zen_mode_device_has_no_filter_api() {
        let device = MockAudioDevice::new().with_zen_mode(ZenMode::TotalSilence);
        assert_eq!(device.dnd_api(), DndApi::ZenModeSetting);
        assert_eq!(device.zen_mode().unwrap(), ZenMode::TotalSilence);
        assert!(device.interruption_filter().unwrap_err().is_unsupported());
    }

    #[test]
    fn test_user_filter_change_is_not_recorded() {
        let device = MockAudioDevice::new();
        device.set_user_interruption_filter(InterruptionFilter::Alarms);
        assert_eq!(
            device.current_interruption_filter(),
            InterruptionFilter::Alarms
        );
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_clear_calls() {
        let device = MockAudioDevice::new();
        device.set_ringer_mode(RingerMode::Vibrate).unwrap();
        assert_eq!(device.ringer_mode_calls(), vec![RingerMode::Vibrate]);
        device.clear_calls();
        assert!(device.calls().is_empty());
    }
}
