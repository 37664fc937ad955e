//! Built-in alert tone.
//!
//! The tone is synthesized with rodio sources instead of shipping audio data,
//! so an alert can always be heard even when no sound file is configured or
//! the configured one cannot be decoded.

use std::time::Duration;

use rodio::source::{SineWave, Zero};
use rodio::{Sink, Source};

/// Sample rate of the silent gaps; matches rodio's `SineWave`.
const SAMPLE_RATE: u32 = 48_000;

/// Amplitude applied to every tone step.
pub const TONE_AMPLITUDE: f32 = 0.4;

/// One step of the alert pattern. A frequency of zero is a pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneStep {
    pub frequency_hz: f32,
    pub duration_ms: u64,
}

impl ToneStep {
    pub const fn tone(frequency_hz: f32, duration_ms: u64) -> Self {
        Self {
            frequency_hz,
            duration_ms,
        }
    }

    pub const fn pause(duration_ms: u64) -> Self {
        Self {
            frequency_hz: 0.0,
            duration_ms,
        }
    }

    pub fn is_pause(&self) -> bool {
        self.frequency_hz <= 0.0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Two-pitch alarm pattern, played once per iteration.
pub const ALERT_TONE: &[ToneStep] = &[
    ToneStep::tone(880.0, 200),
    ToneStep::pause(80),
    ToneStep::tone(1046.5, 200),
    ToneStep::pause(80),
    ToneStep::tone(880.0, 200),
    ToneStep::pause(80),
    ToneStep::tone(1046.5, 400),
    ToneStep::pause(300),
];

/// Total length of one alert tone iteration.
pub fn alert_tone_duration() -> Duration {
    ALERT_TONE.iter().map(ToneStep::duration).sum()
}

/// Queues one iteration of the alert tone on `sink`.
pub fn append_alert_tone(sink: &Sink) {
    for step in ALERT_TONE {
        if step.is_pause() {
            sink.append(Zero::<f32>::new(1, SAMPLE_RATE).take_duration(step.duration()));
        } else {
            sink.append(
                SineWave::new(step.frequency_hz)
                    .take_duration(step.duration())
                    .amplify(TONE_AMPLITUDE),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_alternates_tone_and_pause() {
        assert!(!ALERT_TONE.is_empty());
        for pair in ALERT_TONE.windows(2) {
            assert_ne!(pair[0].is_pause(), pair[1].is_pause());
        }
        assert!(!ALERT_TONE[0].is_pause());
    }

    #[test]
    fn test_alert_tone_duration() {
        assert_eq!(alert_tone_duration(), Duration::from_millis(1540));
    }

    #[test]
    fn test_step_constructors() {
        assert!(ToneStep::pause(10).is_pause());
        assert!(!ToneStep::tone(440.0, 10).is_pause());
        assert_eq!(ToneStep::tone(440.0, 250).duration(), Duration::from_millis(250));
    }
}
