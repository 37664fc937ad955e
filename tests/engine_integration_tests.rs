//! Integration tests for the alert engine.
//!
//! These tests drive the public API end to end with the recording device and
//! the tokio-clock sound player:
//! - Override and restoration under each Do-Not-Disturb API
//! - Rapid and concurrent restarts
//! - Configuration loaded from disk
//! - Event ordering

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use alert_player::{
    AlertEngine, AlertEvent, AlertSettings, AudioStream, EngineConfig, EngineState,
    InterruptionFilter, MockAudioDevice, MockSoundPlayer, RingerMode, SoundPlayer, VolumeLimits,
    ZenMode,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestRig {
    engine: AlertEngine,
    device: Arc<MockAudioDevice>,
    sound: Arc<MockSoundPlayer>,
    events: mpsc::UnboundedReceiver<AlertEvent>,
}

/// Builds an engine over `device` with one-second mock clips.
fn create_rig(device: MockAudioDevice, config: EngineConfig) -> TestRig {
    let device = Arc::new(device);
    let sound = Arc::new(MockSoundPlayer::new());
    let factory_sound = sound.clone();
    let (tx, rx) = mpsc::unbounded_channel();

    let engine = AlertEngine::builder(
        config,
        device.clone(),
        Box::new(move || Ok(factory_sound.clone() as Arc<dyn SoundPlayer>)),
    )
    .events(tx)
    .build()
    .expect("engine should build inside a runtime");

    TestRig {
        engine,
        device,
        sound,
        events: rx,
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<AlertEvent>) -> Vec<AlertEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn alarm(volume: f32, looping: bool, interval_seconds: i64) -> AlertSettings {
    AlertSettings::new(VolumeLimits::default(), volume, looping, interval_seconds)
}

// ============================================================================
// Do-Not-Disturb Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_priority_dnd_is_relaxed_and_fully_restored() {
    let rig = create_rig(
        MockAudioDevice::new()
            .with_stream_volume(AudioStream::Alarm, 2)
            .with_ringer_mode(RingerMode::Vibrate)
            .with_interruption_filter(InterruptionFilter::Priority),
        EngineConfig::default(),
    );

    rig.engine.start(&alarm(1.0, true, 5));
    assert_eq!(rig.device.current_volume(AudioStream::Alarm), 7);
    assert_eq!(rig.device.current_ringer_mode(), RingerMode::Normal);
    assert_eq!(
        rig.device.current_interruption_filter(),
        InterruptionFilter::All
    );

    sleep(Duration::from_secs(10)).await;
    rig.engine.stop();

    assert_eq!(rig.device.current_volume(AudioStream::Alarm), 2);
    assert_eq!(rig.device.current_ringer_mode(), RingerMode::Vibrate);
    assert_eq!(
        rig.device.current_interruption_filter(),
        InterruptionFilter::Priority
    );
    assert!(!rig.engine.has_pending_restore());
}

#[tokio::test(start_paused = true)]
async fn test_total_silence_plays_without_touching_device() {
    let rig = create_rig(
        MockAudioDevice::new().with_zen_mode(ZenMode::TotalSilence),
        EngineConfig::default(),
    );

    rig.engine.start(&alarm(1.0, false, 0));
    assert_eq!(rig.sound.play_count(), 1);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(rig.engine.state(), EngineState::Stopped);
    assert!(rig.device.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_blocked_filter_without_access_skips_all_overrides() {
    let rig = create_rig(
        MockAudioDevice::new()
            .with_interruption_filter(InterruptionFilter::Silence)
            .with_policy_access(false),
        EngineConfig::default(),
    );

    rig.engine.start(&alarm(0.9, false, 0));
    sleep(Duration::from_secs(2)).await;

    assert_eq!(rig.sound.play_count(), 1);
    assert!(rig.device.calls().is_empty());
    assert_eq!(
        rig.device.current_interruption_filter(),
        InterruptionFilter::Silence
    );
}

// ============================================================================
// Restart Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rapid_restarts_restore_exactly_once() {
    let mut rig = create_rig(MockAudioDevice::new(), EngineConfig::default());

    for _ in 0..10 {
        rig.engine.start(&alarm(1.0, true, 1));
        sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(rig.engine.current_generation(), 10);
    assert_eq!(rig.engine.state(), EngineState::Playing { generation: 10 });

    rig.engine.stop();
    sleep(Duration::from_secs(30)).await;

    let volumes = rig.device.volume_calls(AudioStream::Alarm);
    assert_eq!(volumes.iter().filter(|&&level| level == 3).count(), 1);
    assert_eq!(volumes.last(), Some(&3));
    assert_eq!(rig.sound.play_count(), 10);

    let events = drain(&mut rig.events);
    let superseded = events
        .iter()
        .filter(|e| matches!(e, AlertEvent::Superseded { .. }))
        .count();
    assert_eq!(superseded, 9);
    assert!(!events
        .iter()
        .any(|e| matches!(e, AlertEvent::Replayed { .. })));
    assert_eq!(events.last(), Some(&AlertEvent::Stopped { generation: 10 }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_starts_leave_consistent_state() {
    let rig = create_rig(MockAudioDevice::new(), EngineConfig::default());
    let engine = Arc::new(rig.engine);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                let volume = if i % 2 == 0 { 1.0 } else { 0.75 };
                engine.start(&alarm(volume, true, 0))
            })
        })
        .collect();
    let mut generations: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    generations.sort_unstable();
    assert_eq!(generations, (1..=8).collect::<Vec<_>>());

    engine.stop();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(engine.state(), EngineState::Stopped);
    assert!(!rig.sound.is_playing());
    assert_eq!(rig.device.current_volume(AudioStream::Alarm), 3);
    assert_eq!(rig.device.current_ringer_mode(), RingerMode::Normal);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop_reuses_sound_player() {
    let rig = create_rig(MockAudioDevice::new(), EngineConfig::default());

    rig.engine.start(&alarm(1.0, false, 0));
    rig.engine.stop();
    rig.engine.start(&alarm(1.0, false, 0));

    assert_eq!(rig.engine.state(), EngineState::Playing { generation: 2 });
    assert_eq!(rig.sound.play_count(), 2);
    assert_eq!(rig.sound.attributes().len(), 1);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(rig.device.volume_calls(AudioStream::Alarm), vec![7, 3, 7, 3]);
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_engine_uses_limits_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"volume": {{"default_volume": 0.3, "max_volume": 0.5}}, "poll_interval_ms": 50}}"#
    )
    .unwrap();
    let config = EngineConfig::load(file.path()).unwrap();

    let rig = create_rig(MockAudioDevice::new().with_max_level(10), config);
    rig.engine.start(&alarm(1.0, false, 0));

    let settings = rig.engine.current_settings().unwrap();
    assert_eq!(settings.volume(), 0.5);
    assert_eq!(rig.device.volume_calls(AudioStream::Alarm), vec![5]);

    rig.engine.start(&alarm(-1.0, false, 0));
    assert_eq!(rig.engine.current_settings().unwrap().volume(), 0.3);
}

#[tokio::test(start_paused = true)]
async fn test_alternate_stream_from_config() {
    let config = EngineConfig::default().with_stream(AudioStream::Ring);
    let rig = create_rig(MockAudioDevice::new(), config);

    rig.engine.start(&alarm(1.0, false, 0));
    rig.engine.stop();

    assert_eq!(rig.device.volume_calls(AudioStream::Ring), vec![7, 3]);
    assert!(rig.device.volume_calls(AudioStream::Alarm).is_empty());
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_event_sequence_for_looping_alert() {
    let mut rig = create_rig(MockAudioDevice::new(), EngineConfig::default());

    rig.engine.start(&alarm(1.0, true, 1));
    // Clip 0-1s, replays at 2s and 4s.
    sleep(Duration::from_millis(4500)).await;
    rig.engine.stop();

    assert_eq!(
        drain(&mut rig.events),
        vec![
            AlertEvent::Started {
                generation: 1,
                looping: true
            },
            AlertEvent::Replayed {
                generation: 1,
                iteration: 2
            },
            AlertEvent::Replayed {
                generation: 1,
                iteration: 3
            },
            AlertEvent::Stopped { generation: 1 },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_events_without_subscriber() {
    let device = Arc::new(MockAudioDevice::new());
    let engine = AlertEngine::builder(
        EngineConfig::default(),
        device.clone(),
        Box::new(|| Ok(Arc::new(MockSoundPlayer::new()) as Arc<dyn SoundPlayer>)),
    )
    .build()
    .unwrap();

    engine.start(&alarm(1.0, false, 0));
    sleep(Duration::from_secs(2)).await;

    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(device.volume_calls(AudioStream::Alarm), vec![7, 3]);
}
