//! Display utilities for the alert player CLI.
//!
//! This module provides formatted output for:
//! - Alert events
//! - The requested settings
//! - The simulated device's mutation history and final state
//! - Error messages

use crate::device::{AudioStream, DeviceCall, InterruptionFilter, MockAudioDevice, RingerMode};
use crate::engine::AlertEvent;
use crate::guard::AudioStateSnapshot;
use crate::types::AlertSettings;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the settings an alert is about to start with.
    pub fn show_settings(settings: &AlertSettings) {
        println!("アラート設定");
        println!("─────────────────────────────");
        println!("有効: {}", Self::yes_no(settings.is_enabled()));
        if settings.uses_default_volume() {
            println!("音量: {:.2} (既定値・端末の音量は変更しません)", settings.volume());
        } else {
            println!("音量: {:.2}", settings.volume());
        }
        println!("ループ: {}", Self::yes_no(settings.is_looping()));
        if settings.is_looping() {
            println!("間隔: {}秒", settings.interval_seconds());
        }
        println!();
    }

    /// Shows one engine event.
    pub fn show_event(event: &AlertEvent) {
        println!("{}", Self::format_event(event));
    }

    /// Shows the device mutations and the final device state.
    pub fn show_device_report(
        device: &MockAudioDevice,
        stream: AudioStream,
        baseline: Option<AudioStateSnapshot>,
    ) {
        println!();
        println!("端末の状態");
        println!("─────────────────────────────");

        let calls = device.calls();
        if calls.is_empty() {
            println!("変更: なし");
        } else {
            println!("変更:");
            for call in &calls {
                println!("  {}", Self::format_call(call));
            }
        }

        if let Some(baseline) = baseline {
            println!(
                "開始前: 音量 {} / 着信モード {}",
                baseline.original_volume,
                Self::ringer_label(baseline.original_ringer_mode)
            );
        }
        println!(
            "現在: 音量 {} / 着信モード {} / おやすみモード {}",
            device.current_volume(stream),
            Self::ringer_label(device.current_ringer_mode()),
            Self::filter_label(device.current_interruption_filter())
        );
    }

    /// Shows a warning that an argument was clamped.
    pub fn show_clamped_interval(requested: i64, applied: u32) {
        eprintln!(
            "注意: 間隔 {}秒 は範囲外のため {}秒 に調整されました",
            requested, applied
        );
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Formats an engine event as a single line.
    fn format_event(event: &AlertEvent) -> String {
        match *event {
            AlertEvent::Started {
                generation,
                looping,
            } => format!(
                "> アラートを開始しました (#{}, ループ: {})",
                generation,
                Self::yes_no(looping)
            ),
            AlertEvent::Silent { generation } => {
                format!("- アラートは無音です (#{})", generation)
            }
            AlertEvent::Replayed {
                generation,
                iteration,
            } => format!("> アラートを再生しました (#{}, {}回目)", generation, iteration),
            AlertEvent::Completed { generation } => {
                format!("* アラートの再生が完了しました (#{})", generation)
            }
            AlertEvent::Superseded { generation } => {
                format!("» 新しいアラートに置き換えられました (#{})", generation)
            }
            AlertEvent::Stopped { generation } => {
                format!("[] アラートを停止しました (#{})", generation)
            }
        }
    }

    /// Formats one device mutation.
    fn format_call(call: &DeviceCall) -> String {
        match call {
            DeviceCall::SetVolume { stream, level } => {
                format!("音量 ({}) → {}", stream.as_str(), level)
            }
            DeviceCall::SetRingerMode(mode) => {
                format!("着信モード → {}", Self::ringer_label(*mode))
            }
            DeviceCall::SetInterruptionFilter(filter) => {
                format!("おやすみモード → {}", Self::filter_label(*filter))
            }
        }
    }

    fn ringer_label(mode: RingerMode) -> &'static str {
        match mode {
            RingerMode::Silent => "サイレント",
            RingerMode::Vibrate => "バイブレーション",
            RingerMode::Normal => "通常",
        }
    }

    fn filter_label(filter: InterruptionFilter) -> &'static str {
        match filter {
            InterruptionFilter::Unknown => "不明",
            InterruptionFilter::All => "オフ",
            InterruptionFilter::Priority => "優先のみ",
            InterruptionFilter::Silence => "完全サイレント",
            InterruptionFilter::Alarms => "アラームのみ",
        }
    }

    fn yes_no(value: bool) -> &'static str {
        if value {
            "あり"
        } else {
            "なし"
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
