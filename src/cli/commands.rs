//! Command definitions for the alert player CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::device::{AudioStream, InterruptionFilter, MockAudioDevice, RingerMode, ZenMode};
use crate::sound::{is_supported_format, SoundSource};
use crate::types::{AlertSettings, VolumeLimits, MAX_INTERVAL_SECONDS, NO_VOLUME_CHANGE};

// ============================================================================
// CLI Structure
// ============================================================================

/// Alert player CLI - drives one alarm-style alert against a simulated device
#[derive(Parser, Debug)]
#[command(
    name = "alert-player",
    version,
    about = "アラーム型アラート再生エンジンの検証用CLI",
    long_about = "指定した音量でアラート音を再生し、着信モードとおやすみモードを一時的に変更して\n\
                  終了後に元の状態へ戻します。端末の状態はシミュレートされます。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a JSON engine config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Play one alert and report what happened to the device
    Play(PlayArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Play Command Arguments
// ============================================================================

/// Arguments for the play command
#[derive(Args, Debug, Clone)]
pub struct PlayArgs {
    /// Alert volume as a fraction of the device maximum (-1 keeps the device volume)
    #[arg(long, default_value_t = NO_VOLUME_CHANGE, allow_hyphen_values = true)]
    pub volume: f32,

    /// Repeat the alert until stopped
    #[arg(short = 'l', long = "loop")]
    pub looping: bool,

    /// Seconds between loop iterations (clamped to 0-120)
    #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
    pub interval: i64,

    /// Start the alert disabled (no sound, no device changes)
    #[arg(long)]
    pub disabled: bool,

    /// Audio file to play instead of the built-in tone
    #[arg(short, long, value_parser = validate_sound_path)]
    pub sound: Option<PathBuf>,

    /// Stop the alert after this many seconds (1-3600)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub duration: Option<u64>,

    /// Use a silent simulated sound player instead of the audio device
    #[arg(long)]
    pub simulate_sound: bool,

    /// Simulated device: current volume level of the alert stream
    #[arg(long, default_value_t = 3)]
    pub baseline_volume: u32,

    /// Simulated device: maximum volume level (1-100)
    #[arg(
        long,
        default_value = "7",
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub max_level: u32,

    /// Simulated device: ringer mode
    #[arg(long, value_enum, default_value_t = RingerMode::Normal)]
    pub ringer: RingerMode,

    /// Simulated device: interruption filter
    #[arg(long, value_enum, default_value_t = InterruptionFilter::All)]
    pub filter: InterruptionFilter,

    /// Simulated device: use the legacy zen-mode setting with this value
    #[arg(long, value_enum)]
    pub zen_mode: Option<ZenMode>,

    /// Simulated device: deny notification policy access
    #[arg(long)]
    pub no_policy_access: bool,
}

impl Default for PlayArgs {
    fn default() -> Self {
        Self {
            volume: NO_VOLUME_CHANGE,
            looping: false,
            interval: 0,
            disabled: false,
            sound: None,
            duration: None,
            simulate_sound: false,
            baseline_volume: 3,
            max_level: 7,
            ringer: RingerMode::Normal,
            filter: InterruptionFilter::All,
            zen_mode: None,
            no_policy_access: false,
        }
    }
}

impl PlayArgs {
    /// Alert settings for this request under `limits`.
    pub fn to_settings(&self, limits: VolumeLimits) -> AlertSettings {
        AlertSettings::new(limits, self.volume, self.looping, self.interval)
            .with_enabled(!self.disabled)
    }

    /// The simulated device described by the arguments.
    pub fn simulated_device(&self, stream: AudioStream) -> MockAudioDevice {
        let device = MockAudioDevice::new()
            .with_max_level(self.max_level)
            .with_stream_volume(stream, self.baseline_volume.min(self.max_level))
            .with_ringer_mode(self.ringer)
            .with_interruption_filter(self.filter)
            .with_policy_access(!self.no_policy_access);
        match self.zen_mode {
            Some(zen_mode) => device.with_zen_mode(zen_mode),
            None => device,
        }
    }

    /// The sound to play.
    pub fn sound_source(&self) -> SoundSource {
        self.sound
            .as_ref()
            .map(SoundSource::file)
            .unwrap_or_default()
    }

    /// Returns true if the interval argument will be clamped.
    pub fn interval_out_of_range(&self) -> bool {
        self.interval < 0 || self.interval > i64::from(MAX_INTERVAL_SECONDS)
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the sound file path.
///
/// - Must not be empty
/// - Must have a supported audio extension
fn validate_sound_path(s: &str) -> Result<PathBuf, String> {
    if s.is_empty() {
        return Err("サウンドファイルのパスは空にできません".to_string());
    }
    let path = PathBuf::from(s);
    if !is_supported_format(&path) {
        return Err("サウンドファイルは wav / mp3 / ogg / flac 形式で指定してください".to_string());
    }
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{AudioDevice, DndApi};

    // ------------------------------------------------------------------------
    // Cli Tests
    // ------------------------------------------------------------------------

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["alert-player"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
            assert!(cli.config.is_none());
        }

        #[test]
        fn test_parse_global_flags() {
            let cli = Cli::parse_from(["alert-player", "play", "-v", "--config", "/tmp/c.json"]);
            assert!(cli.verbose);
            assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        }

        #[test]
        fn test_parse_completions() {
            let cli = Cli::parse_from(["alert-player", "completions", "zsh"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Completions {
                    shell: clap_complete::Shell::Zsh
                })
            ));
        }

        #[test]
        fn test_parse_unknown_command_fails() {
            assert!(Cli::try_parse_from(["alert-player", "pause"]).is_err());
        }
    }

    // ------------------------------------------------------------------------
    // PlayArgs Tests
    // ------------------------------------------------------------------------

    mod play_args_tests {
        use super::*;

        fn parse(args: &[&str]) -> PlayArgs {
            let mut argv = vec!["alert-player", "play"];
            argv.extend_from_slice(args);
            match Cli::parse_from(argv).command {
                Some(Commands::Play(args)) => args,
                other => panic!("expected play command, got {:?}", other),
            }
        }

        #[test]
        fn test_defaults() {
            let args = parse(&[]);
            assert_eq!(args.volume, NO_VOLUME_CHANGE);
            assert!(!args.looping);
            assert_eq!(args.interval, 0);
            assert!(!args.disabled);
            assert!(args.sound.is_none());
            assert!(args.duration.is_none());
            assert_eq!(args.baseline_volume, 3);
            assert_eq!(args.max_level, 7);
            assert_eq!(args.ringer, RingerMode::Normal);
            assert_eq!(args.filter, InterruptionFilter::All);
            assert!(args.zen_mode.is_none());
        }

        #[test]
        fn test_parse_all_options() {
            let args = parse(&[
                "--volume",
                "0.8",
                "--loop",
                "--interval",
                "10",
                "--sound",
                "/tmp/alarm.ogg",
                "--duration",
                "30",
                "--ringer",
                "silent",
                "--filter",
                "priority",
                "--no-policy-access",
            ]);
            assert_eq!(args.volume, 0.8);
            assert!(args.looping);
            assert_eq!(args.interval, 10);
            assert_eq!(args.sound, Some(PathBuf::from("/tmp/alarm.ogg")));
            assert_eq!(args.duration, Some(30));
            assert_eq!(args.ringer, RingerMode::Silent);
            assert_eq!(args.filter, InterruptionFilter::Priority);
            assert!(args.no_policy_access);
        }

        #[test]
        fn test_negative_values_accepted() {
            let args = parse(&["--volume", "-1", "--interval", "-5"]);
            assert_eq!(args.volume, -1.0);
            assert_eq!(args.interval, -5);
            assert!(args.interval_out_of_range());
        }

        #[test]
        fn test_rejects_unsupported_sound() {
            assert!(Cli::try_parse_from(["alert-player", "play", "--sound", "alarm.txt"]).is_err());
            assert!(Cli::try_parse_from(["alert-player", "play", "--sound", ""]).is_err());
        }

        #[test]
        fn test_rejects_out_of_range_duration() {
            assert!(Cli::try_parse_from(["alert-player", "play", "--duration", "0"]).is_err());
            assert!(Cli::try_parse_from(["alert-player", "play", "--duration", "3601"]).is_err());
        }

        #[test]
        fn test_to_settings_clamps() {
            let args = parse(&["--volume", "3.5", "--loop", "--interval", "500", "--disabled"]);
            let settings = args.to_settings(VolumeLimits::default());
            assert_eq!(settings.volume(), 1.0);
            assert_eq!(settings.interval_seconds(), MAX_INTERVAL_SECONDS);
            assert!(settings.is_looping());
            assert!(!settings.is_enabled());
        }

        #[test]
        fn test_simulated_device() {
            let args = parse(&[
                "--baseline-volume",
                "9",
                "--max-level",
                "5",
                "--ringer",
                "vibrate",
                "--filter",
                "silence",
                "--no-policy-access",
            ]);
            let device = args.simulated_device(AudioStream::Alarm);
            assert_eq!(device.current_volume(AudioStream::Alarm), 5);
            assert_eq!(device.max_stream_volume(AudioStream::Alarm).unwrap(), 5);
            assert_eq!(device.current_ringer_mode(), RingerMode::Vibrate);
            assert_eq!(
                device.current_interruption_filter(),
                InterruptionFilter::Silence
            );
            assert!(!device.has_policy_access());
            assert_eq!(device.dnd_api(), DndApi::InterruptionFilter);
        }

        #[test]
        fn test_zen_mode_selects_legacy_api() {
            let args = parse(&["--zen-mode", "total-silence"]);
            let device = args.simulated_device(AudioStream::Alarm);
            assert_eq!(device.dnd_api(), DndApi::ZenModeSetting);
            assert!(device.zen_mode().unwrap().is_total_silence());
        }

        #[test]
        fn test_sound_source() {
            assert!(PlayArgs::default().sound_source().is_builtin());
            let args = parse(&["--sound", "/sounds/wake.wav"]);
            assert_eq!(args.sound_source().name(), "wake");
        }
    }
}
