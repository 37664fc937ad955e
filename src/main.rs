//! Alert Player CLI
//!
//! Plays one alarm-style alert through the alert engine against a simulated
//! device, then reports which device state the engine changed and whether it
//! was put back.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;

use alert_player::cli::{Cli, Commands, Display, PlayArgs};
use alert_player::sound::{alert_tone_duration, rodio_factory, MockSoundPlayer, SoundFactory};
use alert_player::{AlertEngine, EngineConfig, SoundPlayer};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Play(args)) => {
            let config = EngineConfig::load_or_default(cli.config.as_deref())?;
            run_play(args, config).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Plays one alert until it completes, the duration elapses or Ctrl-C.
async fn run_play(args: PlayArgs, config: EngineConfig) -> Result<()> {
    let device = Arc::new(args.simulated_device(config.stream));
    let sound_factory: SoundFactory = if args.simulate_sound {
        let clip = alert_tone_duration();
        Box::new(move || {
            let player: Arc<dyn SoundPlayer> = Arc::new(MockSoundPlayer::with_clip_duration(clip));
            Ok(player)
        })
    } else {
        rodio_factory(args.sound_source())
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let engine = AlertEngine::builder(config.clone(), device.clone(), sound_factory)
        .events(event_tx)
        .build()
        .context("アラートエンジンを初期化できません")?;

    let settings = args.to_settings(config.volume);
    if args.interval_out_of_range() {
        Display::show_clamped_interval(args.interval, settings.interval_seconds());
    }
    Display::show_settings(&settings);

    let generation = engine.start(&settings);

    let deadline = async {
        match args.duration {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                Display::show_event(&event);
                if event.generation() == generation && event.ends_playback() {
                    break;
                }
            }
            _ = &mut deadline => {
                tracing::info!("Alert duration elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    engine.stop();
    while let Ok(event) = event_rx.try_recv() {
        Display::show_event(&event);
    }

    Display::show_device_report(&device, config.stream, engine.baseline());
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["alert-player"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_play() {
        let cli = Cli::parse_from(["alert-player", "play"]);
        assert!(matches!(cli.command, Some(Commands::Play(_))));
    }

    #[test]
    fn test_cli_parse_completions() {
        let cli = Cli::parse_from(["alert-player", "completions", "bash"]);
        assert!(matches!(cli.command, Some(Commands::Completions { .. })));
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_play_simulated_completes() {
        let args = PlayArgs {
            volume: 1.0,
            simulate_sound: true,
            ..PlayArgs::default()
        };
        run_play(args, EngineConfig::default()).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_play_looping_stops_after_duration() {
        let args = PlayArgs {
            volume: 0.9,
            looping: true,
            interval: 1,
            duration: Some(5),
            simulate_sound: true,
            ..PlayArgs::default()
        };
        run_play(args, EngineConfig::default()).await.unwrap();
    }
}
