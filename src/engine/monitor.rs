//! Playback monitor.
//!
//! One monitor task runs per audible generation. It polls the sound player
//! until the clip ends, then either completes the alert or waits out the loop
//! interval and replays. Every wait also listens on the engine's wake channel,
//! so a monitor whose generation was stopped or superseded exits as soon as
//! that happens instead of sleeping out its interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use super::{AlertEvent, ReplayOutcome, Shared};
use crate::sound::SoundPlayer;
use crate::types::AlertSettings;

pub(super) struct PlaybackMonitor {
    shared: Arc<Shared>,
    generation: u64,
    settings: Arc<AlertSettings>,
    sound: Arc<dyn SoundPlayer>,
    wake_rx: watch::Receiver<u64>,
}

impl PlaybackMonitor {
    pub(super) fn new(
        shared: Arc<Shared>,
        generation: u64,
        settings: Arc<AlertSettings>,
        sound: Arc<dyn SoundPlayer>,
    ) -> Self {
        let wake_rx = shared.subscribe_wake();
        Self {
            shared,
            generation,
            settings,
            sound,
            wake_rx,
        }
    }

    pub(super) async fn run(mut self) {
        let poll_interval = self.shared.poll_interval();
        let mut iteration: u32 = 1;

        loop {
            while self.sound.is_playing() {
                if !self.pause(poll_interval).await {
                    debug!(generation = self.generation, "Monitor exiting while playing");
                    return;
                }
            }

            if !self.is_active() {
                debug!(generation = self.generation, "Monitor exiting after playback");
                return;
            }

            if !self.settings.is_looping() {
                self.shared.complete(self.generation);
                return;
            }

            if !self.pause(self.settings.interval()).await {
                debug!(generation = self.generation, "Monitor exiting during loop interval");
                return;
            }

            match self.shared.replay(self.generation, self.sound.as_ref()) {
                ReplayOutcome::Played => {
                    iteration = iteration.saturating_add(1);
                    self.shared.emit(AlertEvent::Replayed {
                        generation: self.generation,
                        iteration,
                    });
                }
                // Retry no faster than the poll interval.
                ReplayOutcome::Failed => {
                    if !self.pause(poll_interval).await {
                        debug!(generation = self.generation, "Monitor exiting after failed replay");
                        return;
                    }
                }
                ReplayOutcome::Inactive => return,
            }
        }
    }

    /// Sleeps for `duration` or until the engine changes state.
    ///
    /// Returns true if this generation is still current and not stopped.
    async fn pause(&mut self, duration: Duration) -> bool {
        self.wake_rx.borrow_and_update();
        if !self.is_active() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.wake_rx.changed() => {}
        }

        self.is_active()
    }

    fn is_active(&self) -> bool {
        self.shared.is_active(self.generation)
    }
}
