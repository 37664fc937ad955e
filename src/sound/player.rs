//! Sound player implementation using rodio.
//!
//! rodio's `OutputStream` is not `Send`, so it lives on a dedicated audio
//! thread for as long as the player exists. The player itself only keeps the
//! stream handle and the current sink, which makes it shareable with the
//! engine's monitor tasks.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{bounded, Sender};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::SoundSource;
use super::tone::append_alert_tone;
use super::{AudioAttributes, SoundPlayer};

/// A [`SoundPlayer`] backed by rodio.
pub struct RodioSoundPlayer {
    source: SoundSource,
    stream_handle: OutputStreamHandle,
    sink: Mutex<Option<Sink>>,
    /// Dropping this ends the audio thread and closes the output stream.
    _shutdown: Sender<()>,
}

impl RodioSoundPlayer {
    /// Opens the default output device and prepares `source` for playback.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device is
    /// available and `SoundError::StreamError` if the audio thread cannot be
    /// started.
    pub fn new(source: SoundSource) -> Result<Self, SoundError> {
        let (handle_tx, handle_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        std::thread::Builder::new()
            .name("alert-audio".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    if handle_tx.send(Ok(handle)).is_err() {
                        return;
                    }
                    // Returns once the player drops its sender.
                    let _ = shutdown_rx.recv();
                    drop(stream);
                    debug!("Audio output stream closed");
                }
                Err(e) => {
                    let _ = handle_tx.send(Err(SoundError::DeviceNotAvailable(e.to_string())));
                }
            })
            .map_err(|e| SoundError::StreamError(e.to_string()))?;

        let stream_handle = handle_rx
            .recv()
            .map_err(|e| SoundError::StreamError(e.to_string()))??;

        debug!(source = source.name(), "Audio output stream initialized");

        Ok(Self {
            source,
            stream_handle,
            sink: Mutex::new(None),
            _shutdown: shutdown_tx,
        })
    }

    /// The source this player plays.
    #[must_use]
    pub fn source(&self) -> &SoundSource {
        &self.source
    }

    fn sink(&self) -> MutexGuard<'_, Option<Sink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_sink(&self) -> Result<Sink, SoundError> {
        Sink::try_new(&self.stream_handle).map_err(|e| SoundError::StreamError(e.to_string()))
    }

    fn append_file(sink: &Sink, path: &Path) -> Result<(), SoundError> {
        let file = File::open(path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| SoundError::DecodeError(e.to_string()))?;
        sink.append(decoder);
        Ok(())
    }
}

impl SoundPlayer for RodioSoundPlayer {
    /// Starts one iteration of the source, replacing whatever was playing.
    ///
    /// A file that cannot be opened or decoded falls back to the built-in
    /// alert tone.
    fn play(&self) -> Result<(), SoundError> {
        let mut current = self.sink();
        if let Some(previous) = current.take() {
            previous.stop();
        }

        let sink = self.new_sink()?;
        match &self.source {
            SoundSource::File { name, path } => {
                if let Err(e) = Self::append_file(&sink, path) {
                    if !e.should_fallback_to_builtin() {
                        return Err(e);
                    }
                    warn!(sound = %name, error = %e, "Failed to play sound file, falling back to built-in tone");
                    append_alert_tone(&sink);
                }
            }
            SoundSource::BuiltIn { .. } => append_alert_tone(&sink),
        }

        debug!(sound = self.source.name(), "Sound playback started");
        *current = Some(sink);
        Ok(())
    }

    fn stop(&self) {
        if let Some(sink) = self.sink().take() {
            sink.stop();
            debug!("Sound playback stopped");
        }
    }

    fn is_playing(&self) -> bool {
        self.sink().as_ref().is_some_and(|sink| !sink.empty())
    }

    /// rodio always plays on the default output device, so the hints are
    /// only logged.
    fn set_audio_attributes(&self, attributes: AudioAttributes) {
        debug!(?attributes, "Audio attributes ignored by rodio output");
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer")
            .field("source", &self.source)
            .field("playing", &self.is_playing())
            .finish_non_exhaustive()
    }
}
