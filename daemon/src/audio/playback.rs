//! Reply playback on the default output device.

use crate::audio::Player;
use crate::error::AudioError;
use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Plays WAV files through rodio, blocking the cycle until the sink drains.
///
/// The output stream is opened per reply and dropped afterwards, so the
/// device is only held while something is playing.
#[derive(Debug, Default, Clone)]
pub struct RodioPlayer;

impl RodioPlayer {
    pub fn new() -> Self {
        Self
    }
}

fn play_blocking(path: &Path) -> Result<(), AudioError> {
    let file = File::open(path)?;
    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| AudioError::Playback(format!("Failed to decode audio: {}", e)))?;

    let (_stream, stream_handle) = OutputStream::try_default().map_err(|e| match e {
        rodio::StreamError::NoDevice => AudioError::NoOutputDevice,
        other => AudioError::Playback(format!("Failed to open audio output: {}", other)),
    })?;
    let sink = Sink::try_new(&stream_handle)
        .map_err(|e| AudioError::Playback(format!("Failed to create audio sink: {}", e)))?;

    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}

#[async_trait::async_trait]
impl Player for RodioPlayer {
    async fn play(&mut self, path: &Path) -> Result<(), AudioError> {
        let path: PathBuf = path.to_path_buf();
        tracing::info!("Playing reply from {}", path.display());

        tokio::task::spawn_blocking(move || play_blocking(&path))
            .await
            .map_err(|e| AudioError::Playback(format!("Playback task failed: {}", e)))??;

        tracing::debug!("Playback finished");
        Ok(())
    }
}
