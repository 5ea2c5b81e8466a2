pub mod capture;
pub mod playback;
pub mod wav;

use crate::error::AudioError;
use crate::input::Activation;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use capture::{AudioCapture, CaptureLimits, CpalRecorder};
pub use playback::RodioPlayer;
pub use wav::PcmAudio;

/// A finished recording written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved sample count.
    pub samples: usize,
}

impl Recording {
    pub fn duration(&self) -> Duration {
        let frames = self.samples as f64 / f64::from(self.channels.max(1));
        Duration::from_secs_f64(frames / f64::from(self.sample_rate.max(1)))
    }
}

/// Records microphone audio while `hold` stays engaged.
#[async_trait::async_trait]
pub trait Recorder: Send {
    async fn record(&mut self, hold: &mut dyn Activation) -> Result<Recording, AudioError>;
}

/// Renders an audio file on the output device, returning once it finished.
#[async_trait::async_trait]
pub trait Player: Send {
    async fn play(&mut self, path: &Path) -> Result<(), AudioError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_duration_mono() {
        let recording = Recording {
            path: PathBuf::from("r.wav"),
            sample_rate: 16000,
            channels: 1,
            samples: 48000,
        };
        assert_eq!(recording.duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_recording_duration_stereo() {
        let recording = Recording {
            path: PathBuf::from("r.wav"),
            sample_rate: 16000,
            channels: 2,
            samples: 16000,
        };
        assert_eq!(recording.duration(), Duration::from_millis(500));
    }
}
