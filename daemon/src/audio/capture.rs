use crate::audio::{wav, Recorder, Recording};
use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::input::Activation;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Opens the microphone on demand. The cpal stream lives on its own thread
/// because `cpal::Stream` is not `Send`.
#[derive(Debug, Clone)]
pub struct AudioCapture {
    device_index: Option<usize>,
    sample_rate: u32,
    channels: u16,
}

/// A running input stream. Dropping it releases the device.
pub struct CaptureStream {
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AudioCapture {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            device_index: config.device_index,
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }

    /// Starts streaming interleaved 16-bit chunks into the returned receiver.
    pub async fn start(
        &self,
    ) -> Result<(CaptureStream, mpsc::UnboundedReceiver<Vec<i16>>), AudioError> {
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let settings = self.clone();

        let thread = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || {
                let stream = match settings.open_stream(audio_tx) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // Returns on an explicit stop and when the handle is dropped.
                let _ = stop_rx.recv();
                drop(stream);
                tracing::debug!("Audio input stream released");
            })?;

        let stream = CaptureStream {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        };

        match ready_rx.await {
            Ok(Ok(())) => {
                tracing::info!("Audio capture started");
                Ok((stream, audio_rx))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AudioError::Stream(
                "capture thread exited during start-up".to_string(),
            )),
        }
    }

    fn select_device(&self, host: &cpal::Host) -> Result<Device, AudioError> {
        match self.device_index {
            Some(index) => host
                .input_devices()
                .map_err(|e| AudioError::Connection(e.to_string()))?
                .nth(index)
                .ok_or(AudioError::DeviceIndex(index)),
            None => host
                .default_input_device()
                .ok_or(AudioError::NoInputDevice),
        }
    }

    fn open_stream(&self, audio_tx: mpsc::UnboundedSender<Vec<i16>>) -> Result<Stream, AudioError> {
        let host = cpal::default_host();
        let device = self.select_device(&host)?;
        tracing::info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        tracing::info!(
            "Configuring audio stream: {}Hz, {} channel(s)",
            self.sample_rate,
            self.channels
        );

        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| AudioError::Connection(e.to_string()))?;

        let mut selected = None;
        for supported in supported_configs {
            tracing::debug!("Supported config: {:?}", supported);
            if supported.channels() == self.channels
                && supported.min_sample_rate().0 <= self.sample_rate
                && supported.max_sample_rate().0 >= self.sample_rate
            {
                selected = Some(supported.with_sample_rate(cpal::SampleRate(self.sample_rate)));
                break;
            }
        }

        let selected = selected.ok_or(AudioError::UnsupportedConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
        })?;
        let sample_format = selected.sample_format();
        let config: StreamConfig = selected.into();

        let error_callback = |err| {
            tracing::error!("Audio stream error: {}", err);
        };

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &_| {
                    let _ = audio_tx.send(data.to_vec());
                },
                error_callback,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &_| {
                    let _ = audio_tx.send(data.iter().map(|&s| f32_to_i16(s)).collect());
                },
                error_callback,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _: &_| {
                    let _ = audio_tx.send(data.iter().map(|&s| u16_to_i16(s)).collect());
                },
                error_callback,
                None,
            ),
            format => {
                return Err(AudioError::Stream(format!(
                    "Unsupported sample format: {:?}",
                    format
                )));
            }
        }
        .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        Ok(stream)
    }
}

impl CaptureStream {
    /// Stops the stream and waits until the device has been released.
    pub fn stop(mut self) {
        self.request_stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Audio capture thread panicked");
            }
        }
        tracing::info!("Audio capture stopped");
    }

    fn request_stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.request_stop();
    }
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn u16_to_i16(sample: u16) -> i16 {
    (i32::from(sample) - 32768) as i16
}

/// When to look at the hold predicate and when to give up, in interleaved
/// samples of captured audio.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureLimits {
    pub check_every: usize,
    pub max_samples: usize,
    pub stall_timeout: Duration,
}

impl CaptureLimits {
    pub fn new(
        sample_rate: u32,
        channels: u16,
        check_interval: Duration,
        max_duration: Duration,
        stall_timeout: Duration,
    ) -> Self {
        let per_second = f64::from(sample_rate) * f64::from(channels);
        Self {
            check_every: ((per_second * check_interval.as_secs_f64()) as usize).max(1),
            max_samples: ((per_second * max_duration.as_secs_f64()) as usize).max(1),
            stall_timeout,
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(
            config.sample_rate,
            config.channels,
            config.check_interval(),
            config.max_record_duration(),
            config.stall_timeout(),
        )
    }
}

/// Accumulates chunks until the hold predicate reports release, the hard
/// cap is reached or the stream ends.
///
/// `hold` is consulted each time another `check_every` samples have been
/// captured, so a release is noticed within one check interval of audio.
pub async fn collect_while_held(
    audio_rx: &mut mpsc::UnboundedReceiver<Vec<i16>>,
    hold: &mut dyn Activation,
    limits: &CaptureLimits,
) -> Result<Vec<i16>, AudioError> {
    let mut samples: Vec<i16> = Vec::new();
    let mut next_check = limits.check_every;

    loop {
        let chunk = match tokio::time::timeout(limits.stall_timeout, audio_rx.recv()).await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                tracing::debug!("Audio stream closed after {} samples", samples.len());
                break;
            }
            Err(_) => {
                return Err(AudioError::Stalled(limits.stall_timeout.as_millis() as u64));
            }
        };

        samples.extend_from_slice(&chunk);

        if samples.len() >= limits.max_samples {
            samples.truncate(limits.max_samples);
            tracing::info!("Recording reached the maximum duration");
            break;
        }

        if samples.len() >= next_check {
            while next_check <= samples.len() {
                next_check += limits.check_every;
            }
            if !hold.is_engaged() {
                tracing::info!("Recording stopped (button released)");
                break;
            }
        }
    }

    Ok(samples)
}

/// Microphone recorder writing each take to a single WAV file that is
/// overwritten on every cycle.
pub struct CpalRecorder {
    capture: AudioCapture,
    limits: CaptureLimits,
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
}

impl CpalRecorder {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            capture: AudioCapture::new(config),
            limits: CaptureLimits::from_config(config),
            path: config.recording_path(),
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }
}

#[async_trait::async_trait]
impl Recorder for CpalRecorder {
    async fn record(&mut self, hold: &mut dyn Activation) -> Result<Recording, AudioError> {
        let (stream, mut audio_rx) = self.capture.start().await?;
        let collected = collect_while_held(&mut audio_rx, hold, &self.limits).await;
        stream.stop();

        let samples = collected?;
        if samples.is_empty() {
            return Err(AudioError::EmptyRecording);
        }

        wav::write_pcm16(&self.path, &samples, self.sample_rate, self.channels)?;

        let recording = Recording {
            path: self.path.clone(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: samples.len(),
        };
        tracing::info!(
            "Recording finished: {:.2}s written to {}",
            recording.duration().as_secs_f32(),
            recording.path.display()
        );
        Ok(recording)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: usize = 1024;

    fn limits() -> CaptureLimits {
        CaptureLimits::new(
            16000,
            1,
            Duration::from_millis(500),
            Duration::from_secs(20),
            Duration::from_secs(1),
        )
    }

    /// Hold predicate engaged for the first `engaged_checks` calls.
    struct CountedHold {
        engaged_checks: usize,
        calls: usize,
    }

    impl Activation for CountedHold {
        fn is_engaged(&mut self) -> bool {
            self.calls += 1;
            self.calls <= self.engaged_checks
        }
    }

    fn feed(chunks: usize) -> mpsc::UnboundedReceiver<Vec<i16>> {
        let (tx, rx) = mpsc::unbounded_channel();
        for _ in 0..chunks {
            tx.send(vec![1i16; CHUNK]).unwrap();
        }
        rx
    }

    #[test]
    fn test_limits_from_defaults() {
        let limits = limits();
        assert_eq!(limits.check_every, 8000);
        assert_eq!(limits.max_samples, 320000);
    }

    #[test]
    fn test_limits_scale_with_channels() {
        let limits = CaptureLimits::new(
            16000,
            2,
            Duration::from_millis(500),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert_eq!(limits.check_every, 16000);
        assert_eq!(limits.max_samples, 32000);
    }

    #[test]
    fn test_sample_conversion() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), -i16::MAX);
        assert_eq!(u16_to_i16(32768), 0);
        assert_eq!(u16_to_i16(0), i16::MIN);
        assert_eq!(u16_to_i16(u16::MAX), i16::MAX);
    }

    #[tokio::test]
    async fn test_release_stops_within_one_check_interval() {
        let limits = limits();
        // 3 seconds of audio held, released at the seventh check.
        let mut hold = CountedHold {
            engaged_checks: 6,
            calls: 0,
        };
        let mut rx = feed(200);

        let samples = collect_while_held(&mut rx, &mut hold, &limits)
            .await
            .unwrap();

        assert_eq!(hold.calls, 7);
        let held = 6 * limits.check_every;
        assert!(samples.len() >= held + limits.check_every);
        assert!(samples.len() < held + limits.check_every + CHUNK);
    }

    #[tokio::test]
    async fn test_immediate_release_records_one_interval() {
        let limits = limits();
        let mut hold = CountedHold {
            engaged_checks: 0,
            calls: 0,
        };
        let mut rx = feed(50);

        let samples = collect_while_held(&mut rx, &mut hold, &limits)
            .await
            .unwrap();

        assert_eq!(hold.calls, 1);
        assert!(samples.len() >= limits.check_every);
        assert!(samples.len() < limits.check_every + CHUNK);
    }

    #[tokio::test]
    async fn test_held_button_stops_at_hard_cap() {
        let limits = CaptureLimits::new(
            16000,
            1,
            Duration::from_millis(500),
            Duration::from_secs(2),
            Duration::from_secs(1),
        );
        let mut hold = CountedHold {
            engaged_checks: usize::MAX,
            calls: 0,
        };
        let mut rx = feed(100);

        let samples = collect_while_held(&mut rx, &mut hold, &limits)
            .await
            .unwrap();

        assert_eq!(samples.len(), 32000);
        assert!(rx.try_recv().is_ok(), "collection must stop before draining the stream");
    }

    #[tokio::test]
    async fn test_closed_stream_returns_what_was_captured() {
        let limits = limits();
        let mut hold = CountedHold {
            engaged_checks: usize::MAX,
            calls: 0,
        };
        let mut rx = feed(3);

        let samples = collect_while_held(&mut rx, &mut hold, &limits)
            .await
            .unwrap();

        assert_eq!(samples.len(), 3 * CHUNK);
        assert_eq!(hold.calls, 0);
    }

    #[tokio::test]
    async fn test_stalled_stream_is_an_error() {
        let limits = CaptureLimits::new(
            16000,
            1,
            Duration::from_millis(500),
            Duration::from_secs(20),
            Duration::from_millis(50),
        );
        let mut hold = CountedHold {
            engaged_checks: usize::MAX,
            calls: 0,
        };
        let (_tx, mut rx) = mpsc::unbounded_channel::<Vec<i16>>();

        let result = collect_while_held(&mut rx, &mut hold, &limits).await;
        assert!(matches!(result, Err(AudioError::Stalled(50))));
    }
}
