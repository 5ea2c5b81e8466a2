use crate::error::AudioError;
use std::path::Path;

/// 16-bit little-endian PCM samples without a container header.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmAudio {
    pub fn from_samples(samples: &[i16], sample_rate: u32, channels: u16) -> Self {
        let bytes = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self {
            bytes,
            sample_rate,
            channels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn write_pcm16(
    path: &Path,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::debug!("Wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

/// Reads a 16-bit integer WAV file back into raw PCM.
pub fn read_pcm16(path: &Path) -> Result<PcmAudio, AudioError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(AudioError::WavFormat(format!(
            "expected 16-bit integer PCM, found {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()?;

    Ok(PcmAudio::from_samples(
        &samples,
        spec.sample_rate,
        spec.channels,
    ))
}
