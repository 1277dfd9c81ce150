/// WAV input for offline keyword spotting

use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum WavError {
    #[error("Failed to read WAV file: {0}")]
    Read(#[from] hound::Error),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),
}

/// Mono 16-bit PCM loaded from a WAV file
#[derive(Debug, Clone)]
pub struct WavAudio {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl WavAudio {
    /// Samples as little-endian bytes, the layout `KeywordStream` expects
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Read a mono, 16-bit integer WAV file
pub fn read_pcm(path: impl AsRef<Path>) -> Result<WavAudio, WavError> {
    let reader = hound::WavReader::open(path.as_ref())?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(WavError::UnsupportedFormat(format!(
            "expected mono audio, got {} channels",
            spec.channels
        )));
    }

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(WavError::UnsupportedFormat(format!(
            "expected 16-bit integer samples, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Loaded {} samples at {} Hz from {}",
        samples.len(),
        spec.sample_rate,
        path.as_ref().display()
    );

    Ok(WavAudio {
        sample_rate: spec.sample_rate,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn write_wav(path: &Path, channels: u16, bits: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            if bits == 16 {
                writer.write_sample(s).unwrap();
            } else {
                writer.write_sample(s as i32).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_mono_16bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("speech.wav");
        let samples: Vec<i16> = (0..16000).map(|i| (i % 200) as i16 - 100).collect();
        write_wav(&path, 1, 16, &samples);

        let audio = read_pcm(&path).unwrap();
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.samples, samples);
        assert_relative_eq!(audio.duration_secs(), 1.0);
    }

    #[test]
    fn test_le_bytes_layout() {
        let audio = WavAudio {
            sample_rate: 16000,
            samples: vec![0x0102, -2],
        };
        assert_eq!(audio.to_le_bytes(), vec![0x02, 0x01, 0xfe, 0xff]);
    }

    #[test]
    fn test_stereo_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 16, &[0; 64]);

        assert!(matches!(read_pcm(&path), Err(WavError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_24bit_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deep.wav");
        write_wav(&path, 1, 24, &[0; 64]);

        assert!(matches!(read_pcm(&path), Err(WavError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_pcm("/nonexistent/input.wav"),
            Err(WavError::Read(_))
        ));
    }
}
