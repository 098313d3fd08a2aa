use std::fs::File;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use tonelink_core::{AudioSink, AudioSource, ModemError, SAMPLE_RATE};

#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("WAV error: {0}")]
    Format(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported WAV layout: {0}")]
    Unsupported(String),
}

/// Read a captured signal from a WAV file as normalized f32 samples.
///
/// Accepts 16-bit integer and 32-bit float mono files; 16-bit samples are
/// normalized by 32768.
pub fn read_samples(path: &Path) -> Result<Vec<f32>, WavError> {
    let file = File::open(path)?;
    let mut reader = hound::WavReader::new(file)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(WavError::Unsupported(format!(
            "{} channels, expected mono",
            spec.channels
        )));
    }

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => {
            let ints: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
            ints?.into_iter().map(|s| s as f32 / 32768.0).collect()
        }
        (SampleFormat::Float, 32) => {
            let floats: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
            floats?
        }
        (format, bits) => {
            return Err(WavError::Unsupported(format!("{bits}-bit {format:?}")));
        }
    };

    Ok(samples)
}

/// Persist a signal as 16-bit PCM mono at the modem sample rate.
pub fn write_samples(path: &Path, samples: &[f32]) -> Result<(), WavError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let file = File::create(path)?;
    let mut writer = WavWriter::new(file, spec)?;
    for &sample in samples {
        let clamped = sample.max(-1.0).min(1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Transmit sink that persists the signal instead of playing it: the
/// file-simulation transmit path of the half-duplex session.
pub struct WavFileSink {
    path: PathBuf,
}

impl WavFileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl AudioSink for WavFileSink {
    fn play(&mut self, samples: &[f32]) -> tonelink_core::Result<()> {
        write_samples(&self.path, samples).map_err(|err| ModemError::AudioSource(err.to_string()))
    }
}

/// Receive source that replays a captured WAV file in live-sized chunks.
///
/// Reads past the end of the capture fail like a closed device stream,
/// which aborts a session whose packet never completed.
pub struct WavFileSource {
    samples: Vec<f32>,
    pos: usize,
}

impl WavFileSource {
    pub fn open(path: &Path) -> Result<Self, WavError> {
        Ok(Self {
            samples: read_samples(path)?,
            pos: 0,
        })
    }
}

impl AudioSource for WavFileSource {
    fn read(&mut self, n: usize) -> tonelink_core::Result<(Vec<f32>, bool)> {
        if self.pos >= self.samples.len() {
            return Err(ModemError::AudioSource("end of captured signal".into()));
        }
        let end = (self.pos + n).min(self.samples.len());
        let mut chunk = self.samples[self.pos..end].to_vec();
        self.pos = end;
        // The tail of the capture is padded out to a full read
        chunk.resize(n, 0.0);
        Ok((chunk, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_preserves_the_signal() {
        let path = std::env::temp_dir().join("tonelink_wav_round_trip.wav");

        let original: Vec<f32> = (0..200).map(|i| (i as f32 / 200.0) - 0.5).collect();
        write_samples(&path, &original).expect("write failed");
        let restored = read_samples(&path).expect("read failed");
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.len(), original.len());
        for (a, b) in original.iter().zip(&restored) {
            // 16-bit quantization bounds the round-trip error
            assert!((a - b).abs() < 1.0 / 16384.0, "sample drifted: {a} vs {b}");
        }
    }

    #[test]
    fn missing_file_reports_an_error() {
        let path = Path::new("/nonexistent/tonelink/capture.wav");
        assert!(read_samples(path).is_err());
    }

    #[test]
    fn file_sink_and_source_carry_a_full_session() {
        use tonelink_core::{HalfDuplexController, SessionReport};

        let path = std::env::temp_dir().join("tonelink_file_session.wav");

        let mut sender = HalfDuplexController::new(1);
        let mut sink = WavFileSink::new(path.clone());
        sender.transmit("VIA FILE", 2, &mut sink).expect("transmit failed");

        let mut receiver = HalfDuplexController::new(2);
        let mut source = WavFileSource::open(&path).expect("open failed");
        let report = receiver.receive(&mut source).expect("receive failed");
        std::fs::remove_file(&path).ok();

        match report {
            SessionReport::Received(packet) => {
                assert_eq!(packet.text, "VIA FILE");
                assert!(packet.crc_ok);
            }
            other => panic!("expected Received report, got {other:?}"),
        }
    }
}
