//! Decoding `.wav` recordings into mono frames for offline analysis.

use std::path::Path;

use hound::{SampleFormat, WavReader};

/// A decoded recording, downmixed to one channel and scaled to `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct MonoSignal {
    pub sample_rate: usize,
    pub samples: Vec<f32>,
}

impl MonoSignal {
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

pub fn read_mono(path: &Path) -> Result<MonoSignal, hound::Error> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    log::debug!(
        "Read {} ({} Hz, {} channel(s), {}-bit {:?})",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );
    Ok(MonoSignal {
        sample_rate: spec.sample_rate as usize,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    #[test]
    fn stereo_int_file_is_downmixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for (left, right) in [(16384i16, 0i16), (-16384, -16384), (0, 32767)] {
            writer.write_sample(left).unwrap();
            writer.write_sample(right).unwrap();
        }
        writer.finalize().unwrap();

        let signal = read_mono(&path).unwrap();
        assert_eq!(signal.sample_rate, 8000);
        assert_eq!(signal.samples.len(), 3);
        assert!((signal.samples[0] - 0.25).abs() < 1e-4);
        assert!((signal.samples[1] + 0.5).abs() < 1e-4);
        assert!((signal.samples[2] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_mono(Path::new("/nonexistent/recording.wav")).is_err());
    }
}
