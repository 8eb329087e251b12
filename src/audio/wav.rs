use hound::{SampleFormat, WavReader};
use log::info;
use std::path::Path;

use crate::error::Result;

/// Decoded mono audio ready for block-wise ingestion
#[derive(Debug, Clone)]
pub struct MonoClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoClip {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Read a WAV file and mix all channels down to mono in -1.0..1.0
pub fn load_wav_mono<P: AsRef<Path>>(path: P) -> Result<MonoClip> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<hound::Result<_>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<hound::Result<_>>()?
        }
    };

    let samples: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    info!(
        "Loaded {}: {} Hz, {} channel(s), {:.2}s",
        path.display(),
        spec.sample_rate,
        channels,
        samples.len() as f32 / spec.sample_rate.max(1) as f32
    );

    Ok(MonoClip {
        samples,
        sample_rate: spec.sample_rate,
    })
}
