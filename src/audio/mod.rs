pub mod features;
pub mod fft;
pub mod wav;

pub use features::{AudioFeatures, BandEnergies, FeatureExtractor, MAX_HARMONICS};
pub use fft::SpectralAnalyzer;
pub use wav::{load_wav_mono, MonoClip};

/// Runs the spectral front end and feature extraction for one block.
pub fn analyze_block(
    analyzer: &SpectralAnalyzer,
    extractor: &FeatureExtractor,
    samples: &[f32],
    sample_rate: u32,
) -> AudioFeatures {
    let spectrum = analyzer.magnitude_spectrum(samples);
    extractor.extract(&spectrum, samples, analyzer.bin_width(sample_rate))
}
