use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Windowed FFT front end producing a magnitude spectrum per sample block.
///
/// The plan and Hann window are computed once for the configured size and reused
/// for every block, whatever its length.
pub struct SpectralAnalyzer {
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl SpectralAnalyzer {
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window = Self::hann_window(fft_size);

        Self {
            fft_size,
            fft,
            window,
        }
    }

    fn hann_window(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect()
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Frequency resolution of one output bin
    pub fn bin_width(&self, sample_rate: u32) -> f32 {
        sample_rate as f32 / self.fft_size as f32
    }

    /// Magnitudes of the first `fft_size / 2` bins.
    ///
    /// Blocks shorter than the FFT are zero-padded, longer ones are truncated.
    /// Non-finite samples count as silence.
    pub fn magnitude_spectrum(&self, samples: &[f32]) -> Vec<f32> {
        let mut buffer = self.apply_window(samples);
        self.fft.process(&mut buffer);

        buffer[..self.fft_size / 2]
            .iter()
            .map(|c| (c.re * c.re + c.im * c.im).sqrt())
            .collect()
    }

    fn apply_window(&self, samples: &[f32]) -> Vec<Complex<f32>> {
        let mut buffer = vec![Complex::new(0.0, 0.0); self.fft_size];
        for (slot, (&sample, &w)) in buffer.iter_mut().zip(samples.iter().zip(self.window.iter())) {
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = Complex::new(sample * w, 0.0);
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_spectrum_length_is_half_fft() {
        let analyzer = SpectralAnalyzer::new(2048);
        let spectrum = analyzer.magnitude_spectrum(&sine(440.0, 44100, 2048));
        assert_eq!(spectrum.len(), 1024);
    }

    #[test]
    fn test_empty_block_is_silence() {
        let analyzer = SpectralAnalyzer::new(512);
        let spectrum = analyzer.magnitude_spectrum(&[]);
        assert_eq!(spectrum.len(), 256);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_short_block_is_zero_padded() {
        let analyzer = SpectralAnalyzer::new(2048);
        let spectrum = analyzer.magnitude_spectrum(&sine(1000.0, 44100, 300));
        assert_eq!(spectrum.len(), 1024);
        assert!(spectrum.iter().any(|&m| m > 0.0));
    }

    #[test]
    fn test_non_finite_samples_are_ignored() {
        let analyzer = SpectralAnalyzer::new(64);
        let samples = vec![f32::NAN, f32::INFINITY, 0.0, f32::NEG_INFINITY];
        let spectrum = analyzer.magnitude_spectrum(&samples);
        assert!(spectrum.iter().all(|m| m.is_finite() && *m == 0.0));
    }

    #[test]
    fn test_peak_bin_matches_tone() {
        let analyzer = SpectralAnalyzer::new(2048);
        let spectrum = analyzer.magnitude_spectrum(&sine(440.0, 44100, 2048));
        let peak = spectrum
            .iter()
            .enumerate()
            .skip(1)
            .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
        let freq = peak.0 as f32 * analyzer.bin_width(44100);
        assert!((freq - 440.0).abs() <= analyzer.bin_width(44100));
    }

    #[test]
    fn test_hann_window_shape() {
        let window = SpectralAnalyzer::hann_window(8);
        assert_eq!(window[0], 0.0);
        assert!((window[4] - 1.0).abs() < 1e-6);
        assert!((window[2] - 0.5).abs() < 1e-6);
    }
}
