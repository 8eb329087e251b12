use serde::Serialize;

/// Upper bound on the harmonics vector
pub const MAX_HARMONICS: usize = 16;

const BAND_EPSILON: f32 = 1e-10;

// Upper edges (exclusive) in Hz; everything above the last edge is brilliance
const SUB_BASS_END: f32 = 60.0;
const BASS_END: f32 = 250.0;
const LOW_MID_END: f32 = 500.0;
const MID_END: f32 = 2000.0;
const HIGH_MID_END: f32 = 4000.0;
const PRESENCE_END: f32 = 6000.0;

/// Fraction of total spectral energy per band. Sums to 1 for any non-silent spectrum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandEnergies {
    pub sub_bass: f32,   // < 60 Hz
    pub bass: f32,       // 60-250 Hz
    pub low_mid: f32,    // 250-500 Hz
    pub mid: f32,        // 500-2000 Hz
    pub high_mid: f32,   // 2-4 kHz
    pub presence: f32,   // 4-6 kHz
    pub brilliance: f32, // >= 6 kHz
}

impl BandEnergies {
    pub fn treble(&self) -> f32 {
        self.high_mid + self.presence + self.brilliance
    }

    pub fn total(&self) -> f32 {
        self.sub_bass + self.bass + self.low_mid + self.mid + self.treble()
    }
}

/// Descriptors derived from one sample block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeatures {
    /// Dominant frequency in Hz
    pub frequency: f32,
    /// Perceptually boosted RMS, 0.0-1.0
    pub amplitude: f32,
    /// Magnitudes at integer multiples of `frequency`
    pub harmonics: Vec<f32>,
    pub spectral_centroid: f32,
    pub spectral_spread: f32,
    pub zero_crossing_rate: f32,
    pub bands: BandEnergies,
    /// Mean of `harmonics`
    pub resonance: f32,
}

/// Stateless extractor; every method degrades to zero on silent or empty input.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, spectrum: &[f32], samples: &[f32], bin_width: f32) -> AudioFeatures {
        let frequency = self.dominant_frequency(spectrum, bin_width);
        let harmonics = self.harmonics(spectrum, frequency, bin_width);
        let (spectral_centroid, spectral_spread) = self.centroid_and_spread(spectrum, bin_width);
        let resonance = if harmonics.is_empty() {
            0.0
        } else {
            harmonics.iter().sum::<f32>() / harmonics.len() as f32
        };

        AudioFeatures {
            frequency,
            amplitude: self.amplitude(samples),
            harmonics,
            spectral_centroid,
            spectral_spread,
            zero_crossing_rate: self.zero_crossing_rate(samples),
            bands: self.band_energies(spectrum, bin_width),
            resonance,
        }
    }

    /// Loudest bin above DC, converted to Hz. 0 when nothing rises above zero.
    pub fn dominant_frequency(&self, spectrum: &[f32], bin_width: f32) -> f32 {
        let mut peak_bin = 0;
        let mut peak_magnitude = 0.0;

        for (i, &magnitude) in spectrum.iter().enumerate().skip(1) {
            if magnitude > peak_magnitude {
                peak_magnitude = magnitude;
                peak_bin = i;
            }
        }

        peak_bin as f32 * bin_width
    }

    /// RMS boosted with `(rms * 20)^0.7`, clamped to 0.0-1.0
    pub fn amplitude(&self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let sum_squares: f32 = samples
            .iter()
            .filter(|s| s.is_finite())
            .map(|s| s * s)
            .sum();
        let rms = (sum_squares / samples.len() as f32).sqrt();

        (rms * 20.0).powf(0.7).clamp(0.0, 1.0)
    }

    pub fn harmonics(&self, spectrum: &[f32], fundamental: f32, bin_width: f32) -> Vec<f32> {
        if fundamental <= 0.0 || bin_width <= 0.0 {
            return Vec::new();
        }

        let mut harmonics = Vec::with_capacity(MAX_HARMONICS);
        for h in 1..=MAX_HARMONICS {
            let bin = (h as f32 * fundamental / bin_width).round() as usize;
            match spectrum.get(bin) {
                Some(&magnitude) => harmonics.push(magnitude),
                None => break,
            }
        }
        harmonics
    }

    /// Magnitude-weighted mean frequency and its standard deviation
    pub fn centroid_and_spread(&self, spectrum: &[f32], bin_width: f32) -> (f32, f32) {
        let total_magnitude: f32 = spectrum.iter().sum();
        if total_magnitude <= 0.0 {
            return (0.0, 0.0);
        }

        let centroid = spectrum
            .iter()
            .enumerate()
            .map(|(i, &magnitude)| i as f32 * bin_width * magnitude)
            .sum::<f32>()
            / total_magnitude;

        let variance = spectrum
            .iter()
            .enumerate()
            .map(|(i, &magnitude)| {
                let deviation = i as f32 * bin_width - centroid;
                deviation * deviation * magnitude
            })
            .sum::<f32>()
            / total_magnitude;

        (centroid, variance.max(0.0).sqrt())
    }

    pub fn zero_crossing_rate(&self, samples: &[f32]) -> f32 {
        if samples.len() < 2 {
            return 0.0;
        }

        // Non-finite samples count as 0
        let negative = |s: f32| s.is_finite() && s < 0.0;
        let crossings = samples
            .windows(2)
            .filter(|pair| negative(pair[0]) != negative(pair[1]))
            .count();

        crossings as f32 / (samples.len() - 1) as f32
    }

    pub fn band_energies(&self, spectrum: &[f32], bin_width: f32) -> BandEnergies {
        let mut raw = BandEnergies::default();

        for (i, &magnitude) in spectrum.iter().enumerate() {
            let frequency = i as f32 * bin_width;
            let energy = magnitude * magnitude;

            let band = if frequency < SUB_BASS_END {
                &mut raw.sub_bass
            } else if frequency < BASS_END {
                &mut raw.bass
            } else if frequency < LOW_MID_END {
                &mut raw.low_mid
            } else if frequency < MID_END {
                &mut raw.mid
            } else if frequency < HIGH_MID_END {
                &mut raw.high_mid
            } else if frequency < PRESENCE_END {
                &mut raw.presence
            } else {
                &mut raw.brilliance
            };
            *band += energy;
        }

        let total = raw.total() + BAND_EPSILON;
        BandEnergies {
            sub_bass: raw.sub_bass / total,
            bass: raw.bass / total,
            low_mid: raw.low_mid / total,
            mid: raw.mid / total,
            high_mid: raw.high_mid / total,
            presence: raw.presence / total,
            brilliance: raw.brilliance / total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SpectralAnalyzer;

    const SAMPLE_RATE: u32 = 44100;

    fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    fn analyze(samples: &[f32]) -> AudioFeatures {
        let analyzer = SpectralAnalyzer::new(2048);
        let spectrum = analyzer.magnitude_spectrum(samples);
        FeatureExtractor::new().extract(&spectrum, samples, analyzer.bin_width(SAMPLE_RATE))
    }

    #[test]
    fn test_silence_yields_zeroed_features() {
        let features = analyze(&vec![0.0; 2048]);
        assert_eq!(features.amplitude, 0.0);
        assert_eq!(features.frequency, 0.0);
        assert_eq!(features.spectral_centroid, 0.0);
        assert_eq!(features.spectral_spread, 0.0);
        assert_eq!(features.zero_crossing_rate, 0.0);
        assert!(features.harmonics.is_empty());
        assert_eq!(features.bands, BandEnergies::default());
        assert_eq!(features.bands.total(), 0.0);
    }

    #[test]
    fn test_empty_block_yields_zeroed_features() {
        let features = analyze(&[]);
        assert_eq!(features, AudioFeatures::default());
    }

    #[test]
    fn test_sine_440_pitch_and_centroid() {
        let features = analyze(&sine(440.0, 0.5, 2048));
        let bin_width = SAMPLE_RATE as f32 / 2048.0;
        assert!((features.frequency - 440.0).abs() <= bin_width, "frequency {}", features.frequency);
        assert!((features.spectral_centroid - 440.0).abs() < 60.0, "centroid {}", features.spectral_centroid);
    }

    #[test]
    fn test_amplitude_always_in_unit_range() {
        let extractor = FeatureExtractor::new();
        for amplitude in [0.0, 0.001, 0.01, 0.1, 0.5, 1.0, 4.0] {
            let value = extractor.amplitude(&sine(220.0, amplitude, 1024));
            assert!((0.0..=1.0).contains(&value), "amplitude {} -> {}", amplitude, value);
        }
        let spikes: Vec<f32> = (0..512).map(|i| if i % 2 == 0 { 100.0 } else { -100.0 }).collect();
        assert_eq!(extractor.amplitude(&spikes), 1.0);
    }

    #[test]
    fn test_amplitude_boost_curve() {
        let extractor = FeatureExtractor::new();
        // Constant 0.01 -> rms 0.01 -> (0.2)^0.7
        let value = extractor.amplitude(&vec![0.01; 256]);
        assert!((value - 0.2f32.powf(0.7)).abs() < 1e-4);
    }

    #[test]
    fn test_band_energies_sum_to_one() {
        let mixed: Vec<f32> = sine(100.0, 0.3, 2048)
            .iter()
            .zip(sine(3000.0, 0.2, 2048))
            .map(|(a, b)| a + b)
            .collect();
        let features = analyze(&mixed);
        assert!((features.bands.total() - 1.0).abs() < 1e-4);
        assert!(features.bands.bass > 0.1);
        assert!(features.bands.high_mid > 0.05);
    }

    #[test]
    fn test_band_boundaries() {
        let extractor = FeatureExtractor::new();
        // One bin per 10 Hz, energy only at 250 Hz which belongs to low-mid
        let mut spectrum = vec![0.0; 1000];
        spectrum[25] = 2.0;
        let bands = extractor.band_energies(&spectrum, 10.0);
        assert!((bands.low_mid - 1.0).abs() < 1e-6);
        assert_eq!(bands.bass, 0.0);

        let mut spectrum = vec![0.0; 1000];
        spectrum[600] = 1.0;
        let bands = extractor.band_energies(&spectrum, 10.0);
        assert!((bands.brilliance - 1.0).abs() < 1e-6);
        assert!((bands.treble() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_harmonics_stop_at_spectrum_edge() {
        let extractor = FeatureExtractor::new();
        let spectrum: Vec<f32> = (0..100).map(|i| i as f32).collect();
        // Fundamental at bin 30: bins 30, 60, 90 fit, 120 does not
        let harmonics = extractor.harmonics(&spectrum, 300.0, 10.0);
        assert_eq!(harmonics, vec![30.0, 60.0, 90.0]);

        let low = extractor.harmonics(&spectrum, 10.0, 10.0);
        assert_eq!(low.len(), MAX_HARMONICS);
    }

    #[test]
    fn test_centroid_and_spread_of_two_bins() {
        let extractor = FeatureExtractor::new();
        let mut spectrum = vec![0.0; 10];
        spectrum[2] = 1.0;
        spectrum[4] = 1.0;
        let (centroid, spread) = extractor.centroid_and_spread(&spectrum, 100.0);
        assert!((centroid - 300.0).abs() < 1e-3);
        assert!((spread - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_crossing_rate() {
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.zero_crossing_rate(&[1.0, -1.0, 1.0, -1.0, 1.0]), 1.0);
        assert_eq!(extractor.zero_crossing_rate(&[1.0, 1.0, -1.0, -1.0, -1.0]), 0.25);
        assert_eq!(extractor.zero_crossing_rate(&[0.5]), 0.0);
    }

    #[test]
    fn test_zero_crossing_rate_ignores_non_finite_samples() {
        let extractor = FeatureExtractor::new();
        let corrupt = [1.0, f32::NEG_INFINITY, 1.0, f32::NAN, 1.0, f32::INFINITY];
        assert_eq!(extractor.zero_crossing_rate(&corrupt), 0.0);

        // -inf reads as 0, so only the real sign changes count
        let mixed = [-1.0, f32::NEG_INFINITY, -1.0];
        assert_eq!(extractor.zero_crossing_rate(&mixed), 1.0);
    }
}
