use glam::Vec3;
use std::f32::consts::TAU;

use super::{Rgb, Shape, VisualElement};
use crate::audio::AudioFeatures;
use crate::config::AnalysisConfig;
use crate::sources::AudioSource;

/// Deterministic feature-to-visual mapping. Holds nothing but the frequency range.
#[derive(Debug, Clone)]
pub struct VisualMapper {
    min_frequency: f32,
    max_frequency: f32,
}

impl VisualMapper {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_frequency: config.min_frequency,
            max_frequency: config.max_frequency,
        }
    }

    /// Build the element for `source`. Velocity is left at zero for the compositor.
    pub fn map(&self, features: &AudioFeatures, source: &AudioSource) -> VisualElement {
        let amplitude = features.amplitude.clamp(0.0, 1.0);

        VisualElement {
            source_id: source.id.clone(),
            x: features.resonance.clamp(0.0, 1.0),
            y: self.pitch_height(features.frequency),
            z: self.centroid_depth(features.spectral_centroid),
            color: self.color(source.color, features),
            brightness: (amplitude * 3.0).min(1.0).max(0.2),
            size: (features.harmonics.len() as f32 / 5.0).min(1.0).max(0.3),
            shape: self.shape(features),
            velocity: Vec3::ZERO,
            rotation: features.zero_crossing_rate * TAU,
            anchor: source.position,
            frequency: features.frequency,
            amplitude,
            harmonics: features.harmonics.clone(),
            spectral_centroid: features.spectral_centroid,
            spectral_spread: features.spectral_spread,
            zcr: features.zero_crossing_rate,
        }
    }

    /// Log-frequency height, monotonic within the configured range
    pub fn pitch_height(&self, frequency: f32) -> f32 {
        let log_min = self.min_frequency.ln();
        let log_max = self.max_frequency.ln();
        let height = ((frequency.max(0.0) + 1.0).ln() - log_min) / (log_max - log_min);
        clamp_unit(height)
    }

    pub fn centroid_depth(&self, centroid: f32) -> f32 {
        let depth = (centroid - self.min_frequency) / (self.max_frequency - self.min_frequency);
        clamp_unit(depth)
    }

    /// Base color tinted by bass (red), mid (green) and treble (blue) energy
    pub fn color(&self, base: Rgb, features: &AudioFeatures) -> Rgb {
        let bands = &features.bands;
        Rgb::new(
            scale_channel(base.r, bands.bass),
            scale_channel(base.g, bands.mid),
            scale_channel(base.b, bands.treble()),
        )
    }

    /// First matching rule wins: many harmonics, noisy, wide spectrum, then harmonic count.
    pub fn shape(&self, features: &AudioFeatures) -> Shape {
        let harmonic_count = features.harmonics.len();

        if harmonic_count > 8 {
            Shape::Star
        } else if features.zero_crossing_rate > 0.5 {
            Shape::Spike
        } else if features.spectral_spread > 2000.0 {
            Shape::Wave
        } else if harmonic_count < 3 {
            Shape::Triangle
        } else if harmonic_count < 6 {
            Shape::Square
        } else {
            Shape::Circle
        }
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn scale_channel(channel: u8, energy: f32) -> u8 {
    (channel as f32 * (1.0 + 2.0 * energy)).round().clamp(0.0, 255.0) as u8
}
