pub mod compositor;
pub mod mapper;

pub use compositor::FrameCompositor;
pub use mapper::VisualMapper;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VisualizerError;

/// 8-bit RGB color, parsed from `#rrggbb` or `#rgb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = VisualizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VisualizerError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Rgb::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            3 => {
                // #abc is shorthand for #aabbcc
                let expand = |d: &str| channel(d).map(|v| v * 17);
                Ok(Rgb::new(expand(&hex[0..1])?, expand(&hex[1..2])?, expand(&hex[2..3])?))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Waveform "shape" of an element, chosen by `VisualMapper::shape`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Star,
    Wave,
    Spike,
}

impl Shape {
    pub const ALL: [Shape; 6] = [
        Shape::Circle,
        Shape::Square,
        Shape::Triangle,
        Shape::Star,
        Shape::Wave,
        Shape::Spike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Triangle => "triangle",
            Shape::Star => "star",
            Shape::Wave => "wave",
            Shape::Spike => "spike",
        }
    }
}

/// One source's current sound expressed as spatial, color and shape attributes.
///
/// `x`, `y`, `z`, `brightness` and `size` are always within 0.0-1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualElement {
    pub source_id: String,
    /// Resonance (width)
    pub x: f32,
    /// Log-scaled pitch (height)
    pub y: f32,
    /// Spectral centroid (depth)
    pub z: f32,
    pub color: Rgb,
    pub brightness: f32,
    pub size: f32,
    pub shape: Shape,
    /// Per-second change of (x, y, z) since the previous element of this source
    pub velocity: Vec3,
    pub rotation: f32,
    /// The source's spatial anchor when the element was built
    pub anchor: Vec3,

    // Raw audio properties kept for inspection
    pub frequency: f32,
    pub amplitude: f32,
    pub harmonics: Vec<f32>,
    pub spectral_centroid: f32,
    pub spectral_spread: f32,
    pub zcr: f32,
}

impl VisualElement {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAudioMetrics {
    /// Mean amplitude across elements
    pub overall_volume: f32,
    /// Frequency of the loudest element
    pub dominant_frequency: f32,
    pub num_active_sources: usize,
}

impl GlobalAudioMetrics {
    pub fn from_elements(elements: &[VisualElement]) -> Self {
        if elements.is_empty() {
            return Self::default();
        }

        let overall_volume =
            elements.iter().map(|e| e.amplitude).sum::<f32>() / elements.len() as f32;

        let mut loudest = &elements[0];
        for element in &elements[1..] {
            if element.amplitude > loudest.amplitude {
                loudest = element;
            }
        }

        Self {
            overall_volume,
            dominant_frequency: loudest.frequency,
            num_active_sources: elements.len(),
        }
    }
}

/// The current picture: at most one element per source, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationFrame {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub elements: Vec<VisualElement>,
    pub global_metrics: GlobalAudioMetrics,
}

impl VisualizationFrame {
    pub fn element(&self, source_id: &str) -> Option<&VisualElement> {
        self.elements.iter().find(|e| e.source_id == source_id)
    }
}
