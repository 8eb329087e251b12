//! Real-time multi-source sound visualization.
//!
//! Sample blocks go in through [`Visualizer::process_audio`]; a
//! [`VisualizationFrame`] with one [`VisualElement`] per source comes out,
//! refreshed by the scheduler at the configured update rate.

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod sources;
pub mod visual;
pub mod visualizer;

pub use config::AnalysisConfig;
pub use error::{Result, VisualizerError};
pub use events::VisualizerEvent;
pub use sources::AudioSource;
pub use visual::{GlobalAudioMetrics, Rgb, Shape, VisualElement, VisualizationFrame};
pub use visualizer::Visualizer;
