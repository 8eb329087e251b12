use log::debug;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{GlobalAudioMetrics, VisualElement, VisualizationFrame};
use crate::sources::SourceRegistry;

/// Per-tick brightness multiplier for sources that sent nothing
pub const DECAY_FACTOR: f32 = 0.9;
/// Elements dimmer than this are evicted
pub const EVICTION_THRESHOLD: f32 = 0.01;

/// Owns the single current frame and keeps one element per source in it.
#[derive(Debug)]
pub struct FrameCompositor {
    update_rate: f32,
    frame: Option<VisualizationFrame>,
}

impl FrameCompositor {
    pub fn new(update_rate: f32) -> Self {
        Self {
            update_rate,
            frame: None,
        }
    }

    pub fn frame(&self) -> Option<&VisualizationFrame> {
        self.frame.as_ref()
    }

    /// Insert or replace the element for its source, deriving velocity from the previous one
    pub fn merge(&mut self, mut element: VisualElement) {
        let frame = self.frame.get_or_insert_with(VisualizationFrame::default);

        match frame.elements.iter_mut().find(|e| e.source_id == element.source_id) {
            Some(previous) => {
                element.velocity = (element.position() - previous.position()) * self.update_rate;
                *previous = element;
            }
            None => frame.elements.push(element),
        }

        Self::refresh(frame);
    }

    /// One decay pass: dim elements of inactive sources, evict faded ones,
    /// then clear every source's active flag for the next cycle.
    pub fn decay(&mut self, registry: &mut SourceRegistry) {
        if let Some(frame) = self.frame.as_mut() {
            frame.elements.retain_mut(|element| {
                if registry.is_active(&element.source_id) {
                    return true;
                }

                element.brightness *= DECAY_FACTOR;
                if element.brightness < EVICTION_THRESHOLD {
                    debug!("Evicting faded element for source '{}'", element.source_id);
                    return false;
                }
                true
            });

            Self::refresh(frame);
        }

        registry.clear_active();
    }

    /// Drop the element of one source; returns whether one existed
    pub fn remove(&mut self, source_id: &str) -> bool {
        let Some(frame) = self.frame.as_mut() else {
            return false;
        };

        let before = frame.elements.len();
        frame.elements.retain(|e| e.source_id != source_id);
        let removed = frame.elements.len() != before;
        if removed {
            Self::refresh(frame);
        }
        removed
    }

    pub fn reset(&mut self) {
        self.frame = None;
    }

    fn refresh(frame: &mut VisualizationFrame) {
        frame.timestamp = now_millis();
        frame.global_metrics = GlobalAudioMetrics::from_elements(&frame.elements);
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::{Rgb, Shape};
    use glam::Vec3;

    fn element(source_id: &str, x: f32, y: f32, z: f32, amplitude: f32, frequency: f32) -> VisualElement {
        VisualElement {
            source_id: source_id.to_string(),
            x,
            y,
            z,
            color: Rgb::WHITE,
            brightness: 1.0,
            size: 0.3,
            shape: Shape::Circle,
            velocity: Vec3::ZERO,
            rotation: 0.0,
            anchor: Vec3::ZERO,
            frequency,
            amplitude,
            harmonics: Vec::new(),
            spectral_centroid: 0.0,
            spectral_spread: 0.0,
            zcr: 0.0,
        }
    }

    #[test]
    fn test_frame_created_lazily() {
        let mut compositor = FrameCompositor::new(60.0);
        assert!(compositor.frame().is_none());

        compositor.merge(element("a", 0.5, 0.5, 0.5, 0.4, 440.0));
        let frame = compositor.frame().unwrap();
        assert_eq!(frame.elements.len(), 1);
        assert!(frame.timestamp > 0);
    }

    #[test]
    fn test_merge_replaces_and_computes_velocity() {
        let mut compositor = FrameCompositor::new(50.0);
        compositor.merge(element("a", 0.2, 0.4, 0.6, 0.5, 440.0));
        compositor.merge(element("a", 0.3, 0.2, 0.6, 0.5, 220.0));

        let frame = compositor.frame().unwrap();
        assert_eq!(frame.elements.len(), 1);
        let velocity = frame.elements[0].velocity;
        assert!((velocity.x - 5.0).abs() < 1e-4);
        assert!((velocity.y + 10.0).abs() < 1e-4);
        assert!(velocity.z.abs() < 1e-6);
        assert_eq!(frame.elements[0].frequency, 220.0);
    }

    #[test]
    fn test_global_metrics() {
        let mut compositor = FrameCompositor::new(60.0);
        compositor.merge(element("a", 0.0, 0.0, 0.0, 0.2, 100.0));
        compositor.merge(element("b", 0.0, 0.0, 0.0, 0.8, 880.0));
        compositor.merge(element("c", 0.0, 0.0, 0.0, 0.5, 300.0));

        let metrics = &compositor.frame().unwrap().global_metrics;
        assert_eq!(metrics.num_active_sources, 3);
        assert!((metrics.overall_volume - 0.5).abs() < 1e-6);
        assert_eq!(metrics.dominant_frequency, 880.0);
    }

    #[test]
    fn test_decay_skips_active_sources() {
        let mut registry = SourceRegistry::new();
        registry.register("a", "active", "#ffffff");
        registry.register("b", "idle", "#ffffff");
        registry.mark_active("a");

        let mut compositor = FrameCompositor::new(60.0);
        compositor.merge(element("a", 0.0, 0.0, 0.0, 0.5, 100.0));
        compositor.merge(element("b", 0.0, 0.0, 0.0, 0.5, 100.0));

        compositor.decay(&mut registry);

        let frame = compositor.frame().unwrap();
        assert_eq!(frame.element("a").unwrap().brightness, 1.0);
        assert!((frame.element("b").unwrap().brightness - 0.9).abs() < 1e-6);
        assert!(!registry.is_active("a"));
    }

    #[test]
    fn test_decay_evicts_after_44_ticks() {
        let mut registry = SourceRegistry::new();
        registry.register("a", "fading", "#ffffff");

        let mut compositor = FrameCompositor::new(60.0);
        compositor.merge(element("a", 0.0, 0.0, 0.0, 0.5, 100.0));

        for _ in 0..43 {
            compositor.decay(&mut registry);
        }
        assert!(compositor.frame().unwrap().element("a").is_some());

        compositor.decay(&mut registry);
        let frame = compositor.frame().unwrap();
        assert!(frame.elements.is_empty());
        assert_eq!(frame.global_metrics, GlobalAudioMetrics::default());
    }

    #[test]
    fn test_element_of_unknown_source_decays() {
        let mut registry = SourceRegistry::new();
        let mut compositor = FrameCompositor::new(60.0);
        compositor.merge(element("ghost", 0.0, 0.0, 0.0, 0.5, 100.0));

        compositor.decay(&mut registry);
        assert!(compositor.frame().unwrap().element("ghost").unwrap().brightness < 1.0);
    }

    #[test]
    fn test_remove_and_reset() {
        let mut compositor = FrameCompositor::new(60.0);
        assert!(!compositor.remove("a"));
        compositor.merge(element("a", 0.0, 0.0, 0.0, 0.5, 100.0));
        compositor.merge(element("b", 0.0, 0.0, 0.0, 0.1, 100.0));

        assert!(compositor.remove("a"));
        assert_eq!(compositor.frame().unwrap().global_metrics.num_active_sources, 1);

        compositor.reset();
        assert!(compositor.frame().is_none());
    }
}
