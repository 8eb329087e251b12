use glam::Vec3;
use log::{info, warn};
use rand::Rng;
use serde::Serialize;

use crate::visual::Rgb;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub color: Rgb,
    /// Spatial anchor used to separate simultaneous sources
    pub position: Vec3,
    /// Set by ingestion, cleared by every decay tick
    pub active: bool,
}

/// Known sources in registration order
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<AudioSource>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a source. Unparseable colors fall back to white.
    pub fn register(&mut self, id: &str, name: &str, color: &str) -> &AudioSource {
        let color = color.parse::<Rgb>().unwrap_or_else(|e| {
            warn!("Source '{}': {}, using white", id, e);
            Rgb::WHITE
        });

        let mut rng = rand::rng();
        let source = AudioSource {
            id: id.to_string(),
            name: name.to_string(),
            color,
            position: Vec3::new(rng.random(), rng.random(), rng.random()),
            active: false,
        };

        info!("Registered audio source '{}' ({}) color {}", id, name, color);

        let index = match self.index_of(id) {
            Some(index) => {
                self.sources[index] = source;
                index
            }
            None => {
                self.sources.push(source);
                self.sources.len() - 1
            }
        };
        &self.sources[index]
    }

    /// Returns false when no such source exists
    pub fn set_position(&mut self, id: &str, position: Vec3) -> bool {
        match self.get_mut(id) {
            Some(source) => {
                source.position = position;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<AudioSource> {
        let index = self.index_of(id)?;
        info!("Removed audio source '{}'", id);
        Some(self.sources.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&AudioSource> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut AudioSource> {
        self.sources.iter_mut().find(|s| s.id == id)
    }

    pub fn mark_active(&mut self, id: &str) -> Option<&AudioSource> {
        let source = self.get_mut(id)?;
        source.active = true;
        Some(source)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.get(id).map_or(false, |s| s.active)
    }

    pub fn clear_active(&mut self) {
        for source in &mut self.sources {
            source.active = false;
        }
    }

    pub fn snapshot(&self) -> Vec<AudioSource> {
        self.sources.clone()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.id == id)
    }
}
