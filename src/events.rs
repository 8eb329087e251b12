use crossbeam_channel::{Receiver, Sender};
use glam::Vec3;
use serde::Serialize;

use crate::visual::{Rgb, VisualizationFrame};

/// Notifications for rendering and transport collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VisualizerEvent {
    #[serde(rename_all = "camelCase")]
    SourceRegistered { id: String, name: String, color: Rgb },
    #[serde(rename_all = "camelCase")]
    SourceRemoved { source_id: String },
    #[serde(rename_all = "camelCase")]
    SourcePositionChanged { source_id: String, position: Vec3 },
    VisualizerStarted { timestamp: u64 },
    VisualizerStopped { timestamp: u64 },
    FrameUpdate { frame: VisualizationFrame },
}

/// Single-writer fan-out over unbounded channels, delivered in publish order
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<VisualizerEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<VisualizerEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Send to every subscriber, dropping those whose receiver is gone
    pub fn publish(&mut self, event: VisualizerEvent) {
        self.subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
