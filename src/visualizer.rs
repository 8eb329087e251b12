use crossbeam_channel::Receiver;
use glam::Vec3;
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::audio::{analyze_block, FeatureExtractor, SpectralAnalyzer};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::events::{EventBus, VisualizerEvent};
use crate::scheduler::Scheduler;
use crate::sources::{AudioSource, SourceRegistry};
use crate::visual::compositor::now_millis;
use crate::visual::{FrameCompositor, VisualMapper, VisualizationFrame};

/// State shared between callers and the scheduler task
struct Core {
    registry: SourceRegistry,
    compositor: FrameCompositor,
    analyzer: SpectralAnalyzer,
    extractor: FeatureExtractor,
    mapper: VisualMapper,
    events: EventBus,
}

impl Core {
    fn tick(&mut self) {
        self.compositor.decay(&mut self.registry);
        if let Some(frame) = self.compositor.frame() {
            let frame = frame.clone();
            self.events.publish(VisualizerEvent::FrameUpdate { frame });
        }
    }
}

/// Multi-source sound visualizer.
///
/// Ingestion runs analysis synchronously and merges the result into the current
/// frame; the scheduler decays idle sources and broadcasts the frame at
/// `update_rate`. All methods take `&self`, so one instance can be shared
/// between an audio feeder and the tick task.
pub struct Visualizer {
    config: AnalysisConfig,
    core: Arc<Mutex<Core>>,
    scheduler: Mutex<Scheduler>,
}

impl Visualizer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let core = Core {
            registry: SourceRegistry::new(),
            compositor: FrameCompositor::new(config.update_rate),
            analyzer: SpectralAnalyzer::new(config.fft_size),
            extractor: FeatureExtractor::new(),
            mapper: VisualMapper::new(&config),
            events: EventBus::new(),
        };

        info!(
            "Visualizer ready: fft_size={}, range={}-{} Hz, update_rate={} Hz",
            config.fft_size, config.min_frequency, config.max_frequency, config.update_rate
        );

        Ok(Self {
            scheduler: Mutex::new(Scheduler::new(config.tick_interval())),
            config,
            core: Arc::new(Mutex::new(core)),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn subscribe(&self) -> Receiver<VisualizerEvent> {
        self.core().events.subscribe()
    }

    pub fn register_source(&self, id: &str, name: &str, color: &str) {
        let mut core = self.core();
        let source = core.registry.register(id, name, color);
        let event = VisualizerEvent::SourceRegistered {
            id: source.id.clone(),
            name: source.name.clone(),
            color: source.color,
        };
        core.events.publish(event);
    }

    /// Unregister a source and drop its element from the frame
    pub fn remove_source(&self, id: &str) -> bool {
        let mut core = self.core();
        if core.registry.remove(id).is_none() {
            return false;
        }
        core.compositor.remove(id);
        core.events.publish(VisualizerEvent::SourceRemoved {
            source_id: id.to_string(),
        });
        true
    }

    /// Move a source's spatial anchor. Unknown ids are ignored.
    pub fn set_source_position(&self, id: &str, x: f32, y: f32, z: f32) {
        let mut core = self.core();
        let position = Vec3::new(x, y, z);
        if core.registry.set_position(id, position) {
            core.events.publish(VisualizerEvent::SourcePositionChanged {
                source_id: id.to_string(),
                position,
            });
        }
    }

    pub fn sources(&self) -> Vec<AudioSource> {
        self.core().registry.snapshot()
    }

    /// Analyze one block of mono samples for `source_id` and merge it into the frame.
    ///
    /// Unknown sources are logged and ignored; degenerate blocks produce zeroed features.
    pub fn process_audio(&self, source_id: &str, samples: &[f32], sample_rate: u32) {
        let mut core = self.core();
        let core = &mut *core;

        let Some(source) = core.registry.mark_active(source_id) else {
            warn!("Audio for unknown source '{}' ignored", source_id);
            return;
        };

        let features = analyze_block(&core.analyzer, &core.extractor, samples, sample_rate);
        let element = core.mapper.map(&features, source);
        core.compositor.merge(element);
    }

    pub fn current_frame(&self) -> Option<VisualizationFrame> {
        self.core().compositor.frame().cloned()
    }

    /// Run one decay pass and broadcast the frame, as the scheduler does each period
    pub fn tick(&self) {
        self.core().tick();
    }

    /// Begin periodic ticks. Needs a tokio runtime; a second call is a no-op.
    pub fn start(&self) -> Result<()> {
        let core = Arc::clone(&self.core);
        let started = self.scheduler().start(move || {
            lock(&*core).tick();
        })?;

        if started {
            self.core().events.publish(VisualizerEvent::VisualizerStarted {
                timestamp: now_millis(),
            });
        }
        Ok(())
    }

    pub fn stop(&self) {
        if self.scheduler().stop() {
            self.core().events.publish(VisualizerEvent::VisualizerStopped {
                timestamp: now_millis(),
            });
        }
    }

    pub fn is_running(&self) -> bool {
        self.scheduler().is_running()
    }

    /// Stop the scheduler and forget every source and the current frame.
    /// Subscribers stay connected.
    pub fn reset(&self) {
        self.stop();
        let mut core = self.core();
        core.registry.clear();
        core.compositor.reset();
        info!("Visualizer reset");
    }

    fn core(&self) -> MutexGuard<'_, Core> {
        lock(&*self.core)
    }

    fn scheduler(&self) -> MutexGuard<'_, Scheduler> {
        lock(&self.scheduler)
    }
}

impl Drop for Visualizer {
    fn drop(&mut self) {
        self.stop();
    }
}

// A panicked tick leaves the state usable; keep going with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
