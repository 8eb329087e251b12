use log::info;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{Result, VisualizerError};

/// Periodic tick driver: Stopped -> Running -> Stopped.
///
/// Runs the tick callback on a tokio task; at most one task exists at a time.
#[derive(Debug)]
pub struct Scheduler {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self { period, task: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Spawn the tick task. Returns `Ok(false)` when already running.
    pub fn start<F>(&mut self, mut on_tick: F) -> Result<bool>
    where
        F: FnMut() + Send + 'static,
    {
        if self.task.is_some() {
            return Ok(false);
        }

        let runtime = Handle::try_current().map_err(|_| VisualizerError::NoRuntime)?;
        let period = self.period;

        self.task = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; ticks proper start one period later
            interval.tick().await;

            loop {
                interval.tick().await;
                on_tick();
            }
        }));

        info!("Scheduler started ({:?} period)", period);
        Ok(true)
    }

    /// Cancel the tick task. Returns false when already stopped.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                info!("Scheduler stopped");
                true
            }
            None => false,
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
