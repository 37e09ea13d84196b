// Periodic read scheduling

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Callback invoked once per interval
pub type ReadCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Host hook the engine registers its read callback against
pub trait Scheduler {
    fn register_read(&mut self, name: &str, interval: Duration, callback: ReadCallback);
}

/// Tokio-driven scheduler: one ticker task per registration.
///
/// The callback is awaited inside the ticker loop, so a registration never
/// runs concurrently with itself; ticks missed meanwhile are skipped.
#[derive(Default)]
pub struct TickScheduler {
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort every ticker task
    pub fn shutdown(&mut self) {
        for (name, task) in self.tasks.drain(..) {
            task.abort();
            tracing::debug!("Stopped read callback '{}'", name);
        }
    }
}

impl Scheduler for TickScheduler {
    fn register_read(&mut self, name: &str, interval: Duration, callback: ReadCallback) {
        if interval.is_zero() {
            tracing::error!("Refusing to register read callback '{}' with a zero interval", name);
            return;
        }
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                callback().await;
            }
        });
        tracing::debug!("Registered read callback '{}' every {:?}", name, interval);
        self.tasks.push((name.to_string(), task));
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Scheduler that records registrations and fires them on demand
#[cfg(test)]
#[derive(Default)]
pub(crate) struct ManualScheduler {
    pub registrations: Vec<(String, Duration, ReadCallback)>,
}

#[cfg(test)]
impl ManualScheduler {
    /// Run the `index`th registered callback once
    pub async fn fire(&self, index: usize) {
        let callback = self.registrations[index].2.clone();
        callback().await;
    }
}

#[cfg(test)]
impl Scheduler for ManualScheduler {
    fn register_read(&mut self, name: &str, interval: Duration, callback: ReadCallback) {
        self.registrations
            .push((name.to_string(), interval, callback));
    }
}
