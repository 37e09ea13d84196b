// Polling cycle over the configured units

use crate::config::Config;
use crate::error::Result;
use crate::scheduler::{ReadCallback, Scheduler};
use crate::sink::MetricsSink;
use crate::systemd::{
    active_value, qualified_unit_name, running_value, BusConnector, GaugeKind, Sample,
    UnitStateReader, PLUGIN_NAME,
};
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Monitor shared with the scheduler's read callback
pub type SharedMonitor<C, S> = Arc<Mutex<Monitor<C, S>>>;

/// Outcome of one polling cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub units: usize,
    pub samples: usize,
    pub dispatch_errors: usize,
    pub reconnect_attempts: usize,
    pub failed_reconnects: usize,
}

/// Samples every configured unit and hands two gauges per unit to the sink
pub struct Monitor<C: BusConnector, S: MetricsSink> {
    services: Vec<String>,
    reader: UnitStateReader<C>,
    sink: S,
}

impl<C: BusConnector, S: MetricsSink> Monitor<C, S> {
    /// Create a monitor without connecting
    pub fn new(services: Vec<String>, connector: C, sink: S) -> Self {
        Self {
            services,
            reader: UnitStateReader::new(connector),
            sink,
        }
    }

    /// Establish the initial connection
    pub async fn connect(&mut self) -> Result<u64> {
        self.reader.reconnect().await
    }

    pub fn reader(&self) -> &UnitStateReader<C> {
        &self.reader
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run one polling cycle.
    ///
    /// A fallback SubState read triggers one reconnect and one retried read
    /// for that unit. After a reconnect fails, later units in the same cycle
    /// skip reconnecting.
    pub async fn read_cycle(&mut self) -> CycleReport {
        tracing::debug!("Read callback called");
        let mut report = CycleReport::default();
        let mut reconnect_failed = false;

        for name in self.services.iter() {
            let unit = qualified_unit_name(name);
            report.units += 1;

            let mut sub_state = self.reader.sub_state(&unit).await;
            if sub_state.is_fallback() {
                if reconnect_failed {
                    tracing::debug!(
                        "Unit {} reported as broken, connection already failed this cycle",
                        unit
                    );
                } else {
                    tracing::debug!(
                        "Unit {} reported as broken. Reinitializing the connection to systemd & retrying.",
                        unit
                    );
                    report.reconnect_attempts += 1;
                    if let Err(e) = self.reader.reconnect().await {
                        tracing::warn!("Failed to reconnect to systemd: {}", e);
                        report.failed_reconnects += 1;
                        reconnect_failed = true;
                    }
                    sub_state = self.reader.sub_state(&unit).await;
                }
            }

            let running = running_value(sub_state.as_str());
            tracing::debug!(
                "Sending value: {}.{}={} (substate={})",
                PLUGIN_NAME,
                name,
                running,
                sub_state
            );
            emit(
                &mut self.sink,
                Sample::new(name, GaugeKind::Running, running),
                &mut report,
            );

            let active_state = self.reader.active_state(&unit).await;
            let active = active_value(active_state.as_str());
            tracing::debug!(
                "Sending value: {}.{}={} (activestate={})",
                PLUGIN_NAME,
                name,
                active,
                active_state
            );
            emit(
                &mut self.sink,
                Sample::new(name, GaugeKind::Active, active),
                &mut report,
            );
        }

        report
    }
}

fn emit<S: MetricsSink>(sink: &mut S, sample: Sample, report: &mut CycleReport) {
    report.samples += 1;
    if let Err(e) = sink.dispatch(&sample) {
        report.dispatch_errors += 1;
        tracing::warn!(
            "Failed to dispatch {}/{}: {}",
            sample.plugin_instance,
            sample.type_instance(),
            e
        );
    }
}

/// Build the monitor for `config` and register its read callback.
///
/// Returns None, without touching the bus, when no services are configured.
/// A failed initial connect is logged and left to the first cycle's
/// recovery.
pub async fn configure<C, S, R>(
    config: &Config,
    connector: C,
    sink: S,
    scheduler: &mut R,
) -> Option<SharedMonitor<C, S>>
where
    C: BusConnector + 'static,
    S: MetricsSink + 'static,
    R: Scheduler + ?Sized,
{
    if config.services.is_empty() {
        tracing::debug!("No services defined in configuration");
        return None;
    }

    let mut monitor = Monitor::new(config.services.clone(), connector, sink);
    if let Err(e) = monitor.connect().await {
        tracing::warn!("Failed to connect to systemd, retrying on the next read: {}", e);
    }

    let monitor = Arc::new(Mutex::new(monitor));
    scheduler.register_read(PLUGIN_NAME, config.interval, read_callback(monitor.clone()));
    tracing::debug!(
        "Configured with services={:?}, interval={}",
        config.services,
        config.interval_secs()
    );

    Some(monitor)
}

/// Read callback running one cycle, skipped while a previous one is in flight
pub fn read_callback<C, S>(monitor: SharedMonitor<C, S>) -> ReadCallback
where
    C: BusConnector + 'static,
    S: MetricsSink + 'static,
{
    Arc::new(move || {
        let monitor = monitor.clone();
        async move {
            match monitor.try_lock() {
                Ok(mut guard) => {
                    let report = guard.read_cycle().await;
                    tracing::debug!("Read cycle finished: {:?}", report);
                }
                Err(_) => {
                    tracing::warn!("Previous read cycle still running, skipping this interval");
                }
            }
        }
        .boxed()
    })
}
