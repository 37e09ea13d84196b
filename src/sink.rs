// Metrics sinks for emitted samples

use crate::error::{Result, SysgaugeError};
use crate::systemd::Sample;
use std::io::Write;
use std::time::Duration;

/// Destination for gauge samples
#[cfg_attr(test, mockall::automock)]
pub trait MetricsSink: Send {
    fn dispatch(&mut self, sample: &Sample) -> Result<()>;
}

/// Writes samples as collectd exec-plugin `PUTVAL` lines
pub struct PutvalSink<W: Write + Send> {
    writer: W,
    hostname: String,
    interval: Duration,
}

impl PutvalSink<std::io::Stdout> {
    /// Sink writing to stdout, the channel collectd's exec plugin reads
    pub fn stdout(hostname: impl Into<String>, interval: Duration) -> Self {
        Self::new(std::io::stdout(), hostname, interval)
    }
}

impl<W: Write + Send> PutvalSink<W> {
    pub fn new(writer: W, hostname: impl Into<String>, interval: Duration) -> Self {
        Self {
            writer,
            hostname: hostname.into(),
            interval,
        }
    }

    /// Render one sample as a PUTVAL command
    pub fn format_line(&self, sample: &Sample) -> String {
        format!(
            "PUTVAL \"{}/{}-{}/{}-{}\" interval={:.3} {}:{}",
            self.hostname,
            sample.plugin,
            sample.plugin_instance,
            sample.type_name(),
            sample.type_instance(),
            self.interval.as_secs_f64(),
            sample.time.timestamp(),
            sample.value
        )
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MetricsSink for PutvalSink<W> {
    fn dispatch(&mut self, sample: &Sample) -> Result<()> {
        let line = self.format_line(sample);
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| SysgaugeError::Sink(e.to_string()))?;
        Ok(())
    }
}

/// Host name used in metric identifiers when none was given
pub fn default_hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
