// Sysgauge - systemd unit state gauges for collectd
// Library root

pub mod config;
pub mod error;
pub mod monitor;
pub mod scheduler;
pub mod sink;
pub mod systemd;
pub mod version;
