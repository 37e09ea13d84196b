// Unit state and sample data models

use chrono::{DateTime, Utc};
use std::fmt;

/// Plugin identity attached to every emitted sample
pub const PLUGIN_NAME: &str = "systemd";

/// Suffix appended to configured base names when talking to systemd
pub const SERVICE_SUFFIX: &str = ".service";

/// Interface that owns the state properties we read
pub const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";

/// Build the fully-qualified unit name for a configured base name
pub fn qualified_unit_name(base: &str) -> String {
    format!("{}{}", base, SERVICE_SUFFIX)
}

/// Unit properties the monitor samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitProperty {
    /// Fine-grained lifecycle state (running, reload, dead, ...)
    SubState,
    /// Coarse lifecycle state (active, failed, inactive, ...)
    ActiveState,
}

impl UnitProperty {
    /// D-Bus property name
    pub fn name(&self) -> &'static str {
        match self {
            UnitProperty::SubState => "SubState",
            UnitProperty::ActiveState => "ActiveState",
        }
    }

    /// Value reported when the property cannot be read
    pub fn fallback(&self) -> &'static str {
        match self {
            UnitProperty::SubState => "broken",
            UnitProperty::ActiveState => "failed",
        }
    }
}

/// Why a read fell back to its sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFailure {
    /// The unit handle could not be resolved
    NoHandle,
    /// The handle exists but the property fetch failed
    Transport(String),
}

/// Result of reading a single unit property.
///
/// A genuine state and a fallback sentinel may carry the same text, so the
/// variant is what tells a connectivity problem apart from a real state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRead {
    Value(String),
    Fallback {
        sentinel: &'static str,
        reason: ReadFailure,
    },
}

impl StateRead {
    /// Textual state used for gauge mapping
    pub fn as_str(&self) -> &str {
        match self {
            StateRead::Value(value) => value,
            StateRead::Fallback { sentinel, .. } => sentinel,
        }
    }

    /// Returns true if the read did not reach the unit
    pub fn is_fallback(&self) -> bool {
        matches!(self, StateRead::Fallback { .. })
    }
}

impl fmt::Display for StateRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gauge kinds emitted per unit, one sample each per cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeKind {
    Running,
    Active,
}

impl GaugeKind {
    /// collectd type instance tag
    pub fn type_instance(&self) -> &'static str {
        match self {
            GaugeKind::Running => "running",
            GaugeKind::Active => "active",
        }
    }
}

/// Liveness gauge: 1.0 while the unit runs or reloads
pub fn running_value(sub_state: &str) -> f64 {
    match sub_state {
        "running" | "reload" => 1.0,
        _ => 0.0,
    }
}

/// Activity gauge: 1.0 only for exactly "active"
pub fn active_value(active_state: &str) -> f64 {
    if active_state == "active" {
        1.0
    } else {
        0.0
    }
}

/// A single gauge sample handed to the metrics sink
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub plugin: String,
    pub plugin_instance: String,
    pub kind: GaugeKind,
    pub value: f64,
    pub time: DateTime<Utc>,
}

impl Sample {
    /// Build a sample for a unit base name, stamped with the current time
    pub fn new(unit: &str, kind: GaugeKind, value: f64) -> Self {
        Self {
            plugin: PLUGIN_NAME.to_string(),
            plugin_instance: unit.to_string(),
            kind,
            value,
            time: Utc::now(),
        }
    }

    /// collectd data set type; every sample is a gauge
    pub fn type_name(&self) -> &'static str {
        "gauge"
    }

    pub fn type_instance(&self) -> &'static str {
        self.kind.type_instance()
    }
}
