// Scripted in-memory systemd bus for tests

use crate::error::{Result, SysgaugeError};
use crate::systemd::bus::{BusConnector, SystemdBus};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct FakeUnit {
    sub_state: String,
    active_state: String,
}

#[derive(Debug, Default)]
struct FakeState {
    units: HashMap<String, FakeUnit>,
    live_buses: HashSet<u64>,
    next_bus_id: u64,
    fail_connect: bool,
    fail_reads: bool,
    failing_sub_reads: HashMap<String, usize>,
    stats: FakeStats,
}

/// Call counters observed by the fake
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FakeStats {
    pub connect_attempts: usize,
    pub connects: usize,
    pub get_unit_calls: usize,
    pub property_reads: usize,
    pub stale_handle_uses: usize,
}

/// Shared handle to the fake service manager; clones observe the same state
#[derive(Debug, Clone, Default)]
pub struct FakeSystemd {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSystemd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(self, unit: &str, sub_state: &str, active_state: &str) -> Self {
        self.set_unit(unit, sub_state, active_state);
        self
    }

    pub fn set_unit(&self, unit: &str, sub_state: &str, active_state: &str) {
        self.state.lock().unwrap().units.insert(
            unit.to_string(),
            FakeUnit {
                sub_state: sub_state.to_string(),
                active_state: active_state.to_string(),
            },
        );
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    /// Make every property read fail with a transport error
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    /// Make the next `count` SubState reads of `unit` fail
    pub fn fail_next_sub_reads(&self, unit: &str, count: usize) {
        self.state
            .lock()
            .unwrap()
            .failing_sub_reads
            .insert(unit.to_string(), count);
    }

    /// Simulate the daemon dropping every open connection
    pub fn kill_connections(&self) {
        self.state.lock().unwrap().live_buses.clear();
    }

    pub fn stats(&self) -> FakeStats {
        self.state.lock().unwrap().stats
    }

    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            systemd: self.clone(),
        }
    }
}

pub struct FakeConnector {
    systemd: FakeSystemd,
}

#[async_trait]
impl BusConnector for FakeConnector {
    type Bus = FakeBus;

    async fn connect(&self) -> Result<FakeBus> {
        let mut state = self.systemd.state.lock().unwrap();
        state.stats.connect_attempts += 1;
        if state.fail_connect {
            return Err(SysgaugeError::SystemdConnection("bus unavailable".to_string()).into());
        }
        state.next_bus_id += 1;
        let id = state.next_bus_id;
        state.live_buses.insert(id);
        state.stats.connects += 1;
        Ok(FakeBus {
            id,
            systemd: self.systemd.clone(),
        })
    }
}

/// Handle bound to the bus that resolved it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeHandle {
    pub bus_id: u64,
    pub unit: String,
}

pub struct FakeBus {
    id: u64,
    systemd: FakeSystemd,
}

#[async_trait]
impl SystemdBus for FakeBus {
    type Handle = FakeHandle;

    async fn get_unit(&self, unit: &str) -> Result<FakeHandle> {
        let mut state = self.systemd.state.lock().unwrap();
        state.stats.get_unit_calls += 1;
        if !state.live_buses.contains(&self.id) {
            return Err(SysgaugeError::UnitResolution {
                unit: unit.to_string(),
                message: "connection closed".to_string(),
            }
            .into());
        }
        if !state.units.contains_key(unit) {
            return Err(SysgaugeError::UnitResolution {
                unit: unit.to_string(),
                message: format!("Unit {} not loaded.", unit),
            }
            .into());
        }
        Ok(FakeHandle {
            bus_id: self.id,
            unit: unit.to_string(),
        })
    }

    async fn get_property(&self, handle: &FakeHandle, property: &str) -> Result<String> {
        let mut state = self.systemd.state.lock().unwrap();
        state.stats.property_reads += 1;

        let read_error = |message: &str| -> anyhow::Error {
            SysgaugeError::PropertyRead {
                unit: handle.unit.clone(),
                property: property.to_string(),
                message: message.to_string(),
            }
            .into()
        };

        if handle.bus_id != self.id {
            state.stats.stale_handle_uses += 1;
            return Err(read_error("handle from another connection"));
        }
        if !state.live_buses.contains(&self.id) {
            return Err(read_error("connection closed"));
        }
        if state.fail_reads {
            return Err(read_error("transport error"));
        }
        if property == "SubState" {
            if let Some(remaining) = state.failing_sub_reads.get_mut(&handle.unit) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(read_error("transport error"));
                }
            }
        }

        let unit = state
            .units
            .get(&handle.unit)
            .ok_or_else(|| read_error("unit vanished"))?;
        match property {
            "SubState" => Ok(unit.sub_state.clone()),
            "ActiveState" => Ok(unit.active_state.clone()),
            other => Err(read_error(&format!("unknown property {}", other))),
        }
    }
}
