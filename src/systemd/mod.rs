// Systemd integration module

pub mod bus;
pub mod cache;
pub mod connection;
pub mod models;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use bus::{BusConnector, DbusSystemdBus, SystemBusConnector, SystemdBus, UnitHandle};
pub use cache::UnitCache;
pub use connection::{Connection, ConnectionManager};
pub use models::{
    active_value, qualified_unit_name, running_value, GaugeKind, ReadFailure, Sample, StateRead,
    UnitProperty, PLUGIN_NAME,
};
pub use state::UnitStateReader;
