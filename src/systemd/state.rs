// Unit state reads with fallback sentinels

use crate::error::Result;
use crate::systemd::bus::{BusConnector, SystemdBus};
use crate::systemd::cache::UnitCache;
use crate::systemd::connection::ConnectionManager;
use crate::systemd::models::{ReadFailure, StateRead, UnitProperty};

/// Handle type produced by a connector's bus
pub type HandleOf<C> = <<C as BusConnector>::Bus as SystemdBus>::Handle;

/// Reads unit properties through the handle cache.
///
/// No error crosses this boundary: every failure turns into the caller's
/// fallback value.
pub struct UnitStateReader<C: BusConnector> {
    connections: ConnectionManager<C>,
    cache: UnitCache<HandleOf<C>>,
}

impl<C: BusConnector> UnitStateReader<C> {
    /// Create a reader without connecting
    pub fn new(connector: C) -> Self {
        Self {
            connections: ConnectionManager::new(connector),
            cache: UnitCache::new(),
        }
    }

    /// Rebuild the connection and drop every cached handle
    pub async fn reconnect(&mut self) -> Result<u64> {
        let generation = self.connections.connect().await?;
        self.cache.reset(generation);
        Ok(generation)
    }

    pub fn connections(&self) -> &ConnectionManager<C> {
        &self.connections
    }

    pub fn cache(&self) -> &UnitCache<HandleOf<C>> {
        &self.cache
    }

    /// Cached or freshly resolved handle for a fully-qualified unit name
    pub async fn get_handle(&mut self, unit: &str) -> Option<HandleOf<C>> {
        self.cache.get_handle(self.connections.current(), unit).await
    }

    /// Read a property, returning `fallback` on any failure
    pub async fn read_property(
        &mut self,
        unit: &str,
        property: &str,
        fallback: &'static str,
    ) -> StateRead {
        let Some(handle) = self.get_handle(unit).await else {
            return StateRead::Fallback {
                sentinel: fallback,
                reason: ReadFailure::NoHandle,
            };
        };

        let Some(connection) = self.connections.current() else {
            return StateRead::Fallback {
                sentinel: fallback,
                reason: ReadFailure::NoHandle,
            };
        };

        match connection.bus().get_property(&handle, property).await {
            Ok(value) => StateRead::Value(value),
            Err(e) => {
                tracing::debug!("Failed to monitor unit {}: {}", unit, e);
                StateRead::Fallback {
                    sentinel: fallback,
                    reason: ReadFailure::Transport(e.to_string()),
                }
            }
        }
    }

    /// SubState, falling back to "broken"
    pub async fn sub_state(&mut self, unit: &str) -> StateRead {
        let property = UnitProperty::SubState;
        self.read_property(unit, property.name(), property.fallback())
            .await
    }

    /// ActiveState, falling back to "failed"
    pub async fn active_state(&mut self, unit: &str) -> StateRead {
        let property = UnitProperty::ActiveState;
        self.read_property(unit, property.name(), property.fallback())
            .await
    }
}
