// Lazily-filled cache of unit handles

use crate::systemd::bus::SystemdBus;
use crate::systemd::connection::Connection;
use std::collections::HashMap;

/// Maps unit names to handles resolved against one connection generation.
///
/// Misses are never cached, so a unit that fails to resolve is retried on
/// the next lookup.
#[derive(Debug)]
pub struct UnitCache<H> {
    generation: u64,
    handles: HashMap<String, H>,
}

impl<H> Default for UnitCache<H> {
    fn default() -> Self {
        Self {
            generation: 0,
            handles: HashMap::new(),
        }
    }
}

impl<H: Clone> UnitCache<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation the cached handles belong to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Drop every cached handle
    pub fn clear(&mut self) {
        self.handles.clear();
    }

    /// Drop every cached handle and adopt a new generation
    pub fn reset(&mut self, generation: u64) {
        self.clear();
        self.generation = generation;
    }

    /// Return the handle for `unit`, resolving it on a miss.
    ///
    /// Returns None when there is no connection or resolution fails.
    pub async fn get_handle<B>(&mut self, connection: Option<&Connection<B>>, unit: &str) -> Option<H>
    where
        B: SystemdBus<Handle = H>,
    {
        let Some(connection) = connection else {
            tracing::warn!("Failed to monitor unit {}: not connected to systemd", unit);
            return None;
        };

        if connection.generation() != self.generation {
            if !self.handles.is_empty() {
                tracing::debug!(
                    "Dropping {} handles from generation {} (live generation {})",
                    self.handles.len(),
                    self.generation,
                    connection.generation()
                );
            }
            self.reset(connection.generation());
        }

        if let Some(handle) = self.handles.get(unit) {
            return Some(handle.clone());
        }

        match connection.bus().get_unit(unit).await {
            Ok(handle) => {
                self.handles.insert(unit.to_string(), handle.clone());
                Some(handle)
            }
            Err(e) => {
                tracing::warn!("Failed to monitor unit {}: {}", unit, e);
                None
            }
        }
    }
}
