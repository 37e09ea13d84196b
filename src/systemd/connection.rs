// Connection manager owning the single service-manager connection

use crate::error::Result;
use crate::systemd::bus::BusConnector;

/// A live bus tagged with the generation it was built in
pub struct Connection<B> {
    generation: u64,
    bus: B,
}

impl<B> Connection<B> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

/// Owns the connection and rebuilds it on demand.
///
/// Generations start at 1 and increase with every successful connect; a
/// failed connect keeps whatever connection was live before.
pub struct ConnectionManager<C: BusConnector> {
    connector: C,
    current: Option<Connection<C::Bus>>,
    last_generation: u64,
}

impl<C: BusConnector> ConnectionManager<C> {
    /// Create a manager without connecting
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            current: None,
            last_generation: 0,
        }
    }

    /// Establish a fresh connection, replacing the current one.
    ///
    /// Returns the new generation. Handles resolved against an older
    /// generation must not be used afterwards.
    pub async fn connect(&mut self) -> Result<u64> {
        let bus = self.connector.connect().await?;
        self.last_generation += 1;
        self.current = Some(Connection {
            generation: self.last_generation,
            bus,
        });
        tracing::debug!("Connected to systemd (generation {})", self.last_generation);
        Ok(self.last_generation)
    }

    /// Currently live connection, if any
    pub fn current(&self) -> Option<&Connection<C::Bus>> {
        self.current.as_ref()
    }

    /// Generation of the live connection, 0 when never connected
    pub fn generation(&self) -> u64 {
        self.current.as_ref().map(|c| c.generation).unwrap_or(0)
    }

    pub fn is_connected(&self) -> bool {
        self.current.is_some()
    }
}
