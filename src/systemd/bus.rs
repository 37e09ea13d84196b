// D-Bus transport to the systemd manager

use crate::error::{Result, SysgaugeError};
use crate::systemd::models::UNIT_INTERFACE;
use async_trait::async_trait;
use std::time::Duration;
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};
use zbus::{Connection, Proxy};

const SYSTEMD_DESTINATION: &str = "org.freedesktop.systemd1";
const SYSTEMD_PATH: &str = "/org/freedesktop/systemd1";
const MANAGER_INTERFACE: &str = "org.freedesktop.systemd1.Manager";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Operations the monitor needs from a live service-manager connection
#[async_trait]
pub trait SystemdBus: Send + Sync {
    /// Reusable reference to one unit's property interface
    type Handle: Clone + Send + Sync;

    /// Resolve a fully-qualified unit name through the manager's `GetUnit`
    async fn get_unit(&self, unit: &str) -> Result<Self::Handle>;

    /// Fetch a string property of the unit interface
    async fn get_property(&self, handle: &Self::Handle, property: &str) -> Result<String>;
}

/// Builds fresh bus connections
#[async_trait]
pub trait BusConnector: Send + Sync {
    type Bus: SystemdBus;

    async fn connect(&self) -> Result<Self::Bus>;
}

/// Connector for the system bus
#[derive(Debug, Clone)]
pub struct SystemBusConnector {
    connection_timeout: Duration,
}

impl Default for SystemBusConnector {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(5),
        }
    }
}

#[async_trait]
impl BusConnector for SystemBusConnector {
    type Bus = DbusSystemdBus;

    async fn connect(&self) -> Result<DbusSystemdBus> {
        let connection = tokio::time::timeout(self.connection_timeout, Connection::system())
            .await
            .map_err(|_| SysgaugeError::SystemdConnection("Connection timeout".to_string()))?
            .map_err(|e| SysgaugeError::SystemdConnection(format!("Failed to connect: {}", e)))?;

        let manager = Proxy::new(
            &connection,
            SYSTEMD_DESTINATION,
            SYSTEMD_PATH,
            MANAGER_INTERFACE,
        )
        .await
        .map_err(|e| SysgaugeError::SystemdConnection(e.to_string()))?;

        Ok(DbusSystemdBus {
            connection,
            manager,
        })
    }
}

/// Properties proxy bound to a single unit object
#[derive(Clone)]
pub struct UnitHandle {
    unit: String,
    proxy: Proxy<'static>,
}

impl std::fmt::Debug for UnitHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitHandle")
            .field("unit", &self.unit)
            .field("path", &self.proxy.path().as_str())
            .finish()
    }
}

/// zbus-backed systemd manager connection
pub struct DbusSystemdBus {
    connection: Connection,
    manager: Proxy<'static>,
}

#[async_trait]
impl SystemdBus for DbusSystemdBus {
    type Handle = UnitHandle;

    async fn get_unit(&self, unit: &str) -> Result<UnitHandle> {
        let unit_path: OwnedObjectPath = self
            .manager
            .call("GetUnit", &(unit,))
            .await
            .map_err(|e| SysgaugeError::UnitResolution {
                unit: unit.to_string(),
                message: e.to_string(),
            })?;

        let proxy = Proxy::new(
            &self.connection,
            SYSTEMD_DESTINATION,
            unit_path.as_str().to_owned(),
            PROPERTIES_INTERFACE,
        )
        .await
        .map_err(|e| SysgaugeError::UnitResolution {
            unit: unit.to_string(),
            message: e.to_string(),
        })?;

        Ok(UnitHandle {
            unit: unit.to_string(),
            proxy,
        })
    }

    async fn get_property(&self, handle: &UnitHandle, property: &str) -> Result<String> {
        let value: OwnedValue = handle
            .proxy
            .call("Get", &(UNIT_INTERFACE, property))
            .await
            .map_err(|e| SysgaugeError::PropertyRead {
                unit: handle.unit.clone(),
                property: property.to_string(),
                message: e.to_string(),
            })?;

        value_as_string(&value).ok_or_else(|| {
            SysgaugeError::PropertyRead {
                unit: handle.unit.clone(),
                property: property.to_string(),
                message: format!("unexpected value type {:?}", value.value_signature()),
            }
            .into()
        })
    }
}

/// Unwrap a (possibly nested) variant holding a string
fn value_as_string(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.as_str().to_owned()),
        Value::Value(inner) => value_as_string(inner),
        _ => None,
    }
}
