//! Seam to the Tuya local protocol stack.
//!
//! Framing, encryption and session handling live behind these traits. The client only
//! asks for a full status read or a single point write.

use crate::dps::DataPointMap;
use crate::error::Result;
use serde_json::Value;
use std::fmt;
use std::future::Future;

pub const DEFAULT_VERSION: &str = "3.3";

/// Identifies one physical device on the local network.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    id: String,
    local_key: String,
    ip_address: String,
    version: String,
}

impl DeviceAddress {
    pub fn new<I, K, A>(id: I, local_key: K, ip_address: A) -> Self
    where
        I: Into<String>,
        K: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            local_key: local_key.into(),
            ip_address: ip_address.into(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    /// Protocol version, e.g. "3.3".
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

// The local key never ends up in logs.
impl fmt::Debug for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceAddress")
            .field("id", &self.id)
            .field("local_key", &"<redacted>")
            .field("ip_address", &self.ip_address)
            .field("version", &self.version)
            .finish()
    }
}

/// An open connection to one device.
pub trait Transport: Send + Sync + 'static {
    /// Reads the full data point status of the device.
    fn read_status(&self) -> impl Future<Output = Result<DataPointMap>> + Send;

    /// Writes a single data point.
    fn write_point(&self, point: &str, value: Value) -> impl Future<Output = Result<()>> + Send;
}

/// Opens transports. Reconnection after a dropped link is the transport's own business.
pub trait Connector {
    type Transport: Transport;

    fn connect(
        &self,
        address: &DeviceAddress,
    ) -> impl Future<Output = Result<Self::Transport>> + Send;
}
