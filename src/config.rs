//! Platform configuration for one thermostat.
//!
//! Uses the same keys as the original platform schema (`name`, `id`, `key`, `ip`) and
//! adds optional tuning knobs with conservative defaults.

use crate::error::{ClimateError, Result};
use crate::transport::{DEFAULT_VERSION, DeviceAddress};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_NAME: &str = "Tuya climate";
pub const MIN_TEMP: f32 = 7.0;
pub const MAX_TEMP: f32 = 30.0;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for a single climate entity.
///
/// # Examples
///
/// ```
/// use tuya_climate::ClimateConfig;
///
/// let config = ClimateConfig::from_json_str(
///     r#"{"name": "Bathroom floor", "id": "bf0123", "key": "0123456789abcdef", "ip": "192.168.1.40"}"#,
/// )
/// .unwrap();
/// assert_eq!(config.unique_id(), "Bathroom floor_climate");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(rename = "id", alias = "device_id")]
    pub device_id: String,
    #[serde(rename = "key", alias = "device_key")]
    pub device_key: String,
    #[serde(rename = "ip", alias = "device_ip")]
    pub device_ip: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_min_temp")]
    pub min_temp: f32,
    #[serde(default = "default_max_temp")]
    pub max_temp: f32,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_min_temp() -> f32 {
    MIN_TEMP
}

fn default_max_temp() -> f32 {
    MAX_TEMP
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY.as_millis() as u64
}

fn default_scan_interval_secs() -> u64 {
    DEFAULT_SCAN_INTERVAL.as_secs()
}

impl ClimateConfig {
    pub fn new<I, K, A>(device_id: I, device_key: K, device_ip: A) -> Self
    where
        I: Into<String>,
        K: Into<String>,
        A: Into<String>,
    {
        Self {
            name: default_name(),
            device_id: device_id.into(),
            device_key: device_key.into(),
            device_ip: device_ip.into(),
            version: default_version(),
            min_temp: MIN_TEMP,
            max_temp: MAX_TEMP,
            settle_delay_ms: default_settle_delay_ms(),
            scan_interval_secs: default_scan_interval_secs(),
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_temp_range(mut self, min: f32, max: f32) -> Self {
        self.min_temp = min;
        self.max_temp = max;
        self
    }

    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval_secs = interval.as_secs();
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("id", &self.device_id),
            ("key", &self.device_key),
            ("ip", &self.device_ip),
        ] {
            if value.trim().is_empty() {
                return Err(ClimateError::InvalidConfig(format!(
                    "'{}' must not be empty",
                    field
                )));
            }
        }
        if !(self.min_temp < self.max_temp) {
            return Err(ClimateError::InvalidConfig(format!(
                "min_temp {} must be below max_temp {}",
                self.min_temp, self.max_temp
            )));
        }
        if self.scan_interval_secs == 0 {
            return Err(ClimateError::InvalidConfig(
                "scan_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Stable entity id, `<name>_climate`.
    pub fn unique_id(&self) -> String {
        format!("{}_climate", self.name)
    }

    pub fn address(&self) -> DeviceAddress {
        DeviceAddress::new(&self.device_id, &self.device_key, &self.device_ip)
            .with_version(&self.version)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }
}
