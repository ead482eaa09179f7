//! Raw data point (DP) maps as exchanged with the device.
//! Also holds the point table of the thermostat and the half-degree temperature codec.

use crate::error::{ClimateError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Power switch (bool).
pub const DP_POWER: &str = "1";
/// Target temperature in half degrees (integer).
pub const DP_TARGET_TEMP: &str = "2";
/// Room temperature in half degrees (integer).
pub const DP_CURRENT_TEMP: &str = "3";
/// Operating mode, `"0"` auto or `"1"` heat (string).
pub const DP_MODE: &str = "4";
/// Child lock (bool).
pub const DP_CHILD_LOCK: &str = "6";
/// Floor sensor temperature in half degrees (integer).
pub const DP_FLOOR_TEMP: &str = "102";

const KEY_DPS: &str = "dps";

/// Encodes degrees Celsius into the device's half-degree units.
pub fn encode_temperature(celsius: f32) -> i64 {
    (celsius * 2.0).round() as i64
}

/// Decodes half-degree units into degrees Celsius.
pub fn decode_temperature(raw: i64) -> f32 {
    raw as f32 / 2.0
}

/// Wire-level device state: point id to JSON value.
///
/// A map only carries the points the device chose to report. Consumers treat a
/// missing or `null` point as "no news" for that point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataPointMap(Map<String, Value>);

impl DataPointMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts the `dps` object from a status payload such as `{"dps": {"1": true}}`.
    pub fn from_status(status: &Value) -> Result<Self> {
        match status.get(KEY_DPS) {
            Some(Value::Object(map)) => Ok(Self(map.clone())),
            Some(other) => Err(ClimateError::InvalidPayload(format!(
                "'{}' is not an object: {}",
                KEY_DPS, other
            ))),
            None => Err(ClimateError::InvalidPayload(format!(
                "missing '{}' in status",
                KEY_DPS
            ))),
        }
    }

    /// Parses a raw JSON status payload.
    pub fn from_status_bytes(payload: &[u8]) -> Result<Self> {
        let status: Value = serde_json::from_slice(payload)?;
        Self::from_status(&status)
    }

    /// Returns the value of a point, treating an explicit `null` as absent.
    pub fn get(&self, point: &str) -> Option<&Value> {
        self.0.get(point).filter(|v| !v.is_null())
    }

    pub fn insert<V: Into<Value>>(&mut self, point: impl Into<String>, value: V) -> Option<Value> {
        self.0.insert(point.into(), value.into())
    }

    pub fn with<V: Into<Value>>(mut self, point: impl Into<String>, value: V) -> Self {
        self.insert(point, value);
        self
    }

    /// Overlays `other` on top of this map; `null` points in `other` are ignored.
    pub fn merge(&mut self, other: &DataPointMap) {
        for (k, v) in other.iter() {
            if !v.is_null() {
                self.0.insert(k.clone(), v.clone());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get_bool(&self, point: &str) -> Option<bool> {
        self.get(point).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, point: &str) -> Option<i64> {
        self.get(point).and_then(Value::as_i64)
    }

    pub fn get_str(&self, point: &str) -> Option<&str> {
        self.get(point).and_then(Value::as_str)
    }

    /// Reads a half-degree point and converts it to degrees Celsius.
    pub fn get_temperature(&self, point: &str) -> Option<f32> {
        self.get_i64(point).map(decode_temperature)
    }

    /// Wraps the points into a `{"dps": {...}}` status payload.
    pub fn to_status(&self) -> Value {
        serde_json::json!({ KEY_DPS: Value::Object(self.0.clone()) })
    }
}

impl From<Map<String, Value>> for DataPointMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Display for DataPointMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}
