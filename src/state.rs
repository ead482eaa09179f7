//! Typed mirror of the thermostat and the modes derived from it.

use crate::dps::{
    DP_CHILD_LOCK, DP_CURRENT_TEMP, DP_FLOOR_TEMP, DP_MODE, DP_POWER, DP_TARGET_TEMP,
    DataPointMap,
};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const MODE_AUTO: &str = "0";
const MODE_HEAT: &str = "1";

/// Operating program stored on the device (point "4").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    /// Follows the device's internal schedule.
    Auto,
    /// Manual heating to the target temperature.
    Heat,
}

impl DeviceMode {
    /// Wire value written to the mode point.
    pub fn as_dp(&self) -> &'static str {
        match self {
            DeviceMode::Auto => MODE_AUTO,
            DeviceMode::Heat => MODE_HEAT,
        }
    }

    /// Anything other than `"0"` is reported by the device as manual heating.
    pub fn from_dp(value: &str) -> Self {
        if value == MODE_AUTO {
            DeviceMode::Auto
        } else {
            DeviceMode::Heat
        }
    }
}

/// Mode as presented to the host. `Off` has no data point of its own; it is the power
/// switch being off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    Auto,
    Heat,
    Off,
}

impl HvacMode {
    pub const ALL: [HvacMode; 3] = [HvacMode::Auto, HvacMode::Heat, HvacMode::Off];

    pub fn device_mode(&self) -> Option<DeviceMode> {
        match self {
            HvacMode::Auto => Some(DeviceMode::Auto),
            HvacMode::Heat => Some(DeviceMode::Heat),
            HvacMode::Off => None,
        }
    }
}

impl From<DeviceMode> for HvacMode {
    fn from(mode: DeviceMode) -> Self {
        match mode {
            DeviceMode::Auto => HvacMode::Auto,
            DeviceMode::Heat => HvacMode::Heat,
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HvacMode::Auto => "auto",
            HvacMode::Heat => "heat",
            HvacMode::Off => "off",
        };
        f.write_str(s)
    }
}

/// What the heater is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacAction {
    Heating,
    Idle,
}

/// Local mirror of the thermostat's data points.
///
/// Every field stays `None` until the device reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermostatState {
    pub power: Option<bool>,
    pub mode: Option<DeviceMode>,
    pub target_temp: Option<f32>,
    pub current_temp: Option<f32>,
    pub floor_temp: Option<f32>,
    pub child_lock: Option<bool>,
}

impl ThermostatState {
    /// Builds a fresh mirror from a single status response.
    pub fn from_dps(dps: &DataPointMap) -> Self {
        let mut state = Self::default();
        state.merge(dps);
        state
    }

    /// Applies the points present in `dps`, leaving every other field as it was.
    /// Returns whether anything changed.
    pub fn merge(&mut self, dps: &DataPointMap) -> bool {
        let before = self.clone();

        if let Some(value) = dps.get(DP_POWER) {
            match value.as_bool() {
                Some(on) => self.power = Some(on),
                None => debug!("Ignoring non-boolean power point: {}", value),
            }
        }
        if let Some(value) = dps.get(DP_MODE) {
            match value {
                Value::String(s) => self.mode = Some(DeviceMode::from_dp(s)),
                other => debug!("Ignoring non-string mode point: {}", other),
            }
        }
        merge_temperature(&mut self.target_temp, dps, DP_TARGET_TEMP);
        merge_temperature(&mut self.current_temp, dps, DP_CURRENT_TEMP);
        merge_temperature(&mut self.floor_temp, dps, DP_FLOOR_TEMP);
        if let Some(lock) = dps.get_bool(DP_CHILD_LOCK) {
            self.child_lock = Some(lock);
        }

        *self != before
    }

    pub fn is_on(&self) -> bool {
        self.power == Some(true)
    }

    /// Stored mode while powered, `Off` otherwise.
    pub fn hvac_mode(&self) -> Option<HvacMode> {
        if self.is_on() {
            self.mode.map(HvacMode::from)
        } else {
            Some(HvacMode::Off)
        }
    }

    /// Heating whenever the target is above the room temperature. There is no deadband.
    pub fn hvac_action(&self) -> Option<HvacAction> {
        match (self.target_temp, self.current_temp) {
            (Some(target), Some(current)) if target > current => Some(HvacAction::Heating),
            (Some(_), Some(_)) => Some(HvacAction::Idle),
            _ => None,
        }
    }
}

fn merge_temperature(field: &mut Option<f32>, dps: &DataPointMap, point: &str) {
    if let Some(value) = dps.get(point) {
        match dps.get_temperature(point) {
            Some(t) => *field = Some(t),
            None => debug!("Ignoring non-integer temperature point {}: {}", point, value),
        }
    }
}
