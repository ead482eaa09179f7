//! In-process thermostat that speaks the [`Transport`] contract.
//!
//! Applies writes to its own data points like the real device would, records all
//! traffic, and can be told to fail or to answer with scripted partial responses.

use crate::dps::{DP_CURRENT_TEMP, DP_MODE, DP_POWER, DP_TARGET_TEMP, DataPointMap};
use crate::error::{ClimateError, Result};
use crate::transport::{Connector, DeviceAddress, Transport};
use log::debug;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::time::{Duration, sleep};

#[derive(Default)]
struct SimState {
    dps: DataPointMap,
    scripted: VecDeque<Result<DataPointMap>>,
    writes: Vec<(String, Value)>,
    reads: usize,
    offline: bool,
    reject_writes: bool,
    read_delay: Duration,
}

/// Shared handle to a simulated device. Clones observe the same device.
#[derive(Clone, Default)]
pub struct SimulatedThermostat {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedThermostat {
    /// A powered thermostat in auto mode, target 21 °C, room 20 °C.
    pub fn new() -> Self {
        Self::with_dps(
            DataPointMap::new()
                .with(DP_POWER, true)
                .with(DP_MODE, "0")
                .with(DP_TARGET_TEMP, 42)
                .with(DP_CURRENT_TEMP, 40),
        )
    }

    pub fn with_dps(dps: DataPointMap) -> Self {
        let sim = Self::default();
        sim.state.lock().dps = dps;
        sim
    }

    /// Changes device-side points, as if someone pressed buttons on the unit.
    pub fn apply(&self, dps: &DataPointMap) {
        self.state.lock().dps.merge(dps);
    }

    pub fn dps(&self) -> DataPointMap {
        self.state.lock().dps.clone()
    }

    /// Answers the next status read with `dps` instead of the full point set.
    pub fn queue_response(&self, dps: DataPointMap) {
        self.state.lock().scripted.push_back(Ok(dps));
    }

    /// Fails the next status read with `err`.
    pub fn queue_failure(&self, err: ClimateError) {
        self.state.lock().scripted.push_back(Err(err));
    }

    /// Offline devices refuse connections, reads and writes.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Makes writes fail while leaving reads working.
    pub fn set_reject_writes(&self, reject: bool) {
        self.state.lock().reject_writes = reject;
    }

    /// Time a status read spends "on the wire".
    pub fn set_read_delay(&self, delay: Duration) {
        self.state.lock().read_delay = delay;
    }

    /// Every point write received, in order.
    pub fn writes(&self) -> Vec<(String, Value)> {
        self.state.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }
}

impl Transport for SimulatedThermostat {
    async fn read_status(&self) -> Result<DataPointMap> {
        let delay = {
            let mut s = self.state.lock();
            s.reads += 1;
            s.read_delay
        };
        if !delay.is_zero() {
            sleep(delay).await;
        }

        let mut s = self.state.lock();
        if s.offline {
            return Err(ClimateError::Offline);
        }
        match s.scripted.pop_front() {
            Some(scripted) => scripted,
            None => Ok(s.dps.clone()),
        }
    }

    async fn write_point(&self, point: &str, value: Value) -> Result<()> {
        let mut s = self.state.lock();
        if s.offline {
            return Err(ClimateError::Offline);
        }
        if s.reject_writes {
            return Err(ClimateError::Timeout);
        }
        debug!("Simulated device applying {}={}", point, value);
        s.writes.push((point.to_string(), value.clone()));
        s.dps.insert(point, value);
        Ok(())
    }
}

impl Connector for SimulatedThermostat {
    type Transport = SimulatedThermostat;

    async fn connect(&self, address: &DeviceAddress) -> Result<Self::Transport> {
        if self.state.lock().offline {
            return Err(ClimateError::ConnectionFailed);
        }
        debug!(
            "Simulated device {} accepting connection on {}",
            address.id(),
            address.ip_address()
        );
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn writes_update_points_and_are_recorded() {
        let sim = SimulatedThermostat::new();
        sim.write_point(DP_TARGET_TEMP, json!(45)).await.unwrap();
        assert_eq!(sim.dps().get_i64(DP_TARGET_TEMP), Some(45));
        assert_eq!(sim.writes(), vec![(DP_TARGET_TEMP.to_string(), json!(45))]);
    }

    #[tokio::test]
    async fn scripted_responses_come_first() {
        let sim = SimulatedThermostat::new();
        sim.queue_response(DataPointMap::new().with(DP_POWER, false));
        sim.queue_failure(ClimateError::Timeout);

        assert_eq!(sim.read_status().await.unwrap().len(), 1);
        assert_eq!(sim.read_status().await, Err(ClimateError::Timeout));
        assert_eq!(sim.read_status().await.unwrap().len(), 4);
        assert_eq!(sim.read_count(), 3);
    }

    #[tokio::test]
    async fn offline_device_refuses_everything() {
        let sim = SimulatedThermostat::new();
        sim.set_offline(true);
        let addr = DeviceAddress::new("sim", "key", "127.0.0.1");
        assert!(matches!(
            sim.connect(&addr).await,
            Err(ClimateError::ConnectionFailed)
        ));
        assert_eq!(sim.read_status().await, Err(ClimateError::Offline));
        assert_eq!(
            sim.write_point(DP_POWER, json!(false)).await,
            Err(ClimateError::Offline)
        );
        assert!(sim.writes().is_empty());
    }
}
