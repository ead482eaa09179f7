//! Device state client for one thermostat.
//! Mirrors the device's data points locally, issues writes, and reconciles polls with
//! writes that are still settling on the device.

use crate::config::{ClimateConfig, DEFAULT_SETTLE_DELAY, MAX_TEMP, MIN_TEMP};
use crate::dps::{DP_MODE, DP_POWER, DP_TARGET_TEMP, encode_temperature};
use crate::error::{ClimateError, Result};
use crate::gate::{Phase, WriteGate, WriteTicket};
use crate::state::{DeviceMode, HvacAction, HvacMode, ThermostatState};
use crate::transport::{Connector, Transport};
use futures_core::stream::Stream;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, sleep};

pub const TEMPERATURE_UNIT: &str = "°C";

/// Result of one [`DeviceStateClient::poll`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The status was read and merged into the mirror.
    Updated { changed: bool },
    /// A write was in flight, so nothing was read or merged.
    Skipped,
    /// The device could not be read; the mirror is unchanged until the next poll.
    Failed(ClimateError),
}

/// Behaviour knobs that do not identify the device.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub name: String,
    pub settle_delay: Duration,
    pub min_temp: f32,
    pub max_temp: f32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            name: crate::config::DEFAULT_NAME.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            min_temp: MIN_TEMP,
            max_temp: MAX_TEMP,
        }
    }
}

impl From<&ClimateConfig> for ClientOptions {
    fn from(config: &ClimateConfig) -> Self {
        Self {
            name: config.name.clone(),
            settle_delay: config.settle_delay(),
            min_temp: config.min_temp,
            max_temp: config.max_temp,
        }
    }
}

struct Inner<T> {
    id: String,
    transport: T,
    options: ClientOptions,
    state: RwLock<ThermostatState>,
    gate: WriteGate,
    updates_tx: broadcast::Sender<ThermostatState>,
}

/// Client for a single Tuya thermostat.
///
/// Cloning is cheap; clones share the connection, the mirror and the write gate.
pub struct DeviceStateClient<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for DeviceStateClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> DeviceStateClient<T> {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Wraps an already open transport. No status is read yet.
    pub fn new(id: impl Into<String>, transport: T, options: ClientOptions) -> Self {
        let (updates_tx, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Inner {
                id: id.into(),
                transport,
                options,
                state: RwLock::new(ThermostatState::default()),
                gate: WriteGate::new(),
                updates_tx,
            }),
        }
    }

    /// Connects to the configured device and performs the initial status read.
    ///
    /// A failed initial read is tolerated; the mirror fills in on a later poll.
    pub async fn connect<C>(connector: &C, config: &ClimateConfig) -> Result<Self>
    where
        C: Connector<Transport = T>,
    {
        config.validate()?;
        let address = config.address();
        info!(
            "Connecting to thermostat {} at {} (v{})",
            address.id(),
            address.ip_address(),
            address.version()
        );
        let transport = connector.connect(&address).await?;
        let client = Self::new(address.id(), transport, ClientOptions::from(config));
        if let PollOutcome::Failed(e) = client.poll().await {
            warn!("Initial status read for {} failed: {}", client.id(), e);
        }
        Ok(client)
    }

    // -------------------------------------------------------------------------
    // Polling
    // -------------------------------------------------------------------------

    /// Reads the full status and merges it into the mirror.
    ///
    /// Dropped while a write is queued, in flight or settling. Read failures are
    /// logged and reported in the outcome, never retried.
    pub async fn poll(&self) -> PollOutcome {
        if self.phase() == Phase::Busy {
            debug!("Skipping poll for {}: write in flight", self.id());
            return PollOutcome::Skipped;
        }
        let Some(_exchange) = self.inner.gate.try_exchange() else {
            debug!("Skipping poll for {}: link busy", self.id());
            return PollOutcome::Skipped;
        };

        match self.inner.transport.read_status().await {
            Ok(dps) => {
                debug!("Status from {}: {}", self.id(), dps);
                // A writer queued up while the read was in transit; its optimistic
                // update wins over whatever this response says.
                if self.phase() == Phase::Busy {
                    debug!("Discarding status for {}: write pending", self.id());
                    return PollOutcome::Skipped;
                }
                let changed = self.inner.state.write().merge(&dps);
                if changed {
                    self.notify();
                }
                PollOutcome::Updated { changed }
            }
            Err(e) => {
                warn!(
                    "Can't get data from {}: {}. Retrying in next interval",
                    self.id(),
                    e
                );
                PollOutcome::Failed(e)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Switches the thermostat on or off.
    ///
    /// Nothing is sent if the mirror already shows the requested state, but the gate
    /// is still held for the settle delay.
    pub async fn set_power(&self, on: bool) -> Result<()> {
        let ticket = self.inner.gate.acquire().await;
        let result = self.write_power(on).await;
        self.settle(ticket, result).await
    }

    /// Selects a mode. `Off` is the power switch; any other mode implies power on.
    pub async fn set_mode(&self, mode: HvacMode) -> Result<()> {
        let Some(device_mode) = mode.device_mode() else {
            return self.set_power(false).await;
        };

        let ticket = self.inner.gate.acquire().await;
        let result = async {
            self.write_power(true).await?;
            self.write_mode(device_mode).await
        }
        .await;
        self.settle(ticket, result).await
    }

    /// Sends a new target temperature. `None` does nothing.
    ///
    /// The mirror keeps the old target until a poll reports the new one.
    pub async fn set_target_temperature(&self, celsius: Option<f32>) -> Result<()> {
        let Some(celsius) = celsius else {
            return Ok(());
        };
        let (min, max) = (self.min_temp(), self.max_temp());
        if !(min..=max).contains(&celsius) {
            return Err(ClimateError::OutOfRange {
                value: celsius,
                min,
                max,
            });
        }

        let ticket = self.inner.gate.acquire().await;
        let raw = encode_temperature(celsius);
        let result = self.write(DP_TARGET_TEMP, Value::from(raw)).await;
        if result.is_ok() {
            info!("Target temperature of {} set to {}", self.id(), celsius);
        }
        self.settle(ticket, result).await
    }

    async fn write_power(&self, on: bool) -> Result<()> {
        let current = self.inner.state.read().power;
        if current == Some(on) {
            debug!("Power of {} already {}", self.id(), on);
            return Ok(());
        }
        self.write(DP_POWER, Value::Bool(on)).await?;
        self.inner.state.write().power = Some(on);
        info!("Power of {} set to {}", self.id(), on);
        Ok(())
    }

    async fn write_mode(&self, mode: DeviceMode) -> Result<()> {
        let current = self.inner.state.read().mode;
        if current == Some(mode) {
            debug!("Mode of {} already {:?}", self.id(), mode);
            return Ok(());
        }
        self.write(DP_MODE, Value::from(mode.as_dp())).await?;
        self.inner.state.write().mode = Some(mode);
        info!("Mode of {} set to {:?}", self.id(), mode);
        Ok(())
    }

    async fn write(&self, point: &str, value: Value) -> Result<()> {
        debug!("Writing {}={} to {}", point, value, self.id());
        self.inner
            .transport
            .write_point(point, value)
            .await
            .inspect_err(|e| warn!("Write of point {} to {} failed: {}", point, self.id(), e))
    }

    /// Holds the gate for the settle delay whatever the write's result was.
    async fn settle(&self, ticket: WriteTicket<'_>, result: Result<()>) -> Result<()> {
        sleep(self.inner.options.settle_delay).await;
        drop(ticket);
        self.notify();
        result
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.options.name
    }

    pub fn unique_id(&self) -> String {
        format!("{}_climate", self.name())
    }

    pub fn phase(&self) -> Phase {
        self.inner.gate.phase()
    }

    /// Snapshot of the mirror.
    pub fn state(&self) -> ThermostatState {
        self.inner.state.read().clone()
    }

    pub fn power(&self) -> Option<bool> {
        self.inner.state.read().power
    }

    pub fn hvac_mode(&self) -> Option<HvacMode> {
        self.inner.state.read().hvac_mode()
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        &HvacMode::ALL
    }

    pub fn hvac_action(&self) -> Option<HvacAction> {
        self.inner.state.read().hvac_action()
    }

    pub fn target_temperature(&self) -> Option<f32> {
        self.inner.state.read().target_temp
    }

    pub fn current_temperature(&self) -> Option<f32> {
        self.inner.state.read().current_temp
    }

    pub fn floor_temperature(&self) -> Option<f32> {
        self.inner.state.read().floor_temp
    }

    pub fn child_lock(&self) -> Option<bool> {
        self.inner.state.read().child_lock
    }

    pub fn min_temp(&self) -> f32 {
        self.inner.options.min_temp
    }

    pub fn max_temp(&self) -> f32 {
        self.inner.options.max_temp
    }

    pub fn temperature_unit(&self) -> &'static str {
        TEMPERATURE_UNIT
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    /// Returns a Stream of state snapshots, one after every state-changing poll and
    /// after every command.
    pub fn stream(&self) -> impl Stream<Item = ThermostatState> + Send + 'static {
        let mut rx = self.inner.updates_tx.subscribe();
        let id = self.inner.id.clone();
        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(state) => yield state,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!("State stream for {} lagged by {} updates", id, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    fn notify(&self) {
        let _ = self.inner.updates_tx.send(self.state());
    }
}
