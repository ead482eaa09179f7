//! # tuya-climate
//!
//! Local polling client for Tuya thermostats. Keeps a typed mirror of the device's
//! data points, writes commands optimistically, and drops polls while a write is
//! still settling on the device.
//!
//! The Tuya wire protocol itself (framing, encryption) is supplied through the
//! [`Transport`] and [`Connector`] traits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tuya_climate::{ClimateConfig, DeviceStateClient, HvacMode, SimulatedThermostat};
//!
//! # async fn run() -> tuya_climate::Result<()> {
//! let config = ClimateConfig::new("DEVICE_ID", "DEVICE_KEY", "192.168.1.40");
//! let client = DeviceStateClient::connect(&SimulatedThermostat::new(), &config).await?;
//! client.set_mode(HvacMode::Heat).await?;
//! client.set_target_temperature(Some(21.5)).await?;
//! client.poll().await;
//! # Ok(())
//! # }
//! ```
//!
pub mod client;
pub mod config;
pub mod dps;
pub mod error;
mod gate;
pub mod poller;
pub mod sim;
pub mod state;
pub mod transport;

pub use client::{ClientOptions, DeviceStateClient, PollOutcome};
pub use config::ClimateConfig;
pub use dps::DataPointMap;
pub use error::{ClimateError, Result};
pub use gate::Phase;
pub use poller::Poller;
pub use sim::SimulatedThermostat;
pub use state::{DeviceMode, HvacAction, HvacMode, ThermostatState};
pub use transport::{Connector, DeviceAddress, Transport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}
