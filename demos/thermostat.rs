/**
 * Thermostat Client Example
 *
 * Drives a simulated thermostat through the same calls a host would make:
 * connect, background polling, mode and temperature commands, and state updates.
 *
 * Run with `RUST_LOG=debug` to see the data point traffic.
 */
use futures_util::StreamExt;
use tokio::time::{Duration, sleep};
use tuya_climate::dps::{DP_CURRENT_TEMP, DP_POWER};
use tuya_climate::{
    ClimateConfig, DataPointMap, DeviceStateClient, HvacMode, Poller, SimulatedThermostat,
};

#[tokio::main]
async fn main() -> tuya_climate::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    println!("--- tuya-climate - Thermostat ---");

    // 1. A device that starts switched off
    let device = SimulatedThermostat::new();
    device.apply(&DataPointMap::new().with(DP_POWER, false));

    let config = ClimateConfig::new("bf0123456789abcdef", "0123456789abcdef", "192.168.1.40")
        .with_name("Bathroom floor")
        .with_scan_interval(Duration::from_secs(1));
    let client = DeviceStateClient::connect(&device, &config).await?;
    println!(
        "[INFO] {} connected: mode={:?}, target={:?}, room={:?}",
        client.unique_id(),
        client.hvac_mode(),
        client.target_temperature(),
        client.current_temperature()
    );

    // 2. Print every state update
    let updates = client.stream();
    tokio::spawn(async move {
        tokio::pin!(updates);
        while let Some(state) = updates.next().await {
            println!(
                "[EVENT] mode={:?} action={:?} target={:?} room={:?}",
                state.hvac_mode(),
                state.hvac_action(),
                state.target_temp,
                state.current_temp
            );
        }
    });

    let poller = Poller::spawn(client.clone(), config.scan_interval());

    // 3. Commands
    println!("[STEP 1] Heat (powers the device on first)...");
    client.set_mode(HvacMode::Heat).await?;

    println!("[STEP 2] Target 22.5 °C (confirmed by the next poll)...");
    client.set_target_temperature(Some(22.5)).await?;
    println!("[INFO] Mirror target right after the write: {:?}", client.target_temperature());
    sleep(Duration::from_secs(2)).await;
    println!("[INFO] Mirror target after polling: {:?}", client.target_temperature());

    println!("[STEP 3] Room warms up to 23 °C...");
    device.apply(&DataPointMap::new().with(DP_CURRENT_TEMP, 46));
    sleep(Duration::from_secs(2)).await;
    println!("[INFO] Action: {:?}", client.hvac_action());

    println!("[STEP 4] Off...");
    client.set_mode(HvacMode::Off).await?;

    poller.stop().await;
    println!("[INFO] Example finished.");
    Ok(())
}
