use futures_util::StreamExt;
use serde_json::json;
use tokio::time::{Duration, Instant};
use tuya_climate::dps::{DP_CURRENT_TEMP, DP_MODE, DP_POWER, DP_TARGET_TEMP};
use tuya_climate::{
    ClientOptions, ClimateConfig, ClimateError, DataPointMap, DeviceMode, DeviceStateClient,
    HvacAction, HvacMode, Phase, PollOutcome, SimulatedThermostat,
};

const SETTLE: Duration = Duration::from_millis(300);

fn thermostat(power: bool, mode: &str) -> SimulatedThermostat {
    SimulatedThermostat::with_dps(
        DataPointMap::new()
            .with(DP_POWER, power)
            .with(DP_MODE, mode)
            .with(DP_TARGET_TEMP, 42)
            .with(DP_CURRENT_TEMP, 40),
    )
}

async fn polled_client(sim: &SimulatedThermostat) -> DeviceStateClient<SimulatedThermostat> {
    let client = DeviceStateClient::new("bf-hall", sim.clone(), ClientOptions::default());
    assert_eq!(client.poll().await, PollOutcome::Updated { changed: true });
    client
}

#[tokio::test(start_paused = true)]
async fn initial_status_decodes_into_mirror() {
    let sim = thermostat(true, "0");
    let client = polled_client(&sim).await;

    assert_eq!(client.power(), Some(true));
    assert_eq!(client.hvac_mode(), Some(HvacMode::Auto));
    assert_eq!(client.target_temperature(), Some(21.0));
    assert_eq!(client.current_temperature(), Some(20.0));
    assert_eq!(client.hvac_action(), Some(HvacAction::Heating));
    assert_eq!(client.floor_temperature(), None);

    assert_eq!(client.poll().await, PollOutcome::Updated { changed: false });
}

#[tokio::test(start_paused = true)]
async fn partial_response_leaves_other_fields() {
    let sim = thermostat(true, "1");
    let client = polled_client(&sim).await;

    sim.queue_response(DataPointMap::new().with(DP_POWER, false));
    assert_eq!(client.poll().await, PollOutcome::Updated { changed: true });

    let state = client.state();
    assert_eq!(state.power, Some(false));
    assert_eq!(state.mode, Some(DeviceMode::Heat));
    assert_eq!(state.target_temp, Some(21.0));
    assert_eq!(state.current_temp, Some(20.0));
    assert_eq!(client.hvac_mode(), Some(HvacMode::Off));
}

#[tokio::test(start_paused = true)]
async fn power_off_when_already_off_sends_nothing() {
    let sim = thermostat(false, "0");
    let client = polled_client(&sim).await;

    let started = Instant::now();
    client.set_power(false).await.unwrap();

    assert!(sim.writes().is_empty());
    assert!(started.elapsed() >= SETTLE);
    assert_eq!(client.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn heat_on_powered_off_device_turns_power_on_first() {
    let sim = thermostat(false, "0");
    let client = polled_client(&sim).await;

    client.set_mode(HvacMode::Heat).await.unwrap();

    assert_eq!(
        sim.writes(),
        vec![
            (DP_POWER.to_string(), json!(true)),
            (DP_MODE.to_string(), json!("1")),
        ]
    );
    assert_eq!(client.power(), Some(true));
    assert_eq!(client.state().mode, Some(DeviceMode::Heat));
    assert_eq!(client.hvac_mode(), Some(HvacMode::Heat));
}

#[tokio::test(start_paused = true)]
async fn same_mode_on_powered_device_sends_nothing() {
    let sim = thermostat(true, "0");
    let client = polled_client(&sim).await;

    client.set_mode(HvacMode::Auto).await.unwrap();
    assert!(sim.writes().is_empty());

    client.set_mode(HvacMode::Heat).await.unwrap();
    assert_eq!(sim.writes(), vec![(DP_MODE.to_string(), json!("1"))]);
}

#[tokio::test(start_paused = true)]
async fn off_mode_is_a_power_write() {
    let sim = thermostat(true, "1");
    let client = polled_client(&sim).await;

    client.set_mode(HvacMode::Off).await.unwrap();

    assert_eq!(sim.writes(), vec![(DP_POWER.to_string(), json!(false))]);
    assert_eq!(client.hvac_mode(), Some(HvacMode::Off));
    assert_eq!(client.state().mode, Some(DeviceMode::Heat));
}

#[tokio::test(start_paused = true)]
async fn target_temperature_waits_for_poll_confirmation() {
    let sim = thermostat(true, "1");
    let client = polled_client(&sim).await;

    client.set_target_temperature(Some(21.5)).await.unwrap();

    assert_eq!(sim.writes(), vec![(DP_TARGET_TEMP.to_string(), json!(43))]);
    assert_eq!(client.target_temperature(), Some(21.0));

    assert_eq!(client.poll().await, PollOutcome::Updated { changed: true });
    assert_eq!(client.target_temperature(), Some(21.5));
    assert_eq!(client.hvac_action(), Some(HvacAction::Heating));
}

#[tokio::test(start_paused = true)]
async fn absent_target_temperature_is_a_no_op() {
    let sim = thermostat(true, "1");
    let client = polled_client(&sim).await;

    let started = Instant::now();
    client.set_target_temperature(None).await.unwrap();

    assert!(sim.writes().is_empty());
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_target_is_rejected_before_writing() {
    let sim = thermostat(true, "1");
    let client = polled_client(&sim).await;

    let err = client.set_target_temperature(Some(35.0)).await.unwrap_err();
    assert_eq!(
        err,
        ClimateError::OutOfRange {
            value: 35.0,
            min: 7.0,
            max: 30.0
        }
    );
    assert!(matches!(
        client.set_target_temperature(Some(f32::NAN)).await,
        Err(ClimateError::OutOfRange { .. })
    ));
    assert!(sim.writes().is_empty());
    assert_eq!(client.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn poll_during_settle_is_dropped() {
    let sim = thermostat(true, "0");
    let client = polled_client(&sim).await;
    sim.queue_response(DataPointMap::new().with(DP_TARGET_TEMP, 50));

    let (write, polled) = tokio::join!(client.set_power(true), client.poll());

    write.unwrap();
    assert_eq!(polled, PollOutcome::Skipped);
    assert_eq!(sim.read_count(), 1);
    assert_eq!(client.target_temperature(), Some(21.0));

    // The scripted response is still waiting for the next real poll.
    assert_eq!(client.poll().await, PollOutcome::Updated { changed: true });
    assert_eq!(client.target_temperature(), Some(25.0));
}

#[tokio::test(start_paused = true)]
async fn response_in_transit_does_not_override_optimistic_write() {
    let sim = thermostat(true, "0");
    let client = polled_client(&sim).await;
    sim.set_read_delay(Duration::from_millis(100));

    let (polled, write) = tokio::join!(client.poll(), client.set_power(false));

    write.unwrap();
    assert_eq!(polled, PollOutcome::Skipped);
    assert_eq!(sim.read_count(), 2);
    assert_eq!(client.power(), Some(false));
    assert_eq!(sim.writes(), vec![(DP_POWER.to_string(), json!(false))]);
}

#[tokio::test(start_paused = true)]
async fn gate_stays_busy_for_the_settle_delay() {
    let sim = thermostat(true, "1");
    let client = polled_client(&sim).await;

    let started = Instant::now();
    let writer = client.clone();
    let handle = tokio::spawn(async move { writer.set_target_temperature(Some(22.0)).await });
    while client.phase() == Phase::Idle {
        tokio::task::yield_now().await;
    }

    assert_eq!(client.poll().await, PollOutcome::Skipped);
    handle.await.unwrap().unwrap();
    assert!(started.elapsed() >= SETTLE);
    assert_eq!(client.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn concurrent_commands_are_serialized() {
    let sim = thermostat(true, "0");
    let client = polled_client(&sim).await;

    let started = Instant::now();
    let (a, b) = tokio::join!(
        client.set_mode(HvacMode::Heat),
        client.set_target_temperature(Some(23.0))
    );
    a.unwrap();
    b.unwrap();

    assert!(started.elapsed() >= SETTLE * 2);
    assert_eq!(
        sim.writes(),
        vec![
            (DP_MODE.to_string(), json!("1")),
            (DP_TARGET_TEMP.to_string(), json!(46)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn write_failure_is_reported_and_gate_released() {
    let sim = thermostat(true, "0");
    let client = polled_client(&sim).await;
    sim.set_reject_writes(true);

    let started = Instant::now();
    let err = client.set_power(false).await.unwrap_err();

    assert_eq!(err, ClimateError::Timeout);
    assert!(started.elapsed() >= SETTLE);
    assert_eq!(client.phase(), Phase::Idle);
    assert_eq!(client.power(), Some(true));

    // A failed power-on stops set_mode before the mode write.
    sim.queue_response(DataPointMap::new().with(DP_POWER, false));
    client.poll().await;
    assert!(client.set_mode(HvacMode::Heat).await.is_err());
    assert_eq!(client.state().mode, Some(DeviceMode::Auto));

    sim.set_reject_writes(false);
    assert!(matches!(client.poll().await, PollOutcome::Updated { .. }));
}

#[tokio::test(start_paused = true)]
async fn failed_poll_keeps_last_known_state() {
    let sim = thermostat(true, "1");
    let client = polled_client(&sim).await;
    let before = client.state();

    sim.queue_failure(ClimateError::Offline);
    assert_eq!(client.poll().await, PollOutcome::Failed(ClimateError::Offline));
    assert_eq!(client.state(), before);

    sim.set_offline(true);
    assert!(matches!(client.poll().await, PollOutcome::Failed(_)));
    assert_eq!(client.state(), before);
}

#[tokio::test(start_paused = true)]
async fn stream_reports_commands_and_changes() {
    let sim = thermostat(true, "0");
    let client = polled_client(&sim).await;
    let stream = client.stream();
    tokio::pin!(stream);

    client.set_power(false).await.unwrap();
    let snapshot = stream.next().await.unwrap();
    assert_eq!(snapshot.power, Some(false));

    sim.apply(&DataPointMap::new().with(DP_CURRENT_TEMP, 44));
    client.poll().await;
    let snapshot = stream.next().await.unwrap();
    assert_eq!(snapshot.current_temp, Some(22.0));
    assert_eq!(snapshot.hvac_action(), Some(HvacAction::Idle));
}

#[tokio::test(start_paused = true)]
async fn connect_reads_initial_status() {
    let sim = thermostat(true, "1");
    let config = ClimateConfig::new("bf-hall", "0123456789abcdef", "192.168.1.40")
        .with_name("Hall")
        .with_temp_range(5.0, 35.0);

    let client = DeviceStateClient::connect(&sim, &config).await.unwrap();

    assert_eq!(client.id(), "bf-hall");
    assert_eq!(client.unique_id(), "Hall_climate");
    assert_eq!(client.hvac_mode(), Some(HvacMode::Heat));
    assert_eq!(client.max_temp(), 35.0);
    assert_eq!(client.temperature_unit(), "°C");
    assert_eq!(client.hvac_modes().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn connect_tolerates_failed_initial_read() {
    let sim = thermostat(true, "1");
    sim.queue_failure(ClimateError::Timeout);
    let config = ClimateConfig::new("bf-hall", "0123456789abcdef", "192.168.1.40");

    let client = DeviceStateClient::connect(&sim, &config).await.unwrap();
    assert_eq!(client.power(), None);
    assert_eq!(client.hvac_mode(), Some(HvacMode::Off));
    assert_eq!(client.hvac_action(), None);

    sim.set_offline(true);
    assert!(matches!(
        DeviceStateClient::connect(&sim, &config).await,
        Err(ClimateError::ConnectionFailed)
    ));

    let bad = ClimateConfig::new("", "0123456789abcdef", "192.168.1.40");
    assert!(matches!(
        DeviceStateClient::connect(&sim, &bad).await,
        Err(ClimateError::InvalidConfig(_))
    ));
}
