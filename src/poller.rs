//! Background polling task.
//!
//! Stands in for the host's update cycle: calls [`DeviceStateClient::poll`] on a fixed
//! interval until stopped.

use crate::client::{DeviceStateClient, PollOutcome};
use crate::transport::Transport;
use log::{debug, info};
use rand::RngCore;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

const MAX_START_JITTER: Duration = Duration::from_secs(5);

/// Handle to a running poll loop. Dropping it leaves the loop running; use
/// [`stop`](Self::stop) to end it.
pub struct Poller {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Starts polling `client` every `interval`.
    ///
    /// The first poll happens after a random delay of up to five seconds (never more
    /// than one interval) so several thermostats do not hit the network together.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn spawn<T: Transport>(client: DeviceStateClient<T>, interval: Duration) -> Self {
        let jitter = start_jitter(interval);
        Self::spawn_at(client, interval, Instant::now() + jitter)
    }

    /// Starts polling `client` every `interval`, first at `start`.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn spawn_at<T: Transport>(
        client: DeviceStateClient<T>,
        interval: Duration,
        start: Instant,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let mut ticker = interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let handle = tokio::spawn(async move {
            info!(
                "Polling {} every {}s",
                client.id(),
                interval.as_secs_f32()
            );
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        match client.poll().await {
                            PollOutcome::Updated { changed } => {
                                debug!("Poll of {} done (changed: {})", client.id(), changed)
                            }
                            PollOutcome::Skipped => {}
                            // Already logged by the client; wait for the next tick.
                            PollOutcome::Failed(_) => {}
                        }
                    }
                }
            }
            debug!("Poll loop for {} exited", client.id());
        });
        Self {
            cancel_token,
            handle,
        }
    }

    /// Signals the loop to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the loop and waits for it to exit. A poll already in progress finishes first.
    pub async fn stop(self) {
        self.cancel_token.cancel();
        let _ = self.handle.await;
    }
}

fn start_jitter(interval: Duration) -> Duration {
    let max_ms = interval.min(MAX_START_JITTER).as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let mut rng = rand::rng();
    Duration::from_millis(rng.next_u64() % max_ms)
}
