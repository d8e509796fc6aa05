//! Periodic purge of expired codes.

use crate::registry::OtpRegistry;
use chrono::Utc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Shortest interval the sweeper will tick at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that sweeps expired entries out of a registry.
pub struct Sweeper {
    registry: OtpRegistry,
    interval: Duration,
}

impl Sweeper {
    /// Intervals shorter than [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn new(registry: OtpRegistry, interval: Duration) -> Self {
        let interval = if interval < MIN_SWEEP_INTERVAL {
            warn!(
                "Sweep interval {:?} too short, using {:?}",
                interval, MIN_SWEEP_INTERVAL
            );
            MIN_SWEEP_INTERVAL
        } else {
            interval
        };

        Self { registry, interval }
    }

    /// Run a single sweep cycle.
    pub async fn sweep_once(&self) -> usize {
        let removed = self.registry.sweep(Utc::now()).await;

        if removed > 0 {
            debug!("Swept {} expired verification codes", removed);
        }

        removed
    }

    /// Run the sweeper until the task is aborted.
    pub async fn run(&self) {
        info!("Starting OTP sweeper, interval: {:?}", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Spawn the sweeper as a background task.
///
/// Abort the returned handle to stop it.
pub fn spawn_sweeper(registry: OtpRegistry, interval: Duration) -> tokio::task::JoinHandle<()> {
    let sweeper = Sweeper::new(registry, interval);

    tokio::spawn(async move {
        sweeper.run().await;
    })
}
