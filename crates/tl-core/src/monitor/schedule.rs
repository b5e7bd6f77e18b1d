use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::monitor::engine::Monitor;
use crate::monitor::state::TickOutcome;

const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);
const DEFAULT_RESET_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Check and reset cadences for [`run_schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSchedule {
    pub check_interval: Duration,
    pub reset_interval: Duration,
}

impl Default for MonitorSchedule {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            reset_interval: DEFAULT_RESET_INTERVAL,
        }
    }
}

impl MonitorSchedule {
    pub fn with_check_interval_secs(mut self, secs: u64) -> Self {
        self.check_interval = Duration::from_secs(secs.max(1));
        self
    }

    pub fn with_reset_interval_secs(mut self, secs: u64) -> Self {
        self.reset_interval = Duration::from_secs(secs.max(1));
        self
    }
}

/// Drive `monitor` until `shutdown` resolves.
///
/// The first check runs immediately; the first reset fires one reset
/// interval after start. When both are due at once the reset runs first.
pub async fn run_schedule<F>(monitor: &mut Monitor, schedule: MonitorSchedule, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut checks = interval(schedule.check_interval);
    checks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut resets = interval_at(
        Instant::now() + schedule.reset_interval,
        schedule.reset_interval,
    );
    resets.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(shutdown);

    info!(
        region = %monitor.region(),
        check_secs = schedule.check_interval.as_secs(),
        reset_secs = schedule.reset_interval.as_secs(),
        "Monitor schedule started"
    );

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = resets.tick() => monitor.reset(),
            _ = checks.tick() => {
                let outcome = monitor.tick().await;
                if !matches!(outcome, TickOutcome::Skipped) {
                    debug!(notified = outcome.notified(), "Scheduled check finished");
                }
            }
        }
    }

    info!(region = %monitor.region(), "Monitor schedule stopped");
}
