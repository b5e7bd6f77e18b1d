use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::scrape::RegionSnapshot;

/// Whether scheduled checks run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    /// Checks run and may notify.
    #[default]
    Active,
    /// Stability was confirmed; checks are skipped until the next reset.
    Suppressed,
}

impl MonitorState {
    /// State after a completed check.
    pub fn after_check(self, all_good: bool) -> MonitorState {
        match (self, all_good) {
            (MonitorState::Active, true) => MonitorState::Suppressed,
            (state, _) => state,
        }
    }

    /// State after the external reset trigger. Always `Active`.
    pub fn after_reset(self) -> MonitorState {
        MonitorState::Active
    }
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Suppressed => write!(f, "suppressed"),
        }
    }
}

/// What a scheduled tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Suppressed: nothing fetched, nothing sent.
    Skipped,
    /// Every server Good; an all-clear was sent and the monitor is now suppressed.
    AllClear(RegionSnapshot),
    /// Some server is not Good; a status notification was sent.
    Degraded(RegionSnapshot),
    /// The check could not complete; nothing sent, state unchanged.
    Failed(Error),
}

impl TickOutcome {
    pub fn notified(&self) -> bool {
        matches!(self, Self::AllClear(_) | Self::Degraded(_))
    }
}
