use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::format::format_check;
use crate::monitor::state::{MonitorState, TickOutcome};
use crate::scrape::{Region, RegionSnapshot, ServerStatus};
use crate::service::StatusService;
use crate::webhook::{Notification, NotificationKind};

/// Periodic health check of one region with notification suppression.
///
/// The monitor is owned by whatever drives it; `tick` and `reset` take
/// `&mut self`, so two checks can never overlap.
pub struct Monitor {
    service: Arc<StatusService>,
    region: Region,
    state: MonitorState,
    notification_tx: Option<UnboundedSender<Notification>>,
    last_checked: Option<DateTime<Utc>>,
}

impl Monitor {
    pub fn new(
        service: Arc<StatusService>,
        region: Region,
        notification_tx: Option<UnboundedSender<Notification>>,
    ) -> Self {
        Self {
            service,
            region,
            state: MonitorState::Active,
            notification_tx,
            last_checked: None,
        }
    }

    /// Monitor for the service's configured default region.
    pub fn for_default_region(
        service: Arc<StatusService>,
        notification_tx: Option<UnboundedSender<Notification>>,
    ) -> Self {
        let region = service.config().default_region;
        Self::new(service, region, notification_tx)
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    /// Scheduled check. Skipped entirely while suppressed.
    pub async fn tick(&mut self) -> TickOutcome {
        if self.state == MonitorState::Suppressed {
            debug!(region = %self.region, "All servers were in good condition, check skipped");
            return TickOutcome::Skipped;
        }

        self.last_checked = Some(Utc::now());

        let snapshot = match self.check().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(region = %self.region, kind = e.kind(), error = %e, "Server status check failed");
                return TickOutcome::Failed(e);
            }
        };

        for server in &snapshot.servers {
            match server.status {
                ServerStatus::Good => debug!(server = %server.name, "Server is good"),
                ServerStatus::InMaintenance => {
                    warn!(server = %server.name, "Server is in maintenance")
                }
                status => warn!(server = %server.name, %status, "Server is not in good status"),
            }
        }

        let all_good = snapshot.all_good();
        self.state = self.state.after_check(all_good);

        let content = format_check(self.region, &snapshot);
        if all_good {
            info!(region = %self.region, "All servers are in good condition, suppressing checks until reset");
            self.notify(NotificationKind::AllClear, content);
            TickOutcome::AllClear(snapshot)
        } else {
            info!(
                region = %self.region,
                servers = snapshot.servers.len(),
                good = snapshot.count(ServerStatus::Good),
                "Some servers are not in good condition, continuing checks"
            );
            self.notify(NotificationKind::Status, content);
            TickOutcome::Degraded(snapshot)
        }
    }

    /// External reset trigger: resume checks regardless of the current state.
    pub fn reset(&mut self) {
        let previous = self.state;
        self.state = self.state.after_reset();
        info!(region = %self.region, %previous, "Monitor reset");
    }

    async fn check(&self) -> Result<RegionSnapshot, Error> {
        let mut report = self.service.server_status(Some(self.region)).await?;
        match report.remove(&self.region) {
            Some(snapshot) if !snapshot.servers.is_empty() => Ok(snapshot),
            Some(_) => Err(Error::NotFound(format!(
                "No servers listed for region {}",
                self.region
            ))),
            None => Err(Error::NotFound(format!(
                "Region {} not found on status page",
                self.region
            ))),
        }
    }

    fn notify(&self, kind: NotificationKind, content: String) {
        match &self.notification_tx {
            Some(tx) => {
                if tx.send(Notification::new(kind, self.region, content)).is_err() {
                    warn!(region = %self.region, "Notification channel closed, dropping notification");
                }
            }
            None => debug!(region = %self.region, ?kind, "No notification channel configured"),
        }
    }
}
