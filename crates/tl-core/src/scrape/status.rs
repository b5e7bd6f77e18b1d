use chrono::{DateTime, Utc};

use super::classify::StatusClassifier;
use super::extract;
use super::model::{Region, RegionSnapshot, ServerEntry, StatusReport};

const UNKNOWN_SERVER: &str = "Unknown";

/// Builds a report for `regions` from a status page.
///
/// Regions whose container is missing from the page are left out.
pub fn parse_status_page(
    markup: &str,
    regions: &[Region],
    classifier: &dyn StatusClassifier,
    observed_at: DateTime<Utc>,
) -> StatusReport {
    let doc = extract::parse(markup);
    let mut report = StatusReport::new();

    for &region in regions {
        let Some(container) = extract::region_container(&doc, region) else {
            continue;
        };

        let servers = extract::server_items(container)
            .into_iter()
            .map(|item| ServerEntry {
                name: extract::server_name(item).unwrap_or_else(|| UNKNOWN_SERVER.to_string()),
                status: classifier.classify(&extract::server_icon(item).unwrap_or_default()),
            })
            .collect();

        report.insert(
            region,
            RegionSnapshot {
                servers,
                observed_at,
            },
        );
    }

    report
}
