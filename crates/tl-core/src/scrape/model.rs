use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Server region as keyed on the status page (`data-regionid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Europe,
    America,
    Asia,
    Japan,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Europe, Region::America, Region::Asia, Region::Japan];

    /// Canonical key used by the status page.
    pub fn key(self) -> &'static str {
        match self {
            Self::Europe => "europe",
            Self::America => "america",
            Self::Asia => "asia",
            Self::Japan => "japan",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidRegion(s.to_string()))
    }
}

/// Health of a single server. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Good,
    Busy,
    Full,
    InMaintenance,
    Unknown,
}

impl ServerStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "🟢 Good",
            Self::Busy => "🟡 Busy",
            Self::Full => "🔴 Full",
            Self::InMaintenance => "🔵 In Maintenance",
            Self::Unknown => "⚪ Unknown",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    pub status: ServerStatus,
}

/// Point-in-time read of one region. Servers keep page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSnapshot {
    pub servers: Vec<ServerEntry>,
    pub observed_at: DateTime<Utc>,
}

impl RegionSnapshot {
    /// True only when at least one server is listed and every one is Good.
    pub fn all_good(&self) -> bool {
        !self.servers.is_empty() && self.servers.iter().all(|s| s.status == ServerStatus::Good)
    }

    pub fn count(&self, status: ServerStatus) -> usize {
        self.servers.iter().filter(|s| s.status == status).count()
    }
}

/// Snapshots keyed by region, iterated in region declaration order.
pub type StatusReport = BTreeMap<Region, RegionSnapshot>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub link: String,
    pub title: String,
    pub category: String,
    pub description: String,
}

impl Article {
    pub fn in_category(&self, category: &str) -> bool {
        self.category.to_lowercase() == category.to_lowercase()
    }
}
