//! Usage snapshot reported alongside every session view and action result.

use super::{Session, SessionSnapshot};
use serde::{Deserialize, Serialize};

/// Point-in-time view of a session's quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Successful actions so far.
    pub used: u32,

    /// Free actions per session.
    pub quota: u32,

    /// Free actions left.
    pub remaining: u32,

    /// Upgrade link, present only once the quota is exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_url: Option<String>,
}

impl UsageSnapshot {
    pub fn new(used: u32, quota: u32, upgrade_url: &str) -> Self {
        let remaining = quota.saturating_sub(used);
        Self {
            used,
            quota,
            remaining,
            upgrade_url: (remaining == 0).then(|| upgrade_url.to_string()),
        }
    }

    pub fn from_session(session: &Session, upgrade_url: &str) -> Self {
        Self::new(session.usage_count(), session.quota(), upgrade_url)
    }

    pub fn from_snapshot(snapshot: &SessionSnapshot, upgrade_url: &str) -> Self {
        Self::new(snapshot.usage_count, snapshot.quota, upgrade_url)
    }
}
