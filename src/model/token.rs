//! Access tokens - short-lived secondary credentials for one asset

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A token that unlocks one asset until its expiry
///
/// Validity depends on the current time, so it is never cached: callers pass
/// "now" in and every read re-checks it. Expired tokens are not removed, they
/// just stop working.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetToken {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Expiry as a unix timestamp (seconds)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub expiry: i64,
    /// The asset this token refers to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asset_id: String,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl AssetToken {
    /// Issue a fresh token for `asset_id` that expires `ttl` after `now`
    pub fn issue(asset_id: impl Into<String>, ttl: Duration, now: i64) -> Self {
        AssetToken {
            token: uuid::Uuid::new_v4().to_string(),
            expiry: now.saturating_add(ttl.as_secs() as i64),
            asset_id: asset_id.into(),
        }
    }

    /// True if both identifiers are set and the expiry is strictly after `now`
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.asset_id.is_empty() && !self.token.is_empty() && now < self.expiry
    }

    /// The token carries no credential at all
    pub fn is_empty(&self) -> bool {
        self.token.is_empty() && self.asset_id.is_empty() && self.expiry == 0
    }
}
