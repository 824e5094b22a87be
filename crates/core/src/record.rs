use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PathPrefix, ResourceId, Token};

/// What a token grants: one resource, reachable under one path prefix.
///
/// This is the value persisted in the token store. The expiry lives next to
/// it in the store entry so backends can purge without decoding the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The file to deliver.
    pub resource: ResourceId,
    /// The prefix the token must be requested under.
    pub path: PathPrefix,
}

/// A fully resolved redemption right, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub token: Token,
    pub record: TokenRecord,
    pub expires_at: DateTime<Utc>,
}

impl Grant {
    /// Whether the grant can still be redeemed at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
