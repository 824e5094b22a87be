use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use dropgate_core::{
    FieldNames, Grant, PathPrefix, RequestTarget, Submission, SubmissionDefaults, TokenRecord,
};
use dropgate_state::{KeyKind, StateKey, StateStore, StoredValue};

use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;
use crate::resolver::{ResolvedResource, ResourceResolver};

/// Outcome of a redemption attempt on a claimed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// The token was consumed; deliver this file.
    Deliver(ResolvedResource),
    /// Nothing to deliver. Every failure reason looks the same to the client.
    NotFound,
}

/// Entries removed by one maintenance sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub tokens_removed: u64,
    pub paths_removed: u64,
}

impl SweepReport {
    /// Total number of entries removed.
    pub fn total(&self) -> u64 {
        self.tokens_removed + self.paths_removed
    }
}

/// Issues one-time download tokens, redeems them and sweeps expired ones.
///
/// Every method that depends on the current time has an `_at` variant taking
/// `now` explicitly; the plain variant uses [`Utc::now`].
pub struct Gateway {
    pub(crate) state: Arc<dyn StateStore>,
    pub(crate) resolver: Arc<dyn ResourceResolver>,
    pub(crate) defaults: SubmissionDefaults,
    pub(crate) field_names: FieldNames,
    pub(crate) metrics: Arc<GatewayMetrics>,
}

impl Gateway {
    /// Record a grant for a parsed submission.
    pub async fn submit(&self, submission: &Submission) -> Result<Grant, GatewayError> {
        self.submit_at(submission, Utc::now()).await
    }

    /// Record a grant for a parsed submission issued at `now`.
    ///
    /// Writes the token entry, then raises the path index entry for the
    /// grant's prefix to the grant's expiry if it is lower or absent.
    #[instrument(skip_all, fields(resource = %submission.resource))]
    pub async fn submit_at(
        &self,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<Grant, GatewayError> {
        let grant = submission.grant(&self.defaults, now);
        let value = serde_json::to_string(&grant.record)
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;
        let expires_at = grant.expires_at.timestamp_millis();

        self.state
            .put(&StateKey::token(&grant.token), &StoredValue::new(value, expires_at))
            .await?;
        self.state
            .raise_expiry(&StateKey::path(&grant.record.path), expires_at)
            .await?;

        self.metrics.increment_submissions_accepted();
        info!(
            token = %grant.token.masked(),
            resource = %grant.record.resource,
            prefix = %grant.record.path,
            expires_at = %grant.expires_at,
            "download token granted"
        );
        if !grant.is_live_at(now) {
            debug!(prefix = %grant.record.path, "granted token is already expired");
        }
        Ok(grant)
    }

    /// Handle raw submission fields. See [`Gateway::handle_fields_at`].
    pub async fn handle_fields(
        &self,
        fields: &HashMap<String, String>,
    ) -> Result<Option<Grant>, GatewayError> {
        self.handle_fields_at(fields, Utc::now()).await
    }

    /// Extract a submission from raw form fields and record it.
    ///
    /// A submission without a usable token or resource is ignored and
    /// yields `Ok(None)`; only store failures are errors.
    pub async fn handle_fields_at(
        &self,
        fields: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<Option<Grant>, GatewayError> {
        match Submission::from_fields(fields, &self.field_names) {
            Ok(submission) => self.submit_at(&submission, now).await.map(Some),
            Err(reason) => {
                self.metrics.increment_submissions_ignored();
                debug!(%reason, "submission ignored");
                Ok(None)
            }
        }
    }

    /// Whether requests under `prefix` belong to the gateway.
    ///
    /// A prefix is claimed while its path index entry exists, whether or not
    /// it has expired yet.
    pub async fn is_claimed(&self, prefix: &PathPrefix) -> Result<bool, GatewayError> {
        Ok(self.state.get(&StateKey::path(prefix)).await?.is_some())
    }

    /// Redeem the token addressed by `target`. See [`Gateway::redeem_at`].
    pub async fn redeem(&self, target: &RequestTarget) -> Result<Redemption, GatewayError> {
        self.redeem_at(target, Utc::now()).await
    }

    /// Validate and consume the token addressed by `target`.
    ///
    /// The token must exist, be unexpired at `now`, and have been granted
    /// for the requested prefix. It is then removed with a compare-and-delete
    /// so that, of several concurrent redeemers, exactly one proceeds. A
    /// consumed token whose resource no longer resolves is still consumed.
    #[instrument(skip_all, fields(prefix = %target.prefix, token = %target.token.masked()))]
    pub async fn redeem_at(
        &self,
        target: &RequestTarget,
        now: DateTime<Utc>,
    ) -> Result<Redemption, GatewayError> {
        if !target.token.is_addressable() {
            return Ok(self.reject("empty token"));
        }

        let key = StateKey::token(&target.token);
        let Some(entry) = self.state.get(&key).await? else {
            return Ok(self.reject("unknown token"));
        };
        if entry.is_expired_at(now.timestamp_millis()) {
            return Ok(self.reject("token expired"));
        }

        let record: TokenRecord = match serde_json::from_str(&entry.value) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "undecodable token record");
                return Ok(self.reject("undecodable record"));
            }
        };
        if record.path != target.prefix {
            return Ok(self.reject("prefix mismatch"));
        }

        if !self.state.compare_and_delete(&key, &entry).await? {
            return Ok(self.reject("token already redeemed"));
        }

        let Some(resource) = self.resolver.resolve(&record.resource).await else {
            warn!(resource = %record.resource, "redeemed token names a missing resource");
            return Ok(self.reject("resource missing"));
        };

        self.metrics.increment_redemptions();
        info!(resource = %record.resource, file = %resource.file_name, "token redeemed");
        Ok(Redemption::Deliver(resource))
    }

    fn reject(&self, reason: &'static str) -> Redemption {
        self.metrics.increment_rejections();
        debug!(reason, "redemption rejected");
        Redemption::NotFound
    }

    /// Remove expired entries. See [`Gateway::sweep_at`].
    pub async fn sweep(&self) -> Result<SweepReport, GatewayError> {
        self.sweep_at(Utc::now()).await
    }

    /// Remove every token and path entry whose expiry is at or before `now`.
    ///
    /// Idempotent. Each removal is atomic per key in the store, so the sweep
    /// can run alongside submissions and redemptions.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, GatewayError> {
        let now = now.timestamp_millis();
        let tokens_removed = self.state.purge_expired(&KeyKind::Token, now).await?;
        let paths_removed = self.state.purge_expired(&KeyKind::Path, now).await?;

        let report = SweepReport {
            tokens_removed,
            paths_removed,
        };
        self.metrics
            .record_sweep(report.tokens_removed, report.paths_removed);
        if report.total() > 0 {
            info!(tokens_removed, paths_removed, "expired entries swept");
        } else {
            debug!("sweep found nothing to remove");
        }
        Ok(report)
    }

    /// Shared metrics handle.
    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    #[cfg(test)]
    pub(crate) fn defaults(&self) -> &SubmissionDefaults {
        &self.defaults
    }

    #[cfg(test)]
    pub(crate) fn field_names(&self) -> &FieldNames {
        &self.field_names
    }
}
