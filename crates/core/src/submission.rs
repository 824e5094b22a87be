use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::error::SubmissionError;
use crate::record::{Grant, TokenRecord};
use crate::types::{PathPrefix, ResourceId, Token};

/// Prefix used when a submission does not name one.
pub const DEFAULT_PATH: &str = "/download";

/// Lifetime used when a submission does not name one.
pub const DEFAULT_LIFETIME_HOURS: f64 = 1.0;

/// Upper bound on a grant's lifetime (100 years).
const MAX_LIFETIME_SECONDS: f64 = 100.0 * 365.0 * 24.0 * 3600.0;

/// Names of the form fields a submission is read from.
///
/// Every other field in the submission is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Field carrying the download token.
    pub token: String,
    /// Field carrying the resource reference.
    pub resource: String,
    /// Optional field carrying the path prefix.
    pub path: String,
    /// Optional field carrying the minimum lifetime in hours.
    pub lifetime: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            token: "download_token".to_owned(),
            resource: "download_resource".to_owned(),
            path: "download_path".to_owned(),
            lifetime: "download_lifetime".to_owned(),
        }
    }
}

/// Values applied when a submission leaves the optional fields out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionDefaults {
    pub path: PathPrefix,
    pub lifetime: TimeDelta,
}

impl Default for SubmissionDefaults {
    fn default() -> Self {
        Self {
            path: PathPrefix::new(DEFAULT_PATH),
            lifetime: TimeDelta::hours(1),
        }
    }
}

/// Convert a lifetime in (possibly fractional) hours into a [`TimeDelta`].
///
/// Returns `None` for non-finite input. Negative lifetimes clamp to zero and
/// very large ones to a century.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn lifetime_from_hours(hours: f64) -> Option<TimeDelta> {
    if !hours.is_finite() {
        return None;
    }
    let seconds = (hours * 3600.0).clamp(0.0, MAX_LIFETIME_SECONDS).round();
    TimeDelta::try_seconds(seconds as i64)
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// The download-related part of a form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub token: Token,
    pub resource: ResourceId,
    /// Normalized prefix, if the submission supplied a usable one.
    pub path: Option<PathPrefix>,
    /// Lifetime, if the submission supplied a parseable one.
    pub lifetime: Option<TimeDelta>,
}

impl Submission {
    /// Extract a submission from a bag of form field values.
    ///
    /// Values are trimmed. Token and resource are required; an empty or
    /// unusable path or lifetime is treated as absent.
    pub fn from_fields(
        fields: &HashMap<String, String>,
        names: &FieldNames,
    ) -> Result<Self, SubmissionError> {
        let value = |name: &str| field(fields, name);

        let token = Token::new(value(&names.token).ok_or(SubmissionError::MissingToken)?);
        let resource =
            ResourceId::new(value(&names.resource).ok_or(SubmissionError::MissingResource)?);
        if !token.is_addressable() {
            return Err(SubmissionError::UnaddressableToken);
        }

        let path = value(&names.path).and_then(PathPrefix::normalize);
        let lifetime = value(&names.lifetime)
            .and_then(|raw| raw.parse::<f64>().ok())
            .and_then(lifetime_from_hours);

        Ok(Self {
            token,
            resource,
            path,
            lifetime,
        })
    }

    /// Resolve the submission into a grant issued at `now`.
    #[must_use]
    pub fn grant(&self, defaults: &SubmissionDefaults, now: DateTime<Utc>) -> Grant {
        let path = self.path.clone().unwrap_or_else(|| defaults.path.clone());
        let lifetime = self.lifetime.unwrap_or(defaults.lifetime);
        Grant {
            token: self.token.clone(),
            record: TokenRecord {
                resource: self.resource.clone(),
                path,
            },
            expires_at: now + lifetime,
        }
    }
}
