use dropgate_core::{
    DEFAULT_LIFETIME_HOURS, DEFAULT_PATH, FieldNames, PathPrefix, SubmissionDefaults,
    lifetime_from_hours,
};
use serde::Deserialize;

/// How form submissions are turned into grants.
#[derive(Debug, Deserialize)]
pub struct SubmissionConfig {
    /// Prefix used when a submission names none (default: `/download`).
    #[serde(default = "default_path")]
    pub default_path: String,
    /// Lifetime in hours used when a submission names none (default: 1).
    #[serde(default = "default_lifetime_hours")]
    pub default_lifetime_hours: f64,
    /// Names of the form fields carrying token, resource, path and lifetime.
    #[serde(default)]
    pub fields: FieldNames,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            default_path: default_path(),
            default_lifetime_hours: default_lifetime_hours(),
            fields: FieldNames::default(),
        }
    }
}

impl SubmissionConfig {
    /// Resolve the configured defaults, falling back to the built-in ones
    /// when a value is unusable.
    pub fn defaults(&self) -> SubmissionDefaults {
        let builtin = SubmissionDefaults::default();
        SubmissionDefaults {
            path: PathPrefix::normalize(&self.default_path).unwrap_or(builtin.path),
            lifetime: lifetime_from_hours(self.default_lifetime_hours).unwrap_or(builtin.lifetime),
        }
    }
}

fn default_path() -> String {
    DEFAULT_PATH.to_owned()
}

fn default_lifetime_hours() -> f64 {
    DEFAULT_LIFETIME_HOURS
}
