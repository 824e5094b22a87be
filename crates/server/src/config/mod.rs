mod media;
mod server;
mod site;
mod state;
mod submission;
mod sweep;


pub use media::*;
pub use server::*;
pub use site::*;
pub use state::*;
pub use submission::*;
pub use sweep::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the Dropgate server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct DropgateConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// State backend configuration.
    #[serde(default)]
    pub state: StateConfig,
    /// Submission defaults and field names.
    #[serde(default)]
    pub submission: SubmissionConfig,
    /// Where downloadable files live.
    #[serde(default)]
    pub media: MediaConfig,
    /// Static site served for unclaimed paths.
    #[serde(default)]
    pub site: SiteConfig,
    /// Periodic removal of expired entries.
    #[serde(default)]
    pub sweep: SweepSettings,
}

impl DropgateConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults. Returns the configuration and
    /// whether the file was found.
    pub fn load(path: &Path) -> Result<(Self, bool), ServerError> {
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Ok((config, true))
    }
}
