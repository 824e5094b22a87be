use std::path::PathBuf;

use serde::Deserialize;

/// The site Dropgate sits in front of.
#[derive(Debug, Default, Deserialize)]
pub struct SiteConfig {
    /// Directory of static files served for paths no token claims.
    pub root: Option<PathBuf>,
    /// HTML page used as the body of not-found responses.
    pub not_found_page: Option<PathBuf>,
}
