use std::collections::HashMap;
use std::path::PathBuf;

use dropgate_core::ResourceId;
use dropgate_gateway::MediaLibrary;
use serde::Deserialize;

/// Location of downloadable files and the ids that name them.
#[derive(Debug, Deserialize)]
pub struct MediaConfig {
    /// Directory every resource resolves under (default: `media`).
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Resolve ids missing from the catalog as paths relative to `root`.
    #[serde(default)]
    pub allow_direct: bool,
    /// Resource id to path (relative to `root`).
    #[serde(default)]
    pub catalog: HashMap<String, PathBuf>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            allow_direct: false,
            catalog: HashMap::new(),
        }
    }
}

impl MediaConfig {
    /// Build the media library this configuration describes.
    pub fn library(&self) -> MediaLibrary {
        let catalog = self
            .catalog
            .iter()
            .map(|(id, path)| (ResourceId::new(id.as_str()), path.clone()))
            .collect();
        MediaLibrary::new(&self.root)
            .catalog(catalog)
            .allow_direct(self.allow_direct)
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("media")
}
