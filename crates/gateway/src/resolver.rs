use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use dropgate_core::ResourceId;

/// A resource reference resolved to a file that exists right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// Absolute (or root-relative) location of the file on disk.
    pub path: PathBuf,
    /// Base name offered to the client as the download filename.
    pub file_name: String,
    /// Size in bytes at resolution time.
    pub len: u64,
}

/// Maps opaque resource references to files.
#[async_trait]
pub trait ResourceResolver: Send + Sync {
    /// Resolve a reference. Returns `None` when the reference is unknown or
    /// the file it names is gone.
    async fn resolve(&self, resource: &ResourceId) -> Option<ResolvedResource>;
}

/// A directory of downloadable files plus a catalog of resource ids.
///
/// Catalog entries are paths relative to `root`. With `allow_direct`
/// enabled, an id missing from the catalog is itself treated as a relative
/// path. Paths that would leave `root` never resolve.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
    catalog: HashMap<ResourceId, PathBuf>,
    allow_direct: bool,
}

impl MediaLibrary {
    /// Create a library rooted at `root` with an empty catalog.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            catalog: HashMap::new(),
            allow_direct: false,
        }
    }

    /// Register a catalog entry.
    #[must_use]
    pub fn entry(mut self, resource: impl Into<ResourceId>, relative: impl Into<PathBuf>) -> Self {
        self.catalog.insert(resource.into(), relative.into());
        self
    }

    /// Replace the catalog.
    #[must_use]
    pub fn catalog(mut self, catalog: HashMap<ResourceId, PathBuf>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Allow ids absent from the catalog to resolve as relative paths.
    #[must_use]
    pub fn allow_direct(mut self, allow: bool) -> Self {
        self.allow_direct = allow;
        self
    }

    /// The directory files are resolved under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative_for(&self, resource: &ResourceId) -> Option<PathBuf> {
        if let Some(relative) = self.catalog.get(resource) {
            return Some(relative.clone());
        }
        self.allow_direct.then(|| PathBuf::from(resource.as_str()))
    }
}

fn stays_inside(relative: &Path) -> bool {
    let mut components = relative.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

#[async_trait]
impl ResourceResolver for MediaLibrary {
    async fn resolve(&self, resource: &ResourceId) -> Option<ResolvedResource> {
        let relative = self.relative_for(resource)?;
        if !stays_inside(&relative) {
            debug!(resource = %resource, "resource path escapes the media root");
            return None;
        }

        let path = self.root.join(&relative);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(resource = %resource, error = %e, "resource file unavailable");
                return None;
            }
        };
        if !metadata.is_file() {
            return None;
        }

        let file_name = path.file_name()?.to_string_lossy().into_owned();
        Some(ResolvedResource {
            path,
            file_name,
            len: metadata.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> (tempfile::TempDir, MediaLibrary) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ebooks")).unwrap();
        std::fs::write(dir.path().join("ebooks/guide.pdf"), b"%PDF-guide").unwrap();
        std::fs::write(dir.path().join("loose.zip"), b"zip").unwrap();
        let lib = MediaLibrary::new(dir.path()).entry("42", "ebooks/guide.pdf");
        (dir, lib)
    }

    #[tokio::test]
    async fn catalog_entry_resolves() {
        let (dir, lib) = library();
        let resolved = lib.resolve(&ResourceId::new("42")).await.unwrap();
        assert_eq!(resolved.path, dir.path().join("ebooks/guide.pdf"));
        assert_eq!(resolved.file_name, "guide.pdf");
        assert_eq!(resolved.len, 10);
    }

    #[tokio::test]
    async fn unknown_id_does_not_resolve_by_default() {
        let (_dir, lib) = library();
        assert!(lib.resolve(&ResourceId::new("loose.zip")).await.is_none());
    }

    #[tokio::test]
    async fn direct_ids_resolve_when_allowed() {
        let (_dir, lib) = library();
        let lib = lib.allow_direct(true);
        let resolved = lib.resolve(&ResourceId::new("loose.zip")).await.unwrap();
        assert_eq!(resolved.file_name, "loose.zip");
        assert_eq!(resolved.len, 3);
    }

    #[tokio::test]
    async fn traversal_is_refused() {
        let (_dir, lib) = library();
        let lib = lib.allow_direct(true).entry("evil", "../etc/passwd");
        assert!(lib.resolve(&ResourceId::new("evil")).await.is_none());
        assert!(lib.resolve(&ResourceId::new("../loose.zip")).await.is_none());
        assert!(lib.resolve(&ResourceId::new("/etc/passwd")).await.is_none());
    }

    #[tokio::test]
    async fn missing_file_and_directories_do_not_resolve() {
        let (dir, lib) = library();
        let lib = lib.entry("gone", "ebooks/removed.pdf").entry("dir", "ebooks");
        assert!(lib.resolve(&ResourceId::new("gone")).await.is_none());
        assert!(lib.resolve(&ResourceId::new("dir")).await.is_none());

        std::fs::remove_file(dir.path().join("ebooks/guide.pdf")).unwrap();
        assert!(lib.resolve(&ResourceId::new("42")).await.is_none());
    }
}
