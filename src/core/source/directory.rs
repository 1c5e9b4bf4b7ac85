//! Filesystem-backed asset source and access gate.

use super::fast_decode::FastDecoder;
use super::filter::ImageFilter;
use super::{Access, AssetHandle, AssetSource, AuthorizationGate};
use crate::core::sampler::GridSize;
use crate::error::{SampleError, SourceError};
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for directory walking
#[derive(Debug, Clone, Default)]
pub struct DirectoryConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Image files under one or more root directories.
///
/// Asset ids are file paths. Files are listed root by root, sorted by name
/// within each directory, so the order is stable between scans.
pub struct DirectoryAssetSource {
    roots: Vec<PathBuf>,
    config: DirectoryConfig,
    filter: ImageFilter,
}

impl DirectoryAssetSource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self::with_config(roots, DirectoryConfig::default())
    }

    pub fn with_config(roots: Vec<PathBuf>, config: DirectoryConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);
        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self {
            roots,
            config,
            filter,
        }
    }

    fn walk_root(&self, root: &Path, assets: &mut Vec<AssetHandle>) -> Result<(), SourceError> {
        if !root.is_dir() {
            return Err(SourceError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        // One spelling per directory, so `/x`, `/x/.` and aliases list once
        let canonical_root = fs::canonicalize(root).map_err(|source| SourceError::ReadDirectory {
            path: root.to_path_buf(),
            source,
        })?;

        let mut walker = WalkDir::new(&canonical_root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker.into_iter().filter_entry(|e| {
            include_hidden || e.depth() == 0 || !ImageFilter::is_hidden(e.path())
        });

        for entry in entries {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if self.filter.should_include(entry.path()) {
                        assets.push(AssetHandle::new(self.asset_path(entry.path())));
                    }
                }
                Ok(_) => {}
                Err(e) if e.depth() == 0 => {
                    return Err(SourceError::ReadDirectory {
                        path: root.to_path_buf(),
                        source: e.into(),
                    });
                }
                // Unreadable subdirectories only hide their own files
                Err(e) => warn!(error = %e, "skipping unreadable entry"),
            }
        }

        Ok(())
    }

    /// Asset id for a listed file.
    ///
    /// Followed links can reach a file through a path outside the canonical
    /// root, so those paths are resolved too.
    fn asset_path(&self, path: &Path) -> String {
        if self.config.follow_symlinks {
            if let Ok(resolved) = fs::canonicalize(path) {
                return resolved.display().to_string();
            }
        }
        path.display().to_string()
    }
}

impl AssetSource for DirectoryAssetSource {
    fn assets(&self) -> Result<Vec<AssetHandle>, SourceError> {
        let mut assets = Vec::new();
        for root in &self.roots {
            self.walk_root(root, &mut assets)?;
        }

        // Overlapping roots must not list a file twice
        let mut seen = std::collections::HashSet::new();
        assets.retain(|asset| seen.insert(asset.id().to_string()));

        debug!(count = assets.len(), roots = self.roots.len(), "listed assets");
        Ok(assets)
    }

    fn load_image(
        &self,
        asset: &AssetHandle,
        target: GridSize,
    ) -> Result<DynamicImage, SampleError> {
        FastDecoder::decode_fitted(Path::new(asset.id()), target)
    }
}

/// Grants access when every root is an existing, readable directory
pub struct DirectoryAccessGate {
    roots: Vec<PathBuf>,
}

impl DirectoryAccessGate {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl AuthorizationGate for DirectoryAccessGate {
    fn request_access(&self) -> Access {
        let readable = self
            .roots
            .iter()
            .all(|root| root.is_dir() && fs::read_dir(root).is_ok());

        if readable {
            Access::Granted
        } else {
            Access::Denied
        }
    }
}
