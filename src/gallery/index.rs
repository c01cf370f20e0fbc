use super::catalog;
use super::error::ScanError;
use super::model::GalleryModel;
use super::thumbnail::{CacheOutcome, ImageSize, ThumbnailCache};
use super::types::{Album, AlbumId, PhotoEntry, caseless_cmp};
use crate::GalleryConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Counters gathered while building a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub albums: usize,
    pub photos: usize,
    pub cached: usize,
    pub created: usize,
    pub failed: usize,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} albums, {} photos ({} cached, {} created, {} failed)",
            self.albums, self.photos, self.cached, self.created, self.failed
        )
    }
}

/// Mirror a source path from the photos tree into the thumbnails tree.
pub fn thumbnail_path_for(source: &Path, photos_root: &Path, thumbnails_root: &Path) -> Option<PathBuf> {
    source
        .strip_prefix(photos_root)
        .ok()
        .map(|relative| thumbnails_root.join(relative))
}

/// Builds a [`GalleryModel`] from the photos tree, creating missing thumbnails.
pub struct GalleryIndex {
    photos_root: PathBuf,
    thumbnails_root: PathBuf,
    cache: ThumbnailCache,
}

impl GalleryIndex {
    pub fn new(photos_root: PathBuf, thumbnails_root: PathBuf, max_size: ImageSize) -> Self {
        Self {
            photos_root,
            thumbnails_root,
            cache: ThumbnailCache::new(max_size),
        }
    }

    pub fn from_config(config: &GalleryConfig) -> Self {
        Self::new(
            config.photos_root.clone(),
            config.thumbnails_root.clone(),
            config.thumbnail.into(),
        )
    }

    /// Scan and build. An unusable root yields an empty model rather than an error.
    pub fn build(&self) -> GalleryModel {
        info!(
            "Starting photo scan of {:?} (thumbnails in {:?})",
            self.photos_root, self.thumbnails_root
        );

        match self.try_build() {
            Ok(model) => {
                info!(
                    "Photo scan complete: {} ({:?} gallery)",
                    model.stats(),
                    model.mode()
                );
                model
            }
            Err(e) => {
                error!("Photo scan failed, publishing an empty gallery: {}", e);
                GalleryModel::empty(self.photos_root.clone(), self.thumbnails_root.clone())
            }
        }
    }

    pub fn try_build(&self) -> Result<GalleryModel, ScanError> {
        let photos_root = canonical_root(&self.photos_root)?;
        let entries = catalog::walk(&photos_root)?;

        std::fs::create_dir_all(&self.thumbnails_root)
            .and_then(|()| self.thumbnails_root.canonicalize())
            .map_err(|e| ScanError::ThumbnailRootUnavailable(self.thumbnails_root.clone(), e))
            .and_then(|thumbnails_root| {
                self.index_entries(entries, photos_root, thumbnails_root)
            })
    }

    fn index_entries(
        &self,
        entries: impl Iterator<Item = catalog::CatalogEntry>,
        photos_root: PathBuf,
        thumbnails_root: PathBuf,
    ) -> Result<GalleryModel, ScanError> {
        let mut stats = BuildStats::default();
        let mut albums = BTreeMap::new();

        for entry in entries {
            let Some(album_id) = entry
                .directory
                .strip_prefix(&photos_root)
                .ok()
                .and_then(AlbumId::from_relative)
            else {
                warn!("Skipping directory with unusable name: {:?}", entry.directory);
                continue;
            };

            info!("Processing album: {}", album_id.display_name());

            let mut filenames = entry.images;
            filenames.sort_by(|a, b| caseless_cmp(a, b));

            let mut photos = Vec::with_capacity(filenames.len());
            for filename in filenames {
                let source_path = entry.directory.join(&filename);
                let Some(thumbnail_path) =
                    thumbnail_path_for(&source_path, &photos_root, &thumbnails_root)
                else {
                    continue;
                };

                match self.cache.ensure(&source_path, &thumbnail_path) {
                    Ok(CacheOutcome::Hit) => stats.cached += 1,
                    Ok(CacheOutcome::Created) => stats.created += 1,
                    Err(e) => {
                        warn!("Error generating thumbnail for {:?}: {}", source_path, e);
                        stats.failed += 1;
                        continue;
                    }
                }

                photos.push(PhotoEntry {
                    album: album_id.clone(),
                    filename,
                    source_path,
                    thumbnail_path,
                });
            }

            match Album::new(album_id.clone(), photos) {
                Some(album) => {
                    debug!(
                        "Album '{}' has {} photos",
                        album_id.display_name(),
                        album.photos().len()
                    );
                    stats.photos += album.photos().len();
                    albums.insert(album_id, album);
                }
                None => warn!(
                    "Dropping album '{}': no photo could be thumbnailed",
                    album_id.display_name()
                ),
            }
        }

        stats.albums = albums.len();
        Ok(GalleryModel::new(photos_root, thumbnails_root, albums, stats))
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf, ScanError> {
    root.canonicalize().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::RootMissing(root.to_path_buf()),
        _ => ScanError::IoError(e),
    })
}
