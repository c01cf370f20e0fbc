use super::error::GalleryError;
use super::index::BuildStats;
use super::types::{
    Album, AlbumId, AlbumSummary, GalleryMode, PhotoEntry, caseless_cmp, is_plain_segment,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Immutable result of one scan. A rescan builds a new model.
#[derive(Debug, Clone)]
pub struct GalleryModel {
    photos_root: PathBuf,
    thumbnails_root: PathBuf,
    albums: BTreeMap<AlbumId, Album>,
    mode: GalleryMode,
    stats: BuildStats,
}

#[derive(Debug, Clone, Copy)]
enum Tree {
    Photos,
    Thumbnails,
}

impl GalleryModel {
    pub(crate) fn new(
        photos_root: PathBuf,
        thumbnails_root: PathBuf,
        albums: BTreeMap<AlbumId, Album>,
        stats: BuildStats,
    ) -> Self {
        let mode = classify(&albums);
        Self {
            photos_root,
            thumbnails_root,
            albums,
            mode,
            stats,
        }
    }

    pub fn empty(photos_root: PathBuf, thumbnails_root: PathBuf) -> Self {
        Self::new(
            photos_root,
            thumbnails_root,
            BTreeMap::new(),
            BuildStats::default(),
        )
    }

    pub fn mode(&self) -> GalleryMode {
        self.mode
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub fn photos_root(&self) -> &Path {
        &self.photos_root
    }

    pub fn thumbnails_root(&self) -> &Path {
        &self.thumbnails_root
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    pub fn albums(&self) -> impl Iterator<Item = &Album> {
        self.albums.values()
    }

    pub fn album(&self, id: &AlbumId) -> Option<&Album> {
        self.albums.get(id)
    }

    /// All albums ordered case-insensitively by display name.
    pub fn list_albums(&self) -> Vec<AlbumSummary> {
        let mut summaries: Vec<AlbumSummary> = self.albums.values().map(Album::summary).collect();
        summaries.sort_by(|a, b| caseless_cmp(&a.display_name, &b.display_name));
        summaries
    }

    pub fn list_photos(&self, album_id: &str) -> Result<&[PhotoEntry], GalleryError> {
        AlbumId::parse(album_id)
            .and_then(|id| self.albums.get(&id))
            .map(Album::photos)
            .ok_or_else(|| GalleryError::AlbumNotFound(album_id.to_string()))
    }

    pub fn photo(&self, album_id: &str, filename: &str) -> Result<&PhotoEntry, GalleryError> {
        let not_found = || GalleryError::PhotoNotFound(format!("{}/{}", album_id, filename));

        if !is_plain_segment(filename) {
            debug!("Rejected photo name {:?} in album {:?}", filename, album_id);
            return Err(not_found());
        }

        AlbumId::parse(album_id)
            .and_then(|id| self.albums.get(&id))
            .and_then(|album| album.photo(filename))
            .ok_or_else(not_found)
    }

    /// Filesystem path of the original image, guaranteed to lie under the photos root.
    pub fn resolve_photo(&self, album_id: &str, filename: &str) -> Result<PathBuf, GalleryError> {
        self.resolve(album_id, filename, Tree::Photos)
    }

    /// Filesystem path of the thumbnail, guaranteed to lie under the thumbnails root.
    pub fn resolve_thumbnail(
        &self,
        album_id: &str,
        filename: &str,
    ) -> Result<PathBuf, GalleryError> {
        self.resolve(album_id, filename, Tree::Thumbnails)
    }

    fn resolve(&self, album_id: &str, filename: &str, tree: Tree) -> Result<PathBuf, GalleryError> {
        let photo = self.photo(album_id, filename)?;
        let (root, path) = match tree {
            Tree::Photos => (&self.photos_root, &photo.source_path),
            Tree::Thumbnails => (&self.thumbnails_root, &photo.thumbnail_path),
        };

        // Escapes are reported exactly like misses.
        contained_path(root, path)
            .ok_or_else(|| GalleryError::PhotoNotFound(format!("{}/{}", album_id, filename)))
    }
}

/// Flat when the root album is the only album.
fn classify(albums: &BTreeMap<AlbumId, Album>) -> GalleryMode {
    let has_root = albums.contains_key(&AlbumId::Root);
    let has_other = albums.keys().any(|id| !id.is_root());

    if has_root && !has_other {
        GalleryMode::Flat
    } else {
        GalleryMode::Nested
    }
}

/// Canonicalize `path` and return it only if it is a descendant of `root`.
fn contained_path(root: &Path, path: &Path) -> Option<PathBuf> {
    let canonical = match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(e) => {
            debug!("Cannot resolve {:?}: {}", path, e);
            return None;
        }
    };

    if canonical.starts_with(root) && canonical != root {
        Some(canonical)
    } else {
        debug!("Rejected {:?}: outside of {:?}", canonical, root);
        None
    }
}
