use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

/// Label shown for the album formed by images sitting directly in the photos root.
pub const ROOT_DISPLAY_NAME: &str = "Root Gallery";

/// Identifier of an album: its directory relative to the photos root.
///
/// The root directory is its own variant and renders as the empty string,
/// which no real directory can be named, so it never collides with a
/// subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlbumId {
    Root,
    Path(String),
}

impl AlbumId {
    /// Build an id from a directory path relative to the photos root.
    ///
    /// Returns `None` for paths that are not plain UTF-8 descendants.
    pub fn from_relative(relative: &Path) -> Option<Self> {
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str()?;
                    if !is_plain_segment(part) {
                        return None;
                    }
                    segments.push(part)
                }
                Component::CurDir => {}
                _ => return None,
            }
        }

        if segments.is_empty() {
            Some(AlbumId::Root)
        } else {
            Some(AlbumId::Path(segments.join("/")))
        }
    }

    /// Parse an id handed in by a caller, normalizing redundant slashes.
    ///
    /// Ids containing `.`/`..` segments or platform separators are rejected.
    pub fn parse(id: &str) -> Option<Self> {
        let mut segments = Vec::new();
        for segment in id.split('/').filter(|s| !s.is_empty()) {
            if !is_plain_segment(segment) {
                return None;
            }
            segments.push(segment);
        }

        if segments.is_empty() {
            Some(AlbumId::Root)
        } else {
            Some(AlbumId::Path(segments.join("/")))
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, AlbumId::Root)
    }

    pub fn as_str(&self) -> &str {
        match self {
            AlbumId::Root => "",
            AlbumId::Path(path) => path,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AlbumId::Root => ROOT_DISPLAY_NAME,
            AlbumId::Path(path) => path,
        }
    }

    /// The album's directory relative to either root.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            AlbumId::Root => PathBuf::new(),
            AlbumId::Path(path) => path.split('/').collect(),
        }
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlbumId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single path component that names an entry inside its directory.
///
/// Shared by the scan and the query side so every published album id and
/// filename can be looked up again. A backslash is an ordinary character on
/// Unix and a separator on Windows.
pub fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('\0')
        && !segment.chars().any(std::path::is_separator)
}

/// Compare names ignoring case, falling back to the exact bytes so the order is total.
pub fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// One image in an album. Identity is the `(album, filename)` pair.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoEntry {
    pub album: AlbumId,
    pub filename: String,
    pub source_path: PathBuf,
    pub thumbnail_path: PathBuf,
}

impl PartialEq for PhotoEntry {
    fn eq(&self, other: &Self) -> bool {
        self.album == other.album && self.filename == other.filename
    }
}

impl Eq for PhotoEntry {}

impl Hash for PhotoEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.album.hash(state);
        self.filename.hash(state);
    }
}

/// A directory holding at least one photo.
#[derive(Debug, Clone)]
pub struct Album {
    id: AlbumId,
    photos: Vec<PhotoEntry>,
}

impl Album {
    /// Returns `None` when there are no photos; empty albums are never published.
    pub fn new(id: AlbumId, mut photos: Vec<PhotoEntry>) -> Option<Self> {
        if photos.is_empty() {
            return None;
        }
        photos.sort_by(|a, b| caseless_cmp(&a.filename, &b.filename));
        Some(Self { id, photos })
    }

    pub fn id(&self) -> &AlbumId {
        &self.id
    }

    pub fn photos(&self) -> &[PhotoEntry] {
        &self.photos
    }

    /// First photo in sorted order. Always `Some` for albums built by [`Album::new`].
    pub fn cover(&self) -> Option<&PhotoEntry> {
        self.photos.first()
    }

    pub fn photo(&self, filename: &str) -> Option<&PhotoEntry> {
        self.photos.iter().find(|photo| photo.filename == filename)
    }

    pub fn summary(&self) -> AlbumSummary {
        AlbumSummary {
            id: self.id.as_str().to_string(),
            display_name: self.id.display_name().to_string(),
            photo_count: self.photos.len(),
            cover_filename: self
                .cover()
                .map(|photo| photo.filename.clone())
                .unwrap_or_default(),
        }
    }
}

/// Row of the album listing. The cover thumbnail is addressed by
/// `(id, cover_filename)` through the thumbnail resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumSummary {
    pub id: String,
    pub display_name: String,
    pub photo_count: usize,
    pub cover_filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryMode {
    /// Images only in the root directory.
    Flat,
    /// Images in at least one subdirectory.
    Nested,
}
