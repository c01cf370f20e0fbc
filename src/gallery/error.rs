use std::path::PathBuf;
use thiserror::Error;

/// Failure to walk the photos tree at all. Callers treat it as an empty gallery.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Photos root does not exist: {0:?}")]
    RootMissing(PathBuf),

    #[error("Photos root is not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("Thumbnails root is unusable: {0:?}: {1}")]
    ThumbnailRootUnavailable(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Failure to produce a single thumbnail. The photo is dropped from its album.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Destination has no parent directory: {0:?}")]
    InvalidDestination(PathBuf),
}

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Album not found: {0}")]
    AlbumNotFound(String),

    #[error("Photo not found: {0}")]
    PhotoNotFound(String),

    #[error("Gallery temporarily unavailable")]
    Unavailable,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GalleryError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GalleryError::AlbumNotFound(_) | GalleryError::PhotoNotFound(_)
        )
    }
}
