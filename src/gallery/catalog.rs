//! Discovery of image-bearing directories under the photos root.
//!
//! Symbolic links are never followed: a linked directory is not descended
//! into and a linked file is not counted as an image. This keeps every
//! cataloged path physically inside the root.

use super::error::ScanError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

/// A directory and the image files directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub directory: PathBuf,
    pub images: Vec<String>,
}

pub fn is_image(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Walk `root` lazily, yielding one entry per directory (the root included)
/// that directly contains at least one image.
pub fn walk(root: &Path) -> Result<impl Iterator<Item = CatalogEntry> + use<>, ScanError> {
    let metadata = match std::fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::RootMissing(root.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    // An unreadable root fails the scan; unreadable subdirectories are only skipped.
    std::fs::read_dir(root)?;

    let entries = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_type().is_dir())
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable directory during scan: {}", e);
                None
            }
        })
        .filter_map(|entry| {
            let directory = entry.into_path();
            let images = images_in(&directory)?;
            Some(CatalogEntry { directory, images })
        });

    Ok(entries)
}

/// Image filenames directly inside `directory`, or `None` if there are none.
fn images_in(directory: &Path) -> Option<Vec<String>> {
    debug!("Scanning directory: {:?}", directory);

    let read_dir = match std::fs::read_dir(directory) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            warn!("Failed to read directory {:?}: {}", directory, e);
            return None;
        }
    };

    let mut images = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read entry in {:?}: {}", directory, e);
                continue;
            }
        };

        // DirEntry::file_type does not traverse symlinks.
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) if is_image(&name) => images.push(name),
            Ok(_) => {}
            Err(name) => warn!("Skipping non UTF-8 filename {:?} in {:?}", name, directory),
        }
    }

    if images.is_empty() {
        None
    } else {
        Some(images)
    }
}
