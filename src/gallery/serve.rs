use super::{Gallery, GalleryError};
use std::path::Path;
use tokio::fs::File;
use tracing::{debug, error};

/// An opened photo or thumbnail, ready to be streamed by a transport layer.
#[derive(Debug)]
pub struct ServedFile {
    pub file: File,
    pub content_type: String,
    pub len: u64,
}

/// MIME type inferred from the file extension.
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

impl Gallery {
    pub async fn open_photo(
        &self,
        album_id: &str,
        filename: &str,
    ) -> Result<ServedFile, GalleryError> {
        let path = self.resolve_photo(album_id, filename).await?;
        open_file(&path).await
    }

    pub async fn open_thumbnail(
        &self,
        album_id: &str,
        filename: &str,
    ) -> Result<ServedFile, GalleryError> {
        let path = self.resolve_thumbnail(album_id, filename).await?;
        open_file(&path).await
    }
}

async fn open_file(path: &Path) -> Result<ServedFile, GalleryError> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("File vanished before it could be served: {:?}", path);
            return Err(GalleryError::PhotoNotFound(path.display().to_string()));
        }
        Err(e) => {
            error!("Failed to open file: {:?}: {}", path, e);
            return Err(e.into());
        }
    };
    let len = file.metadata().await?.len();

    Ok(ServedFile {
        file,
        content_type: content_type(path),
        len,
    })
}
