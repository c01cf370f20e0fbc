use crate::Config;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create thumbnails directory: {0}")]
    ThumbnailsDirectoryCreationFailed(#[from] std::io::Error),

    #[error("Photos directory does not exist: {0}")]
    PhotosDirectoryMissing(String),

    #[error("Photos directory is not accessible: {0}")]
    PhotosDirectoryUnreadable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] crate::ConfigError),
}

impl StartupCheckError {
    /// Critical errors stop the process; the others leave an empty gallery.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::ThumbnailsDirectoryCreationFailed(_)
                | StartupCheckError::InvalidConfig(_)
        )
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();
    let gallery = &config.gallery;

    info!("Performing startup checks...");

    if let Err(e) = config.validate() {
        error!("Configuration is invalid: {}", e);
        errors.push(StartupCheckError::InvalidConfig(e));
    }

    let thumbnails_dir = &gallery.thumbnails_root;
    if !thumbnails_dir.exists() {
        info!(
            "Thumbnails directory does not exist, creating: {:?}",
            thumbnails_dir
        );
        if let Err(e) = tokio::fs::create_dir_all(thumbnails_dir).await {
            error!("Failed to create thumbnails directory: {}", e);
            errors.push(StartupCheckError::ThumbnailsDirectoryCreationFailed(e));
        }
    } else {
        info!("Thumbnails directory exists: {:?}", thumbnails_dir);
    }

    let photos_dir = &gallery.photos_root;
    if !photos_dir.is_dir() {
        warn!(
            "Photos directory does not exist, the gallery will be empty: {:?}",
            photos_dir
        );
        errors.push(StartupCheckError::PhotosDirectoryMissing(
            photos_dir.display().to_string(),
        ));
    } else {
        match tokio::fs::read_dir(photos_dir).await {
            Ok(_) => info!("Photos directory is accessible: {:?}", photos_dir),
            Err(e) => {
                warn!("Photos directory is not accessible: {}", e);
                errors.push(StartupCheckError::PhotosDirectoryUnreadable(
                    photos_dir.display().to_string(),
                ));
            }
        }
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        warn!("Startup checks reported {} problems", errors.len());
        Err(errors)
    }
}
