use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub mod gallery;
pub mod startup_checks;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub photos_root: PathBuf,
    pub thumbnails_root: PathBuf,
    pub thumbnail: ImageSizeConfig,
    pub refresh: RefreshPolicy,
    pub scan_timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageSizeConfig {
    pub width: u32,
    pub height: u32,
}

/// When the gallery rescans the photos tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Scan once when the gallery is initialized.
    #[default]
    Startup,
    /// Rescan before answering every query, bounded by `scan_timeout_seconds`.
    OnDemand,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml_edit::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Shashin".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            photos_root: PathBuf::from("photos"),
            thumbnails_root: PathBuf::from("thumbnails"),
            thumbnail: ImageSizeConfig {
                width: 200,
                height: 200,
            },
            refresh: RefreshPolicy::Startup,
            scan_timeout_seconds: 30,
        }
    }
}

impl Config {
    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml_edit::de::from_str::<Config>(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let gallery = &self.gallery;

        if gallery.thumbnail.width == 0 || gallery.thumbnail.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "thumbnail size must be non-zero, got {}x{}",
                gallery.thumbnail.width, gallery.thumbnail.height
            )));
        }

        if gallery.refresh == RefreshPolicy::OnDemand && gallery.scan_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "scan_timeout_seconds must be non-zero when refresh is on_demand".to_string(),
            ));
        }

        // The thumbnail tree must never be indexed as photos, and vice versa.
        let photos = std::path::absolute(&gallery.photos_root)?;
        let thumbnails = std::path::absolute(&gallery.thumbnails_root)?;
        if photos.starts_with(&thumbnails) || thumbnails.starts_with(&photos) {
            return Err(ConfigError::Invalid(format!(
                "photos_root {:?} and thumbnails_root {:?} must be disjoint",
                gallery.photos_root, gallery.thumbnails_root
            )));
        }

        Ok(())
    }
}
