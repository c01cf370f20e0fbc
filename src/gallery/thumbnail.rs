//! Write-once thumbnail cache.
//!
//! The cache key is the destination path and the value is the encoded file
//! on disk; there is no in-memory layer. Whether an existing file may be
//! reused is decided by a [`FreshnessPolicy`]. The gallery uses
//! [`ExistenceOnly`], so replacing a source image under the same name keeps
//! serving the old thumbnail until the thumbnail file is removed.
//!
//! New thumbnails are encoded into a uniquely named temporary file next to
//! the destination and renamed into place, so readers and racing writers
//! never observe a partially written file.

use super::error::ThumbnailError;
use image::{DynamicImage, ImageFormat, codecs::jpeg::JpegEncoder, imageops::FilterType};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Largest size with the aspect ratio of `width`x`height` that fits in
    /// this bounding box. Sizes already inside the box are returned unchanged.
    pub fn fit(&self, width: u32, height: u32) -> ImageSize {
        if width <= self.width && height <= self.height {
            return ImageSize::new(width, height);
        }

        let scale = f64::min(
            self.width as f64 / width as f64,
            self.height as f64 / height as f64,
        );
        let scaled = |value: u32, bound: u32| -> u32 {
            ((value as f64 * scale).round() as u32).clamp(1, bound.max(1))
        };

        ImageSize::new(scaled(width, self.width), scaled(height, self.height))
    }
}

impl From<crate::ImageSizeConfig> for ImageSize {
    fn from(config: crate::ImageSizeConfig) -> Self {
        ImageSize::new(config.width, config.height)
    }
}

/// Decides whether an existing thumbnail can stand in for its source.
pub trait FreshnessPolicy: Send + Sync {
    fn is_fresh(&self, source: &Path, thumbnail: &Path) -> bool;
}

/// Any existing thumbnail is fresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistenceOnly;

impl FreshnessPolicy for ExistenceOnly {
    fn is_fresh(&self, _source: &Path, _thumbnail: &Path) -> bool {
        true
    }
}

/// A thumbnail is fresh unless its source was modified after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceNewer;

impl FreshnessPolicy for SourceNewer {
    fn is_fresh(&self, source: &Path, thumbnail: &Path) -> bool {
        let modified = |path: &Path| std::fs::metadata(path).and_then(|m| m.modified());
        match (modified(source), modified(thumbnail)) {
            (Ok(source_modified), Ok(thumbnail_modified)) => thumbnail_modified >= source_modified,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The thumbnail was already on disk.
    Hit,
    /// The thumbnail was decoded, resized and written by this call.
    Created,
}

pub struct ThumbnailCache<P = ExistenceOnly> {
    max_size: ImageSize,
    policy: P,
}

impl ThumbnailCache {
    pub fn new(max_size: ImageSize) -> Self {
        Self::with_policy(max_size, ExistenceOnly)
    }
}

impl<P: FreshnessPolicy> ThumbnailCache<P> {
    pub fn with_policy(max_size: ImageSize, policy: P) -> Self {
        Self { max_size, policy }
    }

    pub fn max_size(&self) -> ImageSize {
        self.max_size
    }

    /// Make sure a thumbnail of `source` exists at `dest`.
    pub fn ensure(&self, source: &Path, dest: &Path) -> Result<CacheOutcome, ThumbnailError> {
        if dest.is_file() && self.policy.is_fresh(source, dest) {
            debug!("Thumbnail cache hit: {:?}", dest);
            return Ok(CacheOutcome::Hit);
        }

        let parent = dest
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| ThumbnailError::InvalidDestination(dest.to_path_buf()))?;
        std::fs::create_dir_all(parent)?;

        // Fail on an unsupported destination extension before paying for the decode.
        let format = ImageFormat::from_path(dest)?;

        debug!("Generating thumbnail for {:?}", source);
        let img = image::ImageReader::open(source)?
            .with_guessed_format()?
            .decode()?;

        let resized = resize_to_fit(img, self.max_size);
        write_atomically(prepare_for(resized, format), dest, format)?;

        debug!("Thumbnail saved to {:?}", dest);
        Ok(CacheOutcome::Created)
    }
}

/// Resize preserving aspect ratio, never upscaling.
fn resize_to_fit(img: DynamicImage, max_size: ImageSize) -> DynamicImage {
    let target = max_size.fit(img.width(), img.height());

    if target.width != img.width() || target.height != img.height() {
        img.resize_exact(target.width, target.height, FilterType::Lanczos3)
    } else {
        img
    }
}

/// Convert to a pixel layout the target encoder accepts.
fn prepare_for(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Png | ImageFormat::Tiff => img,
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ if img.color().has_alpha() => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}

fn temp_path_for(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
}

fn write_atomically(
    img: DynamicImage,
    dest: &Path,
    format: ImageFormat,
) -> Result<(), ThumbnailError> {
    let temp_path = temp_path_for(dest);

    let result = encode_to(&img, &temp_path, format)
        .and_then(|()| std::fs::rename(&temp_path, dest).map_err(ThumbnailError::from));

    if result.is_err()
        && let Err(e) = std::fs::remove_file(&temp_path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Failed to remove temporary thumbnail {:?}: {}", temp_path, e);
    }

    result
}

fn encode_to(img: &DynamicImage, path: &Path, format: ImageFormat) -> Result<(), ThumbnailError> {
    let mut writer = BufWriter::new(File::create(path)?);

    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            img.write_with_encoder(encoder)?;
        }
        _ => img.write_to(&mut writer, format)?,
    }

    writer.flush()?;
    Ok(())
}
