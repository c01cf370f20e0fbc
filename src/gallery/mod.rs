// Gallery module - indexing, thumbnail cache and the query facade
pub mod catalog;
mod core;
mod error;
mod index;
mod model;
mod serve;
pub mod thumbnail;
mod types;

// Re-export public items
pub use error::{GalleryError, ScanError, ThumbnailError};
pub use index::{BuildStats, GalleryIndex, thumbnail_path_for};
pub use model::GalleryModel;
pub use serve::{ServedFile, content_type};
pub use thumbnail::{CacheOutcome, ImageSize, ThumbnailCache};
pub use types::*;

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, watch};

use crate::GalleryConfig;

pub type SharedGallery = Arc<Gallery>;

/// Receives the model of a running scan once it is published.
pub(crate) type PendingScan = watch::Receiver<Option<Arc<GalleryModel>>>;

/// Holds the most recently published [`GalleryModel`].
///
/// Readers clone the `Arc` of the current model and never see a model that
/// is still being built. At most one scan runs at a time, and refreshes
/// requested while it runs wait for its result.
pub struct Gallery {
    pub(crate) config: GalleryConfig,
    pub(crate) model: Arc<RwLock<Arc<GalleryModel>>>,
    pub(crate) scan_lock: Arc<Mutex<()>>,
    pub(crate) in_flight: Arc<Mutex<Option<PendingScan>>>,
}

impl Gallery {
    pub fn new(config: GalleryConfig) -> Self {
        let empty = GalleryModel::empty(
            config.photos_root.clone(),
            config.thumbnails_root.clone(),
        );

        Self {
            config,
            model: Arc::new(RwLock::new(Arc::new(empty))),
            scan_lock: Arc::new(Mutex::new(())),
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }
}
