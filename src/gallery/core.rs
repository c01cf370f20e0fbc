use super::{
    AlbumSummary, Gallery, GalleryError, GalleryIndex, GalleryMode, GalleryModel, PendingScan,
    PhotoEntry,
};
use crate::RefreshPolicy;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

impl Gallery {
    /// Create a gallery and publish its first model.
    pub async fn initialize(config: crate::GalleryConfig) -> super::SharedGallery {
        let gallery = Arc::new(Gallery::new(config));
        if let Err(e) = gallery.refresh().await {
            error!("Initial gallery scan failed: {}", e);
        }
        gallery
    }

    /// Rescan the photos tree and publish the result.
    ///
    /// Joins a scan that is already running instead of queueing another one.
    pub async fn refresh(&self) -> Result<Arc<GalleryModel>, GalleryError> {
        let pending = self.start_refresh().await;
        wait_for_scan(pending).await
    }

    /// Rescan, giving up after `scan_timeout_seconds`.
    ///
    /// A scan that overruns keeps going in the background and publishes its
    /// model when it finishes; only the caller stops waiting for it.
    pub async fn refresh_with_timeout(&self) -> Result<Arc<GalleryModel>, GalleryError> {
        let timeout = Duration::from_secs(self.config.scan_timeout_seconds);
        let pending = self.start_refresh().await;

        match tokio::time::timeout(timeout, wait_for_scan(pending)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Gallery scan did not finish within {:?}", timeout);
                Err(GalleryError::Unavailable)
            }
        }
    }

    /// Subscribe to the scan in flight, starting one if there is none.
    async fn start_refresh(&self) -> PendingScan {
        let mut in_flight = self.in_flight.lock().await;
        // A closed channel means the scan task died without reporting.
        if let Some(pending) = in_flight.as_ref()
            && pending.has_changed().is_ok()
        {
            debug!("Joining gallery scan already in progress");
            return pending.clone();
        }

        let (done, pending) = watch::channel(None);
        *in_flight = Some(pending.clone());
        drop(in_flight);

        let index = GalleryIndex::from_config(&self.config);
        let scan_lock = self.scan_lock.clone();
        let published = self.model.clone();
        let in_flight = self.in_flight.clone();

        tokio::spawn(async move {
            // Held until the model is published so scans never interleave.
            let _guard = scan_lock.lock_owned().await;

            let model = match tokio::task::spawn_blocking(move || index.build()).await {
                Ok(model) => {
                    let model = Arc::new(model);
                    *published.write().await = model.clone();
                    info!("Published gallery with {} albums", model.stats().albums);
                    model
                }
                Err(e) => {
                    error!("Gallery scan task failed: {}", e);
                    published.read().await.clone()
                }
            };

            in_flight.lock().await.take();
            // Every waiter may have timed out already.
            let _ = done.send(Some(model));
        });

        pending
    }

    /// The last published model, without rescanning.
    pub async fn snapshot(&self) -> Arc<GalleryModel> {
        self.model.read().await.clone()
    }

    /// The model listings are answered from under the configured refresh policy.
    async fn current(&self) -> Result<Arc<GalleryModel>, GalleryError> {
        match self.config.refresh {
            RefreshPolicy::Startup => Ok(self.snapshot().await),
            RefreshPolicy::OnDemand => {
                debug!("Rescanning gallery on demand");
                self.refresh_with_timeout().await
            }
        }
    }

    pub async fn mode(&self) -> Result<GalleryMode, GalleryError> {
        Ok(self.current().await?.mode())
    }

    pub async fn list_albums(&self) -> Result<Vec<AlbumSummary>, GalleryError> {
        Ok(self.current().await?.list_albums())
    }

    pub async fn list_photos(&self, album_id: &str) -> Result<Vec<PhotoEntry>, GalleryError> {
        let model = self.current().await?;
        Ok(model.list_photos(album_id)?.to_vec())
    }

    /// Resolves against the published snapshot under either refresh policy,
    /// so serving bytes never waits on a scan.
    pub async fn resolve_photo(
        &self,
        album_id: &str,
        filename: &str,
    ) -> Result<PathBuf, GalleryError> {
        self.snapshot().await.resolve_photo(album_id, filename)
    }

    pub async fn resolve_thumbnail(
        &self,
        album_id: &str,
        filename: &str,
    ) -> Result<PathBuf, GalleryError> {
        self.snapshot().await.resolve_thumbnail(album_id, filename)
    }
}

async fn wait_for_scan(mut pending: PendingScan) -> Result<Arc<GalleryModel>, GalleryError> {
    let model = pending
        .wait_for(Option::is_some)
        .await
        .map_err(|e| GalleryError::IoError(std::io::Error::other(e)))?
        .clone();
    model.ok_or(GalleryError::Unavailable)
}
