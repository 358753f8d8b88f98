// QR preview service - Transient image handles owned by viewers
use crate::application::pipe_catalog::PipeCatalog;
use crate::application::pipe_repository::{QrImage, RepositoryError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const PREVIEW_QR_SIZE: u32 = 400;
pub const PREVIEW_TTL: Duration = Duration::from_secs(15 * 60);
pub const MAX_PREVIEWS: usize = 64;

/// Images reachable through a handle URL.
#[derive(Default)]
pub struct ImageRegistry {
    next_id: AtomicU64,
    images: Mutex<HashMap<u64, QrImage>>,
}

impl ImageRegistry {
    /// Registers an image; it stays reachable until the handle is dropped.
    pub fn acquire(self: &Arc<Self>, image: QrImage) -> ImageHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().insert(id, image);
        ImageHandle {
            id,
            registry: Arc::clone(self),
        }
    }

    pub fn get(&self, id: u64) -> Option<QrImage> {
        self.lock().get(&id).cloned()
    }

    pub fn live(&self) -> usize {
        self.lock().len()
    }

    fn release(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            tracing::debug!("Released QR image handle {}", id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, QrImage>> {
        self.images.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Owning handle to a registered image; dropping it releases the image.
pub struct ImageHandle {
    id: u64,
    registry: Arc<ImageRegistry>,
}

impl ImageHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> String {
        format!("/admin/images/{}", self.id)
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

struct Preview {
    handle: ImageHandle,
    opened: Instant,
    seq: u64,
}

#[derive(Default)]
struct Previews {
    by_viewer: HashMap<String, Preview>,
    next_seq: u64,
}

impl Previews {
    /// Drops previews older than `ttl`, releasing their images.
    fn sweep(&mut self, ttl: Duration) {
        let before = self.by_viewer.len();
        self.by_viewer.retain(|_, p| p.opened.elapsed() < ttl);
        let expired = before - self.by_viewer.len();
        if expired > 0 {
            tracing::debug!("Expired {} abandoned QR previews", expired);
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .by_viewer
            .iter()
            .min_by_key(|(_, p)| p.seq)
            .map(|(viewer, _)| viewer.clone());
        if let Some(viewer) = oldest {
            self.by_viewer.remove(&viewer);
            tracing::debug!("Evicted QR preview of {}", viewer);
        }
    }
}

/// One preview per viewer. Previews nobody closes expire after `ttl`, and at
/// most `capacity` are held at once.
#[derive(Clone)]
pub struct QrPreviewService {
    catalog: PipeCatalog,
    registry: Arc<ImageRegistry>,
    previews: Arc<Mutex<Previews>>,
    ttl: Duration,
    capacity: usize,
}

impl QrPreviewService {
    #[cfg(test)]
    pub fn new(catalog: PipeCatalog) -> Self {
        Self::with_limits(catalog, PREVIEW_TTL, MAX_PREVIEWS)
    }

    pub fn with_limits(catalog: PipeCatalog, ttl: Duration, capacity: usize) -> Self {
        Self {
            catalog,
            registry: Arc::new(ImageRegistry::default()),
            previews: Arc::new(Mutex::new(Previews::default())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Fetches the QR image of a pipe for `viewer` and returns its handle URL.
    /// Any preview the viewer already had is released.
    pub async fn open(&self, viewer: &str, pipe_id: &str, size: u32) -> Result<String, RepositoryError> {
        let mut image = self.catalog.qr_image_by_pipe(pipe_id, size).await?;

        // Label with the printed code when the pipe is known, for download names.
        if let Ok(pipes) = self.catalog.list_pipes().await {
            if let Some(pipe) = pipes.iter().find(|p| p.id == pipe_id) {
                image.label = pipe.qr_code.clone();
            }
        }

        let handle = self.registry.acquire(image);
        let url = handle.url();

        let mut previews = self.lock_previews();
        previews.sweep(self.ttl);
        let seq = previews.next_seq;
        previews.next_seq += 1;
        let preview = Preview {
            handle,
            opened: Instant::now(),
            seq,
        };
        if let Some(previous) = previews.by_viewer.insert(viewer.to_string(), preview) {
            tracing::debug!("Viewer {} replaced preview {}", viewer, previous.handle.id());
        }
        while previews.by_viewer.len() > self.capacity {
            previews.evict_oldest();
        }
        Ok(url)
    }

    /// Releases the viewer's preview, if any.
    pub fn close(&self, viewer: &str) -> bool {
        self.lock_previews().by_viewer.remove(viewer).is_some()
    }

    pub fn image(&self, handle_id: u64) -> Option<QrImage> {
        self.lock_previews().sweep(self.ttl);
        self.registry.get(handle_id)
    }

    pub fn live_images(&self) -> usize {
        self.registry.live()
    }

    fn lock_previews(&self) -> std::sync::MutexGuard<'_, Previews> {
        self.previews.lock().unwrap_or_else(|e| e.into_inner())
    }
}
