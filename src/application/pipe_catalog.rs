// Pipe catalog - Cached read queries and the create mutation
use crate::application::pipe_repository::{PipeRepository, QrImage, RepositoryError};
use crate::application::query_cache::{CacheTag, QueryCache};
use crate::domain::dashboard::DashboardStats;
use crate::domain::pipe::{NewPipe, Pipe, PipeValidationError};
use std::sync::Arc;
use thiserror::Error;

const ALL_PIPES_KEY: &str = "all";
const STATS_KEY: &str = "stats";
const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Error)]
pub enum CreatePipeError {
    #[error(transparent)]
    Invalid(#[from] PipeValidationError),
    #[error(transparent)]
    Backend(#[from] RepositoryError),
}

impl CreatePipeError {
    /// Notification text shown after a failed create.
    pub fn notification(&self) -> String {
        let message = match self {
            CreatePipeError::Invalid(e) => e.to_string(),
            CreatePipeError::Backend(e) => e.user_message(),
        };
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        };
        format!("Failed to create pipe: {}", message)
    }
}

#[derive(Debug)]
struct CatalogCaches {
    pipes: QueryCache<Vec<Pipe>>,
    by_qr: QueryCache<Pipe>,
    stats: QueryCache<DashboardStats>,
}

#[derive(Clone)]
pub struct PipeCatalog {
    repository: Arc<dyn PipeRepository>,
    caches: Arc<CatalogCaches>,
}

impl PipeCatalog {
    pub fn new(repository: Arc<dyn PipeRepository>) -> Self {
        Self {
            repository,
            caches: Arc::new(CatalogCaches {
                pipes: QueryCache::new(CacheTag::Pipe),
                by_qr: QueryCache::new(CacheTag::Pipe),
                stats: QueryCache::new(CacheTag::Stats),
            }),
        }
    }

    pub async fn list_pipes(&self) -> Result<Vec<Pipe>, RepositoryError> {
        if let Some(pipes) = self.caches.pipes.get(ALL_PIPES_KEY) {
            return Ok(pipes);
        }
        let generation = self.caches.pipes.generation();
        let pipes = self.repository.list_pipes().await?;
        tracing::debug!("Fetched {} pipes", pipes.len());
        if !self.caches.pipes.put(ALL_PIPES_KEY, pipes.clone(), generation) {
            tracing::debug!("Pipe list invalidated while in flight, not cached");
        }
        Ok(pipes)
    }

    pub async fn pipe_by_qr(&self, qr_code: &str) -> Result<Pipe, RepositoryError> {
        if let Some(pipe) = self.caches.by_qr.get(qr_code) {
            return Ok(pipe);
        }
        let generation = self.caches.by_qr.generation();
        let pipe = self.repository.pipe_by_qr(qr_code).await?;
        self.caches.by_qr.put(qr_code, pipe.clone(), generation);
        Ok(pipe)
    }

    pub async fn stats(&self) -> Result<DashboardStats, RepositoryError> {
        if let Some(stats) = self.caches.stats.get(STATS_KEY) {
            return Ok(stats);
        }
        let generation = self.caches.stats.generation();
        let stats = self.repository.dashboard_stats().await?;
        self.caches.stats.put(STATS_KEY, stats.clone(), generation);
        Ok(stats)
    }

    /// Creates a pipe; on success every `Pipe` and `Stats` query is invalidated.
    pub async fn create_pipe(&self, new_pipe: &NewPipe) -> Result<Pipe, CreatePipeError> {
        new_pipe.validate()?;
        let created = self.repository.create_pipe(new_pipe).await?;
        tracing::info!("Created pipe {} ({})", created.id, created.qr_code);
        self.invalidate(&[CacheTag::Pipe, CacheTag::Stats]);
        Ok(created)
    }

    pub fn invalidate(&self, tags: &[CacheTag]) {
        let caches = &self.caches;
        let cached = caches.pipes.len() + caches.by_qr.len() + caches.stats.len();
        caches.pipes.invalidate(tags);
        caches.by_qr.invalidate(tags);
        caches.stats.invalidate(tags);
        tracing::debug!("Invalidated {:?}, {} cached entries before", tags, cached);
    }

    /// Image fetches are not cached.
    pub async fn qr_image_by_code(&self, qr_code: &str, size: u32) -> Result<QrImage, RepositoryError> {
        self.repository.qr_image_by_code(qr_code, size).await
    }

    pub async fn qr_image_by_pipe(&self, pipe_id: &str, size: u32) -> Result<QrImage, RepositoryError> {
        self.repository.qr_image_by_pipe(pipe_id, size).await
    }
}
