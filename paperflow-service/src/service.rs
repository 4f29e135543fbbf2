//! Main service coordinator.

mod cropping;
mod sessions;

pub use sessions::SessionSummary;

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{DemoBackend, StaticConfig};
use crate::demo::{DemoRepository, MemoryStore, SqliteStore};
use crate::error::{ServiceError, ServiceResult};
use crate::paper::PaperSession;
use crate::upstream::{
    ExportClient, ExportJob, ExportRequest, ExtractionClient, VariantClient, VariantRequest,
};

/// Service coordinator: upload sessions, upstream clients, demo repository.
pub struct PaperflowService {
    pub config: Arc<StaticConfig>,
    pub demo: DemoRepository,
    pub extraction: ExtractionClient,
    pub variants: VariantClient,
    pub export: ExportClient,
    pub(crate) sessions: DashMap<String, PaperSession>,
    /// Cancellation tokens for in-flight crop batches, keyed by session id.
    crop_tokens: DashMap<String, CancellationToken>,
}

impl PaperflowService {
    /// Create a new service instance.
    pub async fn new(config: Arc<StaticConfig>) -> ServiceResult<Self> {
        info!("Initializing paperflow service");

        std::fs::create_dir_all(config.storage.uploads_dir()).map_err(|e| {
            ServiceError::Internal {
                message: format!("Failed to create uploads directory: {}", e),
            }
        })?;

        let extraction = ExtractionClient::new(&config.upstream.extraction)?;
        let variants = VariantClient::new(&config.upstream.variants)?;
        let export = ExportClient::new(&config.upstream.export)?;

        match extraction.health_check().await {
            Some(timestamp) => {
                info!(
                    url = %config.upstream.extraction.base_url,
                    timestamp = %timestamp,
                    "Extraction service is available"
                );
            }
            None => {
                warn!(
                    url = %config.upstream.extraction.base_url,
                    "Extraction service is not available"
                );
            }
        }

        let demo = match config.demo.backend {
            DemoBackend::Sqlite => {
                let path = config.storage.data_dir.join("paperflow-demo.db");
                info!(path = %path.display(), "Demo store opened");
                DemoRepository::new(Box::new(SqliteStore::open(&path)?))
            }
            DemoBackend::Memory => {
                info!("Demo store is in-memory");
                DemoRepository::new(Box::new(MemoryStore::new()))
            }
        };

        Ok(Self {
            config,
            demo,
            extraction,
            variants,
            export,
            sessions: DashMap::new(),
            crop_tokens: DashMap::new(),
        })
    }

    /// Generate variant questions for one source question.
    pub async fn generate_variants(&self, request: VariantRequest) -> ServiceResult<Vec<String>> {
        if request.source_text.trim().is_empty() {
            return Err(ServiceError::InvalidRequest {
                message: "Source question text is required".to_string(),
            });
        }

        let items = self.variants.generate(request).await?;
        info!(count = items.len(), "Variants generated");
        Ok(items)
    }

    /// Submit an export job for a question and its variants.
    pub async fn create_export(&self, mut request: ExportRequest) -> ServiceResult<ExportJob> {
        if request.original_text.trim().is_empty() {
            return Err(ServiceError::InvalidRequest {
                message: "Original question text is required".to_string(),
            });
        }
        if request.variants.is_empty() {
            return Err(ServiceError::InvalidRequest {
                message: "At least one variant is required".to_string(),
            });
        }
        if request.title.trim().is_empty() {
            request.title = "举一反三-错题整理".to_string();
        }

        let job = self.export.create(&request).await?;
        info!(job_id = %job.job_id, "Export job created");
        Ok(job)
    }
}
