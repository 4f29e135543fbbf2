//! Upload session management: create/replace/tear down sessions and the
//! operations over their item lists.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::paper::{
    CropStatus, ExtractedItem, Page, PaperSession, SourceImage, clamp_page_size, move_item,
    paginate,
};
use crate::service::PaperflowService;

/// Session state returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub width: u32,
    pub height: u32,
    /// Stable preview reference for the current image; empty when cleared.
    pub preview_url: Option<String>,
    pub item_count: usize,
    pub crop_count: usize,
    pub crop_status: CropStatus,
    /// Item currently being dragged, if any.
    pub dragging: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

fn summarize(session: &PaperSession) -> SessionSummary {
    SessionSummary {
        session_id: session.id.clone(),
        width: session.source.as_ref().map(|s| s.width()).unwrap_or(0),
        height: session.source.as_ref().map(|s| s.height()).unwrap_or(0),
        preview_url: session.preview_ref(),
        item_count: session.items.len(),
        crop_count: session.crops.len(),
        crop_status: session.crop_status,
        dragging: session.drag.dragging_id(),
        created_at: session.created_at,
        updated_at: session.updated_at,
    }
}

impl PaperflowService {
    /// Create a session from an uploaded worksheet image.
    pub async fn create_session(
        &self,
        bytes: Vec<u8>,
        declared_type: Option<String>,
    ) -> ServiceResult<SessionSummary> {
        let source = SourceImage::spool(
            self.config.storage.uploads_dir(),
            bytes,
            declared_type,
            self.config.limits.max_upload_bytes,
        )
        .await?;

        let id = Uuid::new_v4().to_string();
        let mut session = PaperSession::new(id.clone());
        session.replace_source(source);

        info!(
            session_id = %id,
            width = session.source.as_ref().map(|s| s.width()).unwrap_or(0),
            height = session.source.as_ref().map(|s| s.height()).unwrap_or(0),
            "Session created"
        );

        let summary = summarize(&session);
        self.sessions.insert(id, session);
        Ok(summary)
    }

    /// Replace a session's source image.
    ///
    /// Identical bytes (by content hash) keep the current items and crops;
    /// anything else cancels any in-flight crop batch and invalidates all
    /// derived state.
    pub async fn replace_image(
        &self,
        session_id: &str,
        bytes: Vec<u8>,
        declared_type: Option<String>,
    ) -> ServiceResult<SessionSummary> {
        if !self.sessions.contains_key(session_id) {
            return Err(ServiceError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }

        let source = SourceImage::spool(
            self.config.storage.uploads_dir(),
            bytes,
            declared_type,
            self.config.limits.max_upload_bytes,
        )
        .await?;

        let mut session = self.sessions.get_mut(session_id).ok_or_else(|| {
            ServiceError::SessionNotFound {
                session_id: session_id.to_string(),
            }
        })?;

        if let Some(existing) = &session.source
            && existing.hash() == source.hash()
        {
            debug!(session_id = %session_id, "Identical image re-uploaded, keeping session state");
            return Ok(summarize(&session));
        }

        self.cancel_crop_batch(session_id);
        session.replace_source(source);
        info!(session_id = %session_id, "Source image replaced");
        Ok(summarize(&session))
    }

    /// Clear the session's source image without tearing the session down.
    /// The preview reference becomes empty and all derived state is
    /// invalidated; dropping the old image releases its spool file.
    pub fn clear_image(&self, session_id: &str) -> ServiceResult<SessionSummary> {
        self.cancel_crop_batch(session_id);
        let mut session = self.get_session_mut(session_id)?;
        session.clear_source();
        info!(session_id = %session_id, "Source image cleared");
        Ok(summarize(&session))
    }

    /// Tear down a session; dropping it releases the spooled image.
    pub fn delete_session(&self, session_id: &str) -> ServiceResult<()> {
        self.cancel_crop_batch(session_id);
        match self.sessions.remove(session_id) {
            Some(_) => {
                info!(session_id = %session_id, "Session deleted");
                Ok(())
            }
            None => Err(ServiceError::SessionNotFound {
                session_id: session_id.to_string(),
            }),
        }
    }

    pub fn session_summary(&self, session_id: &str) -> ServiceResult<SessionSummary> {
        let session = self.get_session(session_id)?;
        Ok(summarize(&session))
    }

    /// Raw bytes and content type of the current source image.
    pub async fn preview(&self, session_id: &str) -> ServiceResult<(&'static str, Vec<u8>)> {
        let (content_type, path) = {
            let session = self.get_session(session_id)?;
            let source = session.source.as_ref().ok_or_else(|| {
                ServiceError::NoSourceImage {
                    session_id: session_id.to_string(),
                }
            })?;
            (source.content_type(), source.path().to_path_buf())
        };

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ServiceError::Internal {
                message: format!("Failed to read spooled image: {}", e),
            })?;
        Ok((content_type, bytes))
    }

    /// Run extraction for the session's image, install the items, and start
    /// a crop batch.
    pub async fn extract_questions(
        self: &Arc<Self>,
        session_id: &str,
    ) -> ServiceResult<Vec<ExtractedItem>> {
        let (generation, content_type, path) = {
            let session = self.get_session(session_id)?;
            let source = session.source.as_ref().ok_or_else(|| {
                ServiceError::NoSourceImage {
                    session_id: session_id.to_string(),
                }
            })?;
            (
                session.generation,
                source.content_type(),
                source.path().to_path_buf(),
            )
        };

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ServiceError::Internal {
                message: format!("Failed to read spooled image: {}", e),
            })?;

        let filename = format!(
            "worksheet.{}",
            content_type.rsplit('/').next().unwrap_or("png")
        );
        let items = self.extraction.extract(&filename, content_type, bytes).await?;
        info!(session_id = %session_id, count = items.len(), "Questions extracted");

        {
            let mut session = self.get_session_mut(session_id)?;
            if session.generation != generation {
                debug!(
                    session_id = %session_id,
                    "Source image changed during extraction, discarding items"
                );
                return Err(ServiceError::InvalidRequest {
                    message: "Source image changed during extraction, retry".to_string(),
                });
            }
            session.replace_items(items.clone());
        }

        self.spawn_crop_batch(session_id);
        Ok(items)
    }

    /// Current item ordering.
    pub fn items(&self, session_id: &str) -> ServiceResult<Vec<ExtractedItem>> {
        Ok(self.get_session(session_id)?.items.clone())
    }

    /// Crop cache and batch status.
    pub fn crops(
        &self,
        session_id: &str,
    ) -> ServiceResult<(CropStatus, HashMap<i64, String>)> {
        let session = self.get_session(session_id)?;
        Ok((session.crop_status, session.crops.clone()))
    }

    /// Printable pages for the current ordering.
    pub fn pages(&self, session_id: &str, page_size: Option<usize>) -> ServiceResult<Vec<Page>> {
        let session = self.get_session(session_id)?;
        let page_size = clamp_page_size(page_size, &self.config.layout);
        Ok(paginate(&session.items, page_size))
    }

    /// Drag-start: record the dragged item.
    pub fn drag_start(&self, session_id: &str, item_id: i64) -> ServiceResult<Vec<ExtractedItem>> {
        let mut session = self.get_session_mut(session_id)?;
        session.drag.start(item_id);
        Ok(session.items.clone())
    }

    /// Drop onto a target item: apply the reorder recorded by drag-start.
    pub fn drag_drop(&self, session_id: &str, target_id: i64) -> ServiceResult<Vec<ExtractedItem>> {
        let mut session = self.get_session_mut(session_id)?;
        if let Some(from_id) = session.drag.finish_drop() {
            let reordered = move_item(&session.items, from_id, target_id);
            session.apply_ordering(reordered);
        }
        Ok(session.items.clone())
    }

    /// Drag-end without a drop.
    pub fn drag_end(&self, session_id: &str) -> ServiceResult<Vec<ExtractedItem>> {
        let mut session = self.get_session_mut(session_id)?;
        session.drag.cancel();
        Ok(session.items.clone())
    }

    fn get_session(
        &self,
        session_id: &str,
    ) -> ServiceResult<dashmap::mapref::one::Ref<'_, String, PaperSession>> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| ServiceError::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }

    fn get_session_mut(
        &self,
        session_id: &str,
    ) -> ServiceResult<dashmap::mapref::one::RefMut<'_, String, PaperSession>> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| ServiceError::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }
}
