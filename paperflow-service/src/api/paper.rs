//! Worksheet session API endpoints.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::paper::{CropStatus, ExtractedItem, Page};
use crate::service::SessionSummary;

use super::AppState;

/// Response for delete operations
#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Pagination query parameters
#[derive(Deserialize)]
pub struct PagesParams {
    pub page_size: Option<usize>,
}

/// Drag interaction request: one transition of the drag state machine.
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum DragRequest {
    /// Drag-start over an item.
    Start { item_id: i64 },
    /// Drop onto a target item.
    Drop { item_id: i64 },
    /// Drag ended without a drop.
    End,
}

/// Items response shared by the item and drag endpoints.
#[derive(Serialize)]
pub struct ItemsResponse {
    pub items: Vec<ExtractedItem>,
}

/// Crop cache response
#[derive(Serialize)]
pub struct CropsResponse {
    pub status: CropStatus,
    pub crops: HashMap<i64, String>,
}

/// Pages response
#[derive(Serialize)]
pub struct PagesResponse {
    pub page_size: usize,
    pub pages: Vec<Page>,
}

/// Pull the uploaded image out of a multipart form.
async fn read_image_field(
    mut multipart: Multipart,
) -> Result<(Vec<u8>, Option<String>), ServiceError> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name().unwrap_or("") != "file" {
            continue;
        }
        let content_type = field.content_type().map(|ct| ct.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ServiceError::InvalidRequest {
                message: e.to_string(),
            })?;
        return Ok((data.to_vec(), content_type));
    }

    Err(ServiceError::InvalidRequest {
        message: "No file provided".to_string(),
    })
}

/// Upload a worksheet image and create a session
pub async fn upload_paper_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SessionSummary>, ServiceError> {
    let (bytes, content_type) = read_image_field(multipart).await?;
    let summary = state.service.create_session(bytes, content_type).await?;
    Ok(Json(summary))
}

/// Replace the session's source image
pub async fn replace_image_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<SessionSummary>, ServiceError> {
    let (bytes, content_type) = read_image_field(multipart).await?;
    let summary = state.service.replace_image(&id, bytes, content_type).await?;
    Ok(Json(summary))
}

/// Clear the session's source image
pub async fn clear_image_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, ServiceError> {
    Ok(Json(state.service.clear_image(&id)?))
}

/// Get session state
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, ServiceError> {
    Ok(Json(state.service.session_summary(&id)?))
}

/// Tear down a session
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ServiceError> {
    state.service.delete_session(&id)?;
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Session {} deleted", id),
    }))
}

/// Serve the raw source image
pub async fn preview_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let (content_type, bytes) = state.service.preview(&id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Run question extraction for the session's image
pub async fn extract_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ItemsResponse>, ServiceError> {
    let items = state.service.extract_questions(&id).await?;
    Ok(Json(ItemsResponse { items }))
}

/// Current item ordering
pub async fn get_items_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ItemsResponse>, ServiceError> {
    Ok(Json(ItemsResponse {
        items: state.service.items(&id)?,
    }))
}

/// Crop cache keyed by item id
pub async fn get_crops_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CropsResponse>, ServiceError> {
    let (status, crops) = state.service.crops(&id)?;
    Ok(Json(CropsResponse { status, crops }))
}

/// Printable pages for the current ordering
pub async fn get_pages_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PagesParams>,
) -> Result<Json<PagesResponse>, ServiceError> {
    let pages = state.service.pages(&id, params.page_size)?;
    let page_size = crate::paper::clamp_page_size(params.page_size, &state.service.config.layout);
    Ok(Json(PagesResponse { page_size, pages }))
}

/// Apply one drag transition
pub async fn drag_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<DragRequest>,
) -> Result<Json<ItemsResponse>, ServiceError> {
    let items = match request {
        DragRequest::Start { item_id } => state.service.drag_start(&id, item_id)?,
        DragRequest::Drop { item_id } => state.service.drag_drop(&id, item_id)?,
        DragRequest::End => state.service.drag_end(&id)?,
    };
    Ok(Json(ItemsResponse { items }))
}
