//! Variant generation and export API endpoints.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::upstream::{ExportJob, ExportRequest, VariantRequest};

use super::AppState;

/// Generated variants response
#[derive(Serialize)]
pub struct VariantsResponse {
    pub items: Vec<String>,
}

/// Generate variant questions for one source question
pub async fn generate_variants_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VariantRequest>,
) -> Result<Json<VariantsResponse>, ServiceError> {
    let items = state.service.generate_variants(request).await?;
    Ok(Json(VariantsResponse { items }))
}

/// Submit an export job for a question and its variants
pub async fn create_export_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportJob>, ServiceError> {
    let job = state.service.create_export(request).await?;
    Ok(Json(job))
}
