//! HTTP API for the paperflow service.
//!
//! Endpoints for worksheet sessions (upload, extraction, crops, pages,
//! drag reordering), variant generation and export pass-through, the demo
//! student error log, and health monitoring.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{delete, get, post, put},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::PaperflowService;

pub mod demo;
pub mod paper;
pub mod variants;

use demo::{
    demo_dashboard_handler, demo_login_handler, demo_practice_handler, demo_question_handler,
    demo_question_status_handler, demo_reset_handler,
};
use paper::{
    clear_image_handler, delete_session_handler, drag_handler, extract_handler, get_crops_handler,
    get_items_handler, get_pages_handler, get_session_handler, preview_handler,
    replace_image_handler, upload_paper_handler,
};
use variants::{create_export_handler, generate_variants_handler};

/// Application state
pub struct AppState {
    pub service: Arc<PaperflowService>,
    pub start_time: Instant,
}

/// Build the API router
pub fn router(service: Arc<PaperflowService>) -> Router {
    let max_body_size = service.config.limits.max_upload_bytes as usize;

    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Worksheet session endpoints - larger body limit for image uploads
        .route(
            "/paper",
            post(upload_paper_handler).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/paper/{id}", get(get_session_handler))
        .route("/paper/{id}", delete(delete_session_handler))
        .route(
            "/paper/{id}/image",
            put(replace_image_handler)
                .delete(clear_image_handler)
                .layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/paper/{id}/preview", get(preview_handler))
        .route("/paper/{id}/extract", post(extract_handler))
        .route("/paper/{id}/items", get(get_items_handler))
        .route("/paper/{id}/crops", get(get_crops_handler))
        .route("/paper/{id}/pages", get(get_pages_handler))
        .route("/paper/{id}/drag", post(drag_handler))
        // Variant generation and export pass-through
        .route("/variants/generate", post(generate_variants_handler))
        .route("/export", post(create_export_handler))
        // Demo mode endpoints
        .route("/demo/login", post(demo_login_handler))
        .route("/demo/reset", post(demo_reset_handler))
        .route("/demo/students/{id}/dashboard", get(demo_dashboard_handler))
        .route(
            "/demo/students/{id}/wrong-questions",
            post(demo_question_handler),
        )
        .route(
            "/demo/students/{id}/wrong-questions/{qid}/status",
            put(demo_question_status_handler),
        )
        .route(
            "/demo/students/{id}/wrong-questions/{qid}/practices",
            post(demo_practice_handler),
        );

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Health ===

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let extraction_timestamp = state.service.extraction.health_check().await;

    Json(HealthResponse {
        status: if extraction_timestamp.is_some() {
            "healthy"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        extraction_available: extraction_timestamp.is_some(),
        extraction_timestamp,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    extraction_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    extraction_timestamp: Option<String>,
}
