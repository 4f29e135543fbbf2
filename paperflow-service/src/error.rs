use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main service error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Session has no source image: {session_id}")]
    NoSourceImage { session_id: String },

    #[error("Student not found: {student_id}")]
    StudentNotFound { student_id: i64 },

    #[error("Wrong question not found: {question_id}")]
    QuestionNotFound { question_id: i64 },

    #[error("{0}")]
    Upstream(#[from] UpstreamError),

    #[error("Image decode failed")]
    Decode(#[from] DecodeError),

    #[error("Demo store error")]
    Store(#[from] StoreError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Upstream collaborator errors (extraction, variant generation, export)
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Connection failed to {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream request failed (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from upstream service")]
    InvalidResponse(#[source] reqwest::Error),
}

/// Source image decode errors
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported or corrupt image data")]
    Malformed(#[source] image::ImageError),

    #[error("Upload too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("Unsupported content type: {content_type}")]
    UnsupportedType { content_type: String },

    #[error("IO error")]
    Io(#[source] std::io::Error),
}

/// Demo store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store backend failed")]
    Backend(#[source] rusqlite::Error),

    #[error("Serialization failed")]
    Serialization(#[source] serde_json::Error),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::SessionNotFound { .. }
            | ServiceError::StudentNotFound { .. }
            | ServiceError::QuestionNotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::NoSourceImage { .. } | ServiceError::InvalidRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Decode(DecodeError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::Decode(DecodeError::UnsupportedType { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServiceError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::SessionNotFound { .. } => "session_not_found",
            ServiceError::NoSourceImage { .. } => "no_source_image",
            ServiceError::StudentNotFound { .. } => "student_not_found",
            ServiceError::QuestionNotFound { .. } => "question_not_found",
            ServiceError::Upstream(UpstreamError::Connection { .. }) => "upstream_connection",
            ServiceError::Upstream(UpstreamError::Api { .. }) => "upstream_error",
            ServiceError::Upstream(UpstreamError::InvalidResponse(_)) => "upstream_invalid_response",
            ServiceError::Decode(DecodeError::TooLarge { .. }) => "upload_too_large",
            ServiceError::Decode(DecodeError::UnsupportedType { .. }) => "unsupported_type",
            ServiceError::Decode(_) => "decode_error",
            ServiceError::Store(_) => "store_error",
            ServiceError::InvalidRequest { .. } => "invalid_request",
            ServiceError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();

        let response = ErrorResponse {
            message: self.to_string(),
            code: Some(code),
        };

        (status, Json(response)).into_response()
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
