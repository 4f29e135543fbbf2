//! Typed clients for the external collaborator services: question
//! extraction, variant generation, and worksheet export.
//!
//! All three speak JSON (multipart for the image upload) over HTTP.
//! Non-2xx responses carry either a plain-text body or `{ "detail": ... }`
//! JSON; both are reduced to a single message string.

mod export;
mod extraction;
mod variants;

pub use export::{ExportClient, ExportJob, ExportRequest};
pub use extraction::ExtractionClient;
pub use variants::{VariantClient, VariantRequest};

use reqwest::Client;

use crate::config::ServiceEndpoint;
use crate::error::UpstreamError;

/// Build a reqwest client for one upstream endpoint.
pub(crate) fn build_client(endpoint: &ServiceEndpoint) -> Result<Client, UpstreamError> {
    Client::builder()
        .timeout(endpoint.timeout())
        .user_agent(concat!("paperflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| UpstreamError::Connection {
            url: endpoint.base_url.clone(),
            source: e,
        })
}

/// Reduce a non-2xx response to a single user-facing message string.
pub(crate) async fn api_error(response: reqwest::Response) -> UpstreamError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    UpstreamError::Api {
        status,
        message: reduce_error_body(status, &body),
    }
}

/// Error bodies are either plain text or `{ "detail": ... }` JSON; either
/// way the caller gets one message string.
fn reduce_error_body(status: u16, body: &str) -> String {
    let message = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(detail)) => detail.clone(),
            Some(detail) => detail.to_string(),
            None => body.to_string(),
        },
        Err(_) => body.to_string(),
    };

    if message.is_empty() {
        format!("Request failed: {}", status)
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::reduce_error_body;
    use serde_json::json;

    #[test]
    fn test_detail_shaped_error_body() {
        assert_eq!(
            reduce_error_body(422, &json!({"detail": "missing file"}).to_string()),
            "missing file"
        );
    }

    #[test]
    fn test_structured_detail_is_stringified() {
        let body = json!({"detail": [{"loc": ["file"], "msg": "required"}]}).to_string();
        assert!(reduce_error_body(422, &body).contains("required"));
    }

    #[test]
    fn test_plain_text_error_body() {
        assert_eq!(reduce_error_body(500, "boom"), "boom");
    }

    #[test]
    fn test_empty_body_falls_back_to_status() {
        assert_eq!(reduce_error_body(503, ""), "Request failed: 503");
    }
}
