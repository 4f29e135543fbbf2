//! Client for the OCR/layout extraction service.

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::warn;

use crate::config::ServiceEndpoint;
use crate::error::UpstreamError;
use crate::paper::ExtractedItem;

/// Extraction service client
#[derive(Clone)]
pub struct ExtractionClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    items: Vec<ExtractedItem>,
}

#[derive(Deserialize)]
struct HealthResponse {
    timestamp: String,
}

impl ExtractionClient {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: super::build_client(endpoint)?,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send one worksheet image and get back the extracted question items.
    pub async fn extract(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<ExtractedItem>, UpstreamError> {
        let url = format!("{}/api/ocr/extract", self.base_url);

        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(UpstreamError::InvalidResponse)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UpstreamError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(super::api_error(response).await);
        }

        let extracted: ExtractResponse = response
            .json()
            .await
            .map_err(UpstreamError::InvalidResponse)?;
        Ok(extracted.items)
    }

    /// Probe the collaborator health endpoint; returns its timestamp when
    /// reachable. Failures are logged, never propagated.
    pub async fn health_check(&self) -> Option<String> {
        let url = format!("{}/api/health", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<HealthResponse>().await {
                    Ok(health) => Some(health.timestamp),
                    Err(e) => {
                        warn!(error = %e, "Malformed health response from extraction service");
                        None
                    }
                }
            }
            Ok(response) => {
                warn!(status = %response.status(), "Extraction service health check failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "Extraction service unreachable");
                None
            }
        }
    }
}
