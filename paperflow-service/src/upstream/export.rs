//! Client for the worksheet export service.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ServiceEndpoint;
use crate::error::UpstreamError;

/// Export request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub title: String,
    pub original_text: String,
    pub variants: Vec<String>,
    #[serde(default)]
    pub include_images: bool,
}

/// Export job handle returned by the service. The download URL appears once
/// the job has rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Export service client
#[derive(Clone)]
pub struct ExportClient {
    client: Client,
    base_url: String,
}

impl ExportClient {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: super::build_client(endpoint)?,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Submit a worksheet for export rendering.
    pub async fn create(&self, request: &ExportRequest) -> Result<ExportJob, UpstreamError> {
        let url = format!("{}/api/export", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(super::api_error(response).await);
        }

        response.json().await.map_err(UpstreamError::InvalidResponse)
    }
}
