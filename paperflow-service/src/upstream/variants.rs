//! Client for the variant-question generation service.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ServiceEndpoint;
use crate::error::UpstreamError;

/// Largest variant batch a single request may ask for.
pub const MAX_VARIANT_COUNT: u32 = 5;

/// Variant generation request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantRequest {
    pub source_text: String,
    pub count: u32,
    pub grade: String,
    pub subject: String,
}

#[derive(Deserialize)]
struct VariantResponse {
    #[serde(default)]
    items: Vec<String>,
}

/// Variant generation client
#[derive(Clone)]
pub struct VariantClient {
    client: Client,
    base_url: String,
}

impl VariantClient {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: super::build_client(endpoint)?,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Generate variant question texts for one source question.
    pub async fn generate(&self, mut request: VariantRequest) -> Result<Vec<String>, UpstreamError> {
        request.count = request.count.clamp(1, MAX_VARIANT_COUNT);

        let url = format!("{}/api/variants/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| UpstreamError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(super::api_error(response).await);
        }

        let generated: VariantResponse = response
            .json()
            .await
            .map_err(UpstreamError::InvalidResponse)?;
        Ok(generated.items)
    }
}
