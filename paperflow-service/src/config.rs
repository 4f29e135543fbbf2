//! Static service configuration.
//!
//! Loaded once at startup from an optional `config.*` file layered with
//! `PAPERFLOW`-prefixed environment variables. Nothing here is reloadable
//! at runtime.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_storage")]
    pub storage: StorageConfig,

    #[serde(default = "default_upstream")]
    pub upstream: UpstreamConfig,

    #[serde(default = "default_layout")]
    pub layout: LayoutConfig,

    #[serde(default = "default_limits")]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub demo: DemoConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for spooled uploads and the demo store database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

/// Endpoints for the external extraction, variant-generation, and export
/// services. They usually share one deployment, so all three default to the
/// same base URL.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_service_endpoint")]
    pub extraction: ServiceEndpoint,

    #[serde(default = "default_service_endpoint")]
    pub variants: ServiceEndpoint,

    #[serde(default = "default_service_endpoint")]
    pub export: ServiceEndpoint,
}

/// One upstream service location
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEndpoint {
    #[serde(default = "default_upstream_url")]
    pub base_url: String,

    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

impl ServiceEndpoint {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Print layout configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    /// Smallest accepted page size; requests below are clamped up.
    #[serde(default = "default_min_page_size")]
    pub min_page_size: usize,

    /// Largest accepted page size; requests above are clamped down.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Page size used when a request does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

/// Size limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

/// Demo store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Persistence backend for the demo document: "sqlite" or "memory".
    #[serde(default = "default_demo_backend")]
    pub backend: DemoBackend,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            backend: default_demo_backend(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoBackend {
    Sqlite,
    Memory,
}

// ==================== Default Value Functions ====================

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_storage() -> StorageConfig {
    StorageConfig {
        data_dir: default_data_dir(),
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_upstream() -> UpstreamConfig {
    UpstreamConfig {
        extraction: default_service_endpoint(),
        variants: default_service_endpoint(),
        export: default_service_endpoint(),
    }
}

fn default_service_endpoint() -> ServiceEndpoint {
    ServiceEndpoint {
        base_url: default_upstream_url(),
        timeout_secs: default_upstream_timeout_secs(),
    }
}

fn default_upstream_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_layout() -> LayoutConfig {
    LayoutConfig {
        min_page_size: default_min_page_size(),
        max_page_size: default_max_page_size(),
        default_page_size: default_page_size(),
    }
}

fn default_min_page_size() -> usize {
    4
}

fn default_max_page_size() -> usize {
    12
}

fn default_page_size() -> usize {
    6
}

fn default_limits() -> LimitsConfig {
    LimitsConfig {
        max_upload_bytes: default_max_upload_bytes(),
    }
}

fn default_max_upload_bytes() -> u64 {
    20 * 1024 * 1024 // 20MB
}

fn default_demo_backend() -> DemoBackend {
    DemoBackend::Sqlite
}
