//! svctree.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvctreeConfig {
    pub store: StoreConfig,
    pub import: Option<ImportConfig>,
    pub api: Option<ApiConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the embedded store database file.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Partition prefix for allocated ids (0..=999); the leading digits of
    /// every id created by this deployment.
    pub partition_prefix: Option<u16>,
    /// Create nodes through the management API instead of direct store writes.
    pub via_api: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Management API endpoint, e.g. "http://monitor.example/api_jsonrpc.php".
    pub endpoint: String,
    pub user: String,
    pub password: String,
}

impl SvctreeConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SvctreeConfig = toml::from_str(&content)?;
        if config.partition_prefix() > 999 {
            anyhow::bail!(
                "import.partition_prefix must be 0..=999, got {}",
                config.partition_prefix()
            );
        }
        Ok(config)
    }

    pub fn partition_prefix(&self) -> u16 {
        self.import
            .as_ref()
            .and_then(|import| import.partition_prefix)
            .unwrap_or(0)
    }

    pub fn via_api(&self) -> bool {
        self.import
            .as_ref()
            .and_then(|import| import.via_api)
            .unwrap_or(false)
    }
}
