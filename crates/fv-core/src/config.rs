use serde::{Deserialize, Serialize};

/// Top-level configuration (loaded from fragvault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FragvaultConfig {
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// S3-compatible endpoint of the content store
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket name
    pub bucket: String,
    /// Key prefix for stored fragments
    pub prefix: String,
    /// Enforce HTTPS for store connections
    pub enforce_tls: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8333".into(),
            region: "us-east-1".into(),
            bucket: "fragvault".into(),
            prefix: "objects".into(),
            enforce_tls: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fragment size in bytes (default: 5 MiB)
    pub chunk_size: usize,
    /// Concurrent encrypt+store workers (0 = available parallelism)
    pub workers: usize,
    /// Store retry limit before a fragment settles at failed
    pub max_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5 * 1024 * 1024,
            workers: 0,
            max_retries: 3,
        }
    }
}

impl PipelineConfig {
    /// Effective worker count; 0 resolves to available parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        }
    }
}
