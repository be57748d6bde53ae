use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the affinity (collaborative filtering) scorer; snapshot file used when unset
    #[serde(default)]
    pub affinity_url: Option<String>,

    /// Base URL of the content similarity scorer; snapshot file used when unset
    #[serde(default)]
    pub content_url: Option<String>,

    /// Affinity model snapshot file
    #[serde(default = "default_affinity_snapshot_path")]
    pub affinity_snapshot_path: String,

    /// Content model snapshot file
    #[serde(default = "default_content_snapshot_path")]
    pub content_snapshot_path: String,

    /// Smallest accepted per-method candidate count
    #[serde(default = "default_min_count")]
    pub min_count: usize,

    /// Largest accepted per-method candidate count
    #[serde(default = "default_max_count")]
    pub max_count: usize,

    /// Per-method candidate count used when a request omits one
    #[serde(default = "default_count")]
    pub default_count: usize,

    /// Number of unfiltered content candidates scanned for counter-perspectives
    #[serde(default = "default_counter_pool_size")]
    pub counter_pool_size: usize,

    /// Timeout for a single upstream scorer call
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_affinity_snapshot_path() -> String {
    "models/affinity.json".to_string()
}

fn default_content_snapshot_path() -> String {
    "models/content.json".to_string()
}

fn default_min_count() -> usize {
    1
}

fn default_max_count() -> usize {
    100
}

fn default_count() -> usize {
    50
}

fn default_counter_pool_size() -> usize {
    200
}

fn default_upstream_timeout_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            affinity_url: None,
            content_url: None,
            affinity_snapshot_path: default_affinity_snapshot_path(),
            content_snapshot_path: default_content_snapshot_path(),
            min_count: default_min_count(),
            max_count: default_max_count(),
            default_count: default_count(),
            counter_pool_size: default_counter_pool_size(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects count bounds that would make every request invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_count == 0 {
            anyhow::bail!("MIN_COUNT must be positive");
        }
        if self.min_count > self.max_count {
            anyhow::bail!(
                "MIN_COUNT ({}) must not exceed MAX_COUNT ({})",
                self.min_count,
                self.max_count
            );
        }
        if !(self.min_count..=self.max_count).contains(&self.default_count) {
            anyhow::bail!(
                "DEFAULT_COUNT ({}) must lie within [{}, {}]",
                self.default_count,
                self.min_count,
                self.max_count
            );
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
