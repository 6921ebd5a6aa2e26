use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DejavuConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub classifier: ClassifierConfig,
    pub generation: GenerationConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub socket_path: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Duplicate-classifier configuration.
///
/// `feature_dimensions` is the input width of the trained artifact. It must
/// equal the extractor's `FEATURE_DIMENSIONS` — the extractor and the
/// classifier weights are one versioned unit.
#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    pub backend: String,
    pub model_path: String,
    pub feature_dimensions: usize,
    pub threshold: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8767,
        }
    }
}

impl DejavuConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}
