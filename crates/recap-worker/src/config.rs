use config::{Config as ConfigLoader, ConfigError, Environment, File, FileFormat};
use recap_llm::config::{OpenAIConfig, ProviderDetails};
use recap_llm::ProviderConfig;
use recap_pipeline::PipelineConfig;
use recap_queue::{JobSettings, WorkerConfig};
use recap_transcribe::TranscriptionConfig;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub mongodb: MongoDbConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
    
    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub transcription_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    /// In-memory store and queue when disabled
    #[serde(default)]
    pub enabled: bool,
    pub database: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub jobs: JobSettings,
    #[serde(default)]
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub enum LlmProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "azure_openai")]
    AzureOpenAI,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    /// OpenAI base URL override, or the Azure resource endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: None,
            api_version: None,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn provider_config(&self, api_key: &str) -> Result<ProviderConfig, ConfigError> {
        let config = match self.provider {
            LlmProvider::OpenAI => match &self.endpoint {
                Some(endpoint) => ProviderConfig {
                    details: ProviderDetails::OpenAI(OpenAIConfig::new(api_key).with_base_url(endpoint.clone())),
                    timeout_secs: self.timeout_secs,
                },
                None => ProviderConfig::openai(api_key),
            },
            LlmProvider::AzureOpenAI => {
                let endpoint = self
                    .endpoint
                    .clone()
                    .ok_or_else(|| ConfigError::Message("llm.endpoint is required for azure_openai".to_string()))?;
                let api_version = self
                    .api_version
                    .clone()
                    .ok_or_else(|| ConfigError::Message("llm.api_version is required for azure_openai".to_string()))?;
                ProviderConfig::azure_openai(api_key, endpoint, api_version)
            }
        };
        Ok(config.with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    /// 
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed with `RECAP_`, nested keys split by `__`
    ///    (e.g. `RECAP_SERVER__PORT`, `RECAP_QUEUE__WORKER__CONCURRENCY`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());
        
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("RECAP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        
        let mut cfg: Config = config.try_deserialize()?;
        cfg.load_secrets()?;
        Ok(cfg)
    }
    
    /// Parse a TOML document without touching files or the environment
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
    
    fn load_secrets(&mut self) -> Result<(), ConfigError> {
        if self.mongodb.enabled {
            self.mongodb_uri = std::env::var("MONGODB_URI")
                .map_err(|_| ConfigError::Message("MONGODB_URI environment variable is required".to_string()))?;
        }
        self.openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string()))?;
        self.transcription_api_key = std::env::var("TRANSCRIPTION_API_KEY").unwrap_or_default();
        Ok(())
    }
    
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}
