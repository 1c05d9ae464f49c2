//! Service configuration: defaults, optional TOML file, then `SENSI__*` environment.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::genai::{
    GenAiSettings, RetryPolicy, DEFAULT_ENDPOINT, DEFAULT_SPEECH_MODEL, DEFAULT_TEXT_MODEL,
};

#[derive(Debug, Clone, Deserialize)]
pub struct GenAiConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub text_model: String,
    pub speech_model: String,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
}

/// Shared-secret pair checked by the owner panel. Not a security boundary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerConfig {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensiConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub data_path: String,
    /// Namespace segment of every document path.
    pub app_id: String,
    pub genai: GenAiConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub owner: OwnerConfig,
    #[serde(default)]
    pub channel_url: Option<String>,
    /// Custom sign-in token; anonymous sign-in when absent.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// In-memory sessions untouched this long are dropped.
    pub session_idle_secs: u64,
}

impl SensiConfig {
    /// Precedence: environment `SENSI__*` > file (`SENSI_CONFIG` or `config/sensi.toml`) > defaults.
    /// A `.env` file, when present, is loaded into the environment first.
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let config_path =
            std::env::var("SENSI_CONFIG").unwrap_or_else(|_| "config/sensi.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 4000_i64)?
            .set_default("static_dir", "build")?
            .set_default("data_path", "./data/sensi_documents")?
            .set_default("app_id", "default-app-id")?
            .set_default("session_idle_secs", 1800_i64)?
            .set_default("genai.endpoint", DEFAULT_ENDPOINT)?
            .set_default("genai.text_model", DEFAULT_TEXT_MODEL)?
            .set_default("genai.speech_model", DEFAULT_SPEECH_MODEL)?
            .set_default("genai.max_attempts", 3_i64)?
            .set_default("genai.base_delay_ms", 1000_i64)?
            .set_default("genai.timeout_secs", 60_i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        builder
            .add_source(config::Environment::with_prefix("SENSI").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn genai_settings(&self) -> GenAiSettings {
        GenAiSettings {
            endpoint: self.genai.endpoint.clone(),
            api_key: self.genai.api_key.clone(),
            text_model: self.genai.text_model.clone(),
            speech_model: self.genai.speech_model.clone(),
            retry: RetryPolicy {
                max_attempts: self.genai.max_attempts,
                base_delay: Duration::from_millis(self.genai.base_delay_ms),
            },
            timeout: Duration::from_secs(self.genai.timeout_secs),
        }
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Owner-panel login. Fails closed when no credentials are configured.
    pub fn admin_matches(&self, id: &str, key: &str) -> bool {
        !self.admin.id.is_empty() && self.admin.id == id && self.admin.key == key
    }

    /// Store owner login. Fails closed when no key is configured.
    pub fn owner_matches(&self, key: &str) -> bool {
        !self.owner.key.is_empty() && self.owner.key == key
    }
}
