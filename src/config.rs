use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::interview::{Language, HR_OPENING_LINE};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    pub interview: InterviewSettings,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerationConfig {
    #[validate(url)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
    #[validate(range(min = 1, max = 60))]
    pub connect_timeout_secs: u64,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_name")]
    pub dbname: String,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "techhire_db".to_string()
}

fn default_db_user() -> String {
    "techhire_user".to_string()
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.dbname
        )
    }

    /// Connection target without the password, for logs.
    pub fn describe(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InterviewSettings {
    pub default_language: Language,
    #[validate(length(min = 1))]
    pub hr_opening_line: String,
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            default_language: Language::JavaScript,
            hr_opening_line: HR_OPENING_LINE.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `techhire.{toml,json,yaml}` if present, then `TECHHIRE__*`
    /// environment variables (a `.env` file is honoured).
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            info!("No .env file loaded ({}); using process environment", e);
        }

        let settings = Self::defaults()?
            .add_source(File::with_name("techhire").required(false))
            .add_source(
                Environment::with_prefix("TECHHIRE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_settings(settings)
    }

    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("generation.base_url", "https://api.openai.com/v1")?
            .set_default("generation.model", "gpt-4o-mini")?
            .set_default("generation.request_timeout_secs", 60_i64)?
            .set_default("generation.connect_timeout_secs", 5_i64)?
            .set_default("generation.temperature", 0.7)?
            .set_default("interview.default_language", "javascript")?
            .set_default("interview.hr_opening_line", HR_OPENING_LINE)?)
    }

    pub fn from_settings(settings: Config) -> Result<Self> {
        let mut config: AppConfig = settings.try_deserialize()?;

        if config.generation.api_key.is_none() {
            config.generation.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if config.generation.api_key.is_none() {
            warn!("No generation API key configured - backend calls will likely be rejected");
        }
        if config.database.is_none() {
            warn!("No database configured - interview results will only be kept in memory");
        }

        config.generation.validate()?;
        config.interview.validate()?;
        Ok(config)
    }
}
