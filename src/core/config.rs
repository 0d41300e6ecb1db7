use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::Secret;
use serde::Deserialize;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::ConnectOptions;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub factory_link_server_config: FactoryLinkServer,
    pub sqlite: SqliteConfig,
    pub session_auth_config: SessionAuthConfig,
    pub files: FilesConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir().expect("Failed to find the current dir");
        let config_dir = base_path.join("src/core/configurations");

        let app_environment: Environment = std::env::var("FACTORY_LINK_APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .expect("Failed to parse FACTORY_LINK_APP_ENVIRONMENT");

        let configurations = config::Config::builder()
            .add_source(
                config::File::from(config_dir.join(app_environment.as_str())).required(true),
            )
            .build()?;

        configurations.try_deserialize()
    }
}

#[derive(Deserialize, Clone)]
pub struct FactoryLinkServer {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct SqliteConfig {
    pub database_path: String,
}

impl SqliteConfig {
    pub fn connect(&self) -> SqliteConnectOptions {
        let options = SqliteConnectOptions::new()
            .filename(&self.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        options.log_statements(tracing::log::LevelFilter::Trace)
    }
}

#[derive(Deserialize, Clone)]
pub struct SessionAuthConfig {
    pub secret: Secret<String>,
    pub token_expiration_time: i64,
}

#[derive(Deserialize, Clone)]
pub struct FilesConfig {
    pub root_dir: String,
}

impl FilesConfig {
    pub fn submission_dir(&self, submission_id: &str) -> PathBuf {
        Path::new(&self.root_dir).join(submission_id)
    }
}

pub enum Environment {
    Local,
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not supported environment. Use either `local`, `sandbox` or `production` ",
                other
            )),
        }
    }
}
