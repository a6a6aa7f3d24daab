use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

use crate::auth::store::default_session_path;
use crate::services::validation::TransactionPolicy;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PAGE_SIZE: u32 = 20;
const CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "CELLAR";

/// Client configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the REST backend, including the `/api` prefix
    #[validate(url(message = "api_base_url must be an absolute URL"))]
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Overrides the session file location
    #[serde(default)]
    pub session_file: Option<String>,

    /// Whether stock movements must carry a reason
    #[serde(default = "default_true")]
    pub require_transaction_reason: bool,

    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_env")]
    pub environment: String,

    #[validate(custom = "validate_log_level")]
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
            session_file: None,
            require_transaction_reason: true,
            default_page_size: DEFAULT_PAGE_SIZE,
            environment: default_env(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl ClientConfig {
    /// Configuration pointed at a specific backend, everything else default.
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            api_base_url: url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn transaction_policy(&self) -> TransactionPolicy {
        TransactionPolicy {
            require_reason: self.require_transaction_reason,
        }
    }

    /// Explicit `session_file`, else `$CELLAR_CLI_HOME` or `~/.cellar`.
    pub fn session_path(&self) -> Option<PathBuf> {
        match self.session_file.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => default_session_path(),
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("cellar-cli/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_env() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("wine_cellar={level},cellar={level}");
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    // Logs go to stderr so `--json` output on stdout stays machine readable.
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Loads client configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (CELLAR__*)
pub fn load_config() -> Result<ClientConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<ClientConfig, AppConfigError> {
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
        .set_default("require_transaction_reason", true)?
        .set_default("default_page_size", i64::from(DEFAULT_PAGE_SIZE))?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(run_env)).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let client_config: ClientConfig = config.try_deserialize()?;

    client_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(client_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        writeln!(file, "{}", content).unwrap();
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = ClientConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert!(cfg.transaction_policy().require_reason);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut cfg = ClientConfig::default();
        cfg.request_timeout_secs = 0;
        cfg.default_page_size = 500;
        cfg.log_level = "chatty".into();
        let errors = cfg.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("request_timeout_secs"));
        assert!(fields.contains_key("default_page_size"));
        assert!(fields.contains_key("log_level"));
    }

    #[test]
    fn rejects_relative_base_url() {
        let cfg = ClientConfig::with_base_url("localhost/api");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn files_layer_over_defaults() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
            api_base_url = "http://cellar.internal:9000/api"
            require_transaction_reason = false
            "#,
        );
        write_config(&dir, "staging.toml", "request_timeout_secs = 30");

        let cfg = load_config_from(dir.path(), "staging").unwrap();
        assert_eq!(cfg.api_base_url, "http://cellar.internal:9000/api");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert!(!cfg.transaction_policy().require_reason);
        assert_eq!(cfg.environment, "staging");
    }

    #[test]
    fn missing_directory_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("absent"), "test").unwrap();
        assert_eq!(cfg.default_page_size, 20);
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "default.toml", "default_page_size = 0");
        assert!(matches!(
            load_config_from(dir.path(), "test"),
            Err(AppConfigError::Validation(_))
        ));
    }

    #[test]
    fn explicit_session_file_wins() {
        let mut cfg = ClientConfig::default();
        cfg.session_file = Some("/tmp/cellar-session.json".into());
        assert_eq!(
            cfg.session_path(),
            Some(PathBuf::from("/tmp/cellar-session.json"))
        );
    }
}
