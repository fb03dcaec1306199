use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_TABLE_PATH: &str = "data/compras.csv";
const DEFAULT_MAX_TABLE_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_BACKUP_DIR: &str = "data/backups";
const DEFAULT_BACKUP_RETENTION: usize = 5;
const DEFAULT_REMOTE_API_BASE: &str = "https://api.github.com";
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Table file configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the flat table file, the single source of truth
    #[serde(default = "default_table_path")]
    pub table_path: String,

    /// Files above this size are treated as corrupt and reset
    #[serde(default = "default_max_table_bytes")]
    pub max_table_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_path: default_table_path(),
            max_table_bytes: default_max_table_bytes(),
        }
    }
}

/// Backup rotation configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    /// Directory holding the timestamped `.bak` snapshots
    #[serde(default = "default_backup_dir")]
    pub dir: String,

    /// Maximum number of snapshots kept per base file (FIFO eviction)
    #[serde(default = "default_backup_retention")]
    #[validate(range(min = 1))]
    pub retention: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
            retention: default_backup_retention(),
        }
    }
}

/// Remote mirror configuration. Absent means local-only operation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Repository in `owner/name` form
    #[validate(length(min = 1))]
    pub repository: String,

    /// Path of the mirrored file inside the repository
    #[validate(length(min = 1))]
    pub path: String,

    /// Access token for the file API
    #[validate(length(min = 1))]
    pub token: String,

    /// API base URL; tests point this at a local server
    #[serde(default = "default_remote_api_base")]
    pub api_base: String,

    /// Request timeout in seconds; expiry surfaces as a network failure
    #[serde(default = "default_remote_timeout_secs")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

/// Application configuration, loaded once at startup and passed into
/// constructors. Reconfiguration means rebuilding the dependent components.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    #[validate]
    pub store: StoreConfig,

    #[serde(default)]
    #[validate]
    pub backup: BackupConfig,

    /// Optional remote mirror; when unset, sync is disabled entirely
    #[serde(default)]
    #[validate]
    pub remote: Option<RemoteConfig>,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            backup: BackupConfig::default(),
            remote: None,
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn default_table_path() -> String {
    DEFAULT_TABLE_PATH.to_string()
}

fn default_max_table_bytes() -> u64 {
    DEFAULT_MAX_TABLE_BYTES
}

fn default_backup_dir() -> String {
    DEFAULT_BACKUP_DIR.to_string()
}

fn default_backup_retention() -> usize {
    DEFAULT_BACKUP_RETENTION
}

fn default_remote_api_base() -> String {
    DEFAULT_REMOTE_API_BASE.to_string()
}

fn default_remote_timeout_secs() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_SECS
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading error: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from built-in defaults, optional `config/<env>` files
/// and `APP__`-prefixed environment variables (e.g. `APP__REMOTE__TOKEN`).
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    Ok(app_config)
}

/// Initializes the tracing subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("requisition_store={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    if json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init();
    }
}
