use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for the OfferI consultation server
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OfferiConfig {
    /// Program catalog storage
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Continuation token retention
    #[serde(default)]
    pub tokens: TokenConfig,

    /// Per-key monthly consultation quota
    #[serde(default)]
    pub quota: QuotaConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Workflow contract limits
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// SQLite database holding the `programs` table (and quota tables)
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token lifetime in seconds. Unset keeps tokens for the process lifetime.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,

    /// How often expired tokens are swept when a TTL is set
    #[serde(default = "default_purge_interval_seconds")]
    pub purge_interval_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: None,
            purge_interval_seconds: default_purge_interval_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Enforce the monthly quota on the first workflow step
    #[serde(default)]
    pub enabled: bool,

    /// Key used when a caller does not pass one (stdio workers)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Consultations allowed per key per calendar month
    #[serde(default = "default_monthly_limit")]
    pub monthly_limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            monthly_limit: default_monthly_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// SSE keep-alive interval in seconds
    #[serde(default = "default_keep_alive_seconds")]
    pub keep_alive_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            http_port: default_http_port(),
            keep_alive_seconds: default_keep_alive_seconds(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level or EnvFilter directive string, e.g. "info" or "info,rmcp=warn"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for the stdio transport log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: default_log_dir(),
        }
    }
}

/// Quantitative limits each workflow step enforces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub max_selected_universities: usize,
    pub min_background_chars: usize,
    pub max_selection_searches: usize,
    pub selection_results_min: u32,
    pub selection_results_max: u32,
    pub selection_results_default: u32,
    pub max_classifications: usize,
    pub max_universities_per_batch: usize,
    pub max_analysis_searches: usize,
    pub analysis_results_min: u32,
    pub analysis_results_max: u32,
    pub analysis_results_default: u32,
    pub min_fit_note_chars: usize,
    /// Universities at or above this count switch to the large report
    pub large_report_threshold: usize,
    pub small_report_detailed: usize,
    pub small_report_concise: usize,
    pub large_report_detailed: usize,
    pub large_report_concise: usize,
    pub detailed_results_per_search: u32,
    pub min_query_chars: usize,
    pub min_findings_chars: usize,
    pub min_justification_chars: usize,
    pub min_section_chars: usize,
    pub min_summary_chars: usize,
    pub min_strategy_chars: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_selected_universities: 14,
            min_background_chars: 20,
            max_selection_searches: 3,
            selection_results_min: 5,
            selection_results_max: 10,
            selection_results_default: 5,
            max_classifications: 5,
            max_universities_per_batch: 3,
            max_analysis_searches: 2,
            analysis_results_min: 5,
            analysis_results_max: 25,
            analysis_results_default: 5,
            min_fit_note_chars: 40,
            large_report_threshold: 7,
            small_report_detailed: 5,
            small_report_concise: 5,
            large_report_detailed: 10,
            large_report_concise: 10,
            detailed_results_per_search: 15,
            min_query_chars: 10,
            min_findings_chars: 100,
            min_justification_chars: 50,
            min_section_chars: 120,
            min_summary_chars: 30,
            min_strategy_chars: 200,
        }
    }
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("data").join("programs.db")
}
fn default_purge_interval_seconds() -> u64 {
    300
}
fn default_monthly_limit() -> u32 {
    10
}
fn default_http_host() -> String {
    "127.0.0.1".to_string()
}
fn default_http_port() -> u16 {
    3000
}
fn default_keep_alive_seconds() -> u64 {
    15
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_dir() -> PathBuf {
    PathBuf::from(".offeri").join("logs")
}

/// Configuration manager with layered sources
pub struct ConfigManager {
    config: OfferiConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.offeri.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Same as [`ConfigManager::load`], reading `explicit_path` instead of searching.
    pub fn load_from(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        info!("Loading OfferI configuration...");

        Self::load_dotenv();

        let (config, config_path) = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                (Self::read_toml_file(path)?, Some(path.to_path_buf()))
            }
            None => Self::load_config_file()?,
        };

        let config = Self::apply_env_overrides(config);

        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!("Config file: {}", path.display()),
            None => info!("Config file: NONE (using defaults)"),
        }
        info!("Catalog database: {}", config.catalog.database_path.display());
        info!(
            "Token TTL: {}",
            config
                .tokens
                .ttl_seconds
                .map(|s| format!("{}s", s))
                .unwrap_or_else(|| "unbounded".to_string())
        );
        info!(
            "Quota: {}",
            if config.quota.enabled {
                "enforced"
            } else {
                "disabled"
            }
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            } else {
                info!("Loaded .env file from current directory");
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".offeri.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .offeri.env: {}", e);
                } else {
                    info!("Loaded .offeri.env from home directory");
                }
            }
        }
    }

    /// Find and load config file
    /// Search order:
    /// 1. ./.offeri.toml (current directory)
    /// 2. ~/.offeri/config.toml (user config)
    /// 3. Use defaults
    fn load_config_file() -> Result<(OfferiConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".offeri.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".offeri").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        info!("No config file found, using defaults");
        Ok((OfferiConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<OfferiConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let config: OfferiConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: OfferiConfig) -> OfferiConfig {
        if let Ok(path) = std::env::var("OFFERI_DB_PATH") {
            config.catalog.database_path = PathBuf::from(path);
        }

        if let Ok(ttl) = std::env::var("OFFERI_TOKEN_TTL_SECS") {
            if let Ok(secs) = ttl.parse() {
                config.tokens.ttl_seconds = Some(secs);
            }
        }

        if let Ok(enabled) = std::env::var("OFFERI_QUOTA_ENABLED") {
            config.quota.enabled = enabled.to_lowercase() == "true" || enabled == "1";
        }
        if let Ok(limit) = std::env::var("OFFERI_MONTHLY_QUOTA") {
            if let Ok(n) = limit.parse() {
                config.quota.monthly_limit = n;
            }
        }
        if let Ok(key) = std::env::var("OFFERI_API_KEY") {
            config.quota.api_key = Some(key);
        }

        if let Ok(host) = std::env::var("OFFERI_HTTP_HOST") {
            config.server.http_host = host;
        }
        if let Ok(port) = std::env::var("OFFERI_HTTP_PORT") {
            if let Ok(p) = port.parse() {
                config.server.http_port = p;
            }
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }

        config
    }

    /// Validate configuration
    fn validate_config(config: &OfferiConfig) -> Result<(), ConfigError> {
        // Accepts anything RUST_LOG accepts, e.g. `info,rmcp=warn`.
        if let Err(e) = EnvFilter::try_new(&config.logging.level) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log filter '{}': {}",
                config.logging.level, e
            )));
        }

        if config.tokens.ttl_seconds == Some(0) {
            return Err(ConfigError::ValidationError(
                "tokens.ttl_seconds must be positive when set".to_string(),
            ));
        }

        let wf = &config.workflow;
        let ranges = [
            (
                "selection_results",
                wf.selection_results_min,
                wf.selection_results_max,
                wf.selection_results_default,
            ),
            (
                "analysis_results",
                wf.analysis_results_min,
                wf.analysis_results_max,
                wf.analysis_results_default,
            ),
        ];
        for (name, min, max, default) in ranges {
            if min > max || default < min || default > max {
                return Err(ConfigError::ValidationError(format!(
                    "workflow.{name}: expected {name}_min <= {name}_default <= {name}_max, got {min} / {default} / {max}"
                )));
            }
        }

        if wf.max_selected_universities == 0
            || wf.max_classifications == 0
            || wf.max_universities_per_batch == 0
        {
            return Err(ConfigError::ValidationError(
                "workflow selection limits must be positive".to_string(),
            ));
        }

        if wf.large_report_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.large_report_threshold must be positive".to_string(),
            ));
        }

        let small = wf.small_report_detailed + wf.small_report_concise;
        let large = wf.large_report_detailed + wf.large_report_concise;
        if small == 0 || large < small {
            return Err(ConfigError::ValidationError(format!(
                "workflow report sizes must satisfy 0 < small ({}) <= large ({})",
                small, large
            )));
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &OfferiConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = OfferiConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = OfferiConfig::default();
        assert_eq!(config.tokens.ttl_seconds, None);
        assert!(!config.quota.enabled);
        assert_eq!(config.workflow.max_selected_universities, 14);
        assert_eq!(config.workflow.large_report_threshold, 7);
        assert_eq!(config.server.http_port, 3000);
    }

    #[test]
    fn test_config_validation() {
        let config = OfferiConfig::default();
        assert!(ConfigManager::validate_config(&config).is_ok());

        let mut bad_level = config.clone();
        bad_level.logging.level = "info,rmcp=loud".to_string();
        assert!(ConfigManager::validate_config(&bad_level).is_err());

        let mut bad_range = config.clone();
        bad_range.workflow.selection_results_default = 11;
        assert!(ConfigManager::validate_config(&bad_range).is_err());

        let mut zero_ttl = config;
        zero_ttl.tokens.ttl_seconds = Some(0);
        assert!(ConfigManager::validate_config(&zero_ttl).is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: OfferiConfig = toml::from_str(
            r#"
            [tokens]
            ttl_seconds = 3600

            [workflow]
            max_selected_universities = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.tokens.ttl_seconds, Some(3600));
        assert_eq!(config.workflow.max_selected_universities, 10);
        assert_eq!(config.workflow.max_classifications, 5);
        assert_eq!(config.quota.monthly_limit, 10);
    }

    #[test]
    #[serial]
    fn env_overrides_apply() {
        std::env::set_var("OFFERI_TOKEN_TTL_SECS", "120");
        std::env::set_var("OFFERI_QUOTA_ENABLED", "1");
        std::env::set_var("OFFERI_HTTP_PORT", "not_a_port");

        let config = ConfigManager::apply_env_overrides(OfferiConfig::default());
        assert_eq!(config.tokens.ttl_seconds, Some(120));
        assert!(config.quota.enabled);
        assert_eq!(config.server.http_port, 3000);

        std::env::remove_var("OFFERI_TOKEN_TTL_SECS");
        std::env::remove_var("OFFERI_QUOTA_ENABLED");
        std::env::remove_var("OFFERI_HTTP_PORT");
    }

    #[test]
    #[serial]
    fn default_config_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        ConfigManager::create_default_config(&path).unwrap();

        let manager = ConfigManager::load_from(Some(&path)).unwrap();
        assert_eq!(manager.config_path(), Some(path.as_path()));
        assert_eq!(manager.config().workflow.min_strategy_chars, 200);
    }

    #[test]
    #[serial]
    fn rust_log_directives_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        ConfigManager::create_default_config(&path).unwrap();

        std::env::set_var("RUST_LOG", "info,offeri_workflow=debug,rmcp=warn");
        let loaded = ConfigManager::load_from(Some(&path));
        std::env::remove_var("RUST_LOG");

        let manager = loaded.unwrap();
        assert_eq!(
            manager.config().logging.level,
            "info,offeri_workflow=debug,rmcp=warn"
        );
    }

    #[test]
    #[serial]
    fn malformed_rust_log_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        ConfigManager::create_default_config(&path).unwrap();

        std::env::set_var("RUST_LOG", "offeri_workflow=chatty");
        let loaded = ConfigManager::load_from(Some(&path));
        std::env::remove_var("RUST_LOG");

        assert!(matches!(loaded, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let err = ConfigManager::load_from(Some(Path::new("/nonexistent/offeri.toml")))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
