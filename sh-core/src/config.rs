//! Application configuration management.
//!
//! Handles loading, saving, and accessing application configuration including
//! the backend URL and keys, liveness-check tuning, geo defaults, and the
//! migration tooling. Configuration is persisted as TOML on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ShError, ShResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hosted backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Liveness-check tuning.
    #[serde(default)]
    pub liveness: LivenessConfig,

    /// Geographic lookup defaults.
    #[serde(default)]
    pub geo: GeoConfig,

    /// Wallet (invoices and withdrawals) settings.
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Data migration tooling settings.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Hosted backend connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL (e.g., "https://abcd.supabase.co").
    #[serde(default)]
    pub url: String,

    /// Public (anon) API key sent as the `apikey` header.
    #[serde(default)]
    pub anon_key: String,

    /// User access token. Falls back to the anon key when empty.
    #[serde(default)]
    pub access_token: String,

    /// Custom HTTP headers as key-value pairs.
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,

    /// API request timeout in milliseconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_ms: u64,

    /// Automatic retries for transient failures. Zero disables retry.
    #[serde(default)]
    pub max_retries: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

/// Liveness-check thresholds and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessConfig {
    /// A frame counts as a blink when the eye ratio is strictly below this.
    #[serde(default = "default_blink_ratio")]
    pub blink_ratio_threshold: f64,

    /// Number of blink frames required to leave the blink step.
    #[serde(default = "default_required_blinks")]
    pub required_blinks: u32,

    /// Head yaw (degrees) that must be exceeded for a turn to count.
    #[serde(default = "default_yaw_threshold")]
    pub yaw_threshold_deg: f64,

    /// Delay between detection frames in milliseconds.
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// Seconds before the camera closes after a successful check.
    #[serde(default = "default_countdown")]
    pub success_countdown_secs: u64,

    /// Optional session timeout. Unset means wait for the user indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Geographic lookup defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// ISO country code preselected in country pickers.
    #[serde(default = "default_country")]
    pub default_country: String,

    /// Radius used when the caller does not supply one.
    #[serde(default = "default_radius")]
    pub default_radius_km: f64,

    /// Largest radius accepted by proximity searches.
    #[serde(default = "default_max_radius")]
    pub max_radius_km: f64,
}

/// Wallet configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// ISO currency code for invoices and withdrawals.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Smallest withdrawal a provider may request.
    #[serde(default = "default_min_withdrawal")]
    pub min_withdrawal: i64,
}

/// Migration tooling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Path to the SQLite snapshot file. If empty, uses default location.
    #[serde(default)]
    pub snapshot_path: String,

    /// Rows fetched per request while exporting.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Rows sent per request while importing.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Connection pool size for the snapshot database.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

// Default value functions for serde

fn default_api_timeout() -> u64 {
    crate::constants::DEFAULT_API_TIMEOUT_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_blink_ratio() -> f64 {
    0.2
}

fn default_required_blinks() -> u32 {
    2
}

fn default_yaw_threshold() -> f64 {
    15.0
}

fn default_frame_interval() -> u64 {
    33
}

fn default_countdown() -> u64 {
    3
}

fn default_country() -> String {
    "BJ".to_string()
}

fn default_radius() -> f64 {
    25.0
}

fn default_max_radius() -> f64 {
    500.0
}

fn default_currency() -> String {
    "XOF".to_string()
}

fn default_min_withdrawal() -> i64 {
    1_000
}

fn default_page_size() -> u32 {
    500
}

fn default_batch_size() -> u32 {
    200
}

fn default_pool_size() -> u32 {
    4
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: String::new(),
            custom_headers: HashMap::new(),
            api_timeout_ms: default_api_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            blink_ratio_threshold: default_blink_ratio(),
            required_blinks: default_required_blinks(),
            yaw_threshold_deg: default_yaw_threshold(),
            frame_interval_ms: default_frame_interval(),
            success_countdown_secs: default_countdown(),
            timeout_secs: None,
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            default_country: default_country(),
            default_radius_km: default_radius(),
            max_radius_km: default_max_radius(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            min_withdrawal: default_min_withdrawal(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            snapshot_path: String::new(),
            page_size: default_page_size(),
            batch_size: default_batch_size(),
            pool_size: default_pool_size(),
        }
    }
}

impl BackendConfig {
    /// Whether both the URL and the API key are present.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }

    /// Token sent in the `Authorization` header.
    pub fn bearer_token(&self) -> &str {
        if self.access_token.is_empty() {
            &self.anon_key
        } else {
            &self.access_token
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> ShResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> ShResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default config file path.
    pub fn save_default(&self) -> ShResult<()> {
        let path = Self::default_config_path()?;
        self.save_to_file(&path)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> ShResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ShError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> ShResult<PathBuf> {
        let config_dir = Platform::config_dir()?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the effective snapshot path, using the configured path or the default.
    pub fn effective_snapshot_path(&self) -> ShResult<PathBuf> {
        if self.migration.snapshot_path.is_empty() {
            let data_dir = Platform::data_dir()?;
            Ok(data_dir.join("snapshot.db"))
        } else {
            Ok(PathBuf::from(&self.migration.snapshot_path))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> ShResult<PathBuf> {
        if self.logging.directory.is_empty() {
            let data_dir = Platform::data_dir()?;
            Ok(data_dir.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Reject values that would make the liveness check or geo search meaningless.
    pub fn validate(&self) -> ShResult<()> {
        let l = &self.liveness;
        if !(l.blink_ratio_threshold > 0.0 && l.blink_ratio_threshold < 1.0) {
            return Err(ShError::Config(format!(
                "liveness.blink_ratio_threshold must be in (0, 1), got {}",
                l.blink_ratio_threshold
            )));
        }
        if l.required_blinks == 0 {
            return Err(ShError::Config("liveness.required_blinks must be at least 1".into()));
        }
        if !(l.yaw_threshold_deg > 0.0 && l.yaw_threshold_deg < 90.0) {
            return Err(ShError::Config(format!(
                "liveness.yaw_threshold_deg must be in (0, 90), got {}",
                l.yaw_threshold_deg
            )));
        }
        if l.frame_interval_ms == 0 {
            return Err(ShError::Config("liveness.frame_interval_ms must be positive".into()));
        }
        if self.geo.max_radius_km <= 0.0 || self.geo.default_radius_km > self.geo.max_radius_km {
            return Err(ShError::Config(
                "geo.default_radius_km must not exceed a positive geo.max_radius_km".into(),
            ));
        }
        if self.migration.page_size == 0 || self.migration.batch_size == 0 {
            return Err(ShError::Config("migration page and batch sizes must be positive".into()));
        }
        Ok(())
    }

    /// Sanitize and normalize a backend URL.
    ///
    /// Ensures the URL has a scheme (https unless a local address) and strips
    /// trailing slashes and any `/rest/v1` suffix pasted from dashboards.
    pub fn sanitize_backend_url(address: &str) -> String {
        let trimmed = address.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
            format!("http://{trimmed}")
        } else {
            format!("https://{trimmed}")
        };

        let without_slash = with_scheme.trim_end_matches('/');
        without_slash
            .strip_suffix("/rest/v1")
            .unwrap_or(without_slash)
            .to_string()
    }
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }

    /// Save the current configuration to disk.
    pub async fn save(&self) -> ShResult<()> {
        let config = self.inner.read().await;
        config.save_default()
    }
}
