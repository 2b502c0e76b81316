//! Configuration file model and resolution
//!
//! A YAML file is looked up as: explicit `--config` path, then
//! `./config/busflow.yaml`, then `<config_dir>/busflow/config.yaml`.
//! Missing sections and fields fall back to the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use action_flow::{Booking, Pacing, Passenger, Variant, MAX_DAYS_AHEAD};
use action_locator::LocateOptions;
use busflow_core_types::Viewport;
use cdp_adapter::CdpConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const LOCAL_CONFIG: &str = "config/busflow.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserSettings,
    pub locator: LocatorSettings,
    pub booking: BookingSettings,
    /// Screenshots and run reports
    pub artifacts_dir: PathBuf,
    /// YAML file with intent overrides
    pub intents_path: Option<PathBuf>,
    pub flow_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserSettings::default(),
            locator: LocatorSettings::default(),
            booking: BookingSettings::default(),
            artifacts_dir: PathBuf::from("artifacts"),
            intents_path: None,
            flow_timeout_ms: 600_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Chromium binary; detected (`CHROME_BIN`, `PATH`, usual locations) when unset
    pub executable: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
    /// Persistent profile; a throwaway one is used when unset
    pub user_data_dir: Option<PathBuf>,
    pub launch_timeout_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        let window = Viewport::default();
        Self {
            headless: false,
            executable: None,
            window_width: window.width,
            window_height: window.height,
            user_data_dir: None,
            launch_timeout_ms: 20_000,
        }
    }
}

impl BrowserSettings {
    pub fn cdp_config(&self) -> CdpConfig {
        let mut cdp = CdpConfig::default()
            .headless(self.headless)
            .with_window(Viewport::new(self.window_width, self.window_height));
        if let Some(exe) = &self.executable {
            cdp = cdp.with_executable(exe);
        }
        cdp.user_data_dir = self.user_data_dir.clone();
        cdp.launch_timeout = Duration::from_millis(self.launch_timeout_ms);
        cdp
    }
}

/// Baseline for intents that do not set their own search bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSettings {
    pub candidate_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub scan_limit: usize,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        let defaults = LocateOptions::default();
        Self {
            candidate_timeout_ms: defaults.timeout_ms,
            poll_interval_ms: defaults.poll_interval_ms,
            scan_limit: defaults.scan_limit,
        }
    }
}

impl LocatorSettings {
    pub fn options(&self) -> LocateOptions {
        LocateOptions {
            timeout_ms: self.candidate_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
            scan_limit: self.scan_limit,
            ..LocateOptions::default()
        }
    }
}

/// Route settings; unset fields take the variant's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingSettings {
    pub base_url: Option<String>,
    pub variant: Variant,
    /// Defaults to the variant's own pacing
    pub pacing: Option<Pacing>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub days_ahead: Option<u64>,
    pub passenger: Passenger,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            variant: Variant::default(),
            pacing: None,
            from: None,
            to: None,
            days_ahead: None,
            passenger: Passenger::default(),
        }
    }
}

impl BookingSettings {
    pub fn booking(&self, variant: Variant) -> Booking {
        let mut booking = Booking::for_variant(variant);
        if let Some(url) = &self.base_url {
            booking.base_url = url.clone();
        }
        if let Some(from) = &self.from {
            booking.from = from.clone();
        }
        if let Some(to) = &self.to {
            booking.to = to.clone();
        }
        if let Some(days) = self.days_ahead {
            booking.days_ahead = days;
        }
        booking.passenger = self.passenger.clone();
        booking
    }

    pub fn pacing_for(&self, variant: Variant) -> Pacing {
        self.pacing.unwrap_or_else(|| variant.default_pacing())
    }
}

impl Config {
    pub fn from_yaml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flow_timeout_ms == 0 {
            return Err(ConfigError::Invalid("flow_timeout_ms must be positive".into()));
        }
        if self.locator.candidate_timeout_ms == 0 || self.locator.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "locator timeout and poll interval must be positive".into(),
            ));
        }
        if self.locator.scan_limit == 0 {
            return Err(ConfigError::Invalid("locator scan_limit must be at least 1".into()));
        }
        if let Some(days) = self.booking.days_ahead.filter(|d| *d > MAX_DAYS_AHEAD) {
            return Err(ConfigError::Invalid(format!(
                "booking days_ahead {} is past the {}-day limit",
                days, MAX_DAYS_AHEAD
            )));
        }
        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(ConfigError::Invalid("browser window size must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the config came from; `None` when running on defaults
    pub path: Option<PathBuf>,
}

/// First existing file in the lookup order, or the explicit path as given.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("busflow").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load the config; an explicit path that does not exist is an error.
pub async fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let Some(path) = resolve_config_path(explicit) else {
        warn!("No config file found, using defaults");
        return Ok(LoadedConfig {
            config: Config::default(),
            path: None,
        });
    };
    if !path.exists() {
        return Err(ConfigError::NotFound(path));
    }
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
    let config = Config::from_yaml(&path, &content)?;
    info!("Loaded configuration from: {}", path.display());
    Ok(LoadedConfig {
        config,
        path: Some(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let yaml = "booking:\n  variant: quick\n  from: Pune\nlocator:\n  scan_limit: 4\n";
        let config = Config::from_yaml(Path::new("test.yaml"), yaml).unwrap();
        assert_eq!(config.booking.variant, Variant::Quick);
        assert_eq!(config.locator.scan_limit, 4);
        assert_eq!(config.locator.candidate_timeout_ms, 2000);
        assert_eq!(config.flow_timeout_ms, 600_000);

        let booking = config.booking.booking(Variant::Quick);
        assert_eq!(booking.from, "Pune");
        assert_eq!(booking.to, "Jaipur");
        assert_eq!(config.booking.pacing_for(Variant::Quick), Pacing::Slow);
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let err = Config::from_yaml(Path::new("bad.yaml"), "flow_timeout_ms: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn days_ahead_past_a_year_is_rejected() {
        let err = Config::from_yaml(Path::new("far.yaml"), "booking:\n  days_ahead: 366\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("days_ahead")));
        assert!(Config::from_yaml(Path::new("ok.yaml"), "booking:\n  days_ahead: 365\n").is_ok());
    }

    #[test]
    fn browser_settings_map_to_launch_config() {
        let settings = BrowserSettings {
            headless: true,
            executable: Some(PathBuf::from("/opt/chromium")),
            window_width: 1280,
            window_height: 720,
            user_data_dir: None,
            launch_timeout_ms: 5000,
        };
        let cdp = settings.cdp_config();
        assert!(cdp.headless);
        assert_eq!(cdp.window, Viewport::new(1280, 720));
        assert_eq!(cdp.executable, Some(PathBuf::from("/opt/chromium")));
        assert_eq!(cdp.launch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn explicit_path_wins_resolution() {
        let path = Path::new("/nowhere/busflow.yaml");
        assert_eq!(resolve_config_path(Some(path)), Some(path.to_path_buf()));
    }
}
