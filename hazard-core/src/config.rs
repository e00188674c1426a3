use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

pub const USGS_FEED_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson";
pub const NWS_FEED_URL: &str = "https://api.weather.gov/alerts/active";
pub const RELIEFWEB_FEED_URL: &str =
    "https://api.reliefweb.int/v1/disasters?appname=hazardwatch&limit=20&sort[]=date:desc";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cache_capacity: usize,
    pub feeds: FeedsConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub quakes: FeedConfig,
    pub weather: FeedConfig,
    pub disasters: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotifyConfig {
    pub sms: Option<SmsConfig>,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            feeds: FeedsConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            quakes: FeedConfig::with_url(USGS_FEED_URL),
            weather: FeedConfig::with_url(NWS_FEED_URL),
            disasters: FeedConfig::with_url(RELIEFWEB_FEED_URL),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::with_url("")
    }
}

impl FeedConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SmsConfig {
    /// Build an SMS configuration from the Twilio environment variables.
    /// Returns `None` unless every required variable is set.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok()?,
            auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok()?,
            from_number: std::env::var("TWILIO_FROM_NUMBER").ok()?,
            to_number: std::env::var("DEFAULT_SMS_TO").ok()?,
        })
    }
}

impl AppConfig {
    /// Config file location: `HAZARDWATCH_CONFIG` when set, otherwise
    /// `<config_dir>/hazardwatch/config.json`.
    pub fn config_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        if let Ok(path) = std::env::var("HAZARDWATCH_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir().ok_or("could not locate the user config directory")?;
        let app_config_dir = config_dir.join("hazardwatch");
        std::fs::create_dir_all(&app_config_dir)?;

        Ok(app_config_dir.join("config.json"))
    }

    /// Load the configuration from disk, falling back to defaults (and
    /// writing them back) when the file is missing or unreadable.
    pub fn load() -> Self {
        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "could not load configuration, using defaults");
                let default_config = Self::default();
                if let Err(save_err) = default_config.save() {
                    tracing::warn!(error = %save_err, "could not save default configuration");
                }
                default_config
            }
        }
    }

    fn load_from_file() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::config_file_path()?;
        let config_content = std::fs::read_to_string(config_path)?;
        let config: AppConfig = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::config_file_path()?;
        let config_json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, config_json)?;
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with: malformed feed
    /// URLs, a zero poll interval or timeout, or a zero cache capacity.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be at least 1".into());
        }
        for (name, feed) in [
            ("quakes", &self.feeds.quakes),
            ("weather", &self.feeds.weather),
            ("disasters", &self.feeds.disasters),
        ] {
            Url::parse(&feed.url).map_err(|e| format!("invalid {name} feed URL: {e}"))?;
            if feed.poll_interval_secs == 0 {
                return Err(format!("{name} poll interval must be at least 1 second").into());
            }
            if feed.request_timeout_secs == 0 {
                return Err(format!("{name} request timeout must be at least 1 second").into());
            }
        }
        Ok(())
    }

    /// SMS settings from the config file, falling back to the Twilio
    /// environment variables.
    pub fn sms_settings(&self) -> Option<SmsConfig> {
        self.notify.sms.clone().or_else(SmsConfig::from_env)
    }
}
