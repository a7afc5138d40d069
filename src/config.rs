use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::poll::PollPolicy;

const ENV_BASE_URL: &str = "BASEURL";
const ENV_LIST_ID: &str = "LISTID";
const ENV_REMAINING_SEGMENT: &str = "REMAININGSEGMENTID";
const ENV_QUEUED_SEGMENT: &str = "QUEUEDID";
const ENV_SENT_SEGMENT: &str = "SENDID";
const ENV_API_KEY: &str = "APIKEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} must be a numeric segment id, got {value:?}")]
    InvalidSegmentId { name: &'static str, value: String },

    #[error("invalid [mailchimp] settings: {0}")]
    InvalidMailchimp(String),

    #[error("invalid [polling] settings: {0}")]
    InvalidPolling(String),
}

/// Settings read from `config.toml`. Every field has a default.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub mailchimp: MailchimpConfig,
    pub campaign: CampaignConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MailchimpConfig {
    /// Basic-auth username; the platform only checks the API key.
    pub username: String,
    /// Upper bound on any single HTTP request, connect through body.
    pub request_timeout_ms: u64,
}

impl Default for MailchimpConfig {
    fn default() -> Self {
        Self {
            username: "anystring".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl MailchimpConfig {
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidMailchimp(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(Duration::from_millis(self.request_timeout_ms))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CampaignConfig {
    /// Name of the template prepared the day before the run.
    pub template_name: String,
    pub campaign_type: String,
    pub match_mode: String,
    pub subject_line: String,
    pub title: String,
    pub from_name: String,
    pub reply_to: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            template_name: "testing".to_string(),
            campaign_type: "regular".to_string(),
            match_mode: "any".to_string(),
            subject_line: "Zone".to_string(),
            title: "Zone".to_string(),
            from_name: "Storj".to_string(),
            reply_to: "noreply@example.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub max_elapsed_s: u64,
    /// Fraction of each delay added at random, 0.0 to disable.
    pub jitter: f64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            multiplier: 2.0,
            max_elapsed_s: 120,
            jitter: 0.2,
        }
    }
}

impl PollingConfig {
    pub fn policy(&self) -> Result<PollPolicy, ConfigError> {
        if !(self.multiplier.is_finite() && self.multiplier >= 1.0) {
            return Err(ConfigError::InvalidPolling(format!(
                "multiplier must be >= 1.0, got {}",
                self.multiplier
            )));
        }
        if self.initial_delay_ms == 0 {
            return Err(ConfigError::InvalidPolling(
                "initial_delay_ms must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidPolling(format!(
                "jitter must be between 0.0 and 1.0, got {}",
                self.jitter
            )));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ConfigError::InvalidPolling(
                "max_delay_ms must not be below initial_delay_ms".to_string(),
            ));
        }
        Ok(PollPolicy {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
            max_elapsed: Duration::from_secs(self.max_elapsed_s),
            jitter: self.jitter,
        })
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }
}

/// Account and list identifiers plus the API key, taken from the environment.
#[derive(Clone)]
pub struct Environment {
    pub base_url: String,
    pub list_id: String,
    pub remaining_segment_id: u64,
    pub queued_segment_id: u64,
    pub sent_segment_id: u64,
    pub api_key: String,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("base_url", &self.base_url)
            .field("list_id", &self.list_id)
            .field("remaining_segment_id", &self.remaining_segment_id)
            .field("queued_segment_id", &self.queued_segment_id)
            .field("sent_segment_id", &self.sent_segment_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Environment {
    /// Read from process environment after loading `.env`. Real env vars take precedence.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            tracing::info!(".env not found, reading configuration from environment");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|v| sanitize(&v))
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };
        let segment = |name: &'static str| -> Result<u64, ConfigError> {
            let value = require(name)?;
            value
                .parse()
                .map_err(|_| ConfigError::InvalidSegmentId { name, value })
        };

        Ok(Self {
            base_url: require(ENV_BASE_URL)?,
            list_id: require(ENV_LIST_ID)?,
            remaining_segment_id: segment(ENV_REMAINING_SEGMENT)?,
            queued_segment_id: segment(ENV_QUEUED_SEGMENT)?,
            sent_segment_id: segment(ENV_SENT_SEGMENT)?,
            api_key: require(ENV_API_KEY)?,
        })
    }
}

/// Strip carriage returns, BOM and zero-width spaces picked up from hand-edited files.
fn sanitize(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
