use std::path::Path;

use serde::{Deserialize, Serialize};
use survey_spec::{Locale, Step};
use time::{Duration, UtcOffset};
use url::Url;

use crate::error::ConfigError;

pub const ENV_ENDPOINT: &str = "SURVEY_ENDPOINT";
pub const ENV_CLIENT_ID: &str = "SURVEY_CLIENT_ID";

/// Runtime settings for one kiosk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KioskConfig {
    /// Submission endpoint. Without one, submissions are only logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Url>,
    /// Client identifier sent with every submission.
    pub client_id: String,
    pub default_locale: Locale,
    /// Offset applied to the submission timestamp (hours east of UTC).
    pub timestamp_offset_hours: i8,
    pub timing: TimingConfig,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            client_id: format!("survey-kiosk/{}", env!("CARGO_PKG_VERSION")),
            default_locale: Locale::Ja,
            timestamp_offset_hours: 9,
            timing: TimingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub idle_timeout_secs: u64,
    pub idle_poll_ms: u64,
    pub countdown_poll_ms: u64,
    pub submitted_reset_secs: u64,
    pub auto_advance: AutoAdvancePolicy,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 40,
            idle_poll_ms: 1_000,
            countdown_poll_ms: 200,
            submitted_reset_secs: 3,
            auto_advance: AutoAdvancePolicy::default(),
        }
    }
}

impl TimingConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::seconds(self.idle_timeout_secs as i64)
    }

    pub fn submitted_reset(&self) -> Duration {
        Duration::seconds(self.submitted_reset_secs as i64)
    }

    pub fn idle_poll(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.idle_poll_ms)
    }

    pub fn countdown_poll(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.countdown_poll_ms)
    }
}

/// Auto-advance delay per question step, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoAdvancePolicy {
    pub nationality: u64,
    pub age_group: u64,
    pub discovery: u64,
    pub social_media: u64,
    pub transport: u64,
    pub lacking: u64,
    pub manners_source: u64,
}

impl Default for AutoAdvancePolicy {
    fn default() -> Self {
        Self {
            nationality: 7,
            age_group: 5,
            discovery: 7,
            social_media: 10,
            transport: 7,
            lacking: 7,
            manners_source: 20,
        }
    }
}

impl AutoAdvancePolicy {
    /// Delay for `step`; the gate step is never timed.
    pub fn for_step(&self, step: Step) -> Option<Duration> {
        let secs = match step.number() {
            1 => self.nationality,
            2 => self.age_group,
            3 => self.discovery,
            4 => self.social_media,
            5 => self.transport,
            6 => self.lacking,
            7 => self.manners_source,
            _ => return None,
        };
        (secs > 0).then(|| Duration::seconds(secs as i64))
    }
}

impl KioskConfig {
    /// Reads `path` when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(ENV_ENDPOINT).filter(|value| !value.trim().is_empty()) {
            self.set_endpoint(&raw)?;
        }
        if let Some(client_id) = lookup(ENV_CLIENT_ID).filter(|value| !value.trim().is_empty()) {
            self.client_id = client_id;
        }
        Ok(())
    }

    pub fn set_endpoint(&mut self, raw: &str) -> Result<(), ConfigError> {
        let url = Url::parse(raw.trim()).map_err(|source| ConfigError::Endpoint {
            value: raw.to_string(),
            source,
        })?;
        self.endpoint = Some(url);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint
            && !matches!(endpoint.scheme(), "http" | "https")
        {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be http or https, got '{}'",
                endpoint.scheme()
            )));
        }
        if self.timing.idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timing.idle_timeout_secs must be positive".into(),
            ));
        }
        if self.timing.idle_poll_ms == 0 || self.timing.countdown_poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll intervals must be positive".into(),
            ));
        }
        self.timestamp_offset()?;
        Ok(())
    }

    pub fn timestamp_offset(&self) -> Result<UtcOffset, ConfigError> {
        UtcOffset::from_hms(self.timestamp_offset_hours, 0, 0).map_err(|err| {
            ConfigError::Invalid(format!(
                "timestamp_offset_hours {} is out of range: {err}",
                self.timestamp_offset_hours
            ))
        })
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
