//! Opus connection parameters and session tuning.
//!
//! Both are read from the environment by the CLI; library callers can build
//! them directly.

use crate::error::{Field, FieldError, Rule, ValidationError};
use crate::invoice::RawValue;
use getset::Getters;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::time::Duration;

/// Base URL of the Opus launchpad used when none is configured.
pub const DEFAULT_OPUS_URL: &str = "https://ssolaunchpad.kmd.dk/";

/// Default chromedriver endpoint.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Unvalidated connection parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawOpusConfig {
    pub url: Option<String>,
    pub municipality_code: Option<RawValue>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RawOpusConfig {
    /// Reads `OPUS_URL`, `OPUS_MUNICIPALITY_CODE`, `OPUS_USER` and
    /// `OPUS_USER_PASSWORD`. Unset variables stay `None`.
    pub fn from_env() -> Self {
        RawOpusConfig {
            url: env::var("OPUS_URL").ok(),
            municipality_code: env::var("OPUS_MUNICIPALITY_CODE").ok().map(RawValue::Text),
            username: env::var("OPUS_USER").ok(),
            password: env::var("OPUS_USER_PASSWORD").ok(),
        }
    }
}

/// Validated, immutable connection parameters.
#[derive(Clone, Getters)]
#[getset(get = "pub")]
pub struct OpusConfig {
    url: String,
    municipality_code: u32,
    username: String,
    password: String,
}

impl OpusConfig {
    pub fn new(
        municipality_code: u32,
        username: &str,
        password: &str,
    ) -> Result<Self, ValidationError> {
        OpusConfig::try_from(RawOpusConfig {
            url: None,
            municipality_code: Some(RawValue::Integer(i64::from(municipality_code))),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        })
    }

    /// Replaces the base URL.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Launchpad URL with the municipality selected.
    pub fn login_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        format!("{}/?kommune={}", base, self.municipality_code)
    }
}

impl fmt::Debug for OpusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpusConfig")
            .field("url", &self.url)
            .field("municipality_code", &self.municipality_code)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl TryFrom<RawOpusConfig> for OpusConfig {
    type Error = ValidationError;

    fn try_from(raw: RawOpusConfig) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let municipality_code = match raw.municipality_code {
            None => {
                errors.push(FieldError::new(Field::MunicipalityCode, Rule::Missing));
                None
            }
            Some(value) => match parse_municipality_code(&value) {
                Ok(code) => Some(code),
                Err(rule) => {
                    errors.push(FieldError::new(Field::MunicipalityCode, rule));
                    None
                }
            },
        };
        let username = required(Field::Username, raw.username, &mut errors);
        let password = required(Field::Password, raw.password, &mut errors);

        let (Some(municipality_code), Some(username), Some(password)) =
            (municipality_code, username, password)
        else {
            return Err(ValidationError { errors });
        };

        let url = raw
            .url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OPUS_URL.to_string());

        Ok(OpusConfig {
            url,
            municipality_code,
            username,
            password,
        })
    }
}

fn required(field: Field, value: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    match value {
        None => {
            errors.push(FieldError::new(field, Rule::Missing));
            None
        }
        Some(v) if v.is_empty() => {
            errors.push(FieldError::new(field, Rule::Empty));
            None
        }
        Some(v) => Some(v),
    }
}

fn parse_municipality_code(value: &RawValue) -> Result<u32, Rule> {
    match value {
        RawValue::Integer(n) => u32::try_from(*n).map_err(|_| Rule::NotANumber(n.to_string())),
        RawValue::Text(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| Rule::NotANumber(s.clone())),
        RawValue::Float(_) => Err(Rule::WrongType("integer")),
    }
}

/// Bounded waits and fixed delays used by the submission flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Wait for the page to settle after signing in. Expiry is tolerated.
    pub login_settle: Duration,
    /// Wait for the journal-entry form to render after navigation.
    pub form_ready: Duration,
    /// Wait for an upload popup to expose a visible file input. Bounds both
    /// elapsed time and the number of sweeps over the candidate frames.
    pub popup: Duration,
    /// Fixed delay after choosing a file; Opus exposes no signal for it.
    pub upload_settle: Duration,
    /// Wait for the status message after "check document".
    pub status: Duration,
    /// Interval between readiness polls.
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            login_settle: Duration::from_secs(10),
            form_ready: Duration::from_secs(30),
            popup: Duration::from_secs(10),
            upload_settle: Duration::from_secs(2),
            status: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl Timeouts {
    /// Number of polls that fit in `limit`, at least one.
    pub fn attempts(&self, limit: Duration) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let count = limit.as_millis() / interval;
        u32::try_from(count).unwrap_or(u32::MAX).max(1)
    }
}

/// How the browser session is run.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub webdriver_url: String,
    pub headless: bool,
    /// Fail the upload phases when no popup frame exposes a file input,
    /// instead of logging and pressing OK anyway.
    pub strict_upload: bool,
    pub timeouts: Timeouts,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: false,
            strict_upload: false,
            timeouts: Timeouts::default(),
        }
    }
}

impl SessionOptions {
    /// Reads `OPUS_WEBDRIVER_URL`, `OPUS_HEADLESS` and `OPUS_STRICT_UPLOAD`.
    pub fn from_env() -> Self {
        let mut options = SessionOptions::default();
        if let Ok(url) = env::var("OPUS_WEBDRIVER_URL") {
            options.webdriver_url = url;
        }
        if let Ok(flag) = env::var("OPUS_HEADLESS") {
            options.headless = parse_flag(&flag);
        }
        if let Ok(flag) = env::var("OPUS_STRICT_UPLOAD") {
            options.strict_upload = parse_flag(&flag);
        }
        options
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
