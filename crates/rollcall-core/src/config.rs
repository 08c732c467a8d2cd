use std::time::Duration;

use crate::error::AppError;

/// Timing and host settings for the change monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Delay between the first mutation of a burst and the session it schedules.
    pub debounce: Duration,
    /// Wait after the page has loaded before auto-starting.
    pub settle_delay: Duration,
    /// Host name of the meeting site.
    pub meeting_host: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            settle_delay: Duration::from_millis(2000),
            meeting_host: "meet.google.com".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Read configuration from environment variables.
    ///
    /// - `ROLLCALL_DEBOUNCE_MS` (optional, defaults to 1000)
    /// - `ROLLCALL_SETTLE_MS` (optional, defaults to 2000)
    /// - `ROLLCALL_MEETING_HOST` (optional, defaults to `meet.google.com`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let debounce = match lookup("ROLLCALL_DEBOUNCE_MS") {
            None => defaults.debounce,
            Some(raw) => parse_millis("ROLLCALL_DEBOUNCE_MS", &raw)?,
        };
        let settle_delay = match lookup("ROLLCALL_SETTLE_MS") {
            None => defaults.settle_delay,
            Some(raw) => parse_millis("ROLLCALL_SETTLE_MS", &raw)?,
        };
        let meeting_host = match lookup("ROLLCALL_MEETING_HOST") {
            None => defaults.meeting_host,
            Some(raw) => {
                let host = raw.trim().to_ascii_lowercase();
                if host.is_empty() || host.contains('/') {
                    return Err(AppError::ConfigError(format!(
                        "Invalid ROLLCALL_MEETING_HOST '{raw}': must be a bare host name"
                    )));
                }
                host
            }
        };

        Ok(Self {
            debounce,
            settle_delay,
            meeting_host,
        })
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_meeting_host(mut self, host: impl Into<String>) -> Self {
        self.meeting_host = host.into();
        self
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration, AppError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            AppError::ConfigError(format!(
                "Invalid {key} '{raw}': must be a non-negative integer (milliseconds)"
            ))
        })
}
