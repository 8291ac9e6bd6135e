//! Configuration types for ytdlp-client

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Controller and backend configuration
///
/// Every field has a default, so `Config::default()` talks to a backend on
/// the local machine with the original web interface's port.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the backend; endpoint paths are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for the submission, log and listing requests (default: 30s).
    /// Does not apply to the progress stream.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Treat the progress stream as failed after this long without a frame
    /// (None = wait forever, the default)
    #[serde(default, with = "optional_duration_serde")]
    pub stream_idle_timeout: Option<Duration>,

    /// Delay before the scroll signal is delivered (default: 50ms)
    #[serde(default = "default_scroll_delay", with = "millis_serde")]
    pub scroll_delay: Duration,

    /// Capacity of the presentation signal broadcast channel (default: 64)
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,

    /// Capacity of the controller's inbox (default: 32)
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            stream_idle_timeout: None,
            scroll_delay: default_scroll_delay(),
            signal_capacity: default_signal_capacity(),
            command_capacity: default_command_capacity(),
        }
    }
}

impl Config {
    /// Configuration pointing at `base_url`, everything else default
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Parsed base URL, guaranteed to end with `/` so joins keep any path prefix
    pub fn base(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("base URL must be an http(s) URL: {}", self.base_url),
                key: Some("base_url".to_string()),
            });
        }
        Ok(url)
    }

    /// Check settings that would otherwise fail later at runtime
    pub fn validate(&self) -> Result<()> {
        self.base()?;
        if self.signal_capacity == 0 {
            return Err(Error::Config {
                message: "signal_capacity must be at least 1".to_string(),
                key: Some("signal_capacity".to_string()),
            });
        }
        if self.command_capacity == 0 {
            return Err(Error::Config {
                message: "command_capacity must be at least 1".to_string(),
                key: Some("command_capacity".to_string()),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config {
                message: "request_timeout must be greater than zero".to_string(),
                key: Some("request_timeout".to_string()),
            });
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_scroll_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_signal_capacity() -> usize {
    64
}

fn default_command_capacity() -> usize {
    32
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

// UI delays are sub-second, so this one is in milliseconds
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
