//! Configuration (layered: code > env > `.env` file).

use std::fmt;
use std::time::Duration;

use crate::auth::device_code::CodeRequest;
use crate::auth::transport::DEFAULT_BASE_URL;
use crate::error::{AuthError, Result};

const ENV_CLIENT_ID: &str = "YANDEX_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "YANDEX_CLIENT_SECRET";
const ENV_DEVICE_ID: &str = "YANDEX_DEVICE_ID";
const ENV_DEVICE_NAME: &str = "YANDEX_DEVICE_NAME";
const ENV_BASE_URL: &str = "YANDEX_OAUTH_URL";

const DEVICE_ID_LEN: std::ops::RangeInclusive<usize> = 6..=50;
const DEVICE_NAME_MAX_LEN: usize = 100;

/// Timing knobs for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTiming {
    /// Added to the provider's interval to absorb clock and network jitter.
    pub interval_margin: Duration,
    /// Subtracted from the code lifetime so the last attempt completes
    /// before the provider invalidates the code.
    pub deadline_margin: Duration,
    /// Caller-imposed bound on the whole session.
    pub timeout: Option<Duration>,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            interval_margin: Duration::from_secs(2),
            deadline_margin: Duration::from_secs(4),
            timeout: None,
        }
    }
}

/// Application credentials, device identity and endpoint for Yandex OAuth.
///
/// # Example
/// ```no_run
/// use yandex_auth::config::AuthConfig;
///
/// let config = AuthConfig::new("client-id", "client-secret")
///     .with_device("my-device-0001", "Living room TV");
/// config.validate()?;
/// # Ok::<(), yandex_auth::error::AuthError>(())
/// ```
#[derive(Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub base_url: String,
    pub timing: PollTiming,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"..")
            .field("device_id", &self.device_id)
            .field("device_name", &self.device_name)
            .field("base_url", &self.base_url)
            .field("timing", &self.timing)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            device_id: None,
            device_name: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timing: PollTiming::default(),
        }
    }

    /// Load from environment variables (`YANDEX_CLIENT_ID`, `YANDEX_CLIENT_SECRET`, ...).
    ///
    /// A `.env` file in the working directory is read first when present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let client_id = required_env(ENV_CLIENT_ID)?;
        let client_secret = required_env(ENV_CLIENT_SECRET)?;
        let mut config = Self::new(client_id, client_secret);
        config.device_id = optional_env(ENV_DEVICE_ID);
        config.device_name = optional_env(ENV_DEVICE_NAME);
        if let Some(url) = optional_env(ENV_BASE_URL) {
            config.base_url = url;
        }
        Ok(config)
    }

    pub fn with_device(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self.device_name = Some(name.into());
        self
    }

    /// Use a freshly generated device id.
    ///
    /// Generate once and reuse it for every token requested from the same
    /// device, otherwise each login shows up as a new device.
    pub fn with_generated_device_id(mut self) -> Self {
        self.device_id = Some(generate_device_id());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timing(mut self, timing: PollTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timing.timeout = Some(timeout);
        self
    }

    /// Check the values against the provider's documented limits.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::Configuration("client_id is empty".to_string()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(AuthError::Configuration(
                "client_secret is empty".to_string(),
            ));
        }
        if let Some(id) = &self.device_id {
            let printable = id.bytes().all(|b| (32..=126).contains(&b));
            if !DEVICE_ID_LEN.contains(&id.len()) || !printable {
                return Err(AuthError::Configuration(format!(
                    "device_id must be {} to {} printable ASCII characters",
                    DEVICE_ID_LEN.start(),
                    DEVICE_ID_LEN.end()
                )));
            }
        }
        if let Some(name) = &self.device_name {
            if name.chars().count() > DEVICE_NAME_MAX_LEN {
                return Err(AuthError::Configuration(format!(
                    "device_name longer than {DEVICE_NAME_MAX_LEN} characters"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn code_request(&self) -> CodeRequest {
        CodeRequest {
            client_id: self.client_id.clone(),
            device_id: self.device_id.clone(),
            device_name: self.device_name.clone(),
        }
    }
}

/// Random device identifier accepted by the provider.
pub fn generate_device_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn required_env(key: &str) -> Result<String> {
    optional_env(key).ok_or_else(|| AuthError::Configuration(format!("{key} is not set")))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
