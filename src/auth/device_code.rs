use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Device/user code pair issued by Yandex OAuth.
///
/// Deliberately not `Clone`: the device code is single-use, so a value is
/// consumed by exactly one poll session.
///
/// # Example
/// ```no_run
/// use yandex_auth::auth::ConfirmationCodes;
/// use chrono::{DateTime, Utc};
///
/// let codes = ConfirmationCodes {
///     device_code: "4c0b3f4b6e8d4b3a".to_string(),
///     user_code: "ABCD1234".to_string(),
///     verification_url: "https://ya.ru/device".to_string(),
///     interval_secs: 5,
///     lifetime_secs: 600,
///     issued_at: DateTime::<Utc>::from(std::time::SystemTime::now()),
/// };
/// ```
#[derive(Debug)]
pub struct ConfirmationCodes {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    /// Minimum spacing between token requests.
    pub interval_secs: u64,
    /// Validity window of the pair, counted from `issued_at`.
    pub lifetime_secs: u64,
    pub issued_at: DateTime<Utc>,
}

impl ConfirmationCodes {
    pub fn from_response(response: CodesResponse, issued_at: DateTime<Utc>) -> Self {
        Self {
            device_code: response.device_code,
            user_code: response.user_code,
            verification_url: response.verification_url,
            interval_secs: response.interval,
            lifetime_secs: response.expires_in,
            issued_at,
        }
    }

    /// Reject codes that would make the poller spin or never start.
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(AuthError::Configuration(
                "poll interval must be at least one second".to_string(),
            ));
        }
        if self.lifetime_secs == 0 {
            return Err(AuthError::Configuration(
                "code lifetime must be at least one second".to_string(),
            ));
        }
        if self.device_code.is_empty() {
            return Err(AuthError::Configuration("empty device code".to_string()));
        }
        Ok(())
    }
}

/// Body of the code request sent to `/device/code`.
#[derive(Debug, Clone)]
pub struct CodeRequest {
    pub client_id: String,
    /// Unique device identifier, 6 to 50 printable ASCII characters.
    pub device_id: Option<String>,
    /// Ignored by the provider unless `device_id` is set too.
    pub device_name: Option<String>,
}

impl CodeRequest {
    pub(crate) fn form(&self) -> Vec<(&'static str, &str)> {
        let mut form = vec![("client_id", self.client_id.as_str())];
        if let Some(device_id) = &self.device_id {
            form.push(("device_id", device_id.as_str()));
        }
        if let Some(device_name) = &self.device_name {
            form.push(("device_name", device_name.as_str()));
        }
        form
    }
}

/// Successful `/device/code` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CodesResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub interval: u64,
    pub expires_in: u64,
}
