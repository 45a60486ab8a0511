use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::expiry::compute_expiry;

/// OAuth token pair issued by Yandex OAuth.
///
/// # Example
/// ```no_run
/// use yandex_auth::auth::Token;
/// use chrono::{DateTime, Utc};
///
/// let token = Token {
///     access_token: "access".to_string(),
///     token_type: "bearer".to_string(),
///     refresh_token: "refresh".to_string(),
///     expires_at: DateTime::<Utc>::from(std::time::SystemTime::now()),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Build a token from a successful response, stamped against `now`.
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            refresh_token: response.refresh_token,
            expires_at: compute_expiry(now, response.expires_in),
        }
    }

    /// Whether the access token should be refreshed before use.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Remaining lifetime, zero once expired.
    pub fn expires_in(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Always `bearer`.
    pub token_type: String,
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Lives as long as the access token it was issued with.
    pub refresh_token: String,
}

/// Error body returned with a non-success status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}
