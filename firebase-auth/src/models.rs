use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Firebase web app configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    pub measurement_id: Option<String>,
}

/// Signed-in user as seen by the app
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl User {
    /// Whether the ID token has expired (with a minute of slack)
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(60) <= now
    }
}

/// Request body for `accounts:signInWithPassword` and `accounts:signUp`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAuthRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

/// Response of the password endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAuthResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds, sent as a string
    pub expires_in: String,
}

/// Response of the Secure Token refresh endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub expires_in: String,
}

/// Error envelope returned by the Google identity endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    pub message: String,
}

/// Parses the `expires_in` seconds string, defaulting to one hour
pub fn expiry_from(now: DateTime<Utc>, expires_in: &str) -> DateTime<Utc> {
    let seconds = expires_in.trim().parse::<i64>().unwrap_or(3600);
    now + Duration::seconds(seconds)
}

/// State of a login/signup form submission
#[derive(Debug, Clone, PartialEq)]
pub enum AuthFormState {
    /// Waiting for input
    Idle,
    /// Request in flight
    Submitting,
    /// Authenticated
    Success(User),
    /// Failed with a user-facing message
    Error(String),
}
