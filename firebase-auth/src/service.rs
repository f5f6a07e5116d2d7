use crate::models::{
    expiry_from, ErrorEnvelope, FirebaseConfig, PasswordAuthRequest, PasswordAuthResponse,
    RefreshTokenResponse, User,
};
use chrono::Utc;
use std::future::Future;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Error type for authentication operations
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    NetworkError(String),
    JsonError(String),
    /// The backend rejected the request, carries the backend error code
    Rejected(String),
    ServerError(String),
    /// Input was rejected before contacting the backend
    Validation(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            AuthError::JsonError(msg) => write!(f, "JSON error: {}", msg),
            AuthError::Rejected(code) => write!(f, "Rejected by auth backend: {}", code),
            AuthError::ServerError(msg) => write!(f, "Server error: {}", msg),
            AuthError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// Builds an error from a backend message such as
    /// `WEAK_PASSWORD : Password should be at least 6 characters`
    pub fn from_backend_message(message: &str) -> Self {
        let code = message
            .split(" : ")
            .next()
            .unwrap_or(message)
            .trim()
            .to_string();
        AuthError::Rejected(code)
    }

    /// Whether the stored credentials are no longer usable
    pub fn is_credential_error(&self) -> bool {
        matches!(self, AuthError::Rejected(_))
    }

    /// Human readable message for the login and signup screens
    pub fn user_message(&self) -> String {
        match self {
            AuthError::NetworkError(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            AuthError::JsonError(_) | AuthError::ServerError(_) => {
                "The login service returned an unexpected response.".to_string()
            }
            AuthError::Validation(msg) => msg.clone(),
            AuthError::Rejected(code) => match code.as_str() {
                "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                    "Wrong email or password.".to_string()
                }
                "EMAIL_EXISTS" => "An account with this email already exists.".to_string(),
                "WEAK_PASSWORD" => "Password should be at least 6 characters.".to_string(),
                "INVALID_EMAIL" => "Please enter a valid email address.".to_string(),
                "MISSING_PASSWORD" => "Please enter a password.".to_string(),
                "TOO_MANY_ATTEMPTS_TRY_LATER" => {
                    "Too many attempts. Please try again later.".to_string()
                }
                "USER_DISABLED" => "This account has been disabled.".to_string(),
                "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
                    "Your session has expired. Please log in again.".to_string()
                }
                other => format!("Authentication failed ({})", other),
            },
        }
    }
}

/// Identity backend used by the session
pub trait AuthProvider: Send + Sync {
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    /// Exchange the refresh token for a fresh ID token
    fn refresh(&self, user: &User) -> impl Future<Output = Result<User, AuthError>> + Send;
}

/// Validates form input before it is sent anywhere
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::Validation("Please enter your email.".to_string()));
    }
    if !email.contains('@') {
        return Err(AuthError::Validation(
            "Please enter a valid email address.".to_string(),
        ));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("Please enter a password.".to_string()));
    }
    Ok(())
}

/// Firebase authentication service (Identity Toolkit REST API)
pub struct FirebaseAuthService {
    config: FirebaseConfig,
    client: reqwest::Client,
}

impl FirebaseAuthService {
    /// Create a new authentication service
    pub fn new(config: FirebaseConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .user_agent("Shutterbox/0.1.0")
            .build()
            .map_err(|e| AuthError::NetworkError(format!("Client build failed: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    async fn password_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        validate_credentials(email, password)?;
        if self.config.api_key.is_empty() {
            return Err(AuthError::ServerError("Firebase API key is not configured".into()));
        }

        let url = format!(
            "{}/accounts:{}?key={}",
            IDENTITY_TOOLKIT_URL, endpoint, self.config.api_key
        );
        let body = PasswordAuthRequest {
            email: email.trim(),
            password,
            return_secure_token: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        let result = response
            .json::<PasswordAuthResponse>()
            .await
            .map_err(|e| AuthError::JsonError(format!("Failed to parse response: {}", e)))?;

        Ok(User {
            uid: result.local_id,
            email: result.email.or_else(|| Some(email.trim().to_string())),
            id_token: result.id_token,
            refresh_token: result.refresh_token,
            expires_at: expiry_from(Utc::now(), &result.expires_in),
        })
    }

    async fn backend_error(response: reqwest::Response) -> AuthError {
        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => AuthError::from_backend_message(&envelope.error.message),
            Err(_) => AuthError::ServerError(format!("Server returned status: {}", status)),
        }
    }
}

impl AuthProvider for FirebaseAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        log::debug!("Signing in {}", email.trim());
        self.password_request("signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        log::debug!("Creating account for {}", email.trim());
        self.password_request("signUp", email, password).await
    }

    async fn refresh(&self, user: &User) -> Result<User, AuthError> {
        let url = format!("{}?key={}", SECURE_TOKEN_URL, self.config.api_key);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", user.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(format!("Refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        let result = response
            .json::<RefreshTokenResponse>()
            .await
            .map_err(|e| AuthError::JsonError(format!("Failed to parse refresh: {}", e)))?;

        Ok(User {
            uid: result.user_id,
            email: user.email.clone(),
            id_token: result.id_token,
            refresh_token: result.refresh_token,
            expires_at: expiry_from(Utc::now(), &result.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_code_is_extracted() {
        let err =
            AuthError::from_backend_message("WEAK_PASSWORD : Password should be at least 6 characters");
        assert_eq!(err, AuthError::Rejected("WEAK_PASSWORD".to_string()));
        assert_eq!(err.user_message(), "Password should be at least 6 characters.");
    }

    #[test]
    fn test_invalid_credentials_message() {
        for code in ["EMAIL_NOT_FOUND", "INVALID_PASSWORD", "INVALID_LOGIN_CREDENTIALS"] {
            let err = AuthError::from_backend_message(code);
            assert_eq!(err.user_message(), "Wrong email or password.");
            assert!(err.is_credential_error());
        }
    }

    #[test]
    fn test_network_error_is_not_credential_error() {
        assert!(!AuthError::NetworkError("offline".into()).is_credential_error());
    }

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("a@b.c", "secret").is_ok());
        assert!(matches!(
            validate_credentials("  ", "secret"),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            validate_credentials("nope", "secret"),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            validate_credentials("a@b.c", ""),
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_validates_before_network() {
        let service = FirebaseAuthService::new(FirebaseConfig::default()).unwrap();
        let result = service.login("", "pw").await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_reported() {
        let service = FirebaseAuthService::new(FirebaseConfig::default()).unwrap();
        let result = service.sign_up("a@b.c", "secret").await;
        assert!(matches!(result, Err(AuthError::ServerError(_))));
    }
}
