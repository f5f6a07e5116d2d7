use std::fmt;

/// Central error types for the Shutterbox app
#[derive(Debug)]
pub enum AppError {
    /// Database error (rusqlite)
    Database(rusqlite::Error),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Malformed config.toml
    Config(String),
    /// Gallery read or write failed
    Gallery(media_gallery::MediaGalleryError),
    /// Login, signup or session refresh failed
    Auth(firebase_auth::AuthError),
    /// Camera could not be opened or controlled
    Camera(camera_control::CaptureError),
    /// Services were used before they were initialized
    NotInitialized(&'static str),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Gallery(e) => write!(f, "Gallery error: {}", e),
            AppError::Auth(e) => write!(f, "Auth error: {}", e),
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::NotInitialized(what) => write!(f, "{} not initialized", what),
        }
    }
}

impl std::error::Error for AppError {}

// Conversions from other error types
impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<media_gallery::StoreError> for AppError {
    fn from(e: media_gallery::StoreError) -> Self {
        AppError::Gallery(media_gallery::MediaGalleryError::StoreError(e))
    }
}

impl From<media_gallery::MediaGalleryError> for AppError {
    fn from(e: media_gallery::MediaGalleryError) -> Self {
        AppError::Gallery(e)
    }
}

impl From<firebase_auth::AuthError> for AppError {
    fn from(e: firebase_auth::AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<camera_control::CaptureError> for AppError {
    fn from(e: camera_control::CaptureError) -> Self {
        AppError::Camera(e)
    }
}

impl From<camera_control::AdapterError> for AppError {
    fn from(e: camera_control::AdapterError) -> Self {
        AppError::Camera(e.into())
    }
}

/// User-friendly error messages for UI
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "A database error occurred. Please try again.".to_string(),
            AppError::Filesystem(_) => {
                "Error accessing files. Please check app permissions.".to_string()
            }
            AppError::Config(_) => "The app configuration could not be read.".to_string(),
            AppError::Gallery(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
            AppError::Camera(e) => e.user_message(),
            AppError::NotInitialized(_) => "The app failed to start. Please restart it.".to_string(),
        }
    }
}
