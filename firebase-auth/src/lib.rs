//! # Firebase Auth
//!
//! Email/password authentication against Firebase (Identity Toolkit REST API).
//!
//! This crate provides:
//! - Login, signup and token refresh through [`FirebaseAuthService`]
//! - The [`AuthProvider`] seam so the session can run against any backend
//! - A [`Session`] observer holding the current user, with a persistence hook
//! - A Dioxus credentials form (`components` feature)
//!
//! ## Separation of Concerns
//!
//! This crate does **not** decide where sessions are stored. The application
//! implements [`SessionStore`] on top of its own persistence.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use firebase_auth::{FirebaseAuthService, FirebaseConfig, Session};
//!
//! let provider = FirebaseAuthService::new(config)?;
//! let session = Session::new(provider);
//! let mut changes = session.subscribe();
//! session.login("me@example.com", "secret").await?;
//! ```

#[cfg(feature = "components")]
pub mod component;
pub mod models;
pub mod service;
pub mod session;

#[cfg(feature = "components")]
pub use component::{AuthLabels, Credentials, CredentialsForm, CredentialsFormProps};
pub use models::{AuthFormState, FirebaseConfig, User};
pub use service::{validate_credentials, AuthError, AuthProvider, FirebaseAuthService};
pub use session::{Session, SessionStore};
