//! Session observer.
//!
//! One [`Session`] holds the current user for the whole app. Screens call
//! `login`/`sign_up`/`sign_out` on it and the top-level component owns the
//! single subscription that turns a `None` user into a redirect to login.

use crate::models::User;
use crate::service::{AuthError, AuthProvider};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;

/// Persistence hook so a session survives app restarts
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<User>;
    fn save(&self, user: Option<&User>);
}

/// Current-user state shared by all screens
pub struct Session<P: AuthProvider> {
    provider: P,
    state: watch::Sender<Option<User>>,
    store: Option<Arc<dyn SessionStore>>,
}

impl<P: AuthProvider> Session<P> {
    pub fn new(provider: P) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            provider,
            state,
            store: None,
        }
    }

    /// Attach a persistence hook
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Auth state subscription, delivers every change of the current user
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.state.subscribe()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.provider.login(email, password).await.map_err(|e| {
            log::warn!("Login error: {}", e);
            e
        })?;
        log::info!("Logged in: {}", user.email.as_deref().unwrap_or(&user.uid));
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.provider.sign_up(email, password).await.map_err(|e| {
            log::warn!("Signup error: {}", e);
            e
        })?;
        log::info!("Signed up: {}", user.email.as_deref().unwrap_or(&user.uid));
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    pub fn sign_out(&self) {
        log::info!("Signing out");
        self.set_user(None);
    }

    /// Restore a persisted session on startup.
    ///
    /// Expired tokens are refreshed. A rejected refresh signs out, a network
    /// failure keeps the cached user so the app stays usable offline.
    pub async fn restore(&self) -> Option<User> {
        let user = self.store.as_ref().and_then(|store| store.load())?;

        if !user.is_expired(Utc::now()) {
            log::info!("Restored session for {}", user.uid);
            self.set_user(Some(user.clone()));
            return Some(user);
        }

        match self.provider.refresh(&user).await {
            Ok(refreshed) => {
                log::info!("Refreshed session for {}", refreshed.uid);
                self.set_user(Some(refreshed.clone()));
                Some(refreshed)
            }
            Err(e) if e.is_credential_error() => {
                log::warn!("Stored session rejected: {}", e);
                self.set_user(None);
                None
            }
            Err(e) => {
                log::warn!("Could not refresh session, keeping cached user: {}", e);
                self.set_user(Some(user.clone()));
                Some(user)
            }
        }
    }

    fn set_user(&self, user: Option<User>) {
        if let Some(store) = &self.store {
            store.save(user.as_ref());
        }
        self.state.send_replace(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Mutex;

    fn user(uid: &str, valid_for: Duration) -> User {
        User {
            uid: uid.to_string(),
            email: Some(format!("{}@example.com", uid)),
            id_token: format!("token-{}", uid),
            refresh_token: format!("refresh-{}", uid),
            expires_at: Utc::now() + valid_for,
        }
    }

    struct MockProvider {
        refresh_result: Result<(), AuthError>,
    }

    impl MockProvider {
        fn ok() -> Self {
            Self {
                refresh_result: Ok(()),
            }
        }
    }

    impl AuthProvider for MockProvider {
        async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
            if password == "secret" {
                Ok(user(email.split('@').next().unwrap_or(email), Duration::hours(1)))
            } else {
                Err(AuthError::Rejected("INVALID_LOGIN_CREDENTIALS".into()))
            }
        }

        async fn sign_up(&self, email: &str, _password: &str) -> Result<User, AuthError> {
            if email.starts_with("taken") {
                Err(AuthError::Rejected("EMAIL_EXISTS".into()))
            } else {
                Ok(user("new", Duration::hours(1)))
            }
        }

        async fn refresh(&self, old: &User) -> Result<User, AuthError> {
            self.refresh_result.clone()?;
            Ok(User {
                id_token: "fresh".into(),
                ..user(&old.uid, Duration::hours(1))
            })
        }
    }

    #[derive(Default)]
    struct MemorySessionStore {
        user: Mutex<Option<User>>,
    }

    impl SessionStore for MemorySessionStore {
        fn load(&self) -> Option<User> {
            self.user.lock().unwrap().clone()
        }
        fn save(&self, user: Option<&User>) {
            *self.user.lock().unwrap() = user.cloned();
        }
    }

    #[tokio::test]
    async fn test_login_updates_subscribers() {
        let session = Session::new(MockProvider::ok());
        let mut rx = session.subscribe();

        session.login("alice@example.com", "secret").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().uid, "alice");
        assert!(session.is_signed_in());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_signed_out() {
        let session = Session::new(MockProvider::ok());
        let err = session.login("alice@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Wrong email or password.");
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_up_error() {
        let session = Session::new(MockProvider::ok());
        let err = session.sign_up("taken@example.com", "secret").await.unwrap_err();
        assert_eq!(err, AuthError::Rejected("EMAIL_EXISTS".into()));
    }

    #[tokio::test]
    async fn test_sign_out_delivers_none_and_clears_store() {
        let store = Arc::new(MemorySessionStore::default());
        let session = Session::new(MockProvider::ok()).with_store(store.clone());
        session.login("bob@example.com", "secret").await.unwrap();
        assert!(store.load().is_some());

        let mut rx = session.subscribe();
        session.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn test_restore_valid_session() {
        let store = Arc::new(MemorySessionStore::default());
        store.save(Some(&user("carol", Duration::hours(1))));

        let session = Session::new(MockProvider::ok()).with_store(store);
        let restored = session.restore().await.unwrap();
        assert_eq!(restored.uid, "carol");
        assert!(session.is_signed_in());
    }

    #[tokio::test]
    async fn test_restore_refreshes_expired_token() {
        let store = Arc::new(MemorySessionStore::default());
        store.save(Some(&user("dave", Duration::hours(-1))));

        let session = Session::new(MockProvider::ok()).with_store(store.clone());
        let restored = session.restore().await.unwrap();
        assert_eq!(restored.id_token, "fresh");
        assert_eq!(store.load().unwrap().id_token, "fresh");
    }

    #[tokio::test]
    async fn test_restore_rejected_refresh_signs_out() {
        let store = Arc::new(MemorySessionStore::default());
        store.save(Some(&user("erin", Duration::hours(-1))));

        let provider = MockProvider {
            refresh_result: Err(AuthError::Rejected("TOKEN_EXPIRED".into())),
        };
        let session = Session::new(provider).with_store(store.clone());
        assert!(session.restore().await.is_none());
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn test_restore_offline_keeps_cached_user() {
        let store = Arc::new(MemorySessionStore::default());
        store.save(Some(&user("frank", Duration::hours(-1))));

        let provider = MockProvider {
            refresh_result: Err(AuthError::NetworkError("offline".into())),
        };
        let session = Session::new(provider).with_store(store);
        assert_eq!(session.restore().await.unwrap().uid, "frank");
    }

    #[tokio::test]
    async fn test_restore_without_store() {
        let session = Session::new(MockProvider::ok());
        assert!(session.restore().await.is_none());
    }
}
