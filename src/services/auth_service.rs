use crate::config::AppConfig;
use crate::error::AppError;
use firebase_auth::{FirebaseAuthService, Session, SessionStore, User};
use media_gallery::{KeyValueStore, StoreError};
use std::sync::Arc;

pub type AppSession = Session<FirebaseAuthService>;

/// Keeps the signed-in user as JSON in the key-value store
pub struct KvSessionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl KvSessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl SessionStore for KvSessionStore {
    fn load(&self) -> Option<User> {
        match self.store.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    log::warn!("Stored session is unreadable, ignoring it: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::error!("Failed to read stored session: {}", e);
                None
            }
        }
    }

    fn save(&self, user: Option<&User>) {
        let result = match user {
            Some(user) => serde_json::to_string(user)
                .map_err(|e| StoreError::Other(e.to_string()))
                .and_then(|raw| self.store.set(&self.key, &raw)),
            None => self.store.remove(&self.key),
        };
        if let Err(e) = result {
            log::error!("Failed to persist session: {}", e);
        }
    }
}

pub fn create_session(
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
) -> Result<Arc<AppSession>, AppError> {
    if config.firebase.api_key.is_empty() {
        log::warn!("No Firebase API key configured, login and signup will fail");
    }

    let provider = FirebaseAuthService::new(config.firebase.clone())?;
    let session_store = Arc::new(KvSessionStore::new(store, &config.storage.session_key));
    Ok(Arc::new(Session::new(provider).with_store(session_store)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use media_gallery::MemoryStore;

    fn user() -> User {
        User {
            uid: "uid-1".to_string(),
            email: Some("me@example.com".to_string()),
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn test_session_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let sessions = KvSessionStore::new(store.clone(), "authSession");

        assert!(sessions.load().is_none());
        let user = user();
        sessions.save(Some(&user));
        assert_eq!(sessions.load(), Some(user));

        sessions.save(None);
        assert!(sessions.load().is_none());
        assert!(store.get("authSession").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_session_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.set("authSession", "{not json").unwrap();
        let sessions = KvSessionStore::new(store, "authSession");
        assert!(sessions.load().is_none());
    }

    #[tokio::test]
    async fn test_restore_unexpired_session() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        KvSessionStore::new(store.clone(), "authSession").save(Some(&user()));

        let session = create_session(&AppConfig::default(), store).unwrap();
        let restored = session.restore().await;
        assert_eq!(restored.map(|u| u.uid), Some("uid-1".to_string()));
        assert!(session.is_signed_in());
    }
}
