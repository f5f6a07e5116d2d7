use crate::models::{decode_collection, encode_collection, MediaGalleryConfig, MediaItem};
use crate::store::{KeyValueStore, StoreError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Error type for media gallery operations
#[derive(Debug)]
pub enum MediaGalleryError {
    StoreError(StoreError),
    JsonError(serde_json::Error),
    AlreadyExists(String),
    NotFound(String),
}

impl std::fmt::Display for MediaGalleryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaGalleryError::StoreError(e) => write!(f, "Store error: {}", e),
            MediaGalleryError::JsonError(e) => write!(f, "JSON error: {}", e),
            MediaGalleryError::AlreadyExists(uri) => write!(f, "Already in gallery: {}", uri),
            MediaGalleryError::NotFound(uri) => write!(f, "Not found: {}", uri),
        }
    }
}

impl std::error::Error for MediaGalleryError {}

impl From<StoreError> for MediaGalleryError {
    fn from(err: StoreError) -> Self {
        MediaGalleryError::StoreError(err)
    }
}

impl From<serde_json::Error> for MediaGalleryError {
    fn from(err: serde_json::Error) -> Self {
        MediaGalleryError::JsonError(err)
    }
}

impl MediaGalleryError {
    pub fn user_message(&self) -> String {
        match self {
            MediaGalleryError::StoreError(_) => {
                "Could not access saved photos. Please try again.".to_string()
            }
            MediaGalleryError::JsonError(_) => "Saved photo list is damaged.".to_string(),
            MediaGalleryError::AlreadyExists(_) => "This item is already saved.".to_string(),
            MediaGalleryError::NotFound(_) => "This item no longer exists.".to_string(),
        }
    }
}

/// Media Gallery Service
///
/// Every mutation is a read-modify-write of the whole collection. The write
/// lock makes that sequence atomic for all screens sharing the service.
pub struct MediaGalleryService {
    store: Arc<dyn KeyValueStore>,
    config: MediaGalleryConfig,
    write_lock: Mutex<()>,
}

impl MediaGalleryService {
    pub fn new(store: Arc<dyn KeyValueStore>, config: MediaGalleryConfig) -> Self {
        Self {
            store,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Read the persisted collection, newest first
    pub fn load(&self) -> Result<Vec<MediaItem>, MediaGalleryError> {
        match self.store.get(&self.config.media_key)? {
            Some(raw) => Ok(decode_collection(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Prepend a new capture and persist. Returns the new collection.
    pub async fn add(&self, item: MediaItem) -> Result<Vec<MediaItem>, MediaGalleryError> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load()?;
        if items.iter().any(|existing| existing.uri == item.uri) {
            return Err(MediaGalleryError::AlreadyExists(item.uri));
        }

        log::debug!("Adding {:?} {}", item.media_type, item.uri);
        items.insert(0, item);
        self.write(&items)?;
        Ok(items)
    }

    /// Remove exactly one item by URI and persist
    pub async fn remove(&self, uri: &str) -> Result<Vec<MediaItem>, MediaGalleryError> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load()?;
        let before = items.len();
        items.retain(|item| item.uri != uri);
        if items.len() == before {
            return Err(MediaGalleryError::NotFound(uri.to_string()));
        }

        self.write(&items)?;
        Ok(items)
    }

    /// Remove all given URIs in a single write
    pub async fn remove_many(
        &self,
        uris: &HashSet<String>,
    ) -> Result<Vec<MediaItem>, MediaGalleryError> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load()?;
        items.retain(|item| !uris.contains(&item.uri));

        log::info!("Deleting {} selected item(s)", uris.len());
        self.write(&items)?;
        Ok(items)
    }

    fn write(&self, items: &[MediaItem]) -> Result<(), MediaGalleryError> {
        let encoded = encode_collection(items)?;
        self.store.set(&self.config.media_key, &encoded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;
    use crate::store::{MemoryStore, SqliteStore};

    fn service() -> MediaGalleryService {
        MediaGalleryService::new(Arc::new(MemoryStore::new()), MediaGalleryConfig::default())
    }

    async fn seeded(uris: &[&str]) -> MediaGalleryService {
        let service = service();
        // added oldest first, so the collection reads in reverse
        for uri in uris.iter().rev() {
            service.add(MediaItem::photo(*uri)).await.unwrap();
        }
        service
    }

    fn uris(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.uri.as_str()).collect()
    }

    #[tokio::test]
    async fn test_add_prepends() {
        let service = service();
        service.add(MediaItem::photo("first")).await.unwrap();
        let items = service.add(MediaItem::video("second")).await.unwrap();

        assert_eq!(uris(&items), vec!["second", "first"]);
        assert_eq!(service.load().unwrap(), items);
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_uri() {
        let service = service();
        service.add(MediaItem::photo("same")).await.unwrap();
        let result = service.add(MediaItem::photo("same")).await;
        assert!(matches!(result, Err(MediaGalleryError::AlreadyExists(_))));
        assert_eq!(service.load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_single_keeps_order() {
        let service = seeded(&["a", "b", "c", "d"]).await;
        let items = service.remove("b").await.unwrap();

        assert_eq!(uris(&items), vec!["a", "c", "d"]);
        assert_eq!(uris(&service.load().unwrap()), vec!["a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_remove_unknown_uri() {
        let service = seeded(&["a"]).await;
        assert!(matches!(
            service.remove("zzz").await,
            Err(MediaGalleryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_many_preserves_order() {
        let service = seeded(&["a", "b", "c", "d", "e"]).await;
        let selected: HashSet<String> = ["b", "d"].iter().map(|s| s.to_string()).collect();

        let items = service.remove_many(&selected).await.unwrap();
        assert_eq!(uris(&items), vec!["a", "c", "e"]);
        assert_eq!(uris(&service.load().unwrap()), vec!["a", "c", "e"]);
    }

    #[tokio::test]
    async fn test_bulk_delete_last_item() {
        let service = seeded(&["a"]).await;
        let selected: HashSet<String> = ["a".to_string()].into_iter().collect();

        let items = service.remove_many(&selected).await.unwrap();
        assert!(items.is_empty());
        assert!(service.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_through_sqlite() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let service = MediaGalleryService::new(store.clone(), MediaGalleryConfig::default());
        service.add(MediaItem::photo("p1")).await.unwrap();
        service.add(MediaItem::video("v1")).await.unwrap();
        service.add(MediaItem::photo("p2")).await.unwrap();

        let reopened = MediaGalleryService::new(store, MediaGalleryConfig::default());
        let items = reopened.load().unwrap();
        assert_eq!(uris(&items), vec!["p2", "v1", "p1"]);
        assert_eq!(items[1].media_type, MediaType::Video);
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let service = Arc::new(service());
        let mut handles = Vec::new();
        for i in 0..16 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.add(MediaItem::photo(format!("p{}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.load().unwrap().len(), 16);
    }

    #[test]
    fn test_corrupt_value_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store.set(crate::models::DEFAULT_MEDIA_KEY, "not json").unwrap();
        let service = MediaGalleryService::new(store, MediaGalleryConfig::default());
        assert!(matches!(service.load(), Err(MediaGalleryError::JsonError(_))));
    }
}
