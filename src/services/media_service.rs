use crate::config::StorageConfig;
use crate::error::AppError;
use media_gallery::{KeyValueStore, MediaGalleryConfig, MediaGalleryService, MediaItem};
use std::collections::HashSet;
use std::sync::Arc;

pub fn create_media_service(
    store: Arc<dyn KeyValueStore>,
    storage: &StorageConfig,
) -> Arc<MediaGalleryService> {
    let config = MediaGalleryConfig {
        media_key: storage.media_key.clone(),
    };
    Arc::new(MediaGalleryService::new(store, config))
}

/// Re-read the collection, used on every gallery focus
pub fn load_media(gallery: &MediaGalleryService) -> Result<Vec<MediaItem>, AppError> {
    gallery.load().map_err(|e| {
        log::error!("Failed to load media: {}", e);
        AppError::from(e)
    })
}

/// Remove all selected items in one write
pub async fn delete_media(
    gallery: &MediaGalleryService,
    uris: &HashSet<String>,
) -> Result<Vec<MediaItem>, AppError> {
    let remaining = gallery.remove_many(uris).await.map_err(|e| {
        log::error!("Failed to delete {} items: {}", uris.len(), e);
        AppError::from(e)
    })?;
    log::info!("Deleted {} items", uris.len());
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_gallery::MemoryStore;

    #[tokio::test]
    async fn test_uses_configured_key() {
        let store = Arc::new(MemoryStore::new());
        let storage = StorageConfig {
            media_key: "customMedia".to_string(),
            ..StorageConfig::default()
        };
        let gallery = create_media_service(store.clone(), &storage);

        gallery.add(MediaItem::photo("file:///a.jpg")).await.unwrap();
        assert!(store.get("customMedia").unwrap().is_some());
        assert!(store.get("capturedPhotos").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_media() {
        let gallery =
            create_media_service(Arc::new(MemoryStore::new()), &StorageConfig::default());
        gallery.add(MediaItem::photo("a")).await.unwrap();
        gallery.add(MediaItem::video("b")).await.unwrap();
        gallery.add(MediaItem::photo("c")).await.unwrap();

        let selected: HashSet<String> = ["a".to_string(), "c".to_string()].into();
        let remaining = delete_media(&gallery, &selected).await.unwrap();
        assert_eq!(remaining, vec![MediaItem::video("b")]);
        assert_eq!(load_media(&gallery).unwrap(), remaining);
    }
}
