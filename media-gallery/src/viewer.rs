use crate::models::MediaItem;
use crate::service::{MediaGalleryError, MediaGalleryService};

/// The single video player shared by the fullscreen viewer
pub trait PlaybackSurface {
    fn attach(&mut self, uri: &str);
    fn play(&mut self);
    fn pause(&mut self);
}

/// Fullscreen viewer state
///
/// Only one item is shown at a time. Videos are attached to the shared
/// surface and played, leaving a video always pauses it first.
pub struct FullscreenViewer<S: PlaybackSurface> {
    surface: S,
    current: Option<MediaItem>,
}

impl<S: PlaybackSurface> FullscreenViewer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Show an item, switching away from the current one if needed
    pub fn open(&mut self, item: MediaItem) {
        self.pause_current();
        if item.is_video() {
            self.surface.attach(&item.uri);
            self.surface.play();
        }
        self.current = Some(item);
    }

    pub fn close(&mut self) {
        self.pause_current();
        self.current = None;
    }

    /// Delete the displayed item and close the viewer.
    /// Returns the remaining collection.
    pub async fn delete_current(
        &mut self,
        gallery: &MediaGalleryService,
    ) -> Result<Vec<MediaItem>, MediaGalleryError> {
        let Some(item) = self.current.clone() else {
            return gallery.load();
        };

        let remaining = gallery.remove(&item.uri).await?;
        self.close();
        Ok(remaining)
    }

    /// Close the viewer if its item disappeared from the collection
    pub fn sync_with(&mut self, items: &[MediaItem]) {
        if let Some(current) = &self.current {
            if !items.iter().any(|i| i.uri == current.uri) {
                self.close();
            }
        }
    }

    fn pause_current(&mut self) {
        if self.current.as_ref().is_some_and(|c| c.is_video()) {
            self.surface.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaGalleryConfig;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<String>,
    }

    impl PlaybackSurface for RecordingSurface {
        fn attach(&mut self, uri: &str) {
            self.calls.push(format!("attach {}", uri));
        }
        fn play(&mut self) {
            self.calls.push("play".to_string());
        }
        fn pause(&mut self) {
            self.calls.push("pause".to_string());
        }
    }

    #[test]
    fn test_video_plays_and_pauses_on_close() {
        let mut viewer = FullscreenViewer::new(RecordingSurface::default());
        viewer.open(MediaItem::video("v1"));
        viewer.close();

        assert_eq!(viewer.surface.calls, vec!["attach v1", "play", "pause"]);
        assert!(!viewer.is_open());
    }

    #[test]
    fn test_switching_pauses_previous_video() {
        let mut viewer = FullscreenViewer::new(RecordingSurface::default());
        viewer.open(MediaItem::video("v1"));
        viewer.open(MediaItem::photo("p1"));
        viewer.open(MediaItem::video("v2"));

        assert_eq!(
            viewer.surface.calls,
            vec!["attach v1", "play", "pause", "attach v2", "play"]
        );
    }

    #[test]
    fn test_photo_never_touches_surface() {
        let mut viewer = FullscreenViewer::new(RecordingSurface::default());
        viewer.open(MediaItem::photo("p1"));
        viewer.close();
        assert!(viewer.surface.calls.is_empty());
    }

    #[tokio::test]
    async fn test_delete_current_removes_exactly_one() {
        let gallery =
            MediaGalleryService::new(Arc::new(MemoryStore::new()), MediaGalleryConfig::default());
        gallery.add(MediaItem::photo("c")).await.unwrap();
        gallery.add(MediaItem::video("b")).await.unwrap();
        gallery.add(MediaItem::photo("a")).await.unwrap();

        let mut viewer = FullscreenViewer::new(RecordingSurface::default());
        viewer.open(MediaItem::video("b"));
        let remaining = viewer.delete_current(&gallery).await.unwrap();

        let uris: Vec<_> = remaining.iter().map(|i| i.uri.as_str()).collect();
        assert_eq!(uris, vec!["a", "c"]);
        assert!(!viewer.is_open());
        assert_eq!(viewer.surface.calls.last().map(String::as_str), Some("pause"));
    }
}
