use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage key used by the original app for the captured media list
pub const DEFAULT_MEDIA_KEY: &str = "capturedPhotos";

/// Query parameter appended to capture URIs to keep them unique
const CAPTURE_STAMP_PARAM: &str = "t";

/// Kind of a captured media file
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Legacy records without a type are photos
    #[default]
    Photo,
    Video,
}

/// One captured photo or video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MediaItem {
    pub uri: String,
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
}

impl MediaItem {
    pub fn new(uri: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            uri: uri.into(),
            media_type,
        }
    }

    pub fn photo(uri: impl Into<String>) -> Self {
        Self::new(uri, MediaType::Photo)
    }

    pub fn video(uri: impl Into<String>) -> Self {
        Self::new(uri, MediaType::Video)
    }

    /// Builds an item whose URI carries the capture timestamp.
    ///
    /// Camera backends may hand out the same file path twice, the timestamp
    /// suffix keeps every persisted URI distinct.
    pub fn captured(uri: &str, media_type: MediaType, captured_at: DateTime<Utc>) -> Self {
        Self::new(
            stamp_uri(uri, captured_at.timestamp_millis()),
            media_type,
        )
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Local filesystem path of the media file, without scheme and capture stamp
    pub fn file_path(&self) -> &str {
        let without_scheme = self.uri.strip_prefix("file://").unwrap_or(&self.uri);
        match without_scheme.split_once('?') {
            Some((path, _)) => path,
            None => without_scheme,
        }
    }
}

/// Appends `t=<millis>` to a URI, respecting an existing query string
pub fn stamp_uri(uri: &str, millis: i64) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", uri, separator, CAPTURE_STAMP_PARAM, millis)
}

/// Decodes a persisted collection (JSON array, newest first)
pub fn decode_collection(raw: &str) -> Result<Vec<MediaItem>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Encodes a collection for persistence
pub fn encode_collection(items: &[MediaItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

/// Configuration for the media gallery service
#[derive(Debug, Clone)]
pub struct MediaGalleryConfig {
    /// Key under which the collection is stored
    pub media_key: String,
}

impl Default for MediaGalleryConfig {
    fn default() -> Self {
        Self {
            media_key: DEFAULT_MEDIA_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_legacy_record_defaults_to_photo() {
        let items = decode_collection(r#"[{"uri":"file:///a.jpg"},{"uri":"b.mp4","type":"video"}]"#)
            .unwrap();
        assert_eq!(items[0].media_type, MediaType::Photo);
        assert_eq!(items[1].media_type, MediaType::Video);
    }

    #[test]
    fn test_encode_uses_type_field() {
        let json = encode_collection(&[MediaItem::video("v.mp4")]).unwrap();
        assert_eq!(json, r#"[{"uri":"v.mp4","type":"video"}]"#);
    }

    #[test]
    fn test_captured_uri_is_stamped() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let item = MediaItem::captured("file:///cache/photo.jpg", MediaType::Photo, at);
        assert_eq!(item.uri, "file:///cache/photo.jpg?t=1700000000123");
        assert_eq!(item.file_path(), "/cache/photo.jpg");
    }

    #[test]
    fn test_stamp_keeps_existing_query() {
        assert_eq!(stamp_uri("content://x?id=4", 9), "content://x?id=4&t=9");
    }
}
