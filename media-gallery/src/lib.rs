//! # Media Gallery
//!
//! Captured photo and video management for the camera app.
//!
//! This crate provides:
//! - The persisted media collection (a newest-first JSON list under one key)
//! - Key-value stores (SQLite for the app, in-memory for tests)
//! - A gallery service that serializes every read-modify-write of the list
//! - Grid selection state and the fullscreen viewer with a shared video surface
//! - Dioxus components for the grid and the viewer (`components` feature)
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use media_gallery::{MediaGalleryConfig, MediaGalleryService, MediaItem, SqliteStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteStore::new(conn)?);
//! let gallery = MediaGalleryService::new(store, MediaGalleryConfig::default());
//! gallery.add(MediaItem::photo("file:///photos/1.jpg")).await?;
//! ```

pub mod models;
pub mod schema;
pub mod selection;
pub mod service;
pub mod store;
pub mod viewer;

#[cfg(feature = "components")]
pub mod components;

pub use models::{
    decode_collection, encode_collection, stamp_uri, MediaGalleryConfig, MediaItem, MediaType,
    DEFAULT_MEDIA_KEY,
};
pub use schema::init_store_schema;
pub use selection::{SelectionState, TapAction};
pub use service::{MediaGalleryError, MediaGalleryService};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
pub use viewer::{FullscreenViewer, PlaybackSurface};

#[cfg(feature = "components")]
pub use components::{DomVideoSurface, FullscreenMedia, MediaGrid, MediaTile, VIDEO_SURFACE_ID};
