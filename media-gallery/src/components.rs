//! Dioxus UI components for the media gallery
//!
//! Photos are loaded from local storage and rendered as data URLs, videos
//! are played through one shared `<video>` element driven by
//! [`DomVideoSurface`].

#[cfg(feature = "components")]
use crate::models::MediaItem;

#[cfg(feature = "components")]
use crate::selection::SelectionState;

#[cfg(feature = "components")]
use crate::viewer::PlaybackSurface;

#[cfg(feature = "components")]
use dioxus::prelude::*;

#[cfg(feature = "components")]
use std::path::Path;

/// DOM id of the shared video element
#[cfg(feature = "components")]
pub const VIDEO_SURFACE_ID: &str = "media-gallery-video";

#[cfg(feature = "components")]
#[derive(Debug, Clone, PartialEq)]
enum ImageLoadState {
    Loaded(String),
    Failed,
}

#[cfg(feature = "components")]
/// Load a photo file and convert it to a data URL
fn load_photo_data(item: &MediaItem) -> ImageLoadState {
    use base64::{engine::general_purpose, Engine as _};

    let path = Path::new(item.file_path());
    match std::fs::read(path) {
        Ok(bytes) => {
            let mime_type = match path.extension().and_then(|s| s.to_str()) {
                Some("webp") => "image/webp",
                Some("png") => "image/png",
                _ => "image/jpeg",
            };
            let encoded = general_purpose::STANDARD.encode(&bytes);
            ImageLoadState::Loaded(format!("data:{};base64,{}", mime_type, encoded))
        }
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            ImageLoadState::Failed
        }
    }
}

#[cfg(feature = "components")]
/// Playback surface backed by the shared `<video>` element
#[derive(Debug, Clone, Copy, Default)]
pub struct DomVideoSurface;

#[cfg(feature = "components")]
impl DomVideoSurface {
    fn run(script: String) {
        let _ = document::eval(&script);
    }
}

#[cfg(feature = "components")]
impl PlaybackSurface for DomVideoSurface {
    fn attach(&mut self, uri: &str) {
        let src = serde_json::to_string(uri).unwrap_or_else(|_| "\"\"".to_string());
        Self::run(format!(
            "const v = document.getElementById('{}'); if (v) {{ v.src = {}; v.load(); }}",
            VIDEO_SURFACE_ID, src
        ));
    }

    fn play(&mut self) {
        Self::run(format!(
            "const v = document.getElementById('{}'); if (v) {{ v.play().catch(() => {{}}); }}",
            VIDEO_SURFACE_ID
        ));
    }

    fn pause(&mut self) {
        Self::run(format!(
            "const v = document.getElementById('{}'); if (v) {{ v.pause(); }}",
            VIDEO_SURFACE_ID
        ));
    }
}

#[cfg(feature = "components")]
/// One grid tile
///
/// Tap opens or toggles, long-press (context menu on touch webviews) enters
/// selection mode, the checkbox toggles the selection directly.
#[component]
pub fn MediaTile(
    item: MediaItem,
    selection_active: bool,
    selected: bool,
    on_tap: EventHandler<MediaItem>,
    on_long_press: EventHandler<MediaItem>,
    on_toggle: EventHandler<String>,
) -> Element {
    let preview = use_hook({
        let item = item.clone();
        move || {
            if item.is_video() {
                ImageLoadState::Failed
            } else {
                load_photo_data(&item)
            }
        }
    });

    let tap_item = item.clone();
    let press_item = item.clone();
    let toggle_uri = item.uri.clone();
    let border = if selected { "3px solid #0066cc" } else { "3px solid transparent" };

    rsx! {
        div {
            style: "position: relative; width: 33.33%; aspect-ratio: 1; padding: 2px; box-sizing: border-box; cursor: pointer;",
            onclick: move |_| on_tap.call(tap_item.clone()),
            oncontextmenu: move |evt| {
                evt.prevent_default();
                on_long_press.call(press_item.clone());
            },
            div {
                style: "width: 100%; height: 100%; border-radius: 4px; overflow: hidden; background: #f0f0f0; border: {border}; box-sizing: border-box;",
                match preview {
                    ImageLoadState::Loaded(url) => rsx! {
                        img {
                            src: "{url}",
                            style: "width: 100%; height: 100%; object-fit: cover;",
                        }
                    },
                    ImageLoadState::Failed => rsx! {
                        div {
                            style: "width: 100%; height: 100%; display: flex; align-items: center; justify-content: center; font-size: 32px; color: #999;",
                            if item.is_video() { "🎬" } else { "📷" }
                        }
                    },
                }
            }
            if selection_active {
                input {
                    r#type: "checkbox",
                    checked: selected,
                    style: "position: absolute; top: 8px; right: 8px; width: 22px; height: 22px;",
                    onclick: move |evt| {
                        evt.stop_propagation();
                        on_toggle.call(toggle_uri.clone());
                    },
                }
            }
        }
    }
}

#[cfg(feature = "components")]
/// Three column grid of captured media
#[component]
pub fn MediaGrid(
    items: Vec<MediaItem>,
    selection: SelectionState,
    on_tap: EventHandler<MediaItem>,
    on_long_press: EventHandler<MediaItem>,
    on_toggle: EventHandler<String>,
) -> Element {
    if items.is_empty() {
        return rsx! {
            p {
                style: "font-size: 18px; text-align: center; margin-top: 50px; color: #555;",
                "No photos captured yet."
            }
        };
    }

    rsx! {
        div {
            style: "display: flex; flex-wrap: wrap;",
            for item in items.into_iter() {
                MediaTile {
                    key: "{item.uri}",
                    selection_active: selection.is_active(),
                    selected: selection.is_selected(&item.uri),
                    item: item.clone(),
                    on_tap,
                    on_long_press,
                    on_toggle,
                }
            }
        }
    }
}

#[cfg(feature = "components")]
/// Fullscreen viewer overlay
///
/// The shared video element is always part of the tree so the playback
/// surface can address it, it is only shown for video items.
#[component]
pub fn FullscreenMedia(
    item: Option<MediaItem>,
    on_close: EventHandler<()>,
    on_delete: EventHandler<MediaItem>,
) -> Element {
    let is_video = item.as_ref().is_some_and(|i| i.is_video());
    let photo = match &item {
        Some(i) if !i.is_video() => Some(load_photo_data(i)),
        _ => None,
    };
    let overlay_display = if item.is_some() { "flex" } else { "none" };
    let video_display = if is_video { "block" } else { "none" };

    rsx! {
        div {
            style: "position: fixed; top: 0; left: 0; right: 0; bottom: 0; background: black; z-index: 1000; display: {overlay_display}; flex-direction: column; align-items: center; justify-content: center;",
            div {
                style: "position: absolute; top: 40px; left: 20px; right: 20px; display: flex; justify-content: space-between; z-index: 1;",
                if let Some(current) = item.clone() {
                    button {
                        style: "padding: 8px 16px; background: #cc3333; color: white; border: none; border-radius: 4px; font-size: 16px;",
                        onclick: move |_| on_delete.call(current.clone()),
                        "🗑 Delete"
                    }
                }
                button {
                    style: "background: none; border: none; color: white; font-size: 36px; cursor: pointer;",
                    onclick: move |_| on_close.call(()),
                    "×"
                }
            }
            match photo {
                Some(ImageLoadState::Loaded(url)) => rsx! {
                    img {
                        src: "{url}",
                        style: "max-width: 100%; max-height: 100%; object-fit: contain;",
                    }
                },
                Some(ImageLoadState::Failed) => rsx! {
                    div { style: "color: white; font-size: 18px;", "Photo could not be loaded" }
                },
                None => rsx! {},
            }
            video {
                id: VIDEO_SURFACE_ID,
                controls: true,
                style: "display: {video_display}; max-width: 100%; max-height: 100%;",
            }
        }
    }
}
