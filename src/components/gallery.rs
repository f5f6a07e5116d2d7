use crate::services::media_service;
use dioxus::prelude::*;
use media_gallery::{
    DomVideoSurface, FullscreenMedia, FullscreenViewer, MediaGalleryService, MediaGrid, MediaItem,
    SelectionState, TapAction,
};
use std::sync::Arc;

/// Captured photos and videos, newest first
#[component]
pub fn GalleryScreen() -> Element {
    let gallery = use_context::<Arc<MediaGalleryService>>();
    let mut items = use_signal(Vec::<MediaItem>::new);
    let mut selection = use_signal(SelectionState::new);
    let mut viewer = use_signal(|| FullscreenViewer::new(DomVideoSurface));
    let mut error = use_signal(|| None::<String>);

    // Re-read the collection whenever the screen is shown
    let g = gallery.clone();
    let mut reload = move || match media_service::load_media(&g) {
        Ok(list) => {
            selection.write().retain_existing(&list);
            viewer.write().sync_with(&list);
            items.set(list);
        }
        Err(e) => error.set(Some(e.user_message())),
    };

    use_effect(move || {
        reload();
    });

    let mut apply_remaining = move |remaining: Vec<MediaItem>| {
        selection.write().retain_existing(&remaining);
        viewer.write().sync_with(&remaining);
        items.set(remaining);
    };

    let g = gallery.clone();
    let delete_selected = move |_: MouseEvent| {
        let g = g.clone();
        let uris = selection.read().selected().clone();
        if uris.is_empty() {
            return;
        }
        spawn(async move {
            match media_service::delete_media(&g, &uris).await {
                Ok(remaining) => {
                    selection.write().cancel();
                    apply_remaining(remaining);
                }
                Err(e) => error.set(Some(e.user_message())),
            }
        });
    };

    let g = gallery.clone();
    let delete_current = move |item: MediaItem| {
        let g = g.clone();
        spawn(async move {
            match g.remove(&item.uri).await {
                Ok(remaining) => {
                    log::info!("Deleted {}", item.uri);
                    apply_remaining(remaining);
                }
                Err(e) => {
                    log::error!("Failed to delete {}: {}", item.uri, e);
                    error.set(Some(e.user_message()));
                }
            }
        });
    };

    let selection_active = selection.read().is_active();
    let selected_count = selection.read().count();
    let current_item = viewer.read().current().cloned();

    rsx! {
        div { style: "padding: 16px; max-width: 600px; margin: 0 auto;",

            // Header
            div { style: "display: flex; justify-content: space-between; align-items: center; margin-bottom: 12px;",
                h1 { style: "color: #0066cc; margin: 0; font-size: 24px; font-weight: 700;",
                    "Gallery"
                }
                div { style: "display: flex; gap: 8px;",
                    if selection_active && selected_count > 0 {
                        button {
                            style: "padding: 8px 12px; background: #cc3333; color: white; border: none; border-radius: 8px;",
                            onclick: delete_selected,
                            "Delete Selected ({selected_count})"
                        }
                    }
                    button {
                        class: "btn-secondary",
                        style: "padding: 8px 12px;",
                        onclick: move |_| {
                            let mut state = selection.write();
                            if state.is_active() {
                                state.cancel();
                            } else {
                                state.toggle_mode();
                            }
                        },
                        if selection_active { "Cancel" } else { "Select" }
                    }
                }
            }

            if let Some(message) = error() {
                div {
                    style: "margin-bottom: 12px; padding: 12px; background: #f8d7da; border-radius: 4px; color: #721c24; display: flex; justify-content: space-between;",
                    span { "{message}" }
                    button { onclick: move |_| error.set(None), "✕" }
                }
            }

            MediaGrid {
                items: items(),
                selection: selection(),
                on_tap: move |item: MediaItem| {
                    let action = selection.write().tap(&item);
                    if let TapAction::Open(item) = action {
                        viewer.write().open(item);
                    }
                },
                on_long_press: move |item: MediaItem| selection.write().long_press(&item),
                on_toggle: move |uri: String| {
                    selection.write().toggle(&uri);
                },
            }

            FullscreenMedia {
                item: current_item,
                on_close: move |_| viewer.write().close(),
                on_delete: delete_current,
            }
        }
    }
}
