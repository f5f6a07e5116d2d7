use crate::config::AppConfig;
use crate::services::{camera_service, AppCaptureController};
use camera_control::{CaptureOutcome, CaptureSession, CaptureState, PermissionStatus};
use dioxus::core::spawn_forever;
use dioxus::prelude::*;
use media_gallery::MediaGalleryService;
use std::sync::Arc;

/// Controller handle passed to the camera view
#[derive(Clone)]
pub struct SharedController(Arc<AppCaptureController>);

impl PartialEq for SharedController {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Camera screen. Owns the camera for as long as it is mounted.
#[component]
pub fn CaptureScreen() -> Element {
    let gallery = use_context::<Arc<MediaGalleryService>>();
    let config = use_context::<AppConfig>();

    let controller = use_hook(move || {
        camera_service::create_controller(&config, gallery)
            .map(|c| SharedController(Arc::new(c)))
            .map_err(|e| {
                log::error!("Failed to open camera: {}", e);
                e.user_message()
            })
    });

    match controller {
        Ok(controller) => rsx! {
            CameraView { controller }
        },
        Err(message) => rsx! {
            div { style: "padding: 40px 20px; text-align: center; color: #721c24;",
                "{message}"
            }
        },
    }
}

#[component]
fn CameraView(controller: SharedController) -> Element {
    let controller = controller.0;
    let mut session = use_signal(|| controller.session());
    let mut permission = use_signal(|| None::<PermissionStatus>);

    // Mirror the controller state, follow readiness and scanned barcodes,
    // then start the preview
    let mounted = controller.clone();
    use_hook(move || {
        let mirror = mounted.clone();
        spawn(async move {
            let mut changes = mirror.subscribe();
            loop {
                let snapshot = changes.borrow_and_update().clone();
                session.set(snapshot);
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });

        let follower = mounted.clone();
        spawn(async move { follower.follow_readiness().await });

        let scanner = mounted.clone();
        spawn(async move { scanner.follow_barcodes().await });

        spawn(async move {
            match mounted.start().await {
                Ok(status) => permission.set(Some(status)),
                Err(e) => log::error!("Camera start failed: {}", e),
            }
        });
    });

    // Leaving the screen stops a running recording and releases the camera
    let unmounted = controller.clone();
    use_drop(move || {
        let controller = unmounted.clone();
        spawn_forever(async move {
            controller.shutdown().await;
            log::info!("Camera released");
        });
    });

    let c = controller.clone();
    let grant_permission = move |_: MouseEvent| {
        let c = c.clone();
        spawn(async move {
            match c.request_permissions().await {
                Ok(status) => permission.set(Some(status)),
                Err(e) => log::warn!("Permission request failed: {}", e),
            }
        });
    };

    let c = controller.clone();
    let flip_camera = move |_: MouseEvent| {
        let c = c.clone();
        spawn(async move {
            if let Err(e) = c.toggle_camera_facing().await {
                log::warn!("Flip failed: {}", e);
            }
        });
    };

    let c = controller.clone();
    let toggle_barcode = move |_: MouseEvent| {
        if let Err(e) = c.toggle_barcode_mode() {
            log::warn!("Barcode mode not toggled: {}", e);
        }
    };

    let c = controller.clone();
    let set_zoom = move |evt: FormEvent| match evt.value().parse::<f32>() {
        Ok(zoom) => {
            c.set_zoom(zoom);
        }
        Err(e) => log::debug!("Ignoring zoom value {:?}: {}", evt.value(), e),
    };

    let c = controller.clone();
    let capture = move |_: MouseEvent| {
        let c = c.clone();
        spawn(async move {
            match c.capture().await {
                Ok(CaptureOutcome::Photo(item)) => log::debug!("Captured {}", item.uri),
                Ok(CaptureOutcome::Barcode(None)) => log::debug!("Nothing to scan"),
                Ok(CaptureOutcome::Barcode(Some(_))) => {}
                Err(e) => log::warn!("Capture failed: {}", e),
            }
        });
    };

    let c = controller.clone();
    let start_recording = move |_: MouseEvent| {
        let c = c.clone();
        spawn(async move {
            if let Err(e) = c.start_recording().await {
                log::warn!("Recording failed: {}", e);
            }
        });
    };

    let c = controller.clone();
    let stop_recording = move |_: MouseEvent| {
        if let Err(e) = c.stop_recording() {
            log::warn!("Stop failed: {}", e);
        }
    };

    let c = controller.clone();
    let dismiss_error = move |_: MouseEvent| c.clear_error();

    let c = controller.clone();
    let dismiss_barcode = move |_: MouseEvent| c.dismiss_barcode();

    let current: CaptureSession = session();
    let needs_permission = permission().is_some_and(|p| !p.granted);
    let recording = current.is_recording();
    let flip_pending = current.state == CaptureState::FlipPending;
    let zoom_label = format!("Zoom: {:.1}x", current.zoom);
    let preview_text = if current.is_camera_ready {
        format!("{} camera", current.facing.as_str())
    } else {
        "Starting camera...".to_string()
    };

    if needs_permission {
        return rsx! {
            div { style: "display: flex; flex-direction: column; justify-content: center; align-items: center; padding: 40px 20px; min-height: 60vh;",
                p { style: "text-align: center; margin-bottom: 16px;",
                    "We need your permission to show the camera"
                }
                button { class: "btn-primary", onclick: grant_permission, "Grant Permission" }
            }
        };
    }

    rsx! {
        div { style: "position: relative; display: flex; flex-direction: column; height: 100%; background: #000; color: white;",

            // Preview
            div { style: "flex: 1; display: flex; align-items: center; justify-content: center; min-height: 300px;",
                span { style: "opacity: 0.6;", "{preview_text}" }
                if recording {
                    div { style: "position: absolute; top: 16px; left: 16px; color: #ff4444; font-weight: 700;",
                        "● REC"
                    }
                }
            }

            // Top controls
            div { style: "position: absolute; top: 16px; right: 16px; display: flex; flex-direction: column; gap: 8px;",
                button { disabled: flip_pending, onclick: flip_camera, "🔄 Flip Camera" }
                button {
                    disabled: recording,
                    onclick: toggle_barcode,
                    if current.barcode_mode { "📷 Photo Mode" } else { "🔍 Scan Barcode" }
                }
            }

            // Zoom
            div { style: "display: flex; align-items: center; gap: 12px; padding: 8px 16px;",
                input {
                    r#type: "range",
                    min: "0",
                    max: "1",
                    step: "0.1",
                    value: "{current.zoom}",
                    style: "flex: 1;",
                    oninput: set_zoom,
                }
                span { "{zoom_label}" }
            }

            // Capture controls
            div { style: "display: flex; justify-content: space-around; padding: 16px;",
                if current.barcode_mode {
                    button { class: "btn-primary", onclick: capture.clone(), "Scan" }
                } else if recording {
                    button {
                        style: "background: #cc3333; color: white;",
                        onclick: stop_recording,
                        "⏹ Stop Recording"
                    }
                } else {
                    button { class: "btn-primary", onclick: capture, "📸 Take Photo" }
                    button { class: "btn-secondary", onclick: start_recording, "⏺ Start Recording" }
                }
            }

            if let Some(message) = current.last_error.clone() {
                div { style: "position: absolute; bottom: 100px; left: 16px; right: 16px; padding: 12px; background: #f8d7da; color: #721c24; border-radius: 4px; display: flex; justify-content: space-between;",
                    span { "{message}" }
                    button { onclick: dismiss_error, "✕" }
                }
            }

            if let Some(payload) = current.last_barcode.clone() {
                div { style: "position: fixed; top: 0; left: 0; right: 0; bottom: 0; background: rgba(0,0,0,0.6); display: flex; align-items: center; justify-content: center; z-index: 1000;",
                    div { style: "background: white; color: #333; padding: 20px; border-radius: 8px; max-width: 80%; word-break: break-all;",
                        h3 { style: "margin-top: 0;", "Barcode detected" }
                        p { "{payload}" }
                        button { class: "btn-primary", onclick: dismiss_barcode, "Close" }
                    }
                }
            }
        }
    }
}
