use crate::config::{AppConfig, CaptureConfig};
use crate::error::AppError;
use camera_control::{
    CaptureController, ControllerConfig, PictureOptions, PlatformCamera, RecordOptions,
};
use media_gallery::MediaGalleryService;
use std::sync::Arc;
use std::time::Duration;

pub type AppCaptureController = CaptureController<PlatformCamera>;

pub fn controller_config(capture: &CaptureConfig) -> ControllerConfig {
    ControllerConfig {
        ready_timeout: Duration::from_millis(capture.ready_timeout_ms),
        shutdown_grace: Duration::from_millis(capture.shutdown_grace_ms),
        picture: PictureOptions {
            quality: capture.photo_quality.clamp(0.0, 1.0),
            exif: false,
        },
        record: RecordOptions {
            max_duration: capture.max_recording_secs.map(Duration::from_secs),
            mute: capture.mute_recording,
        },
    }
}

#[cfg(target_os = "android")]
fn open_camera(_capture: &CaptureConfig) -> Result<PlatformCamera, AppError> {
    Ok(camera_control::AndroidCamera::new(
        camera_control::AndroidCameraConfig::default(),
    ))
}

#[cfg(not(target_os = "android"))]
fn open_camera(capture: &CaptureConfig) -> Result<PlatformCamera, AppError> {
    let media_dir = crate::filesystem::media_dir()?;
    Ok(camera_control::VirtualCamera::open(
        media_dir,
        Duration::from_millis(capture.virtual_warmup_ms),
    )?)
}

/// Camera controller for one visit of the capture screen
pub fn create_controller(
    config: &AppConfig,
    gallery: Arc<MediaGalleryService>,
) -> Result<AppCaptureController, AppError> {
    let camera = open_camera(&config.capture)?;
    Ok(CaptureController::new(
        camera,
        gallery,
        controller_config(&config.capture),
    ))
}
