//! # Camera Control
//!
//! Capture and recording control for the camera screen.
//!
//! This crate provides:
//! - The [`CameraAdapter`] seam over the platform camera
//! - [`CaptureController`], the single owner of camera commands: photo
//!   capture, recording with mid-recording camera flips, zoom and barcode
//!   scanning
//! - [`BarcodeFeed`], payloads published by a scanning preview
//! - [`ReadySignal`], the preview readiness gate with a bounded wait
//! - A synthetic [`VirtualCamera`] for desktop builds and tests, and a JNI
//!   adapter for Android
//!
//! Captures are persisted through [`media_gallery::MediaGalleryService`].
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use camera_control::{CaptureController, ControllerConfig, VirtualCamera};
//!
//! let camera = VirtualCamera::open("./data/media", Duration::from_millis(300))?;
//! let controller = CaptureController::new(camera, gallery, ControllerConfig::default());
//! controller.start().await?;
//! controller.take_photo().await?;
//! ```

pub mod adapter;
pub mod barcode;
pub mod controller;
pub mod error;
pub mod readiness;
pub mod virtual_camera;

#[cfg(target_os = "android")]
pub mod android;

pub use adapter::{
    CameraAdapter, CaptureMode, CapturedMedia, Facing, PermissionStatus, PictureOptions,
    RecordOptions,
};
pub use barcode::{BarcodeError, BarcodeFeed, BarcodeFormat};
pub use controller::{
    CaptureController, CaptureOutcome, CaptureSession, CaptureState, ControllerConfig,
};
pub use error::{AdapterError, CaptureError};
pub use readiness::ReadySignal;
pub use virtual_camera::VirtualCamera;

#[cfg(target_os = "android")]
pub use android::{AndroidCamera, AndroidCameraConfig};

/// Camera adapter of the current platform
#[cfg(target_os = "android")]
pub type PlatformCamera = AndroidCamera;

/// Camera adapter of the current platform
#[cfg(not(target_os = "android"))]
pub type PlatformCamera = VirtualCamera;
