//! Camera Device Adapter seam.
//!
//! Implementations wrap the platform camera. All long-running calls are
//! async; `record` only resolves once the recording has been stopped.

use crate::barcode::BarcodeFeed;
use crate::error::AdapterError;
use crate::readiness::ReadySignal;
use std::future::Future;
use std::time::Duration;

/// Which camera is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    #[default]
    Back,
    Front,
}

impl Facing {
    pub fn toggled(self) -> Self {
        match self {
            Facing::Back => Facing::Front,
            Facing::Front => Facing::Back,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Facing::Back => "back",
            Facing::Front => "front",
        }
    }
}

/// Capture mode of the preview surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureMode {
    #[default]
    Picture,
    Video,
}

impl CaptureMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureMode::Picture => "picture",
            CaptureMode::Video => "video",
        }
    }
}

/// Result of a permission query or request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionStatus {
    pub granted: bool,
    /// Whether asking again can still show the system prompt
    pub can_ask_again: bool,
}

impl PermissionStatus {
    pub fn granted() -> Self {
        Self {
            granted: true,
            can_ask_again: true,
        }
    }

    pub fn denied() -> Self {
        Self {
            granted: false,
            can_ask_again: true,
        }
    }
}

/// A file written by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMedia {
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PictureOptions {
    /// JPEG quality in `[0, 1]`
    pub quality: f32,
    pub exif: bool,
}

impl Default for PictureOptions {
    fn default() -> Self {
        Self {
            quality: 1.0,
            exif: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordOptions {
    pub max_duration: Option<Duration>,
    pub mute: bool,
}

/// Platform camera
pub trait CameraAdapter: Send + Sync + 'static {
    /// Readiness of the preview surface, fired by the adapter
    fn readiness(&self) -> &ReadySignal;

    /// Payloads decoded by the live preview while scanning is enabled
    fn barcodes(&self) -> &BarcodeFeed;

    /// Start or stop continuous barcode scanning of the preview
    fn set_barcode_scanning(&self, enabled: bool) -> Result<(), AdapterError> {
        self.barcodes().set_enabled(enabled);
        Ok(())
    }

    fn camera_permission(&self)
        -> impl Future<Output = Result<PermissionStatus, AdapterError>> + Send;

    fn request_camera_permission(
        &self,
    ) -> impl Future<Output = Result<PermissionStatus, AdapterError>> + Send;

    fn microphone_permission(
        &self,
    ) -> impl Future<Output = Result<PermissionStatus, AdapterError>> + Send;

    fn request_microphone_permission(
        &self,
    ) -> impl Future<Output = Result<PermissionStatus, AdapterError>> + Send;

    /// Start the live preview, readiness fires once it is up
    fn open_preview(&self) -> impl Future<Output = Result<(), AdapterError>> + Send;

    /// Switch the active camera, the preview re-initializes
    fn set_facing(&self, facing: Facing) -> impl Future<Output = Result<(), AdapterError>> + Send;

    /// Switch picture/video mode, the preview re-initializes
    fn set_mode(&self, mode: CaptureMode)
        -> impl Future<Output = Result<(), AdapterError>> + Send;

    /// Zoom in `[0, 1]`
    fn set_zoom(&self, zoom: f32) -> Result<(), AdapterError>;

    fn take_picture(
        &self,
        options: PictureOptions,
    ) -> impl Future<Output = Result<CapturedMedia, AdapterError>> + Send;

    /// Record until `stop_recording` is called or the device fails
    fn record(
        &self,
        options: RecordOptions,
    ) -> impl Future<Output = Result<CapturedMedia, AdapterError>> + Send;

    /// Fire-and-forget stop, resolves the pending `record`
    fn stop_recording(&self) -> Result<(), AdapterError>;

    /// Release the device
    fn release(&self);
}
