use media_gallery::MediaGalleryError;

/// Failure reported by a camera adapter
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterError {
    PermissionDenied(String),
    /// Capture or recording failed inside the device layer
    DeviceError(String),
    /// `stop_recording` without an active recording
    NotRecording,
    Timeout(String),
    PlatformNotSupported(String),
    Other(String),
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            AdapterError::DeviceError(msg) => write!(f, "Camera error: {}", msg),
            AdapterError::NotRecording => write!(f, "No recording in progress"),
            AdapterError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            AdapterError::PlatformNotSupported(msg) => write!(f, "Platform not supported: {}", msg),
            AdapterError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for AdapterError {}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::DeviceError(err.to_string())
    }
}

/// Error type for controller operations
#[derive(Debug)]
pub enum CaptureError {
    /// The operation is not allowed in the current state
    IllegalState(&'static str),
    /// Another start is already in progress
    Busy,
    /// The camera did not report ready within the wait budget
    NotReady,
    PermissionDenied(String),
    Adapter(AdapterError),
    Persistence(MediaGalleryError),
    Barcode(String),
    /// The capture screen has released the camera
    Closed,
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::IllegalState(msg) => write!(f, "Not allowed now: {}", msg),
            CaptureError::Busy => write!(f, "Camera is busy"),
            CaptureError::NotReady => write!(f, "Camera did not become ready in time"),
            CaptureError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            CaptureError::Adapter(e) => write!(f, "{}", e),
            CaptureError::Persistence(e) => write!(f, "Could not save capture: {}", e),
            CaptureError::Barcode(msg) => write!(f, "Barcode error: {}", msg),
            CaptureError::Closed => write!(f, "Camera has been released"),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<AdapterError> for CaptureError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::PermissionDenied(msg) => CaptureError::PermissionDenied(msg),
            other => CaptureError::Adapter(other),
        }
    }
}

impl From<MediaGalleryError> for CaptureError {
    fn from(err: MediaGalleryError) -> Self {
        CaptureError::Persistence(err)
    }
}

impl CaptureError {
    /// Message shown on the capture screen
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::IllegalState(_) | CaptureError::Busy => {
                "Please wait for the camera to finish.".to_string()
            }
            CaptureError::NotReady => "Camera is not ready yet. Please try again.".to_string(),
            CaptureError::PermissionDenied(_) => {
                "Camera and microphone access is required.".to_string()
            }
            CaptureError::Adapter(_) => "The camera reported an error.".to_string(),
            CaptureError::Persistence(e) => e.user_message(),
            CaptureError::Barcode(_) => "No barcode could be read.".to_string(),
            CaptureError::Closed => "The camera is closed.".to_string(),
        }
    }
}
