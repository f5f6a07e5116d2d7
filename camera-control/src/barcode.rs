//! Barcode scanning.
//!
//! Adapters publish payloads found by their live preview into a
//! [`BarcodeFeed`] while scanning is enabled. Platform scanners are asked for
//! every [`BarcodeFormat`]; the built-in decoder handles QR codes only.
//! Frames are converted to grayscale, downscaled to at most
//! [`MAX_DIMENSION`] pixels and handed to `rqrr`.

use image::imageops::FilterType;
use image::GrayImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Longest edge used for detection
pub const MAX_DIMENSION: u32 = 1024;

const FEED_CAPACITY: usize = 16;

/// Symbologies requested from the platform scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeFormat {
    Qr,
    Ean13,
    Ean8,
    Pdf417,
    Aztec,
    DataMatrix,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 6] = [
        BarcodeFormat::Qr,
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::Pdf417,
        BarcodeFormat::Aztec,
        BarcodeFormat::DataMatrix,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BarcodeFormat::Qr => "qr",
            BarcodeFormat::Ean13 => "ean13",
            BarcodeFormat::Ean8 => "ean8",
            BarcodeFormat::Pdf417 => "pdf417",
            BarcodeFormat::Aztec => "aztec",
            BarcodeFormat::DataMatrix => "datamatrix",
        }
    }

    /// Comma separated list, as passed to the platform scanner
    pub fn joined(formats: &[BarcodeFormat]) -> String {
        formats
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Payloads decoded by the preview. Dropped while scanning is disabled.
#[derive(Clone)]
pub struct BarcodeFeed {
    tx: broadcast::Sender<String>,
    enabled: Arc<AtomicBool>,
}

impl Default for BarcodeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl BarcodeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            tx,
            enabled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Returns whether the payload was delivered to anyone
    pub fn publish(&self, payload: String) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.tx.send(payload).is_ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

#[derive(Debug)]
pub enum BarcodeError {
    ImageError(image::ImageError),
    TaskFailed(String),
}

impl std::fmt::Display for BarcodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BarcodeError::ImageError(e) => write!(f, "Image error: {}", e),
            BarcodeError::TaskFailed(msg) => write!(f, "Decode task failed: {}", msg),
        }
    }
}

impl std::error::Error for BarcodeError {}

impl From<image::ImageError> for BarcodeError {
    fn from(err: image::ImageError) -> Self {
        BarcodeError::ImageError(err)
    }
}

/// Decode every QR code in the image at `path`
pub async fn decode_file(path: String) -> Result<Vec<String>, BarcodeError> {
    tokio::task::spawn_blocking(move || {
        let img = image::open(Path::new(&path))?;
        Ok(decode_luma(&img.to_luma8()))
    })
    .await
    .map_err(|e| BarcodeError::TaskFailed(e.to_string()))?
}

/// Decode every QR code in a grayscale frame
pub fn decode_luma(frame: &GrayImage) -> Vec<String> {
    let (width, height) = frame.dimensions();
    let scaled;
    let frame = if width > MAX_DIMENSION || height > MAX_DIMENSION {
        let scale = (width as f32 / MAX_DIMENSION as f32).max(height as f32 / MAX_DIMENSION as f32);
        let new_width = ((width as f32 / scale) as u32).max(1);
        let new_height = ((height as f32 / scale) as u32).max(1);
        scaled = image::imageops::resize(frame, new_width, new_height, FilterType::Triangle);
        &scaled
    } else {
        frame
    };

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        frame.width() as usize,
        frame.height() as usize,
        |x, y| frame.get_pixel(x as u32, y as u32).0[0],
    );

    let mut payloads = Vec::new();
    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_, content)) => {
                log::debug!("Decoded QR code ({} bytes)", content.len());
                payloads.push(content);
            }
            Err(e) => log::debug!("Failed to decode QR grid: {:?}", e),
        }
    }
    payloads
}

/// Render `payload` as a QR code with a quiet zone, `scale` pixels per module
#[cfg(test)]
pub(crate) fn qr_frame(payload: &str, scale: u32) -> GrayImage {
    let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let quiet = 4;
    let size = (modules + quiet * 2) * scale;

    GrayImage::from_fn(size, size, |x, y| {
        let (mx, my) = (x / scale, y / scale);
        let inside = (quiet..quiet + modules).contains(&mx) && (quiet..quiet + modules).contains(&my);
        let dark = inside
            && colors[((my - quiet) * modules + (mx - quiet)) as usize] == qrcode::Color::Dark;
        image::Luma([if dark { 0 } else { 255 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_decodes_qr_code() {
        let frame = qr_frame("https://example.com/item/42", 6);
        assert_eq!(decode_luma(&frame), vec!["https://example.com/item/42".to_string()]);
    }

    #[tokio::test]
    async fn test_feed_drops_payloads_while_disabled() {
        let feed = BarcodeFeed::new();
        let mut rx = feed.subscribe();

        assert!(!feed.publish("ignored".into()));
        feed.set_enabled(true);
        assert!(feed.publish("4006381333931".into()));
        assert_eq!(rx.recv().await.unwrap(), "4006381333931");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_all_formats_are_requested() {
        assert_eq!(
            BarcodeFormat::joined(&BarcodeFormat::ALL),
            "qr,ean13,ean8,pdf417,aztec,datamatrix"
        );
    }

    #[test]
    fn test_blank_frame_has_no_codes() {
        let frame = GrayImage::from_pixel(320, 240, Luma([255]));
        assert!(decode_luma(&frame).is_empty());
    }

    #[test]
    fn test_large_frame_is_downscaled() {
        let frame = GrayImage::from_pixel(MAX_DIMENSION * 2, 300, Luma([128]));
        assert!(decode_luma(&frame).is_empty());
    }

    #[tokio::test]
    async fn test_decode_file() {
        let path = std::env::temp_dir().join(format!("{}.jpg", uuid::Uuid::new_v4()));
        GrayImage::from_pixel(64, 64, Luma([0])).save(&path).unwrap();

        let payloads = decode_file(path.to_string_lossy().into_owned()).await.unwrap();
        assert!(payloads.is_empty());
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = decode_file("/nonexistent/frame.jpg".to_string()).await;
        assert!(matches!(result, Err(BarcodeError::ImageError(_))));
    }
}
