//! Synthetic camera for desktop builds and tests.
//!
//! Photos are rendered gradient frames saved as JPEG. Recordings are MJPEG
//! streams (concatenated JPEG frames). Every preview re-initialization
//! reports ready after the configured warm-up. A scene shown with
//! [`VirtualCamera::show`] replaces the test pattern and is scanned for
//! barcodes while scanning is enabled.

use crate::adapter::{
    CameraAdapter, CaptureMode, CapturedMedia, Facing, PermissionStatus, PictureOptions,
    RecordOptions,
};
use crate::barcode::{self, BarcodeFeed};
use crate::error::AdapterError;
use crate::readiness::ReadySignal;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;
const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const SCAN_INTERVAL: Duration = Duration::from_millis(250);

pub struct VirtualCamera {
    output_dir: PathBuf,
    warmup: Duration,
    readiness: ReadySignal,
    /// Bumped on every preview re-init so stale warm-ups never fire
    generation: Arc<AtomicU64>,
    facing: Mutex<Facing>,
    mode: Mutex<CaptureMode>,
    zoom: Mutex<f32>,
    recording: AtomicBool,
    stop: Notify,
    barcodes: BarcodeFeed,
    /// What the camera is pointed at, `None` for the test pattern
    scene: Arc<Mutex<Option<GrayImage>>>,
    scanner_running: Arc<AtomicBool>,
}

impl VirtualCamera {
    pub fn open(output_dir: impl Into<PathBuf>, warmup: Duration) -> Result<Self, AdapterError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        log::info!("Virtual camera writing to {:?}", output_dir);

        Ok(Self {
            output_dir,
            warmup,
            readiness: ReadySignal::new(),
            generation: Arc::new(AtomicU64::new(0)),
            facing: Mutex::new(Facing::Back),
            mode: Mutex::new(CaptureMode::Picture),
            zoom: Mutex::new(0.0),
            recording: AtomicBool::new(false),
            stop: Notify::new(),
            barcodes: BarcodeFeed::new(),
            scene: Arc::new(Mutex::new(None)),
            scanner_running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn facing(&self) -> Facing {
        *self.facing.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn mode(&self) -> CaptureMode {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    fn zoom(&self) -> f32 {
        *self.zoom.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Point the camera at `scene`, or back at the test pattern
    pub fn show(&self, scene: Option<GrayImage>) {
        *self.scene.lock().unwrap_or_else(|e| e.into_inner()) = scene;
    }

    fn scene(&self) -> Option<GrayImage> {
        self.scene.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Decode the preview every [`SCAN_INTERVAL`] until released
    fn start_scanner(&self) {
        if self.scanner_running.swap(true, Ordering::SeqCst) {
            return;
        }
        let running = self.scanner_running.clone();
        let scene = self.scene.clone();
        let feed = self.barcodes.clone();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(SCAN_INTERVAL).await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if !feed.is_enabled() {
                    continue;
                }
                let frame = scene.lock().unwrap_or_else(|e| e.into_inner()).clone();
                // the test pattern holds no codes
                let Some(frame) = frame else { continue };

                match tokio::task::spawn_blocking(move || barcode::decode_luma(&frame)).await {
                    Ok(payloads) => {
                        for payload in payloads {
                            feed.publish(payload);
                        }
                    }
                    Err(e) => log::warn!("Preview scan failed: {}", e),
                }
            }
            log::debug!("Virtual barcode scanner stopped");
        });
    }

    /// Report ready once the warm-up has passed
    fn reinitialize(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.generation.clone();
        let readiness = self.readiness.clone();
        let warmup = self.warmup;

        tokio::spawn(async move {
            tokio::time::sleep(warmup).await;
            if current.load(Ordering::SeqCst) == generation {
                readiness.notify_ready();
            }
        });
    }

    fn new_file(&self, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", uuid::Uuid::new_v4(), extension))
    }
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Gradient test pattern, tinted by facing and stretched by zoom
fn render_frame(facing: Facing, zoom: f32, tick: u32) -> RgbImage {
    let scale = 1.0 + zoom * 3.0;
    let tint = match facing {
        Facing::Back => [40u8, 90, 160],
        Facing::Front => [160u8, 90, 40],
    };

    RgbImage::from_fn(FRAME_WIDTH, FRAME_HEIGHT, |x, y| {
        let xs = (x as f32 / scale) as u32;
        let ys = (y as f32 / scale) as u32;
        let wave = ((xs + ys + tick * 8) % 256) as u8;
        Rgb([
            tint[0].saturating_add(wave / 3),
            tint[1].saturating_add((ys % 256) as u8 / 4),
            tint[2].saturating_add((xs % 256) as u8 / 4),
        ])
    })
}

fn encode_jpeg(frame: &RgbImage, quality: f32) -> Result<Vec<u8>, AdapterError> {
    let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(frame)
        .map_err(|e| AdapterError::DeviceError(e.to_string()))?;
    Ok(buffer)
}

impl CameraAdapter for VirtualCamera {
    fn readiness(&self) -> &ReadySignal {
        &self.readiness
    }

    async fn camera_permission(&self) -> Result<PermissionStatus, AdapterError> {
        Ok(PermissionStatus::granted())
    }

    async fn request_camera_permission(&self) -> Result<PermissionStatus, AdapterError> {
        Ok(PermissionStatus::granted())
    }

    async fn microphone_permission(&self) -> Result<PermissionStatus, AdapterError> {
        Ok(PermissionStatus::granted())
    }

    async fn request_microphone_permission(&self) -> Result<PermissionStatus, AdapterError> {
        Ok(PermissionStatus::granted())
    }

    fn barcodes(&self) -> &BarcodeFeed {
        &self.barcodes
    }

    async fn open_preview(&self) -> Result<(), AdapterError> {
        self.reinitialize();
        self.start_scanner();
        Ok(())
    }

    async fn set_facing(&self, facing: Facing) -> Result<(), AdapterError> {
        *self.facing.lock().unwrap_or_else(|e| e.into_inner()) = facing;
        self.reinitialize();
        Ok(())
    }

    async fn set_mode(&self, mode: CaptureMode) -> Result<(), AdapterError> {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
        self.reinitialize();
        Ok(())
    }

    fn set_zoom(&self, zoom: f32) -> Result<(), AdapterError> {
        *self.zoom.lock().unwrap_or_else(|e| e.into_inner()) = zoom.clamp(0.0, 1.0);
        Ok(())
    }

    async fn take_picture(&self, options: PictureOptions) -> Result<CapturedMedia, AdapterError> {
        let path = self.new_file("jpg");
        let facing = self.facing();
        let zoom = self.zoom();
        let scene = self.scene();

        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            let frame = match scene {
                Some(scene) => DynamicImage::ImageLuma8(scene).to_rgb8(),
                None => render_frame(facing, zoom, 0),
            };
            let bytes = encode_jpeg(&frame, options.quality)?;
            std::fs::write(&target, bytes)?;
            Ok::<_, AdapterError>(())
        })
        .await
        .map_err(|e| AdapterError::Other(e.to_string()))??;

        log::debug!("Virtual photo written to {:?}", path);
        Ok(CapturedMedia {
            uri: file_uri(&path),
        })
    }

    async fn record(&self, options: RecordOptions) -> Result<CapturedMedia, AdapterError> {
        if self.recording.swap(true, Ordering::SeqCst) {
            return Err(AdapterError::DeviceError("already recording".into()));
        }

        let path = self.new_file("mjpeg");
        let result = self.record_frames(&path, options).await;
        self.recording.store(false, Ordering::SeqCst);
        result?;

        log::debug!("Virtual recording written to {:?}", path);
        Ok(CapturedMedia {
            uri: file_uri(&path),
        })
    }

    fn stop_recording(&self) -> Result<(), AdapterError> {
        if !self.recording.load(Ordering::SeqCst) {
            return Err(AdapterError::NotRecording);
        }
        self.stop.notify_one();
        Ok(())
    }

    fn release(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.readiness.reset();
        self.scanner_running.store(false, Ordering::SeqCst);
        self.barcodes.set_enabled(false);
        if self.recording.load(Ordering::SeqCst) {
            self.stop.notify_one();
        }
        log::debug!("Virtual camera released");
    }
}

impl VirtualCamera {
    async fn record_frames(&self, path: &Path, options: RecordOptions) -> Result<(), AdapterError> {
        let mut file = std::fs::File::create(path)?;
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        let deadline = options
            .max_duration
            .map(|max| tokio::time::Instant::now() + max);
        let mut tick = 0u32;

        loop {
            tokio::select! {
                _ = self.stop.notified() => break,
                _ = ticker.tick() => {
                    let frame = render_frame(self.facing(), self.zoom(), tick);
                    file.write_all(&encode_jpeg(&frame, 0.7)?)?;
                    tick = tick.wrapping_add(1);
                }
            }

            if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                log::info!("Recording reached its maximum duration");
                break;
            }
        }

        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> VirtualCamera {
        let dir = std::env::temp_dir().join(format!("virtual-camera-{}", uuid::Uuid::new_v4()));
        VirtualCamera::open(dir, Duration::from_millis(10)).unwrap()
    }

    fn path_of(uri: &str) -> PathBuf {
        PathBuf::from(uri.trim_start_matches("file://"))
    }

    #[tokio::test]
    async fn test_take_picture_writes_jpeg() {
        let camera = camera();
        let media = camera.take_picture(PictureOptions::default()).await.unwrap();

        assert!(media.uri.starts_with("file://"));
        assert!(media.uri.ends_with(".jpg"));
        let img = image::open(path_of(&media.uri)).unwrap();
        assert_eq!(img.width(), FRAME_WIDTH);
        assert_eq!(img.height(), FRAME_HEIGHT);
        std::fs::remove_dir_all(camera.output_dir()).unwrap();
    }

    #[tokio::test]
    async fn test_pictures_get_distinct_files() {
        let camera = camera();
        let first = camera.take_picture(PictureOptions::default()).await.unwrap();
        let second = camera.take_picture(PictureOptions::default()).await.unwrap();
        assert_ne!(first.uri, second.uri);
        std::fs::remove_dir_all(camera.output_dir()).unwrap();
    }

    #[tokio::test]
    async fn test_preview_reports_ready_after_warmup() {
        let camera = camera();
        camera.open_preview().await.unwrap();
        assert!(!camera.readiness().is_ready());
        camera
            .readiness()
            .wait(Duration::from_millis(500))
            .await
            .unwrap();
        std::fs::remove_dir_all(camera.output_dir()).unwrap();
    }

    #[tokio::test]
    async fn test_record_until_stopped() {
        let camera = Arc::new(camera());
        let recorder = camera.clone();
        let handle =
            tokio::spawn(async move { recorder.record(RecordOptions::default()).await });

        while !camera.is_recording() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(FRAME_INTERVAL * 2).await;
        camera.stop_recording().unwrap();

        let media = handle.await.unwrap().unwrap();
        assert!(media.uri.ends_with(".mjpeg"));
        let size = std::fs::metadata(path_of(&media.uri)).unwrap().len();
        assert!(size > 0);
        assert!(!camera.is_recording());
        std::fs::remove_dir_all(camera.output_dir()).unwrap();
    }

    #[tokio::test]
    async fn test_record_honors_max_duration() {
        let camera = camera();
        let options = RecordOptions {
            max_duration: Some(Duration::from_millis(250)),
            mute: true,
        };
        let media = tokio::time::timeout(Duration::from_secs(2), camera.record(options))
            .await
            .unwrap()
            .unwrap();
        assert!(path_of(&media.uri).exists());
        std::fs::remove_dir_all(camera.output_dir()).unwrap();
    }

    #[tokio::test]
    async fn test_preview_scans_shown_barcode() {
        let camera = camera();
        camera.open_preview().await.unwrap();
        let mut payloads = camera.barcodes().subscribe();

        camera.show(Some(barcode::qr_frame("SHELF-A7", 6)));
        camera.set_barcode_scanning(true).unwrap();

        let payload = tokio::time::timeout(Duration::from_secs(2), payloads.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload, "SHELF-A7");

        camera.release();
        std::fs::remove_dir_all(camera.output_dir()).unwrap();
    }

    #[tokio::test]
    async fn test_preview_is_not_scanned_while_disabled() {
        let camera = camera();
        camera.open_preview().await.unwrap();
        let mut payloads = camera.barcodes().subscribe();
        camera.show(Some(barcode::qr_frame("SHELF-A7", 6)));

        let received = tokio::time::timeout(SCAN_INTERVAL * 3, payloads.recv()).await;
        assert!(received.is_err());

        camera.release();
        std::fs::remove_dir_all(camera.output_dir()).unwrap();
    }

    #[tokio::test]
    async fn test_picture_of_shown_scene_decodes() {
        let camera = camera();
        camera.show(Some(barcode::qr_frame("SHELF-B2", 8)));

        let media = camera.take_picture(PictureOptions::default()).await.unwrap();
        let payloads = barcode::decode_file(path_of(&media.uri).to_string_lossy().into_owned())
            .await
            .unwrap();
        assert_eq!(payloads, vec!["SHELF-B2".to_string()]);
        std::fs::remove_dir_all(camera.output_dir()).unwrap();
    }

    #[test]
    fn test_stop_without_recording() {
        let camera = camera();
        assert_eq!(camera.stop_recording(), Err(AdapterError::NotRecording));
        std::fs::remove_dir_all(camera.output_dir()).unwrap();
    }
}
