//! Capture/record mode controller.
//!
//! States: `Idle(Picture)`, `Idle(Video)` (armed, waiting for the preview),
//! `Recording` and `FlipPending`. Flipping the camera while recording stops
//! the current segment and starts a new one on the other camera once the
//! pending `record` call has resolved.
//!
//! Every adapter failure ends in `Idle(Picture)`. The only exception is a
//! camera that never becomes ready before a recording starts, which leaves
//! the state untouched.

use crate::adapter::{
    CameraAdapter, CaptureMode, Facing, PermissionStatus, PictureOptions, RecordOptions,
};
use crate::barcode;
use crate::error::{AdapterError, CaptureError};
use chrono::{DateTime, TimeZone, Utc};
use media_gallery::{MediaGalleryService, MediaItem, MediaType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle(CaptureMode),
    Recording,
    /// Camera flip requested mid-recording, the next segment is pending
    FlipPending,
}

/// Observable state of the capture screen
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSession {
    pub facing: Facing,
    pub zoom: f32,
    pub state: CaptureState,
    pub is_camera_ready: bool,
    pub resume_after_flip: bool,
    pub barcode_mode: bool,
    pub last_barcode: Option<String>,
    /// User-facing message of the last failure
    pub last_error: Option<String>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            zoom: 0.0,
            state: CaptureState::Idle(CaptureMode::Picture),
            is_camera_ready: false,
            resume_after_flip: false,
            barcode_mode: false,
            last_barcode: None,
            last_error: None,
        }
    }
}

impl CaptureSession {
    pub fn mode(&self) -> CaptureMode {
        match self.state {
            CaptureState::Idle(mode) => mode,
            CaptureState::Recording | CaptureState::FlipPending => CaptureMode::Video,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(
            self.state,
            CaptureState::Recording | CaptureState::FlipPending
        )
    }
}

/// Result of the shutter button
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Photo(MediaItem),
    /// Barcode mode: decoded payload, `None` if the frame held no code
    Barcode(Option<String>),
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long to wait for the preview to report ready
    pub ready_timeout: Duration,
    /// How long unmount waits for a recording to finish saving
    pub shutdown_grace: Duration,
    pub picture: PictureOptions,
    pub record: RecordOptions,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // 300ms + 600ms
            ready_timeout: Duration::from_millis(900),
            shutdown_grace: Duration::from_secs(3),
            picture: PictureOptions::default(),
            record: RecordOptions::default(),
        }
    }
}

/// The only component allowed to command the camera
pub struct CaptureController<A: CameraAdapter> {
    adapter: A,
    gallery: Arc<MediaGalleryService>,
    config: ControllerConfig,
    session: watch::Sender<CaptureSession>,
    /// Serializes still captures, held for a whole recording as well
    capture_lock: Mutex<()>,
    /// Held from recording start until the last segment is saved
    recording_lock: Mutex<()>,
    /// Per recording, cleared when the next recording starts
    stop_requested: AtomicBool,
    /// Set by `shutdown`, never cleared
    closed: AtomicBool,
    last_stamp: StdMutex<i64>,
}

impl<A: CameraAdapter> CaptureController<A> {
    pub fn new(adapter: A, gallery: Arc<MediaGalleryService>, config: ControllerConfig) -> Self {
        let (session, _) = watch::channel(CaptureSession::default());
        Self {
            adapter,
            gallery,
            config,
            session,
            capture_lock: Mutex::new(()),
            recording_lock: Mutex::new(()),
            stop_requested: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            last_stamp: StdMutex::new(0),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn session(&self) -> CaptureSession {
        self.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureSession> {
        self.session.subscribe()
    }

    /// Check permission and bring up the preview
    pub async fn start(&self) -> Result<PermissionStatus, CaptureError> {
        let status = self
            .adapter
            .camera_permission()
            .await
            .map_err(|e| self.fail(e.into()))?;
        if !status.granted {
            log::info!("Camera permission not granted");
            return Ok(status);
        }

        self.mark_not_ready();
        self.adapter
            .open_preview()
            .await
            .map_err(|e| self.fail(e.into()))?;
        Ok(status)
    }

    /// Ask for camera and microphone access, then start the preview
    pub async fn request_permissions(&self) -> Result<PermissionStatus, CaptureError> {
        let camera = self
            .adapter
            .request_camera_permission()
            .await
            .map_err(|e| self.fail(e.into()))?;

        match self.adapter.request_microphone_permission().await {
            Ok(mic) if !mic.granted => {
                log::warn!("Microphone permission denied, recordings will be silent")
            }
            Err(e) => log::warn!("Microphone permission request failed: {}", e),
            Ok(_) => {}
        }

        if camera.granted {
            self.start().await
        } else {
            Ok(camera)
        }
    }

    /// Mirror the adapter's readiness into the session. Runs until the
    /// calling task is dropped.
    pub async fn follow_readiness(&self) {
        let mut ready = self.adapter.readiness().subscribe();
        loop {
            let is_ready = *ready.borrow_and_update();
            self.session.send_if_modified(|s| {
                let changed = s.is_camera_ready != is_ready;
                s.is_camera_ready = is_ready;
                changed
            });
            if ready.changed().await.is_err() {
                break;
            }
        }
    }

    /// Deliver payloads from the adapter's scanner to
    /// [`on_barcode_scanned`](Self::on_barcode_scanned). Subscribes before
    /// the returned future is first polled.
    pub fn follow_barcodes(&self) -> impl Future<Output = ()> + Send + '_ {
        let mut payloads = self.adapter.barcodes().subscribe();
        async move {
            loop {
                match payloads.recv().await {
                    Ok(payload) => self.on_barcode_scanned(payload),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::debug!("Skipped {} scanned barcodes", skipped)
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    pub fn clear_error(&self) {
        self.update(|s| s.last_error = None);
    }

    /// Shutter button: photo, or barcode decode while scanning
    pub async fn capture(&self) -> Result<CaptureOutcome, CaptureError> {
        let barcode_mode = self.session.borrow().barcode_mode;
        if barcode_mode {
            self.scan_barcode().await.map(CaptureOutcome::Barcode)
        } else {
            self.take_photo().await.map(CaptureOutcome::Photo)
        }
    }

    pub async fn take_photo(&self) -> Result<MediaItem, CaptureError> {
        self.ensure_picture_mode(false)?;
        let _capture = self.capture_lock.lock().await;
        // the state may have changed while queued
        self.ensure_picture_mode(false)?;

        let media = self
            .adapter
            .take_picture(self.config.picture)
            .await
            .map_err(|e| self.fail(e.into()))?;

        let item = MediaItem::captured(&media.uri, MediaType::Photo, self.next_stamp());
        self.persist(item).await
    }

    pub async fn scan_barcode(&self) -> Result<Option<String>, CaptureError> {
        self.ensure_picture_mode(true)?;
        let _capture = self.capture_lock.lock().await;

        let media = self
            .adapter
            .take_picture(self.config.picture)
            .await
            .map_err(|e| self.fail(e.into()))?;

        let path = MediaItem::photo(media.uri).file_path().to_string();
        let payloads = barcode::decode_file(path.clone())
            .await
            .map_err(|e| self.fail(CaptureError::Barcode(e.to_string())))?;

        if let Err(e) = std::fs::remove_file(&path) {
            log::debug!("Scan frame {} not removed: {}", path, e);
        }

        let first = payloads.into_iter().next();
        match &first {
            Some(payload) => self.on_barcode_scanned(payload.clone()),
            None => log::info!("No barcode found in frame"),
        }
        Ok(first)
    }

    /// Barcode callback, ignored unless scanning
    pub fn on_barcode_scanned(&self, payload: String) {
        self.session.send_if_modified(|s| {
            if !s.barcode_mode || s.last_barcode.as_deref() == Some(payload.as_str()) {
                return false;
            }
            log::info!("Barcode detected: {}", payload);
            s.last_barcode = Some(payload);
            true
        });
    }

    pub fn dismiss_barcode(&self) {
        self.update(|s| s.last_barcode = None);
    }

    /// Returns whether barcode mode is now enabled
    pub fn toggle_barcode_mode(&self) -> Result<bool, CaptureError> {
        if self.recording_lock.try_lock().is_err() {
            return Err(CaptureError::IllegalState("cannot scan while recording"));
        }

        let mut enabled = None;
        self.session.send_if_modified(|s| {
            if s.state != CaptureState::Idle(CaptureMode::Picture) {
                return false;
            }
            s.barcode_mode = !s.barcode_mode;
            if !s.barcode_mode {
                s.last_barcode = None;
            }
            enabled = Some(s.barcode_mode);
            true
        });
        let enabled = enabled.ok_or(CaptureError::IllegalState("cannot scan while recording"))?;

        if let Err(e) = self.adapter.set_barcode_scanning(enabled) {
            log::warn!("Continuous scanning unavailable, use the shutter: {}", e);
        }
        Ok(enabled)
    }

    /// Apply zoom, clamped to `[0, 1]`
    pub fn set_zoom(&self, zoom: f32) -> f32 {
        let zoom = if zoom.is_nan() { 0.0 } else { zoom.clamp(0.0, 1.0) };
        self.update(|s| s.zoom = zoom);
        if let Err(e) = self.adapter.set_zoom(zoom) {
            log::warn!("Zoom not applied: {}", e);
        }
        zoom
    }

    /// Swap cameras. While recording this ends the current segment and the
    /// recording resumes on the other camera.
    pub async fn toggle_camera_facing(&self) -> Result<Facing, CaptureError> {
        let mut flipped_mid_recording = None;
        self.session.send_if_modified(|s| {
            if s.state != CaptureState::Recording {
                return false;
            }
            s.facing = s.facing.toggled();
            s.resume_after_flip = true;
            s.state = CaptureState::FlipPending;
            flipped_mid_recording = Some(s.facing);
            true
        });

        if let Some(next) = flipped_mid_recording {
            log::info!("Flipping to {} camera, restarting recording", next.as_str());
            if let Err(e) = self.adapter.stop_recording() {
                // the segment keeps running on the old camera
                self.update(|s| {
                    s.facing = next.toggled();
                    s.resume_after_flip = false;
                    s.state = CaptureState::Recording;
                });
                return Err(self.fail(e.into()));
            }
            return Ok(next);
        }

        let (state, previous) = {
            let s = self.session.borrow();
            (s.state, s.facing)
        };
        if state == CaptureState::FlipPending {
            return Err(CaptureError::Busy);
        }

        let next = previous.toggled();
        self.update(|s| s.facing = next);
        self.mark_not_ready();
        if let Err(e) = self.adapter.set_facing(next).await {
            self.update(|s| s.facing = previous);
            return Err(self.fail(e.into()));
        }
        log::debug!("Camera facing {}", next.as_str());
        Ok(next)
    }

    /// Record until stopped. Resolves once the last segment is saved.
    pub async fn start_recording(&self) -> Result<(), CaptureError> {
        self.ensure_open()?;
        {
            let s = self.session.borrow();
            if !matches!(s.state, CaptureState::Idle(_)) {
                return Err(CaptureError::IllegalState("already recording"));
            }
            if s.barcode_mode {
                return Err(CaptureError::IllegalState("recording is disabled while scanning"));
            }
        }
        let _recording = self.recording_lock.try_lock().map_err(|_| CaptureError::Busy)?;
        let _capture = self.capture_lock.lock().await;
        // shutdown may have run while queued behind a photo
        self.ensure_open()?;
        self.stop_requested.store(false, Ordering::SeqCst);

        if let Err(e) = self.wait_ready().await {
            log::warn!("Camera not ready, recording not started");
            self.report(&e);
            return Err(e);
        }

        let result = self.record_segments().await;
        self.finish_recording().await;
        result.map_err(|e| self.fail(e))
    }

    /// Stop button. The pending `record` call finalizes the transition.
    pub fn stop_recording(&self) -> Result<(), CaptureError> {
        let state = self.session.borrow().state;
        match state {
            CaptureState::Recording => {
                self.stop_requested.store(true, Ordering::SeqCst);
                self.adapter.stop_recording().map_err(|e| {
                    self.stop_requested.store(false, Ordering::SeqCst);
                    self.fail(e.into())
                })
            }
            CaptureState::FlipPending => {
                self.stop_requested.store(true, Ordering::SeqCst);
                self.update(|s| s.resume_after_flip = false);
                match self.adapter.stop_recording() {
                    Ok(()) | Err(AdapterError::NotRecording) => Ok(()),
                    Err(e) => Err(self.fail(e.into())),
                }
            }
            CaptureState::Idle(_) => Err(CaptureError::IllegalState("not recording")),
        }
    }

    /// Screen unmount: stop and keep a running recording, then release the
    /// camera.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.stop_requested.store(true, Ordering::SeqCst);
        self.update(|s| s.resume_after_flip = false);

        if self.session.borrow().is_recording() {
            log::info!("Capture screen closed while recording, saving partial segment");
            if let Err(e) = self.adapter.stop_recording() {
                log::warn!("Stop on shutdown failed: {}", e);
            }
        }

        let drained = tokio::time::timeout(self.config.shutdown_grace, async {
            let _recording = self.recording_lock.lock().await;
            let _capture = self.capture_lock.lock().await;
        })
        .await;
        if drained.is_err() {
            log::warn!("Capture still busy after grace period, releasing camera anyway");
        }

        self.adapter.release();
        self.adapter.readiness().reset();
        self.session.send_replace(CaptureSession::default());
    }

    async fn record_segments(&self) -> Result<(), CaptureError> {
        let mut flip_to: Option<Facing> = None;

        loop {
            self.mark_not_ready();
            match flip_to.take() {
                Some(facing) => self.adapter.set_facing(facing).await?,
                None => self.set_state(CaptureState::Idle(CaptureMode::Video)),
            }
            self.adapter.set_mode(CaptureMode::Video).await?;
            self.wait_ready().await?;

            if self.halted() {
                log::info!("Stop requested before the next segment started");
                return Ok(());
            }
            self.set_state(CaptureState::Recording);
            // a shutdown that saw the old state did not stop this segment
            if self.halted() {
                log::info!("Camera closed before the segment started");
                return Ok(());
            }

            let media = self.adapter.record(self.config.record).await?;

            if media.uri.is_empty() {
                log::warn!("Recording finished without a file");
            } else {
                let item = MediaItem::captured(&media.uri, MediaType::Video, self.next_stamp());
                // a failed save is reported, a pending flip still resumes
                let _ = self.persist(item).await;
            }

            let mut resume_facing = None;
            self.session.send_if_modified(|s| {
                if !s.resume_after_flip {
                    return false;
                }
                s.resume_after_flip = false;
                s.state = CaptureState::FlipPending;
                resume_facing = Some(s.facing);
                true
            });

            match resume_facing {
                Some(facing) if !self.halted() => {
                    log::info!("Resuming recording on {} camera", facing.as_str());
                    flip_to = Some(facing);
                }
                _ => return Ok(()),
            }
        }
    }

    async fn finish_recording(&self) {
        self.update(|s| {
            s.state = CaptureState::Idle(CaptureMode::Picture);
            s.resume_after_flip = false;
        });
        log::debug!("Capture state -> Idle(Picture)");

        self.mark_not_ready();
        if let Err(e) = self.adapter.set_mode(CaptureMode::Picture).await {
            log::warn!("Could not switch back to picture mode: {}", e);
        }
    }

    async fn wait_ready(&self) -> Result<(), CaptureError> {
        self.adapter
            .readiness()
            .wait(self.config.ready_timeout)
            .await?;
        self.update(|s| s.is_camera_ready = true);
        Ok(())
    }

    fn halted(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.stop_requested.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), CaptureError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CaptureError::Closed);
        }
        Ok(())
    }

    fn mark_not_ready(&self) {
        self.adapter.readiness().reset();
        self.update(|s| s.is_camera_ready = false);
    }

    fn ensure_picture_mode(&self, barcode: bool) -> Result<(), CaptureError> {
        self.ensure_open()?;
        let s = self.session.borrow();
        if s.state != CaptureState::Idle(CaptureMode::Picture) {
            return Err(CaptureError::IllegalState("camera is recording"));
        }
        if s.barcode_mode != barcode {
            return Err(CaptureError::IllegalState(if barcode {
                "barcode mode is off"
            } else {
                "photos are disabled while scanning"
            }));
        }
        Ok(())
    }

    async fn persist(&self, item: MediaItem) -> Result<MediaItem, CaptureError> {
        match self.gallery.add(item.clone()).await {
            Ok(_) => {
                log::info!("Saved {:?} {}", item.media_type, item.uri);
                Ok(item)
            }
            Err(e) => {
                log::error!("Failed to save capture: {}", e);
                Err(self.fail(e.into()))
            }
        }
    }

    /// Capture time, strictly increasing so stamped URIs never collide
    fn next_stamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let mut last = self
            .last_stamp
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let millis = now.timestamp_millis().max(*last + 1);
        *last = millis;
        Utc.timestamp_millis_opt(millis).single().unwrap_or(now)
    }

    fn set_state(&self, state: CaptureState) {
        log::debug!("Capture state -> {:?}", state);
        self.update(|s| s.state = state);
    }

    fn update(&self, f: impl FnOnce(&mut CaptureSession)) {
        self.session.send_modify(f);
    }

    fn report(&self, err: &CaptureError) {
        log::warn!("Capture error: {}", err);
        let message = err.user_message();
        self.update(|s| s.last_error = Some(message));
    }

    fn fail(&self, err: CaptureError) -> CaptureError {
        self.report(&err);
        err
    }
}
