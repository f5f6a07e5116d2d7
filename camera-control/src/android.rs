// Android camera adapter
//
// Drives the CameraX preview hosted by MainActivity through JNI. Long-running
// operations are started on the activity and their results polled through the
// static `getLast*` accessors. Barcodes found by the activity's scanner are
// drained from `getLastBarcode` while scanning is enabled.

use crate::adapter::{
    CameraAdapter, CaptureMode, CapturedMedia, Facing, PermissionStatus, PictureOptions,
    RecordOptions,
};
use crate::barcode::{BarcodeFeed, BarcodeFormat};
use crate::error::AdapterError;
use crate::readiness::ReadySignal;
use jni::objects::{JClass, JObject, JString, JValue};
use jni::JNIEnv;
use ndk_context::android_context;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MAIN_ACTIVITY_CLASS: &str = "dev/dioxus/main/MainActivity";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct AndroidCameraConfig {
    /// Fully qualified class name in slash format
    pub main_activity_class: String,
    /// Upper bound for a still capture or a permission dialog
    pub capture_timeout: Duration,
    /// Upper bound for the preview to come up after a re-init
    pub preview_timeout: Duration,
}

impl Default for AndroidCameraConfig {
    fn default() -> Self {
        Self {
            main_activity_class: DEFAULT_MAIN_ACTIVITY_CLASS.to_string(),
            capture_timeout: Duration::from_secs(30),
            preview_timeout: Duration::from_secs(10),
        }
    }
}

fn jni_err(context: &str) -> impl Fn(jni::errors::Error) -> AdapterError + '_ {
    move |e| AdapterError::DeviceError(format!("{} failed: {}", context, e))
}

fn get_app_class_loader<'a>(env: &mut JNIEnv<'a>) -> Result<JObject<'a>, AdapterError> {
    let at_cls = env
        .find_class("android/app/ActivityThread")
        .map_err(jni_err("ActivityThread lookup"))?;
    let at = env
        .call_static_method(
            &at_cls,
            "currentActivityThread",
            "()Landroid/app/ActivityThread;",
            &[],
        )
        .and_then(|v| v.l())
        .map_err(jni_err("currentActivityThread"))?;
    let app = env
        .call_method(&at, "getApplication", "()Landroid/app/Application;", &[])
        .and_then(|v| v.l())
        .map_err(jni_err("getApplication"))?;
    if app.is_null() {
        return Err(AdapterError::DeviceError(
            "Application not initialized".to_string(),
        ));
    }
    env.call_method(&app, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
        .and_then(|v| v.l())
        .map_err(jni_err("getClassLoader"))
}

fn load_activity<'a>(
    env: &mut JNIEnv<'a>,
    config: &AndroidCameraConfig,
) -> Result<(JObject<'a>, JClass<'a>), AdapterError> {
    let loader = get_app_class_loader(env)?;
    let name: JString = env
        .new_string(config.main_activity_class.replace('/', "."))
        .map_err(jni_err("new_string"))?;
    let cls = env
        .call_method(
            &loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&JObject::from(name))],
        )
        .and_then(|v| v.l())
        .map_err(jni_err("loadClass"))?;
    let cls = JClass::from(cls);

    let signature = format!("()L{};", config.main_activity_class);
    let instance = match env.call_static_method(&cls, "getInstance", &signature, &[]) {
        Ok(val) => val.l().map_err(jni_err("getInstance"))?,
        Err(_) => {
            if env.exception_check().unwrap_or(false) {
                let _ = env.exception_clear();
            }
            env.get_static_field(&cls, "instance", &signature)
                .and_then(|v| v.l())
                .map_err(jni_err("instance field"))?
        }
    };
    if instance.is_null() {
        return Err(AdapterError::DeviceError(
            "MainActivity instance is null - Activity not initialized?".to_string(),
        ));
    }
    Ok((instance, cls))
}

/// Run `f` against the attached MainActivity
fn with_activity<T>(
    config: &AndroidCameraConfig,
    f: impl FnOnce(&mut JNIEnv, &JObject, &JClass) -> Result<T, AdapterError>,
) -> Result<T, AdapterError> {
    let vm_ptr = android_context().vm() as *mut *const jni::sys::JNIInvokeInterface_;
    let vm = unsafe { jni::JavaVM::from_raw(vm_ptr) }.map_err(jni_err("JavaVM"))?;
    let mut guard = vm.attach_current_thread().map_err(jni_err("JNI attach"))?;
    let env: &mut JNIEnv = &mut guard;
    let (activity, cls) = load_activity(env, config)?;
    f(env, &activity, &cls)
}

fn static_string(
    env: &mut JNIEnv,
    cls: &JClass,
    method: &str,
) -> Result<Option<String>, AdapterError> {
    let obj = env
        .call_static_method(cls, method, "()Ljava/lang/String;", &[])
        .and_then(|v| v.l())
        .map_err(jni_err(method))?;
    if obj.is_null() {
        return Ok(None);
    }
    let value: String = env
        .get_string((&obj).into())
        .map_err(jni_err("String conversion"))?
        .into();
    Ok(Some(value))
}

fn static_bool(env: &mut JNIEnv, cls: &JClass, method: &str) -> Result<bool, AdapterError> {
    env.call_static_method(cls, method, "()Z", &[])
        .and_then(|v| v.z())
        .map_err(jni_err(method))
}

pub struct AndroidCamera {
    config: AndroidCameraConfig,
    readiness: ReadySignal,
    generation: Arc<AtomicU64>,
    recording: AtomicBool,
    barcodes: BarcodeFeed,
    scanner_running: Arc<AtomicBool>,
}

impl AndroidCamera {
    pub fn new(config: AndroidCameraConfig) -> Self {
        Self {
            config,
            readiness: ReadySignal::new(),
            generation: Arc::new(AtomicU64::new(0)),
            recording: AtomicBool::new(false),
            barcodes: BarcodeFeed::new(),
            scanner_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Drain `getLastBarcode` into the feed until released
    fn start_scanner(&self) {
        if self.scanner_running.swap(true, Ordering::SeqCst) {
            return;
        }
        let running = self.scanner_running.clone();
        let feed = self.barcodes.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(POLL_INTERVAL).await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if !feed.is_enabled() {
                    continue;
                }
                match with_activity(&config, |env, _, cls| static_string(env, cls, "getLastBarcode")) {
                    Ok(Some(payload)) => {
                        feed.publish(payload);
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("Barcode poll failed: {}", e),
                }
            }
        });
    }

    /// Poll `isCameraReady` after a preview re-init and fire readiness
    fn watch_preview(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.generation.clone();
        let readiness = self.readiness.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let attempts = config.preview_timeout.as_millis() / POLL_INTERVAL.as_millis();
            for _ in 0..attempts {
                tokio::time::sleep(POLL_INTERVAL).await;
                if current.load(Ordering::SeqCst) != generation {
                    return;
                }
                match with_activity(&config, |env, _, cls| static_bool(env, cls, "isCameraReady")) {
                    Ok(true) => {
                        readiness.notify_ready();
                        return;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        log::warn!("Preview readiness check failed: {}", e);
                        return;
                    }
                }
            }
            log::warn!("Preview did not come up within {:?}", config.preview_timeout);
        });
    }

    fn permission(&self, query: &str) -> Result<PermissionStatus, AdapterError> {
        let granted = with_activity(&self.config, |env, _, cls| static_bool(env, cls, query))?;
        Ok(if granted {
            PermissionStatus::granted()
        } else {
            PermissionStatus::denied()
        })
    }

    /// Show the system dialog and wait for the answer
    async fn request_permission(
        &self,
        request: &str,
        query: &str,
    ) -> Result<PermissionStatus, AdapterError> {
        with_activity(&self.config, |env, activity, _| {
            env.call_method(activity, request, "()V", &[])
                .map_err(jni_err(request))?;
            Ok(())
        })?;

        let attempts = self.config.capture_timeout.as_millis() / POLL_INTERVAL.as_millis();
        for _ in 0..attempts {
            tokio::time::sleep(POLL_INTERVAL).await;
            let status = self.permission(query)?;
            if status.granted {
                return Ok(status);
            }
        }
        Ok(PermissionStatus {
            granted: false,
            can_ask_again: false,
        })
    }

    /// Poll a `getLast*` accessor until it yields a path or an error
    async fn await_result(
        &self,
        accessor: &str,
        timeout: Option<Duration>,
    ) -> Result<String, AdapterError> {
        let started = tokio::time::Instant::now();
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let (path, error) = with_activity(&self.config, |env, _, cls| {
                Ok((
                    static_string(env, cls, accessor)?,
                    static_string(env, cls, "getLastError")?,
                ))
            })?;
            if let Some(path) = path {
                return Ok(path);
            }
            if let Some(error) = error {
                return Err(AdapterError::DeviceError(error));
            }
            if timeout.is_some_and(|t| started.elapsed() >= t) {
                return Err(AdapterError::Timeout(format!("{} timed out", accessor)));
            }
        }
    }

    fn clear_last_error(env: &mut JNIEnv, cls: &JClass) -> Result<(), AdapterError> {
        env.call_static_method(cls, "clearLastError", "()V", &[])
            .map_err(jni_err("clearLastError"))?;
        Ok(())
    }
}

fn to_file_uri(path: String) -> String {
    if path.contains("://") {
        path
    } else {
        format!("file://{}", path)
    }
}

impl CameraAdapter for AndroidCamera {
    fn readiness(&self) -> &ReadySignal {
        &self.readiness
    }

    async fn camera_permission(&self) -> Result<PermissionStatus, AdapterError> {
        self.permission("hasCameraPermission")
    }

    async fn request_camera_permission(&self) -> Result<PermissionStatus, AdapterError> {
        self.request_permission("requestCameraPermission", "hasCameraPermission")
            .await
    }

    async fn microphone_permission(&self) -> Result<PermissionStatus, AdapterError> {
        self.permission("hasMicrophonePermission")
    }

    async fn request_microphone_permission(&self) -> Result<PermissionStatus, AdapterError> {
        self.request_permission("requestMicrophonePermission", "hasMicrophonePermission")
            .await
    }

    fn barcodes(&self) -> &BarcodeFeed {
        &self.barcodes
    }

    fn set_barcode_scanning(&self, enabled: bool) -> Result<(), AdapterError> {
        with_activity(&self.config, |env, activity, _| {
            let formats = env
                .new_string(BarcodeFormat::joined(&BarcodeFormat::ALL))
                .map_err(jni_err("new_string"))?;
            env.call_method(
                activity,
                "setBarcodeScanning",
                "(ZLjava/lang/String;)V",
                &[
                    JValue::Bool(enabled.into()),
                    JValue::Object(&JObject::from(formats)),
                ],
            )
            .map_err(jni_err("setBarcodeScanning"))?;
            Ok(())
        })?;
        self.barcodes.set_enabled(enabled);
        Ok(())
    }

    async fn open_preview(&self) -> Result<(), AdapterError> {
        with_activity(&self.config, |env, activity, _| {
            env.call_method(activity, "openCameraPreview", "()V", &[])
                .map_err(jni_err("openCameraPreview"))?;
            Ok(())
        })?;
        self.watch_preview();
        self.start_scanner();
        Ok(())
    }

    async fn set_facing(&self, facing: Facing) -> Result<(), AdapterError> {
        with_activity(&self.config, |env, activity, _| {
            let value = env
                .new_string(facing.as_str())
                .map_err(jni_err("new_string"))?;
            env.call_method(
                activity,
                "setCameraFacing",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&JObject::from(value))],
            )
            .map_err(jni_err("setCameraFacing"))?;
            Ok(())
        })?;
        self.watch_preview();
        Ok(())
    }

    async fn set_mode(&self, mode: CaptureMode) -> Result<(), AdapterError> {
        with_activity(&self.config, |env, activity, _| {
            let value = env.new_string(mode.as_str()).map_err(jni_err("new_string"))?;
            env.call_method(
                activity,
                "setCaptureMode",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&JObject::from(value))],
            )
            .map_err(jni_err("setCaptureMode"))?;
            Ok(())
        })?;
        self.watch_preview();
        Ok(())
    }

    fn set_zoom(&self, zoom: f32) -> Result<(), AdapterError> {
        with_activity(&self.config, |env, activity, _| {
            env.call_method(activity, "setCameraZoom", "(F)V", &[JValue::Float(zoom)])
                .map_err(jni_err("setCameraZoom"))?;
            Ok(())
        })
    }

    async fn take_picture(&self, options: PictureOptions) -> Result<CapturedMedia, AdapterError> {
        with_activity(&self.config, |env, activity, cls| {
            Self::clear_last_error(env, cls)?;
            env.call_method(
                activity,
                "takePicture",
                "(FZ)V",
                &[JValue::Float(options.quality), JValue::Bool(options.exif.into())],
            )
            .map_err(jni_err("takePicture"))?;
            Ok(())
        })?;

        let path = self
            .await_result("getLastCapturePath", Some(self.config.capture_timeout))
            .await?;
        Ok(CapturedMedia {
            uri: to_file_uri(path),
        })
    }

    async fn record(&self, options: RecordOptions) -> Result<CapturedMedia, AdapterError> {
        if self.recording.swap(true, Ordering::SeqCst) {
            return Err(AdapterError::DeviceError("already recording".into()));
        }

        let max_ms = options
            .max_duration
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let started = with_activity(&self.config, |env, activity, cls| {
            Self::clear_last_error(env, cls)?;
            env.call_method(
                activity,
                "startRecording",
                "(ZJ)V",
                &[JValue::Bool(options.mute.into()), JValue::Long(max_ms)],
            )
            .map_err(jni_err("startRecording"))?;
            Ok(())
        });
        if let Err(e) = started {
            self.recording.store(false, Ordering::SeqCst);
            return Err(e);
        }

        // resolves once stopRecording has finalized the file
        let result = self.await_result("getLastRecordingPath", None).await;
        self.recording.store(false, Ordering::SeqCst);
        result.map(|path| CapturedMedia {
            uri: to_file_uri(path),
        })
    }

    fn stop_recording(&self) -> Result<(), AdapterError> {
        if !self.recording.load(Ordering::SeqCst) {
            return Err(AdapterError::NotRecording);
        }
        with_activity(&self.config, |env, activity, _| {
            env.call_method(activity, "stopRecording", "()V", &[])
                .map_err(jni_err("stopRecording"))?;
            Ok(())
        })
    }

    fn release(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.readiness.reset();
        self.scanner_running.store(false, Ordering::SeqCst);
        self.barcodes.set_enabled(false);
        let released = with_activity(&self.config, |env, activity, _| {
            env.call_method(activity, "releaseCamera", "()V", &[])
                .map_err(jni_err("releaseCamera"))?;
            Ok(())
        });
        if let Err(e) = released {
            log::warn!("Camera release failed: {}", e);
        }
    }
}
