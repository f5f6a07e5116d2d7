pub mod auth_service;
pub mod camera_service;
pub mod media_service;

use crate::config::AppConfig;
use crate::error::AppError;
use media_gallery::{KeyValueStore, MediaGalleryService};
use std::sync::{Arc, OnceLock};

pub use auth_service::AppSession;
pub use camera_service::AppCaptureController;

/// Services shared by all screens
pub struct AppServices {
    pub config: AppConfig,
    pub gallery: Arc<MediaGalleryService>,
    pub session: Arc<AppSession>,
}

// Global app services, built once at startup
static SERVICES: OnceLock<AppServices> = OnceLock::new();

/// Open the database and build the gallery and session services
pub fn init_services(config: AppConfig) -> Result<&'static AppServices, AppError> {
    if let Some(services) = SERVICES.get() {
        return Ok(services);
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(crate::database::init_database()?);
    let gallery = media_service::create_media_service(store.clone(), &config.storage);
    let session = auth_service::create_session(&config, store)?;

    Ok(SERVICES.get_or_init(|| AppServices {
        config,
        gallery,
        session,
    }))
}

pub fn services() -> Result<&'static AppServices, AppError> {
    SERVICES.get().ok_or(AppError::NotInitialized("App services"))
}
