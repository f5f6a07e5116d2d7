pub mod auth;
pub mod capture;
pub mod gallery;
pub mod navigation;

pub use auth::{LoginScreen, SignupScreen};
pub use capture::CaptureScreen;
pub use gallery::GalleryScreen;
pub use navigation::NavigationBar;
