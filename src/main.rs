use dioxus::prelude::*;

mod components;
mod config;
mod database;
mod error;
mod filesystem;
mod services;

use components::{CaptureScreen, GalleryScreen, LoginScreen, NavigationBar, SignupScreen};
use services::AppServices;

fn main() {
    init_logging();

    let config = config::AppConfig::load();
    if let Err(e) = services::init_services(config) {
        log::error!("Failed to initialize services: {}", e);
    }

    dioxus::launch(App);
}

fn init_logging() {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("shutterbox"),
    );

    #[cfg(not(target_os = "android"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            eprintln!("Logger already initialized: {}", e);
        }
    }
}

/// Screen navigation for the app
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Screen {
    Login,
    Signup,
    Capture,
    Gallery,
}

/// Global services handed to the app shell
#[derive(Clone, Copy)]
struct ServicesRef(&'static AppServices);

impl PartialEq for ServicesRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

#[component]
fn App() -> Element {
    let services = use_hook(|| services::services().map_err(|e| e.user_message()));

    match services {
        Ok(services) => rsx! {
            AppShell { services: ServicesRef(services) }
        },
        Err(message) => rsx! {
            div { style: "padding: 40px 20px; text-align: center; font-family: sans-serif; color: #721c24;",
                "{message}"
            }
        },
    }
}

#[component]
fn AppShell(services: ServicesRef) -> Element {
    let services = services.0;
    let session = use_context_provider(|| services.session.clone());
    use_context_provider(|| services.gallery.clone());
    use_context_provider(|| services.config.clone());

    let mut current_screen = use_signal(|| Screen::Login);
    let mut restoring = use_signal(|| true);

    // The single auth-state subscription: a signed-out session always lands on login
    let observed = session.clone();
    use_hook(move || {
        spawn(async move {
            let mut changes = observed.subscribe();

            if observed.restore().await.is_some() {
                current_screen.set(Screen::Capture);
            }
            restoring.set(false);

            while changes.changed().await.is_ok() {
                let signed_in = changes.borrow_and_update().is_some();
                if !signed_in {
                    log::info!("Signed out, returning to login");
                    current_screen.set(Screen::Login);
                }
            }
        });
    });

    if restoring() {
        return rsx! {
            div { style: "padding: 40px 20px; text-align: center; font-family: sans-serif; color: #666;",
                "Loading..."
            }
        };
    }

    let signed_in_screen = matches!(current_screen(), Screen::Capture | Screen::Gallery);

    rsx! {
        div { style: "display: flex; flex-direction: column; height: 100vh; font-family: sans-serif;",

            // Main Content
            div { style: "flex: 1; overflow-y: auto;",
                match current_screen() {
                    Screen::Login => rsx! {
                        LoginScreen { on_navigate: move |s| current_screen.set(s) }
                    },
                    Screen::Signup => rsx! {
                        SignupScreen { on_navigate: move |s| current_screen.set(s) }
                    },
                    Screen::Capture => rsx! {
                        CaptureScreen {}
                    },
                    Screen::Gallery => rsx! {
                        GalleryScreen {}
                    },
                }
            }

            // Bottom Navigation Bar
            if signed_in_screen {
                NavigationBar {
                    current_screen: current_screen(),
                    on_navigate: move |screen| current_screen.set(screen),
                    on_sign_out: move |_| session.sign_out(),
                }
            }
        }
    }
}
