use crate::services::AppSession;
use crate::Screen;
use dioxus::prelude::*;
use firebase_auth::{AuthFormState, AuthLabels, Credentials, CredentialsForm};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum AuthAction {
    Login,
    SignUp,
}

/// Runs the request and moves to the camera on success
fn submit(
    session: Arc<AppSession>,
    action: AuthAction,
    credentials: Credentials,
    mut state: Signal<AuthFormState>,
    on_navigate: EventHandler<Screen>,
) {
    state.set(AuthFormState::Submitting);
    spawn(async move {
        let result = match action {
            AuthAction::Login => session.login(&credentials.email, &credentials.password).await,
            AuthAction::SignUp => {
                session
                    .sign_up(&credentials.email, &credentials.password)
                    .await
            }
        };

        match result {
            Ok(user) => {
                state.set(AuthFormState::Success(user));
                on_navigate.call(Screen::Capture);
            }
            Err(e) => {
                log::warn!("{:?} failed: {}", action, e);
                state.set(AuthFormState::Error(e.user_message()));
            }
        }
    });
}

#[component]
pub fn LoginScreen(on_navigate: EventHandler<Screen>) -> Element {
    let session = use_context::<Arc<AppSession>>();
    let state = use_signal(|| AuthFormState::Idle);

    rsx! {
        CredentialsForm {
            labels: AuthLabels::login(),
            state: state(),
            on_submit: move |credentials| {
                submit(session.clone(), AuthAction::Login, credentials, state, on_navigate)
            },
            on_alternate: move |_| on_navigate.call(Screen::Signup),
        }
    }
}

#[component]
pub fn SignupScreen(on_navigate: EventHandler<Screen>) -> Element {
    let session = use_context::<Arc<AppSession>>();
    let state = use_signal(|| AuthFormState::Idle);

    rsx! {
        CredentialsForm {
            labels: AuthLabels::sign_up(),
            state: state(),
            on_submit: move |credentials| {
                submit(session.clone(), AuthAction::SignUp, credentials, state, on_navigate)
            },
            on_alternate: move |_| on_navigate.call(Screen::Login),
        }
    }
}
