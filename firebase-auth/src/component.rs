use crate::models::AuthFormState;
use dioxus::prelude::*;

/// Email + password pair submitted by the form
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Labels for the credentials form
#[derive(Clone, PartialEq)]
pub struct AuthLabels {
    pub title: String,
    pub submit_button: String,
    pub submitting: String,
    pub alternate_button: String,
    pub email_placeholder: String,
    pub password_placeholder: String,
}

impl AuthLabels {
    pub fn login() -> Self {
        Self {
            title: "Login".to_string(),
            submit_button: "Login".to_string(),
            submitting: "🔄 Logging in...".to_string(),
            alternate_button: "Go to Signup".to_string(),
            email_placeholder: "Email".to_string(),
            password_placeholder: "Password".to_string(),
        }
    }

    pub fn sign_up() -> Self {
        Self {
            title: "Sign Up".to_string(),
            submit_button: "Sign Up".to_string(),
            submitting: "🔄 Creating account...".to_string(),
            alternate_button: "Go to Login".to_string(),
            email_placeholder: "Email".to_string(),
            password_placeholder: "Password".to_string(),
        }
    }
}

/// Props for the CredentialsForm
#[derive(Props, Clone, PartialEq)]
pub struct CredentialsFormProps {
    pub labels: AuthLabels,
    /// Current submission state, owned by the screen
    pub state: AuthFormState,
    /// Called with the entered email and password
    pub on_submit: EventHandler<Credentials>,
    /// Called when the user wants the other form (login <-> signup)
    pub on_alternate: EventHandler<()>,
}

/// Email/password form shared by the login and signup screens
///
/// The form only collects input. The screen performs the request and feeds
/// the outcome back through `state`, errors are shown below the inputs.
#[component]
pub fn CredentialsForm(props: CredentialsFormProps) -> Element {
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);

    let busy = matches!(props.state, AuthFormState::Submitting);
    let on_submit = props.on_submit;
    let on_alternate = props.on_alternate;

    rsx! {
        div {
            style: "display: flex; flex-direction: column; justify-content: center; padding: 20px; min-height: 80vh;",
            h1 { style: "font-size: 24px; margin-bottom: 20px; text-align: center;", "{props.labels.title}" }
            input {
                placeholder: "{props.labels.email_placeholder}",
                r#type: "email",
                value: "{email}",
                disabled: busy,
                style: "border: 1px solid #ccc; padding: 10px; margin-bottom: 10px; border-radius: 5px;",
                oninput: move |evt| email.set(evt.value()),
            }
            input {
                placeholder: "{props.labels.password_placeholder}",
                r#type: "password",
                value: "{password}",
                disabled: busy,
                style: "border: 1px solid #ccc; padding: 10px; margin-bottom: 10px; border-radius: 5px;",
                oninput: move |evt| password.set(evt.value()),
            }
            button {
                class: "btn-primary",
                disabled: busy,
                onclick: move |_| {
                    on_submit.call(Credentials {
                        email: email(),
                        password: password(),
                    });
                },
                if busy { "{props.labels.submitting}" } else { "{props.labels.submit_button}" }
            }
            if let AuthFormState::Error(message) = &props.state {
                div {
                    style: "margin-top: 12px; padding: 12px; background: #f8d7da; border-radius: 4px; color: #721c24;",
                    "{message}"
                }
            }
            div { style: "margin-top: 15px;",
                button {
                    class: "btn-secondary",
                    style: "width: 100%;",
                    disabled: busy,
                    onclick: move |_| on_alternate.call(()),
                    "{props.labels.alternate_button}"
                }
            }
        }
    }
}
