//! The registration page for creating an account.
//!
//! A guest who registers is signed in straight away. Any expenses they added
//! as a guest are thrown away, not moved to the new account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, Username, ValidatedPassword,
    auth::set_auth_cookie,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, field_error, link,
        log_in_register, password_input, submit_button, text_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    session::Session,
    user::create_user,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 8;

const PASSWORDS_DO_NOT_MATCH_MSG: &str = "Passwords do not match.";

pub fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm_password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm_password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            (field_error("confirm_password", error_message))
        }
    }
}

/// The error message for each field of the registration form that failed validation.
#[derive(Debug, Default, PartialEq)]
struct RegistrationErrors {
    username: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
}

impl RegistrationErrors {
    fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.confirm_password.is_none()
    }
}

fn registration_form(username: &str, errors: &RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #confirm_password, #submit-button"
            hx-swap="outerHTML"
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", username, true, errors.username.as_deref()))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password.as_deref()))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password.as_deref()))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Expenses you added as a guest will not be copied to your new account."
            }

            (submit_button("Create Account", BUTTON_PRIMARY_STYLE))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", &RegistrationErrors::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Handler for registration requests via the POST method.
///
/// On success, the new user is logged in, the guest data in the session is
/// discarded and the client is redirected to their (empty) expense list.
/// Otherwise, the form is returned with a message under each bad field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Extension(session): Extension<Session>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let mut errors = RegistrationErrors::default();

    let username = match form.username.parse::<Username>() {
        Ok(username) => Some(username),
        Err(error) => {
            errors.username = Some(error.to_string());
            None
        }
    };

    let user_inputs = [form.username.trim()];
    let password = match ValidatedPassword::new(&form.password, &user_inputs) {
        Ok(password) => Some(password),
        Err(error) => {
            errors.password = Some(error.to_string());
            None
        }
    };

    if form.password != form.confirm_password {
        errors.confirm_password = Some(PASSWORDS_DO_NOT_MATCH_MSG.to_owned());
    }

    let (Some(username), Some(password), true) = (username, password, errors.is_empty()) else {
        return registration_form(&form.username, &errors).into_response();
    };

    let password_hash = match PasswordHash::new(password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let user = match state.db_connection.lock() {
        Ok(connection) => create_user(username, password_hash, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::DuplicateUsername) => {
            errors.username = Some(Error::DuplicateUsername.to_string());
            return registration_form(&form.username, &errors).into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");

            return get_internal_server_error_redirect();
        }
    };

    match session.lock() {
        Ok(mut session_data) => {
            if !session_data.is_empty() {
                tracing::info!(
                    "Discarding {} guest expense(s) after registration of user {}.",
                    session_data.guest_expenses.len(),
                    user.id
                );
            }
            session_data.clear_guest_data();
        }
        Err(error) => {
            tracing::error!("Could not clear guest data: {error}");

            return get_internal_server_error_redirect();
        }
    }

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => {
            tracing::info!("Registered user {} ({}).", user.id, user.username.as_str());
            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::ROOT.to_owned()),
                jar,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");

            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::{StatusCode, header::CONTENT_TYPE};

    use crate::{
        endpoints,
        register_user::get_register_page,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;
        assert_eq!(response.status(), StatusCode::OK);

        assert!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::REGISTER, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button(&form);

        let log_in_link_selector =
            scraper::Selector::parse(&format!("a[href='{}']", endpoints::LOG_IN)).unwrap();
        assert_eq!(form.select(&log_in_link_selector).count(), 1);
    }
}
