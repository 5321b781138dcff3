//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The cookie module handles the lower level authentication and cookie logic.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
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
    AppState, Error, Username,
    auth::{invalidate_auth_cookie, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, base, field_error, link, log_in_register, password_input,
        submit_button, text_input,
    },
    user::{User, get_user_by_username},
};

fn log_in_form(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            hx-swap="outerHTML"
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", username, true, None))
            (password_input("", 0, None))
            (field_error("form", error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            (submit_button("Log in", BUTTON_PRIMARY_STYLE))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                (link(endpoints::REGISTER, "Register here"))
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Or "
                (link(endpoints::ROOT, "keep going as a guest"))
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    let log_in_form = log_in_form("", None);
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &content).into_response()
}

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password.";

/// The raw data entered by the user in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password hash in the database.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LogInForm {
    /// The username entered during log-in.
    #[serde(default)]
    pub username: String,

    /// Password entered during log-in.
    #[serde(default)]
    pub password: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is
/// redirected to the expense list. The guest session is left untouched.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(form): Form<LogInForm>,
) -> Response {
    let user = match check_credentials(&form, &state.db_connection) {
        Ok(user) => user,
        Err(Error::InvalidCredentials) => {
            return log_in_form(&form.username, Some(INVALID_CREDENTIALS_ERROR_MSG))
                .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(
                &form.username,
                Some("An internal error occurred. Please try again later."),
            )
            .into_response();
        }
    };

    let cookie_duration = if form.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    set_auth_cookie(jar.clone(), user.id, cookie_duration)
        .map(|updated_jar| {
            tracing::info!("User {} logged in.", user.id);
            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::ROOT.to_owned()),
                updated_jar,
            )
        })
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
        })
        .into_response()
}

/// Find the user named in `form` and check their password.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the username is not registered or
/// the password does not match. Other errors are internal.
fn check_credentials(form: &LogInForm, db_connection: &Mutex<Connection>) -> Result<User, Error> {
    let username: Username = form
        .username
        .parse()
        .map_err(|_| Error::InvalidCredentials)?;

    let user = {
        let connection = db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_username(username.as_str(), &connection) {
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            result => result?,
        }
    };

    match user.password_hash.verify(&form.password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(Error::InvalidCredentials),
        Err(error) => Err(Error::HashingError(error.to_string())),
    }
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
    use rusqlite::Connection;

    use crate::{
        PasswordHash, Username, ValidatedPassword,
        app_state::create_cookie_key,
        auth::{COOKIE_EXPIRY, COOKIE_USER_ID, DEFAULT_COOKIE_DURATION},
        db::initialize,
        endpoints,
        test_utils::{
            assert_field_error, assert_form_input, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document, parse_html_fragment,
        },
        user::create_user,
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInForm, LogInState, get_log_in_page, post_log_in,
    };

    const PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_state() -> LogInState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let password = ValidatedPassword::new(PASSWORD, &[]).unwrap();
        create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new(password, 4).unwrap(),
            &connection,
        )
        .unwrap();

        LogInState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn log_in_form(username: &str, password: &str) -> LogInForm {
        LogInForm {
            username: username.to_owned(),
            password: password.to_owned(),
            remember_me: None,
        }
    }

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::LOG_IN, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "remember_me", "checkbox");
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in(State(state), jar, Form(log_in_form("alice", PASSWORD))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ROOT);
        let cookie_names: Vec<String> = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|value| {
                Cookie::parse(value.to_str().unwrap().to_owned())
                    .unwrap()
                    .name()
                    .to_owned()
            })
            .collect();
        assert!(cookie_names.contains(&COOKIE_USER_ID.to_owned()));
        assert!(cookie_names.contains(&COOKIE_EXPIRY.to_owned()));
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let state = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in(
            State(state),
            jar,
            Form(log_in_form("alice", "wrongpassword")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_field_error(&form, "form", INVALID_CREDENTIALS_ERROR_MSG);
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let state = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in(State(state), jar, Form(log_in_form("bob", PASSWORD))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_field_error(&form, "form", INVALID_CREDENTIALS_ERROR_MSG);
    }

    #[tokio::test]
    async fn log_in_fails_with_malformed_username() {
        let state = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response =
            post_log_in(State(state), jar, Form(log_in_form("not a user!", PASSWORD))).await;

        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_field_error(&form, "form", INVALID_CREDENTIALS_ERROR_MSG);
    }
}
