//! Middleware that works out whether a request comes from a logged in user or a guest.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        Identity,
        cookie::{COOKIE_USER_ID, extend_auth_cookie_duration_if_needed, get_user_id_from_auth_cookie},
    },
    user::get_user_by_id,
};

/// The state needed for the identity middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for checking that the user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that resolves the [Identity] of the client.
///
/// A client with a valid auth cookie for a user that exists is treated as
/// that user, and the auth cookie is extended after the request has been
/// handled. Any other client is treated as a guest. Nobody is turned away.
///
/// **Note**: Route handlers can use the function argument `Extension(identity): Extension<Identity>` to receive the identity.
pub async fn identity_middleware(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Treating client as a guest.");
            PrivateCookieJar::new(state.cookie_key.clone())
        }
    };

    let identity = match resolve_identity(&jar, &state.db_connection) {
        Ok(identity) => identity,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(identity);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    if identity.is_guest() || sets_auth_cookie(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar, state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error}. Leaving cookie as is.");
            return Response::from_parts(parts, body);
        }
    };

    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

fn resolve_identity(
    jar: &PrivateCookieJar,
    db_connection: &Mutex<Connection>,
) -> Result<Identity, Error> {
    let Ok(user_id) = get_user_id_from_auth_cookie(jar) else {
        return Ok(Identity::Guest);
    };

    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(user_id, &connection) {
        Ok(_) => Ok(Identity::User(user_id)),
        Err(Error::NotFound) => {
            tracing::warn!("Auth cookie refers to user {user_id} who does not exist.");
            Ok(Identity::Guest)
        }
        Err(error) => Err(error),
    }
}

/// Whether the handler already set (or cleared) the auth cookie, e.g. when logging in or out.
fn sets_auth_cookie(response: &Response) -> bool {
    let prefix = format!("{COOKIE_USER_ID}=");

    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}
