//! Loads the session before a request is handled and saves it afterwards.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    session::{
        Session, SessionData,
        store::{
            SESSION_DURATION, SessionId, delete_expired_sessions, delete_session, load_session,
            save_session,
        },
    },
};

pub(crate) const COOKIE_SESSION_ID: &str = "session_id";

/// The state needed for the session middleware.
#[derive(Clone)]
pub struct SessionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection holding the session table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SessionState> for Key {
    fn from_ref(state: &SessionState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that makes the client's [Session] available to handlers.
///
/// The session is looked up from the encrypted session cookie. Clients
/// without a (valid) session cookie, or whose session has expired, get an empty
/// session. After the request has been handled, changed session data is
/// written back to the database and the session cookie is (re)set so that it
/// expires together with the session. A session that has become empty is
/// removed.
///
/// **Note**: Route handlers can use the function argument `Extension(session): Extension<Session>` to receive the session.
pub async fn session_middleware(
    State(state): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Starting a new session.");
            PrivateCookieJar::new(state.cookie_key.clone())
        }
    };

    let cookie_session_id = jar
        .get(COOKIE_SESSION_ID)
        .and_then(|cookie| SessionId::parse(cookie.value()));

    let (session_id, initial_data) = match load(cookie_session_id, &state.db_connection) {
        Ok(loaded) => loaded,
        Err(error) => return error.into_response(),
    };

    let session = Session::new(initial_data.clone());
    parts.extensions.insert(session.clone());
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let data = match session.lock() {
        Ok(data) => data.clone(),
        Err(_) => return response,
    };

    if data == initial_data {
        return response;
    }

    match persist(session_id, &data, &state.db_connection) {
        Ok(Some(saved_session_id)) => append_session_cookie(response, jar, saved_session_id),
        Ok(None) => response,
        Err(error) => {
            tracing::error!("Could not save session: {error}");
            response
        }
    }
}

/// Load the session named by the cookie.
///
/// Returns the ID of a session that exists in the database (if any) and its data.
fn load(
    cookie_session_id: Option<SessionId>,
    db_connection: &Mutex<Connection>,
) -> Result<(Option<SessionId>, SessionData), Error> {
    let Some(session_id) = cookie_session_id else {
        return Ok((None, SessionData::default()));
    };

    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match load_session(session_id, &connection) {
        Ok(Some(data)) => Ok((Some(session_id), data)),
        Ok(None) => Ok((None, SessionData::default())),
        Err(Error::SessionDataError(error)) => {
            tracing::warn!("Discarding unreadable session {session_id}: {error}");
            Ok((Some(session_id), SessionData::default()))
        }
        Err(error) => Err(error),
    }
}

/// Write `data` back to the database.
///
/// Returns the ID of the saved session, which the client needs a fresh cookie
/// for, or `None` if nothing was saved. Creating a session also clears out
/// expired ones.
fn persist(
    session_id: Option<SessionId>,
    data: &SessionData,
    db_connection: &Mutex<Connection>,
) -> Result<Option<SessionId>, Error> {
    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match session_id {
        Some(session_id) if data.is_empty() => {
            delete_session(session_id, &connection)?;
            Ok(None)
        }
        Some(session_id) => {
            save_session(session_id, data, &connection)?;
            Ok(Some(session_id))
        }
        None if data.is_empty() => Ok(None),
        None => {
            let expired = delete_expired_sessions(&connection)?;
            if expired > 0 {
                tracing::debug!("Deleted {expired} expired session(s).");
            }

            let session_id = SessionId::new();
            save_session(session_id, data, &connection)?;
            tracing::debug!("Created session {session_id}.");
            Ok(Some(session_id))
        }
    }
}

/// Add the cookie for `session_id` to the headers of `response`.
///
/// The cookie expires after [SESSION_DURATION], the same as the session row.
fn append_session_cookie(
    response: Response,
    jar: PrivateCookieJar,
    session_id: SessionId,
) -> Response {
    let jar = jar.add(
        Cookie::build((COOKIE_SESSION_ID, session_id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true)
            .max_age(SESSION_DURATION),
    );

    let (mut parts, body) = response.into_parts();
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}
