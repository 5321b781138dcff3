//! A web app for keeping track of personal expenses.
//!
//! Signed in users keep their expenses in a SQLite database. Visitors who have
//! not signed in can still use the app as a guest: their expenses are kept in
//! a server-side session for as long as the browser session lasts, and are
//! discarded once they register an account.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::response::{IntoResponse, Redirect, Response};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod password;
mod register_user;
mod routing;
mod session;
mod timezone;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use expense::{CATEGORY_CHOICES, ExpenseFormErrors};
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, Username};

use crate::{
    internal_server_error::InternalServerError, not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields of a submitted expense failed validation.
    ///
    /// Every failing field is reported, not just the first one, so that the
    /// form can be shown again with all of the problems at once.
    #[error("the expense form has errors: {0}")]
    InvalidExpense(ExpenseFormErrors),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A guest expense was addressed by a position past the end of the
    /// guest's expense list.
    ///
    /// Unlike [Error::NotFound], this is not shown to the client. Handlers
    /// send the client back to the expense list instead.
    #[error("the guest expense index is out of range")]
    OutOfRange,

    /// The username and password combination did not match a registered user.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The username is empty, too long or contains characters that are not allowed.
    #[error("{0}")]
    InvalidUsername(String),

    /// Another user has already registered the username.
    #[error("A user with that username already exists.")]
    DuplicateUsername,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// A row was rejected by a CHECK constraint in the database.
    #[error("the database rejected the row: {0}")]
    ConstraintViolation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Could not acquire the lock on the request's session data.
    #[error("could not acquire the session lock")]
    SessionLockError,

    /// The session data could not be converted to or from JSON.
    #[error("could not read or write session data: {0}")]
    SessionDataError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK =>
            {
                Error::ConstraintViolation(desc)
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::SessionDataError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::OutOfRange => Redirect::to(endpoints::ROOT).into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings \
                    and ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError | Error::SessionLockError => {
                InternalServerError::default().into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}
