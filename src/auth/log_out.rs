//! Log-out route handler that invalidates authentication cookies and redirects users.

use axum::{
    Extension,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{Error, auth::invalidate_auth_cookie, endpoints, session::Session};

/// Invalidate the auth cookie, forget any guest expenses and redirect the client to the expense list.
///
/// The client carries on as a guest with an empty list.
pub async fn get_log_out(
    Extension(session): Extension<Session>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    session.lock()?.clear_guest_data();
    let jar = invalidate_auth_cookie(jar);

    Ok((jar, Redirect::to(endpoints::ROOT)).into_response())
}
