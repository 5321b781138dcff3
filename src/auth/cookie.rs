//! Defines functions for handling user authentication with cookies.

use std::{cmp::max, num::ParseIntError};

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{
    Duration, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{Error, user::UserID};

pub(crate) const COOKIE_USER_ID: &str = "user_id";
pub(crate) const COOKIE_EXPIRY: &str = "expiry";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Date time format for the cookie expiry, e.g. "2021-01-01 00:00:00.000000 +00:00:00".
const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
         sign:mandatory]:[offset_minute]:[offset_second]"
);

fn auth_cookie<'a>(name: &'a str, value: String, expiry: OffsetDateTime) -> Cookie<'a> {
    Cookie::build((name, value))
        .path("/")
        .expires(expiry)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// Sets the initial expiry of the cookie to `duration` from the current time.
/// You can use [DEFAULT_COOKIE_DURATION] for the default duration.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns a [time::error::Format] if the expiry time cannot be formatted.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, time::error::Format> {
    let expiry = OffsetDateTime::now_utc() + duration;
    // Use format instead of to_string to avoid errors at midnight when the hour is printed as
    // a single digit when [DATE_TIME_FORMAT] expects two digits.
    let expiry_string = expiry.format(DATE_TIME_FORMAT)?;

    Ok(jar
        .add(auth_cookie(
            COOKIE_USER_ID,
            user_id.as_i64().to_string(),
            expiry,
        ))
        .add(auth_cookie(COOKIE_EXPIRY, expiry_string, expiry)))
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let mut user_id_cookie = auth_cookie(
        COOKIE_USER_ID,
        "deleted".to_owned(),
        OffsetDateTime::UNIX_EPOCH,
    );
    user_id_cookie.set_max_age(Duration::ZERO);

    let mut expiry_cookie = auth_cookie(
        COOKIE_EXPIRY,
        "deleted".to_owned(),
        OffsetDateTime::UNIX_EPOCH,
    );
    expiry_cookie.set_max_age(Duration::ZERO);

    jar.add(user_id_cookie).add(expiry_cookie)
}

/// Set the expiry of the auth cookie in `jar` to the latest of UTC now
/// plus `duration` and the cookie's expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - [Error::InvalidCredentials] if the auth cookie or expiry cookie are not in the cookie jar.
/// - [Error::InvalidDateFormat] if the expiry cannot be parsed, extended or formatted.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::InvalidCredentials)?;
    let current_expiry = extract_date_time(&expiry_cookie).map_err(|error| {
        Error::InvalidDateFormat(error.to_string(), expiry_cookie.value().to_owned())
    })?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| {
            Error::InvalidDateFormat(
                "date time overflow".to_owned(),
                expiry_cookie.value().to_owned(),
            )
        })?;

    set_auth_cookie_expiry(jar, max(current_expiry, new_expiry))
}

/// Sets the expires field of the auth cookie and the expires field and
/// value of the expiry cookie in `jar` to `expiry`.
///
/// If an error is returned, the cookie jar is not modified.
fn set_auth_cookie_expiry(
    jar: PrivateCookieJar,
    expiry: OffsetDateTime,
) -> Result<PrivateCookieJar, Error> {
    let expiry_string = expiry
        .format(DATE_TIME_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), expiry.to_string()))?;

    let user_id_cookie = jar.get(COOKIE_USER_ID).ok_or(Error::InvalidCredentials)?;

    Ok(jar
        .add(auth_cookie(
            COOKIE_USER_ID,
            user_id_cookie.value().to_owned(),
            expiry,
        ))
        .add(auth_cookie(COOKIE_EXPIRY, expiry_string, expiry)))
}

/// Get the ID of the logged in user from the auth cookie.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if either cookie is missing or
/// malformed, or if the expiry has passed.
pub(crate) fn get_user_id_from_auth_cookie(jar: &PrivateCookieJar) -> Result<UserID, Error> {
    let user_id_cookie = jar.get(COOKIE_USER_ID).ok_or(Error::InvalidCredentials)?;
    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::InvalidCredentials)?;

    let expiry = extract_date_time(&expiry_cookie).map_err(|_| Error::InvalidCredentials)?;
    if expiry <= OffsetDateTime::now_utc() {
        return Err(Error::InvalidCredentials);
    }

    extract_user_id(&user_id_cookie).map_err(|_| Error::InvalidCredentials)
}

fn extract_date_time(cookie: &Cookie) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(cookie.value_trimmed(), DATE_TIME_FORMAT)
}

fn extract_user_id(cookie: &Cookie) -> Result<UserID, ParseIntError> {
    let id: i64 = cookie.value_trimmed().parse()?;

    Ok(UserID::new(id))
}
