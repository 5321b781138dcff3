//! User authentication: the auth cookie, log-in and log-out pages, and the
//! middleware that works out who is making a request.

mod cookie;
mod identity;
mod log_in;
mod log_out;
mod middleware;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use identity::Identity;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::identity_middleware;

#[cfg(test)]
pub(crate) use cookie::{COOKIE_EXPIRY, COOKIE_USER_ID};
