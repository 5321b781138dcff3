//! Server-side sessions that hold the expenses of visitors who have not logged in.
//!
//! The session ID lives in an encrypted cookie and the data lives in the
//! `session` table. [session_middleware] loads the data before a request is
//! handled and writes it back afterwards if it changed.

mod data;
mod middleware;
mod store;

pub use data::{Session, SessionData};
pub use middleware::session_middleware;
pub use store::create_session_table;

#[cfg(test)]
pub(crate) use middleware::COOKIE_SESSION_ID;
