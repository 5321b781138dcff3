//! Reads and writes session data in the database.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, named_params};
use time::{
    Duration, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};
use uuid::Uuid;

use crate::{Error, session::SessionData};

/// How long a session lasts after it was last changed.
pub const SESSION_DURATION: Duration = Duration::weeks(2);

/// `updated_at` is stored in UTC with this format so that timestamps sort as text.
const UPDATED_AT_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// The random ID that the session cookie carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Read a session ID from a cookie value, `None` if it is not a UUID.
    pub fn parse(raw_id: &str) -> Option<Self> {
        Uuid::parse_str(raw_id.trim()).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Create the session table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS session (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Get the data of the session `id`, `None` if there is no such session or it
/// has expired.
///
/// # Errors
///
/// Returns [Error::SessionDataError] if the stored data is not valid, or an
/// [Error::SqlError] if the query failed.
pub fn load_session(id: SessionId, connection: &Connection) -> Result<Option<SessionData>, Error> {
    let raw_data: Option<String> = connection
        .query_row(
            "SELECT data FROM session WHERE id = :id AND updated_at >= :cutoff",
            named_params! {
                ":id": id.to_string(),
                ":cutoff": expiry_cutoff()?,
            },
            |row| row.get(0),
        )
        .optional()?;

    match raw_data {
        Some(raw_data) => Ok(Some(serde_json::from_str(&raw_data)?)),
        None => Ok(None),
    }
}

/// Insert or replace the data of the session `id`, restarting its lifetime.
pub fn save_session(id: SessionId, data: &SessionData, connection: &Connection) -> Result<(), Error> {
    let raw_data = serde_json::to_string(data)?;

    connection.execute(
        "INSERT INTO session (id, data, updated_at) VALUES (:id, :data, :updated_at)
        ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        named_params! {
            ":id": id.to_string(),
            ":data": raw_data,
            ":updated_at": format_timestamp(OffsetDateTime::now_utc())?,
        },
    )?;

    Ok(())
}

/// Remove the session `id`, if it exists.
pub fn delete_session(id: SessionId, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM session WHERE id = :id",
        named_params! {":id": id.to_string()},
    )?;

    Ok(())
}

/// Remove every session that has not changed within [SESSION_DURATION].
///
/// Returns the number of sessions removed.
pub fn delete_expired_sessions(connection: &Connection) -> Result<usize, Error> {
    let deleted = connection.execute(
        "DELETE FROM session WHERE updated_at < :cutoff",
        named_params! {":cutoff": expiry_cutoff()?},
    )?;

    Ok(deleted)
}

/// Sessions last changed before this timestamp have expired.
fn expiry_cutoff() -> Result<String, Error> {
    format_timestamp(OffsetDateTime::now_utc() - SESSION_DURATION)
}

fn format_timestamp(date_time: OffsetDateTime) -> Result<String, Error> {
    date_time
        .format(UPDATED_AT_FORMAT)
        .map_err(|error| Error::SessionDataError(error.to_string()))
}

#[cfg(test)]
mod session_store_tests {
    use rusqlite::{Connection, params};

    use crate::{
        Error,
        db::initialize,
        expense::GuestId,
        session::SessionData,
    };

    use super::{
        SessionId, delete_expired_sessions, delete_session, load_session, save_session,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn some_data() -> SessionData {
        SessionData {
            guest_id: Some(GuestId::new()),
            guest_expenses: Vec::new(),
        }
    }

    #[test]
    fn unknown_session_loads_nothing() {
        let connection = get_test_connection();

        assert_eq!(load_session(SessionId::new(), &connection), Ok(None));
    }

    #[test]
    fn save_then_load() {
        let connection = get_test_connection();
        let id = SessionId::new();
        let data = some_data();

        save_session(id, &data, &connection).unwrap();

        assert_eq!(load_session(id, &connection), Ok(Some(data)));
    }

    #[test]
    fn save_overwrites_existing_session() {
        let connection = get_test_connection();
        let id = SessionId::new();
        save_session(id, &some_data(), &connection).unwrap();
        let want = some_data();

        save_session(id, &want, &connection).unwrap();

        assert_eq!(load_session(id, &connection), Ok(Some(want)));
    }

    #[test]
    fn delete_removes_session() {
        let connection = get_test_connection();
        let id = SessionId::new();
        save_session(id, &some_data(), &connection).unwrap();

        delete_session(id, &connection).unwrap();

        assert_eq!(load_session(id, &connection), Ok(None));
    }

    fn set_updated_at(id: SessionId, updated_at: &str, connection: &Connection) {
        connection
            .execute(
                "UPDATE session SET updated_at = ?1 WHERE id = ?2",
                params![updated_at, id.to_string()],
            )
            .unwrap();
    }

    #[test]
    fn expired_session_loads_nothing() {
        let connection = get_test_connection();
        let id = SessionId::new();
        save_session(id, &some_data(), &connection).unwrap();
        set_updated_at(id, "2000-01-01 00:00:00", &connection);

        assert_eq!(load_session(id, &connection), Ok(None));
    }

    #[test]
    fn saving_restarts_session_lifetime() {
        let connection = get_test_connection();
        let id = SessionId::new();
        save_session(id, &some_data(), &connection).unwrap();
        set_updated_at(id, "2000-01-01 00:00:00", &connection);
        let want = some_data();

        save_session(id, &want, &connection).unwrap();

        assert_eq!(load_session(id, &connection), Ok(Some(want)));
    }

    #[test]
    fn delete_expired_sessions_keeps_fresh_ones() {
        let connection = get_test_connection();
        let stale_id = SessionId::new();
        let fresh_id = SessionId::new();
        let fresh_data = some_data();
        save_session(stale_id, &some_data(), &connection).unwrap();
        save_session(fresh_id, &fresh_data, &connection).unwrap();
        set_updated_at(stale_id, "2000-01-01 00:00:00", &connection);

        let deleted = delete_expired_sessions(&connection).unwrap();

        assert_eq!(deleted, 1);
        let remaining: i64 = connection
            .query_row("SELECT COUNT(*) FROM session", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
        assert_eq!(load_session(fresh_id, &connection), Ok(Some(fresh_data)));
    }

    #[test]
    fn corrupt_data_is_reported() {
        let connection = get_test_connection();
        let id = SessionId::new();
        connection
            .execute(
                "INSERT INTO session (id, data, updated_at) VALUES (?1, 'not json', '9999-12-31 23:59:59')",
                [id.to_string()],
            )
            .unwrap();

        let result = load_session(id, &connection);

        assert!(matches!(result, Err(Error::SessionDataError(_))));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(SessionId::parse("not-a-uuid"), None);

        let id = SessionId::new();
        assert_eq!(SessionId::parse(&id.to_string()), Some(id));
    }
}
