//! Sets up the application database.

use rusqlite::Connection;

use crate::{
    Error, expense::create_expense_table, session::create_session_table, user::create_user_table,
};

/// Create the tables for users, expenses and sessions if they do not exist yet.
///
/// Foreign key enforcement is switched on for `connection` so that expenses
/// cannot refer to users that do not exist.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;
    create_user_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_session_table(&transaction)?;
    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();
        initialize(&connection).unwrap();
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let foreign_keys: i64 = connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }
}
