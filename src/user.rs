//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The longest username that can be registered.
pub const USERNAME_MAX_LENGTH: usize = 150;

/// A trimmed, non-empty username of at most [USERNAME_MAX_LENGTH] characters
/// made of letters, digits and the characters `@.+-_`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username without any validation.
    ///
    /// The caller should ensure that `raw_username` is a valid username,
    /// e.g. because it was read back from the database.
    pub fn new_unchecked(raw_username: &str) -> Self {
        Self(raw_username.to_owned())
    }

    /// The username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Username {
    type Err = Error;

    fn from_str(raw_username: &str) -> Result<Self, Self::Err> {
        let username = raw_username.trim();

        if username.is_empty() {
            return Err(Error::InvalidUsername("Username is required.".to_owned()));
        }

        if username.chars().count() > USERNAME_MAX_LENGTH {
            return Err(Error::InvalidUsername(format!(
                "Username must be {USERNAME_MAX_LENGTH} characters or fewer."
            )));
        }

        let is_allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
        if !username.chars().all(is_allowed) {
            return Err(Error::InvalidUsername(
                "Enter a valid username. This value may contain only letters, numbers, \
                and @/./+/-/_ characters."
                    .to_owned(),
            ));
        }

        Ok(Self(username.to_owned()))
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// The caller should ensure that `id` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with.
    pub username: Username,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if `username` is already taken,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    username: Username,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, password) VALUES (?1, ?2)",
        (username.as_str(), password_hash.as_ref()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user that registered `username`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if nobody registered `username`, or an
/// [Error::SqlError] if there was an error trying to access the store.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password FROM user WHERE username = :username")?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_username: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(raw_id),
        username: Username::new_unchecked(&raw_username),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
