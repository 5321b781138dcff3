//! Stores the expenses of registered users in the database.

use rusqlite::{Connection, Row, named_params};
use rust_decimal::Decimal;

use crate::{
    Error,
    database_id::ExpenseId,
    expense::{
        core::{Expense, ExpenseEntry, ExpenseKey, Owner},
        filter::DateFilter,
        repository::ExpenseRepository,
        validation::ValidExpense,
    },
    user::UserID,
};

/// Create the expense table.
///
/// The CHECK constraints reject a blank title and a non-positive amount even
/// if validation is skipped.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL CHECK (length(trim(title)) > 0 AND length(title) <= 100),
                amount TEXT NOT NULL CHECK (CAST(amount AS REAL) > 0),
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date)",
        (),
    )?;

    Ok(())
}

/// The expenses of one registered user.
///
/// Every query is scoped to `user_id`, so another user's expense IDs behave
/// as if they do not exist.
pub struct UserExpenseStore<'a> {
    connection: &'a Connection,
    user_id: UserID,
}

impl<'a> UserExpenseStore<'a> {
    /// Create a store for the expenses owned by `user_id`.
    pub fn new(connection: &'a Connection, user_id: UserID) -> Self {
        Self {
            connection,
            user_id,
        }
    }

    fn expense_id(key: ExpenseKey) -> Result<ExpenseId, Error> {
        match key {
            ExpenseKey::Id(id) => Ok(id),
            ExpenseKey::Position(_) => Err(Error::NotFound),
        }
    }
}

const SELECT_EXPENSE: &str =
    "SELECT id, user_id, title, amount, date, category, description FROM expense";

impl ExpenseRepository for UserExpenseStore<'_> {
    fn create(&mut self, expense: ValidExpense) -> Result<ExpenseEntry, Error> {
        self.connection.execute(
            "INSERT INTO expense (user_id, title, amount, date, category, description)
            VALUES (:user_id, :title, :amount, :date, :category, :description)",
            named_params! {
                ":user_id": self.user_id.as_i64(),
                ":title": expense.title,
                ":amount": expense.amount.to_string(),
                ":date": expense.date,
                ":category": expense.category,
                ":description": expense.description,
            },
        )?;

        let id = self.connection.last_insert_rowid();

        Ok(ExpenseEntry {
            key: ExpenseKey::Id(id),
            expense: expense.into_expense(Some(id), Owner::User(self.user_id)),
        })
    }

    fn get_all(&self) -> Result<Vec<ExpenseEntry>, Error> {
        self.connection
            .prepare(&format!(
                "{SELECT_EXPENSE} WHERE user_id = :user_id ORDER BY date DESC, id DESC"
            ))?
            .query_map(
                named_params! {":user_id": self.user_id.as_i64()},
                map_expense_entry_row,
            )?
            .map(|maybe_entry| maybe_entry.map_err(Error::from))
            .collect()
    }

    fn get(&self, key: ExpenseKey) -> Result<Expense, Error> {
        let id = Self::expense_id(key)?;

        self.connection
            .prepare(&format!(
                "{SELECT_EXPENSE} WHERE id = :id AND user_id = :user_id"
            ))?
            .query_row(
                named_params! {":id": id, ":user_id": self.user_id.as_i64()},
                map_expense_row,
            )
            .map_err(Error::from)
    }

    fn update(&mut self, key: ExpenseKey, expense: ValidExpense) -> Result<Expense, Error> {
        let id = Self::expense_id(key)?;

        let rows_affected = self.connection.execute(
            "UPDATE expense
            SET title = :title, amount = :amount, date = :date,
                category = :category, description = :description
            WHERE id = :id AND user_id = :user_id",
            named_params! {
                ":title": expense.title,
                ":amount": expense.amount.to_string(),
                ":date": expense.date,
                ":category": expense.category,
                ":description": expense.description,
                ":id": id,
                ":user_id": self.user_id.as_i64(),
            },
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(expense.into_expense(Some(id), Owner::User(self.user_id)))
    }

    fn delete(&mut self, key: ExpenseKey) -> Result<(), Error> {
        let id = Self::expense_id(key)?;

        let rows_affected = self.connection.execute(
            "DELETE FROM expense WHERE id = :id AND user_id = :user_id",
            named_params! {":id": id, ":user_id": self.user_id.as_i64()},
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn get_filtered(
        &self,
        date_filter: &DateFilter,
        category: Option<&str>,
    ) -> Result<Vec<ExpenseEntry>, Error> {
        self.connection
            .prepare(&format!(
                "{SELECT_EXPENSE}
                WHERE user_id = :user_id
                    AND strftime(:format, date) = :value
                    AND (:category IS NULL OR category = :category)
                ORDER BY date DESC, id DESC"
            ))?
            .query_map(
                named_params! {
                    ":user_id": self.user_id.as_i64(),
                    ":format": date_filter.strftime_format(),
                    ":value": date_filter.strftime_value(),
                    ":category": category,
                },
                map_expense_entry_row,
            )?
            .map(|maybe_entry| maybe_entry.map_err(Error::from))
            .collect()
    }

    fn used_categories(&self) -> Result<Vec<String>, Error> {
        self.connection
            .prepare(
                "SELECT DISTINCT category FROM expense WHERE user_id = :user_id ORDER BY category",
            )?
            .query_map(named_params! {":user_id": self.user_id.as_i64()}, |row| {
                row.get(0)
            })?
            .map(|maybe_category| maybe_category.map_err(Error::from))
            .collect()
    }
}

/// Map a database row to an expense.
///
/// The columns must be in the order of [SELECT_EXPENSE].
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let raw_amount: String = row.get(3)?;
    let amount: Decimal = raw_amount.parse().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(Expense {
        id: Some(row.get(0)?),
        owner: Owner::User(UserID::new(row.get(1)?)),
        title: row.get(2)?,
        amount,
        date: row.get(4)?,
        category: row.get(5)?,
        description: row.get(6)?,
    })
}

fn map_expense_entry_row(row: &Row) -> Result<ExpenseEntry, rusqlite::Error> {
    let expense = map_expense_row(row)?;

    Ok(ExpenseEntry {
        key: ExpenseKey::Id(row.get(0)?),
        expense,
    })
}
