//! The expense record shared by the database and the guest session.

use std::fmt::Display;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::{
    database_id::ExpenseId,
    endpoints::{self, format_endpoint},
    user::UserID,
};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// The categories every user can pick from, in the order they are offered.
pub const CATEGORY_CHOICES: [&str; 6] = ["Food", "Transport", "Shopping", "Bills", "Health", "Other"];

/// The random identifier that ties a guest's expenses together for the
/// lifetime of their session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(String);

impl GuestId {
    /// Generate a new random (v4 UUID) guest identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for GuestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GuestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Who an expense belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    /// The expense is stored in the database for a registered user.
    User(UserID),
    /// The expense is stored in a guest's session.
    Guest(GuestId),
    /// The expense has not been stored yet.
    Unset,
}

/// A single expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The database ID. Only expenses stored in the database have one.
    pub id: Option<ExpenseId>,
    /// Who the expense belongs to.
    pub owner: Owner,
    /// A short name for the expense.
    pub title: String,
    /// How much was spent, always greater than zero.
    pub amount: Decimal,
    /// When the money was spent.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The resolved category, either a preset or one the user made up.
    pub category: String,
    /// Optional free text, empty if the user did not enter any.
    #[serde(default)]
    pub description: String,
}

/// How to find an expense in the store it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseKey {
    /// The database ID of a registered user's expense.
    Id(ExpenseId),
    /// The zero-based position of an expense in a guest's list.
    Position(usize),
}

impl ExpenseKey {
    /// The URL of the page for editing the expense.
    pub fn edit_url(&self) -> String {
        match self {
            ExpenseKey::Id(id) => format_endpoint(endpoints::EDIT_EXPENSE, id),
            ExpenseKey::Position(index) => format_endpoint(endpoints::EDIT_GUEST_EXPENSE, index),
        }
    }

    /// The URL of the page for deleting the expense.
    pub fn delete_url(&self) -> String {
        match self {
            ExpenseKey::Id(id) => format_endpoint(endpoints::DELETE_EXPENSE, id),
            ExpenseKey::Position(index) => {
                format_endpoint(endpoints::DELETE_GUEST_EXPENSE, index)
            }
        }
    }
}

/// An expense together with the key that addresses it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseEntry {
    /// Where the expense lives.
    pub key: ExpenseKey,
    /// The expense itself.
    pub expense: Expense,
}

/// Add up the amounts of `entries`, zero if there are none.
pub fn sum_amounts<'a>(entries: impl IntoIterator<Item = &'a ExpenseEntry>) -> Decimal {
    entries
        .into_iter()
        .map(|entry| entry.expense.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        expense::core::{Expense, ExpenseEntry, ExpenseKey, GuestId, Owner, sum_amounts},
        user::UserID,
    };

    fn expense(amount: rust_decimal::Decimal) -> Expense {
        Expense {
            id: None,
            owner: Owner::Guest(GuestId::new()),
            title: "Lunch".to_owned(),
            amount,
            date: date!(2024 - 01 - 15),
            category: "Food".to_owned(),
            description: String::new(),
        }
    }

    #[test]
    fn key_urls_point_at_the_right_store() {
        assert_eq!(ExpenseKey::Id(7).edit_url(), "/edit/7");
        assert_eq!(ExpenseKey::Id(7).delete_url(), "/delete/7");
        assert_eq!(ExpenseKey::Position(0).edit_url(), "/guest/edit/0");
        assert_eq!(ExpenseKey::Position(2).delete_url(), "/guest/delete/2");
    }

    #[test]
    fn sum_of_nothing_is_zero() {
        assert_eq!(sum_amounts(&Vec::<ExpenseEntry>::new()), dec!(0));
    }

    #[test]
    fn sum_adds_amounts() {
        let entries = [
            ExpenseEntry {
                key: ExpenseKey::Position(0),
                expense: expense(dec!(12.50)),
            },
            ExpenseEntry {
                key: ExpenseKey::Position(1),
                expense: expense(dec!(7.25)),
            },
        ];

        assert_eq!(sum_amounts(&entries), dec!(19.75));
    }

    #[test]
    fn expense_survives_session_json() {
        let mut want = expense(dec!(12.50));
        want.owner = Owner::User(UserID::new(3));

        let json = serde_json::to_string(&want).unwrap();
        let got: Expense = serde_json::from_str(&json).unwrap();

        assert!(json.contains("\"2024-01-15\""), "got {json}");
        assert_eq!(got, want);
    }

    #[test]
    fn guest_ids_are_unique() {
        assert_ne!(GuestId::new(), GuestId::new());
    }
}
