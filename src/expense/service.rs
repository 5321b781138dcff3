//! Validates expense forms and hands them to the store for the current visitor.

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    Error,
    auth::Identity,
    expense::{
        core::{Expense, ExpenseEntry, ExpenseKey, sum_amounts},
        filter::{FilterQuery, FilteredExpenses, category_choices, category_totals},
        guest_store::GuestExpenseStore,
        repository::ExpenseRepository,
        user_store::UserExpenseStore,
        validation::{ExpenseForm, validate_expense},
    },
    session::SessionData,
};

/// Every expense of the current visitor and how much they add up to.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseList {
    /// The expenses in the order the store lists them.
    pub entries: Vec<ExpenseEntry>,
    /// The sum of `entries`, zero if there are none.
    pub total: Decimal,
}

/// The expense operations for one request.
///
/// Signed in users get their expenses from the database, guests from their
/// session. Callers do not need to know which one is in use.
pub struct ExpenseService<'a> {
    repository: Box<dyn ExpenseRepository + 'a>,
}

impl<'a> ExpenseService<'a> {
    /// Pick the store for `identity`.
    ///
    /// `session` is only touched when `identity` is [Identity::Guest].
    pub fn new(identity: Identity, connection: &'a Connection, session: &'a mut SessionData) -> Self {
        let repository: Box<dyn ExpenseRepository + 'a> = match identity {
            Identity::User(user_id) => Box::new(UserExpenseStore::new(connection, user_id)),
            Identity::Guest => Box::new(GuestExpenseStore::new(session)),
        };

        Self { repository }
    }

    /// Every expense with the total amount.
    pub fn list(&self) -> Result<ExpenseList, Error> {
        let entries = self.repository.get_all()?;
        let total = sum_amounts(&entries);

        Ok(ExpenseList { entries, total })
    }

    /// The expense addressed by `key`.
    pub fn get(&self, key: ExpenseKey) -> Result<Expense, Error> {
        self.repository.get(key)
    }

    /// Validate `form` and store it as a new expense.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidExpense] with every problem in the form, in
    /// which case nothing is stored.
    pub fn add(&mut self, form: &ExpenseForm) -> Result<ExpenseEntry, Error> {
        let expense = validate_expense(form).map_err(Error::InvalidExpense)?;

        self.repository.create(expense)
    }

    /// Replace the expense addressed by `key` with the contents of `form`.
    ///
    /// The expense must exist before the form is looked at, so a missing
    /// expense is reported even if the form is also invalid.
    pub fn edit(&mut self, key: ExpenseKey, form: &ExpenseForm) -> Result<Expense, Error> {
        self.repository.get(key)?;
        let expense = validate_expense(form).map_err(Error::InvalidExpense)?;

        self.repository.update(key, expense)
    }

    /// Remove the expense addressed by `key`.
    pub fn delete(&mut self, key: ExpenseKey) -> Result<(), Error> {
        self.repository.delete(key)
    }

    /// The categories to offer in forms: the presets plus any already in use.
    pub fn category_choices(&self) -> Result<Vec<String>, Error> {
        Ok(category_choices(self.repository.used_categories()?))
    }

    /// Apply the filter in `query`.
    ///
    /// Without a complete filter, or with one that cannot be understood,
    /// every expense is returned and the filtered totals are left unset.
    pub fn filter(&self, query: &FilterQuery) -> Result<FilteredExpenses, Error> {
        let all_entries = self.repository.get_all()?;
        let all_time_total = sum_amounts(&all_entries);
        let categories = self.category_choices()?;

        let date_filter = match query.date_filter() {
            Ok(Some(date_filter)) => date_filter,
            Ok(None) => {
                return Ok(FilteredExpenses {
                    entries: all_entries,
                    total: None,
                    category_totals: None,
                    all_time_total,
                    categories,
                    error: None,
                });
            }
            Err(error) => {
                tracing::debug!("Ignoring filter {query:?}: {error}");
                return Ok(FilteredExpenses {
                    entries: all_entries,
                    total: None,
                    category_totals: None,
                    all_time_total,
                    categories,
                    error: Some(error),
                });
            }
        };

        let entries = self
            .repository
            .get_filtered(&date_filter, query.category())?;
        let total = sum_amounts(&entries);
        let totals = category_totals(&entries);

        Ok(FilteredExpenses {
            entries,
            total: Some(total),
            category_totals: Some(totals),
            all_time_total,
            categories,
            error: None,
        })
    }
}
