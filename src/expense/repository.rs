//! The interface shared by the database and the guest session stores.

use crate::{
    Error,
    expense::{
        core::{Expense, ExpenseEntry, ExpenseKey},
        filter::DateFilter,
        validation::ValidExpense,
    },
};

/// Handles the creation and retrieval of expenses for one user or guest.
pub trait ExpenseRepository {
    /// Store a new expense and return it with the key that addresses it.
    fn create(&mut self, expense: ValidExpense) -> Result<ExpenseEntry, Error>;

    /// Every expense in the order the store lists them.
    fn get_all(&self) -> Result<Vec<ExpenseEntry>, Error>;

    /// The expense addressed by `key`.
    ///
    /// # Errors
    ///
    /// Returns the store's "missing" error if `key` does not address an expense.
    fn get(&self, key: ExpenseKey) -> Result<Expense, Error>;

    /// Overwrite the fields of the expense addressed by `key`.
    fn update(&mut self, key: ExpenseKey, expense: ValidExpense) -> Result<Expense, Error>;

    /// Remove the expense addressed by `key`.
    fn delete(&mut self, key: ExpenseKey) -> Result<(), Error>;

    /// The expenses with a date that passes `date_filter` and, if given, in `category`.
    fn get_filtered(
        &self,
        date_filter: &DateFilter,
        category: Option<&str>,
    ) -> Result<Vec<ExpenseEntry>, Error> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|entry| date_filter.matches(entry.expense.date))
            .filter(|entry| category.is_none_or(|category| entry.expense.category == category))
            .collect())
    }

    /// Every distinct category used by the stored expenses.
    fn used_categories(&self) -> Result<Vec<String>, Error> {
        let mut categories: Vec<String> = self
            .get_all()?
            .into_iter()
            .map(|entry| entry.expense.category)
            .collect();
        categories.sort();
        categories.dedup();

        Ok(categories)
    }
}
