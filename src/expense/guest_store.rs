//! Stores the expenses of guests in their session.

use crate::{
    Error,
    expense::{
        core::{Expense, ExpenseEntry, ExpenseKey, GuestId, Owner},
        repository::ExpenseRepository,
        validation::ValidExpense,
    },
    session::SessionData,
};

/// The expenses of a visitor who has not logged in, kept in insertion order.
///
/// Expenses are addressed by their position in the list. A position past the
/// end of the list (or a database ID) gives [Error::OutOfRange].
pub struct GuestExpenseStore<'a> {
    session: &'a mut SessionData,
}

impl<'a> GuestExpenseStore<'a> {
    /// Create a store backed by the guest list in `session`.
    pub fn new(session: &'a mut SessionData) -> Self {
        Self { session }
    }

    fn position(&self, key: ExpenseKey) -> Result<usize, Error> {
        match key {
            ExpenseKey::Position(index) if index < self.session.guest_expenses.len() => Ok(index),
            _ => Err(Error::OutOfRange),
        }
    }
}

impl ExpenseRepository for GuestExpenseStore<'_> {
    fn create(&mut self, expense: ValidExpense) -> Result<ExpenseEntry, Error> {
        let guest_id = self
            .session
            .guest_id
            .get_or_insert_with(|| {
                let guest_id = GuestId::new();
                tracing::debug!("Assigned guest ID {guest_id} to session.");
                guest_id
            })
            .clone();

        let expense = expense.into_expense(None, Owner::Guest(guest_id));
        self.session.guest_expenses.push(expense.clone());

        Ok(ExpenseEntry {
            key: ExpenseKey::Position(self.session.guest_expenses.len() - 1),
            expense,
        })
    }

    fn get_all(&self) -> Result<Vec<ExpenseEntry>, Error> {
        Ok(self
            .session
            .guest_expenses
            .iter()
            .enumerate()
            .map(|(index, expense)| ExpenseEntry {
                key: ExpenseKey::Position(index),
                expense: expense.clone(),
            })
            .collect())
    }

    fn get(&self, key: ExpenseKey) -> Result<Expense, Error> {
        let index = self.position(key)?;

        Ok(self.session.guest_expenses[index].clone())
    }

    fn update(&mut self, key: ExpenseKey, expense: ValidExpense) -> Result<Expense, Error> {
        let index = self.position(key)?;
        let stored = &mut self.session.guest_expenses[index];
        *stored = expense.into_expense(None, stored.owner.clone());

        Ok(stored.clone())
    }

    fn delete(&mut self, key: ExpenseKey) -> Result<(), Error> {
        let index = self.position(key)?;
        self.session.guest_expenses.remove(index);

        Ok(())
    }
}
