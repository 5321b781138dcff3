//! Expense tracking for registered users and guests.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model shared by both stores
//! - Validation of the expense form
//! - The database store for registered users and the session store for guests
//! - Filtering and totals
//! - View handlers for the expense pages

mod core;
mod create_page;
mod delete_page;
mod edit_page;
mod filter;
mod filter_page;
mod form;
mod guest_store;
mod list_page;
mod repository;
mod service;
mod user_store;
mod validation;

#[cfg(test)]
mod test_utils;

pub use core::{CATEGORY_CHOICES, Expense, GuestId};
pub use create_page::{create_expense_endpoint, get_create_expense_page};
pub use delete_page::{
    delete_expense_endpoint, delete_guest_expense_endpoint, get_delete_expense_page,
    get_delete_guest_expense_page,
};
pub use edit_page::{
    edit_expense_endpoint, edit_guest_expense_endpoint, get_edit_expense_page,
    get_edit_guest_expense_page,
};
pub use filter_page::get_filter_page;
pub use list_page::get_expenses_page;
pub use user_store::create_expense_table;
pub use validation::ExpenseFormErrors;

#[cfg(test)]
pub(crate) use core::{ExpenseKey, Owner};
#[cfg(test)]
pub(crate) use service::ExpenseService;
#[cfg(test)]
pub(crate) use validation::ExpenseForm;
