use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    PasswordHash, UserID, Username,
    db::initialize,
    expense::{
        core::{Expense, GuestId, Owner},
        list_page::ExpenseState,
        validation::ExpenseForm,
    },
    session::{Session, SessionData},
    user::create_user,
};

pub fn get_test_state() -> ExpenseState {
    let connection = Connection::open_in_memory().unwrap();
    initialize(&connection).unwrap();

    ExpenseState {
        db_connection: Arc::new(Mutex::new(connection)),
    }
}

pub fn create_test_user(state: &ExpenseState) -> UserID {
    create_user(
        Username::new_unchecked("alice"),
        PasswordHash::new_unchecked("hunter2"),
        &state.db_connection.lock().unwrap(),
    )
    .unwrap()
    .id
}

pub fn guest_expense(title: &str, amount: Decimal, date: Date, category: &str) -> Expense {
    Expense {
        id: None,
        owner: Owner::Guest(GuestId::new()),
        title: title.to_owned(),
        amount,
        date,
        category: category.to_owned(),
        description: String::new(),
    }
}

pub fn guest_session(expenses: Vec<Expense>) -> Session {
    Session::new(SessionData {
        guest_id: Some(GuestId::new()),
        guest_expenses: expenses,
    })
}

pub fn expense_form(title: &str, amount: &str, date: &str, category: &str) -> ExpenseForm {
    ExpenseForm {
        title: title.to_owned(),
        amount: amount.to_owned(),
        date: date.to_owned(),
        category: category.to_owned(),
        new_category: String::new(),
        description: String::new(),
    }
}
