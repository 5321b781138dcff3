//! Defines the route handler for the page listing the visitor's expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    AppState, Error,
    auth::Identity,
    endpoints,
    expense::{core::ExpenseEntry, service::ExpenseService},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
    session::Session,
};

/// The state needed by the expense pages.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection holding the expenses of registered users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A table of expenses with links for editing and deleting each one.
pub fn expense_table(entries: &[ExpenseEntry]) -> Markup {
    html! {
        div class="relative overflow-x-auto shadow-md sm:rounded-lg w-full"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class="px-6 py-4 text-right" { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                    }
                }

                tbody
                {
                    @for entry in entries {
                        tr class=(TABLE_ROW_STYLE) data-expense-row
                        {
                            td class=(TABLE_CELL_STYLE) { (entry.expense.date) }
                            td class=(TABLE_CELL_STYLE) { (entry.expense.title) }
                            td class=(TABLE_CELL_STYLE) { (entry.expense.category) }
                            td class="px-6 py-4 text-right" { (format_currency(entry.expense.amount)) }
                            td class=(TABLE_CELL_STYLE) { (entry.expense.description) }
                            td class="px-6 py-4 space-x-4"
                            {
                                a href=(entry.key.edit_url()) class=(LINK_STYLE) { "Edit" }
                                a href=(entry.key.delete_url()) class="text-red-600 hover:underline dark:text-red-500" { "Delete" }
                            }
                        }
                    }

                    @if entries.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="6" class="px-6 py-4 text-center"
                            {
                                "No expenses yet. "
                                a href=(endpoints::ADD_EXPENSE) class=(LINK_STYLE) { "Add one" }
                                "."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn expenses_view(identity: &Identity, entries: &[ExpenseEntry], total: Decimal) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT, identity).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between items-center w-full mb-4"
            {
                h1 class="text-xl font-bold" { "Expenses" }

                a href=(endpoints::ADD_EXPENSE) class=(LINK_STYLE) { "Add expense" }
            }

            (expense_table(entries))

            p class="w-full mt-4 text-right text-lg font-semibold"
            {
                "Total: "
                span id="total" { (format_currency(total)) }
            }
        }
    };

    base("Expenses", &content)
}

/// Renders every expense of the current user or guest with their total.
pub async fn get_expenses_page(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let mut session_data = session.lock()?;

    let list = ExpenseService::new(identity, &connection, &mut session_data)
        .list()
        .inspect_err(|error| tracing::error!("Could not list expenses for {identity:?}: {error}"))?;

    Ok(expenses_view(&identity, &list.entries, list.total).into_response())
}

#[cfg(test)]
mod tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        auth::Identity,
        expense::{
            get_expenses_page,
            test_utils::{create_test_user, get_test_state, guest_expense, guest_session},
        },
        session::Session,
        test_utils::{assert_valid_html, parse_html_document},
    };

    #[tokio::test]
    async fn lists_guest_expenses_in_insertion_order() {
        let state = get_test_state();
        let session = guest_session(vec![
            guest_expense("Coffee", dec!(4.50), date!(2024 - 03 - 01), "Food"),
            guest_expense("Taxi", dec!(20), date!(2024 - 01 - 01), "Transport"),
        ]);

        let response = get_expenses_page(
            State(state),
            Extension(Identity::Guest),
            Extension(session),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let row_selector = Selector::parse("tr[data-expense-row]").unwrap();
        let titles: Vec<String> = document
            .select(&row_selector)
            .map(|row| {
                row.select(&Selector::parse("td").unwrap())
                    .nth(1)
                    .unwrap()
                    .text()
                    .collect()
            })
            .collect();
        assert_eq!(titles, vec!["Coffee", "Taxi"]);

        let edit_selector = Selector::parse("a[href='/guest/edit/1']").unwrap();
        assert_eq!(document.select(&edit_selector).count(), 1);

        let total_selector = Selector::parse("#total").unwrap();
        let total: String = document.select(&total_selector).next().unwrap().text().collect();
        assert_eq!(total, "$24.50");
    }

    #[tokio::test]
    async fn empty_list_has_zero_total() {
        let state = get_test_state();
        let user_id = create_test_user(&state);

        let response = get_expenses_page(
            State(state),
            Extension(Identity::User(user_id)),
            Extension(Session::default()),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        let row_selector = Selector::parse("tr[data-expense-row]").unwrap();
        assert_eq!(document.select(&row_selector).count(), 0);

        let total_selector = Selector::parse("#total").unwrap();
        let total: String = document.select(&total_selector).next().unwrap().text().collect();
        assert_eq!(total, "$0.00");
    }
}
