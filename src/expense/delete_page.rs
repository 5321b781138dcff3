//! Defines the confirmation pages and endpoints for deleting an expense.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error,
    auth::Identity,
    database_id::ExpenseId,
    endpoints,
    expense::{
        core::{Expense, ExpenseKey},
        list_page::ExpenseState,
        service::ExpenseService,
    },
    html::{BUTTON_DELETE_STYLE, FORM_CONTAINER_STYLE, base, format_currency, link, submit_button},
    internal_server_error::get_internal_server_error_redirect,
    navigation::NavBar,
    session::Session,
};

fn confirm_delete_view(identity: &Identity, key: ExpenseKey, expense: &Expense) -> Markup {
    let nav_bar = NavBar::new(endpoints::DELETE_EXPENSE, identity).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(key.delete_url())
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Delete Expense" }

                p
                {
                    "Are you sure you want to delete "
                    strong { (expense.title) }
                    " (" (format_currency(expense.amount)) " on " (expense.date) ")?"
                }

                (submit_button("Delete", BUTTON_DELETE_STYLE))

                p class="text-sm text-center"
                {
                    (link(endpoints::ROOT, "Cancel"))
                }
            }
        }
    };

    base("Delete Expense", &content)
}

/// Asks a registered user to confirm deleting an expense. Nothing is deleted yet.
pub async fn get_delete_expense_page(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Response, Error> {
    render_confirm_page(&state, identity, &session, ExpenseKey::Id(expense_id))
}

/// Asks a guest to confirm deleting an expense. Nothing is deleted yet.
pub async fn get_delete_guest_expense_page(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Path(index): Path<usize>,
) -> Result<Response, Error> {
    render_confirm_page(&state, identity, &session, ExpenseKey::Position(index))
}

fn render_confirm_page(
    state: &ExpenseState,
    identity: Identity,
    session: &Session,
    key: ExpenseKey,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let mut session_data = session.lock()?;

    let expense = ExpenseService::new(identity, &connection, &mut session_data).get(key)?;

    Ok(confirm_delete_view(&identity, key, &expense).into_response())
}

/// A route handler for deleting a registered user's expense.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    delete_expense(&state, identity, &session, ExpenseKey::Id(expense_id))
}

/// A route handler for deleting one of a guest's expenses.
pub async fn delete_guest_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Path(index): Path<usize>,
) -> Response {
    delete_expense(&state, identity, &session, ExpenseKey::Position(index))
}

/// Delete the expense at `key` and redirect to the expense list.
///
/// A guest position that does not exist is ignored.
fn delete_expense(
    state: &ExpenseState,
    identity: Identity,
    session: &Session,
    key: ExpenseKey,
) -> Response {
    let result = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| {
            let mut session_data = session.lock()?;
            ExpenseService::new(identity, &connection, &mut session_data).delete(key)
        });

    match result {
        Ok(()) => {
            tracing::debug!("Deleted expense {key:?} for {identity:?}");
            (
                HxRedirect(endpoints::ROOT.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::OutOfRange) => (
            HxRedirect(endpoints::ROOT.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::NotFound) => Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("Could not delete expense {key:?}: {error}");
            get_internal_server_error_redirect()
        }
    }
}
