//! Defines the pages and endpoints for editing an expense.
//!
//! Registered users address their expenses by database ID, guests by the
//! position of the expense in their list. Both share the same form.

use axum::{
    Extension, Form,
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
        core::ExpenseKey,
        form::{ExpenseFormView, expense_form},
        list_page::ExpenseState,
        service::ExpenseService,
        validation::{ExpenseForm, ExpenseFormErrors},
    },
    html::{FORM_CONTAINER_STYLE, base},
    internal_server_error::get_internal_server_error_redirect,
    navigation::NavBar,
    session::Session,
};

const HEADING: &str = "Edit Expense";

fn edit_expense_form(
    action: &str,
    form: &ExpenseForm,
    errors: &ExpenseFormErrors,
    categories: &[String],
) -> Markup {
    expense_form(&ExpenseFormView {
        action,
        heading: HEADING,
        submit_text: "Update Expense",
        form,
        errors,
        categories,
    })
}

fn edit_expense_view(identity: &Identity, form: &Markup) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_EXPENSE, identity).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    base(HEADING, &content)
}

/// Renders the form for editing a registered user's expense.
pub async fn get_edit_expense_page(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Response, Error> {
    render_edit_page(&state, identity, &session, ExpenseKey::Id(expense_id))
}

/// Renders the form for editing one of a guest's expenses.
pub async fn get_edit_guest_expense_page(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Path(index): Path<usize>,
) -> Result<Response, Error> {
    render_edit_page(&state, identity, &session, ExpenseKey::Position(index))
}

fn render_edit_page(
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
    let service = ExpenseService::new(identity, &connection, &mut session_data);

    let expense = service.get(key)?;
    let categories = service.category_choices()?;
    let form = edit_expense_form(
        &key.edit_url(),
        &ExpenseForm::from(&expense),
        &ExpenseFormErrors::default(),
        &categories,
    );

    Ok(edit_expense_view(&identity, &form).into_response())
}

/// A route handler for updating a registered user's expense.
pub async fn edit_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Path(expense_id): Path<ExpenseId>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    update_expense(&state, identity, &session, ExpenseKey::Id(expense_id), &form)
}

/// A route handler for updating one of a guest's expenses.
pub async fn edit_guest_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Path(index): Path<usize>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    update_expense(&state, identity, &session, ExpenseKey::Position(index), &form)
}

/// Apply `form` to the expense at `key` and redirect to the expense list.
///
/// A guest position that does not exist also redirects to the list, without
/// any message. A missing database ID gives the 404 page.
fn update_expense(
    state: &ExpenseState,
    identity: Identity,
    session: &Session,
    key: ExpenseKey,
    form: &ExpenseForm,
) -> Response {
    let result = try_update_expense(state, identity, session, key, form);

    match result {
        Ok(None) | Err(Error::OutOfRange) => (
            HxRedirect(endpoints::ROOT.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Ok(Some(form_with_errors)) => form_with_errors.into_response(),
        Err(Error::NotFound) => Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("Could not update expense {key:?}: {error}");
            get_internal_server_error_redirect()
        }
    }
}

/// Returns the form with errors if `form` is invalid.
fn try_update_expense(
    state: &ExpenseState,
    identity: Identity,
    session: &Session,
    key: ExpenseKey,
    form: &ExpenseForm,
) -> Result<Option<Markup>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let mut session_data = session.lock()?;
    let mut service = ExpenseService::new(identity, &connection, &mut session_data);

    match service.edit(key, form) {
        Ok(expense) => {
            tracing::debug!("Updated expense {key:?}: {expense:?}");
            Ok(None)
        }
        Err(Error::InvalidExpense(errors)) => {
            let categories = service.category_choices()?;
            Ok(Some(edit_expense_form(
                &key.edit_url(),
                form,
                &errors,
                &categories,
            )))
        }
        Err(error) => Err(error),
    }
}
