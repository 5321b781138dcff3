//! Defines the page and endpoint for adding an expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::Identity,
    endpoints,
    expense::{
        form::{ExpenseFormView, expense_form},
        list_page::ExpenseState,
        service::ExpenseService,
        validation::{ExpenseForm, ExpenseFormErrors},
    },
    html::{FORM_CONTAINER_STYLE, base},
    internal_server_error::get_internal_server_error_redirect,
    navigation::NavBar,
    session::Session,
    timezone::local_today,
};

const HEADING: &str = "Add Expense";
const SUBMIT_TEXT: &str = "Save Expense";

fn add_expense_form(
    form: &ExpenseForm,
    errors: &ExpenseFormErrors,
    categories: &[String],
) -> Markup {
    expense_form(&ExpenseFormView {
        action: endpoints::ADD_EXPENSE,
        heading: HEADING,
        submit_text: SUBMIT_TEXT,
        form,
        errors,
        categories,
    })
}

fn add_expense_view(identity: &Identity, form: &Markup) -> Markup {
    let nav_bar = NavBar::new(endpoints::ADD_EXPENSE, identity).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    base(HEADING, &content)
}

/// The state needed for the add expense page.
#[derive(Debug, Clone)]
pub struct CreateExpensePageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for looking up the categories in use.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for adding an expense, with today's date filled in.
pub async fn get_create_expense_page(
    State(state): State<CreateExpensePageState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;
        let mut session_data = session.lock()?;

        ExpenseService::new(identity, &connection, &mut session_data).category_choices()?
    };

    let form = ExpenseForm {
        date: today.to_string(),
        ..Default::default()
    };
    let form = add_expense_form(&form, &ExpenseFormErrors::default(), &categories);

    Ok(add_expense_view(&identity, &form).into_response())
}

/// A route handler for adding an expense, redirects to the expense list on success.
///
/// If the form has errors, the form is sent back with a message for each bad field.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    match create_expense(&state, identity, &session, &form) {
        Ok(response) => response,
        Err(error) => {
            tracing::error!("Could not add expense {form:?}: {error}");
            get_internal_server_error_redirect()
        }
    }
}

fn create_expense(
    state: &ExpenseState,
    identity: Identity,
    session: &Session,
    form: &ExpenseForm,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let mut session_data = session.lock()?;
    let mut service = ExpenseService::new(identity, &connection, &mut session_data);

    match service.add(form) {
        Ok(entry) => {
            tracing::debug!("Added expense {:?} for {identity:?}", entry.key);
            Ok((
                HxRedirect(endpoints::ROOT.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response())
        }
        Err(Error::InvalidExpense(errors)) => {
            let categories = service.category_choices()?;
            Ok(add_expense_form(form, &errors, &categories).into_response())
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Form, extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        auth::Identity,
        endpoints,
        expense::{
            ExpenseService, create_expense_endpoint, create_page::CreateExpensePageState,
            get_create_expense_page,
            test_utils::{create_test_user, expense_form, get_test_state},
        },
        session::Session,
        test_utils::{
            assert_field_error, assert_hx_endpoint, assert_hx_redirect, assert_valid_html,
            must_get_form, parse_html_document, parse_html_fragment,
        },
    };

    #[tokio::test]
    async fn page_has_form_posting_to_add() {
        let state = get_test_state();
        let page_state = CreateExpensePageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: state.db_connection.clone(),
        };

        let response = get_create_expense_page(
            State(page_state),
            Extension(Identity::Guest),
            Extension(Session::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::ADD_EXPENSE, "hx-post");
    }

    #[tokio::test]
    async fn invalid_timezone_is_an_error() {
        let state = get_test_state();
        let page_state = CreateExpensePageState {
            local_timezone: "Not/A_Timezone".to_owned(),
            db_connection: state.db_connection.clone(),
        };

        let result = get_create_expense_page(
            State(page_state),
            Extension(Identity::Guest),
            Extension(Session::default()),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn guest_expense_is_added_to_session() {
        let state = get_test_state();
        let session = Session::default();

        let response = create_expense_endpoint(
            State(state),
            Extension(Identity::Guest),
            Extension(session.clone()),
            Form(expense_form("Coffee", "4.50", "2024-03-01", "Food")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ROOT);

        let session_data = session.lock().unwrap();
        assert!(session_data.guest_id.is_some());
        assert_eq!(session_data.guest_expenses.len(), 1);
        assert_eq!(session_data.guest_expenses[0].amount, dec!(4.50));
        assert_eq!(session_data.guest_expenses[0].date, date!(2024 - 03 - 01));
    }

    #[tokio::test]
    async fn user_expense_is_added_to_database() {
        let state = get_test_state();
        let user_id = create_test_user(&state);
        let session = Session::default();

        let response = create_expense_endpoint(
            State(state.clone()),
            Extension(Identity::User(user_id)),
            Extension(session.clone()),
            Form(expense_form("Rent", "800", "2024-03-01", "Bills")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let mut session_data = session.lock().unwrap();
        let list = ExpenseService::new(Identity::User(user_id), &connection, &mut session_data)
            .list()
            .unwrap();
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.total, dec!(800));
        assert!(session_data.guest_expenses.is_empty());
    }

    #[tokio::test]
    async fn invalid_form_is_sent_back_with_errors() {
        let state = get_test_state();
        let session = Session::new(Default::default());

        let response = create_expense_endpoint(
            State(state),
            Extension(Identity::Guest),
            Extension(session.clone()),
            Form(expense_form("Coffee", "0", "2024-03-01", "Food")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_fragment(response).await;
        let form = must_get_form(&document);
        assert_field_error(&form, "amount", "Amount must be greater than zero.");
        assert!(session.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn poisoned_database_lock_redirects_to_error_page() {
        let state = get_test_state();
        let db_connection = state.db_connection.clone();
        let _ = std::thread::spawn(move || {
            let _guard = db_connection.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let response = create_expense_endpoint(
            State(state),
            Extension(Identity::Guest),
            Extension(Session::default()),
            Form(expense_form("Coffee", "4.50", "2024-03-01", "Food")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_hx_redirect(&response, endpoints::INTERNAL_ERROR_VIEW);
    }
}
