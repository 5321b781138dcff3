//! Application router configuration.
//!
//! Every page is open to guests and registered users alike, so there is no
//! auth guard. Instead, every request passes through the identity and session
//! middleware which tell the handlers who the client is and give them the
//! client's session.

use axum::{Router, middleware, routing::get};

use crate::{
    AppState,
    auth::{get_log_in_page, get_log_out, identity_middleware, post_log_in},
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, delete_guest_expense_endpoint,
        edit_expense_endpoint, edit_guest_expense_endpoint, get_create_expense_page,
        get_delete_expense_page, get_delete_guest_expense_page, get_edit_expense_page,
        get_edit_guest_expense_page, get_expenses_page, get_filter_page,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    register_user::{get_register_page, register_user},
    session::session_middleware,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_expenses_page))
        .route(
            endpoints::ADD_EXPENSE,
            get(get_create_expense_page).post(create_expense_endpoint),
        )
        .route(
            endpoints::EDIT_EXPENSE,
            get(get_edit_expense_page).post(edit_expense_endpoint),
        )
        .route(
            endpoints::DELETE_EXPENSE,
            get(get_delete_expense_page).post(delete_expense_endpoint),
        )
        .route(
            endpoints::EDIT_GUEST_EXPENSE,
            get(get_edit_guest_expense_page).post(edit_guest_expense_endpoint),
        )
        .route(
            endpoints::DELETE_GUEST_EXPENSE,
            get(get_delete_guest_expense_page).post(delete_guest_expense_endpoint),
        )
        .route(endpoints::FILTER_VIEW, get(get_filter_page))
        .route(
            endpoints::REGISTER,
            get(get_register_page).post(register_user),
        )
        .route(endpoints::LOG_IN, get(get_log_in_page).post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ))
        // Added last so that it runs first: the session is loaded before the
        // identity is resolved and saved after everything else is done.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        AppState,
        auth::{COOKIE_EXPIRY, COOKIE_USER_ID},
        build_router, endpoints,
        expense::ExpenseForm,
        register_user::RegisterForm,
        session::COOKIE_SESSION_ID,
        test_utils::{assert_valid_html, must_get_form},
    };

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state = AppState::new(connection, "42", "Etc/UTC").expect("Could not create state");

        TestServer::new(build_router(state))
    }

    fn coffee_form() -> ExpenseForm {
        ExpenseForm {
            title: "Coffee".to_owned(),
            amount: "4.50".to_owned(),
            date: "2024-03-01".to_owned(),
            category: "Food".to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn guest_can_view_expense_list() {
        let server = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_ok();
        let document = scraper::Html::parse_document(&response.text());
        assert_valid_html(&document);
        let notice = Selector::parse("#guest-notice").unwrap();
        assert_eq!(document.select(&notice).count(), 1);
        assert!(
            response.maybe_cookie(COOKIE_SESSION_ID).is_none(),
            "viewing an empty list should not start a session"
        );
    }

    #[tokio::test]
    async fn guest_add_starts_a_session() {
        let server = get_test_server();

        let response = server.post(endpoints::ADD_EXPENSE).form(&coffee_form()).await;

        response.assert_status(StatusCode::SEE_OTHER);
        response.assert_header("hx-redirect", endpoints::ROOT);
        assert!(response.maybe_cookie(COOKIE_SESSION_ID).is_some());
    }

    fn expense_row_count(response: &axum_test::TestResponse) -> usize {
        let document = scraper::Html::parse_document(&response.text());
        document
            .select(&Selector::parse("tr[data-expense-row]").unwrap())
            .count()
    }

    #[tokio::test]
    async fn guest_expenses_last_for_the_session_and_are_discarded_on_registration() {
        let server = get_test_server();

        let add_response = server.post(endpoints::ADD_EXPENSE).form(&coffee_form()).await;
        let session_cookie = add_response.cookie(COOKIE_SESSION_ID);

        let list_response = server
            .get(endpoints::ROOT)
            .add_cookie(session_cookie.clone())
            .await;
        list_response.assert_status_ok();
        assert_eq!(expense_row_count(&list_response), 1);

        let register_response = server
            .post(endpoints::REGISTER)
            .add_cookie(session_cookie.clone())
            .form(&RegisterForm {
                username: "alice".to_owned(),
                password: "iamtestingwhethericancreateanewuser".to_owned(),
                confirm_password: "iamtestingwhethericancreateanewuser".to_owned(),
            })
            .await;
        register_response.assert_status(StatusCode::SEE_OTHER);

        let list_response = server
            .get(endpoints::ROOT)
            .add_cookie(session_cookie)
            .add_cookie(register_response.cookie(COOKIE_USER_ID))
            .add_cookie(register_response.cookie(COOKIE_EXPIRY))
            .await;
        list_response.assert_status_ok();
        let document = scraper::Html::parse_document(&list_response.text());
        let guest_notice = Selector::parse("#guest-notice").unwrap();
        assert_eq!(
            document.select(&guest_notice).count(),
            0,
            "want the list of the newly registered user"
        );
        assert_eq!(expense_row_count(&list_response), 0);
    }

    #[tokio::test]
    async fn invalid_add_shows_form_errors() {
        let server = get_test_server();
        let form = ExpenseForm {
            amount: "-1".to_owned(),
            ..coffee_form()
        };

        let response = server.post(endpoints::ADD_EXPENSE).form(&form).await;

        response.assert_status_ok();
        let fragment = scraper::Html::parse_fragment(&response.text());
        let form = must_get_form(&fragment);
        let error = Selector::parse("p[data-error-for=\"amount\"]").unwrap();
        assert_eq!(form.select(&error).count(), 1);
        assert!(response.maybe_cookie(COOKIE_SESSION_ID).is_none());
    }

    #[tokio::test]
    async fn out_of_range_guest_edit_redirects_to_list() {
        let server = get_test_server();

        let response = server.get("/guest/edit/3").await;

        response.assert_status(StatusCode::SEE_OTHER);
        response.assert_header("location", endpoints::ROOT);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        let response = server.get("/does/not/exist").await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn pages_render() {
        let server = get_test_server();

        for endpoint in [
            endpoints::ADD_EXPENSE,
            endpoints::FILTER_VIEW,
            endpoints::REGISTER,
            endpoints::LOG_IN,
        ] {
            let response = server.get(endpoint).await;

            response.assert_status_ok();
            let document = scraper::Html::parse_document(&response.text());
            assert_valid_html(&document);
        }
    }
}
