//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/edit/{expense_id}', use [format_endpoint].

/// The expense list, the landing page for both guests and registered users.
pub const ROOT: &str = "/";
/// The page and form target for adding an expense.
pub const ADD_EXPENSE: &str = "/add";
/// The page and form target for editing a stored expense.
pub const EDIT_EXPENSE: &str = "/edit/{expense_id}";
/// The confirmation page and form target for deleting a stored expense.
pub const DELETE_EXPENSE: &str = "/delete/{expense_id}";
/// The page and form target for editing a guest expense by its position.
pub const EDIT_GUEST_EXPENSE: &str = "/guest/edit/{index}";
/// The confirmation page and form target for deleting a guest expense by its position.
pub const DELETE_GUEST_EXPENSE: &str = "/guest/delete/{index}";
/// The page for filtering expenses and showing totals.
pub const FILTER_VIEW: &str = "/filter";
/// The page and form target for registering a new account.
pub const REGISTER: &str = "/register";
/// The page and form target for logging in.
pub const LOG_IN: &str = "/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/log_out";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/edit/{expense_id}', '{expense_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
