//! Defines the route handler for the page that filters and totals expenses.

use std::collections::BTreeMap;

use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rust_decimal::Decimal;

use crate::{
    Error,
    auth::Identity,
    endpoints,
    expense::{
        filter::{FilterQuery, FilteredExpenses},
        list_page::{ExpenseState, expense_table},
        service::ExpenseService,
    },
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, link,
    },
    navigation::NavBar,
    session::Session,
};

const FILTER_TYPES: [(&str, &str); 3] = [("date", "Date"), ("month", "Month"), ("year", "Year")];

fn filter_form(query: &FilterQuery, categories: &[String]) -> Markup {
    let filter_type = query.filter_type.as_deref().unwrap_or_default();
    let filter_value = query.filter_value.as_deref().unwrap_or_default();
    let selected_category = query.category.as_deref().unwrap_or_default();

    html! {
        form
            method="get"
            action=(endpoints::FILTER_VIEW)
            class="w-full grid gap-4 md:grid-cols-4 items-end mb-6"
        {
            div
            {
                label for="filter_type" class=(FORM_LABEL_STYLE) { "Filter by" }

                select name="filter_type" id="filter_type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "No filter" }

                    @for (value, label) in FILTER_TYPES {
                        option value=(value) selected[value == filter_type] { (label) }
                    }
                }
            }

            div
            {
                label for="filter_value" class=(FORM_LABEL_STYLE) { "Value" }

                input
                    type="text"
                    name="filter_value"
                    id="filter_value"
                    placeholder="2024-01-31, 2024-01 or 2024"
                    value=(filter_value)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All categories" }

                    @for category in categories {
                        option value=(category) selected[*category == selected_category] { (category) }
                    }
                }
            }

            div class="flex gap-4 items-center"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
                (link(endpoints::FILTER_VIEW, "Clear"))
            }
        }
    }
}

fn category_totals_table(totals: &BTreeMap<String, Decimal>) -> Markup {
    html! {
        table id="category-totals" class="w-full text-sm text-left text-gray-500 dark:text-gray-400 mt-4"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class="px-6 py-4 text-right" { "Total" }
                }
            }

            tbody
            {
                @for (category, total) in totals {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (category) }
                        td class="px-6 py-4 text-right" { (format_currency(*total)) }
                    }
                }
            }
        }
    }
}

fn filter_view(identity: &Identity, query: &FilterQuery, filtered: &FilteredExpenses) -> Markup {
    let nav_bar = NavBar::new(endpoints::FILTER_VIEW, identity).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4 self-start" { "Filter Expenses" }

            (filter_form(query, &filtered.categories))

            @if let Some(error) = &filtered.error {
                p id="filter-error" class=(FORM_ERROR_STYLE) { (error) }
            }

            (expense_table(&filtered.entries))

            div class="w-full mt-4 space-y-2 text-right"
            {
                @if let Some(total) = filtered.total {
                    p class="text-lg font-semibold"
                    {
                        "Filtered total: "
                        span id="filtered-total" { (format_currency(total)) }
                    }
                }

                p class="text-lg"
                {
                    "All-time total: "
                    span id="all-time-total" { (format_currency(filtered.all_time_total)) }
                }
            }

            @if let Some(totals) = &filtered.category_totals {
                (category_totals_table(totals))
            }
        }
    };

    base("Filter Expenses", &content)
}

/// Renders the expenses that match the filter in the query string, with totals.
pub async fn get_filter_page(
    State(state): State<ExpenseState>,
    Extension(identity): Extension<Identity>,
    Extension(session): Extension<Session>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let mut session_data = session.lock()?;

    let filtered = ExpenseService::new(identity, &connection, &mut session_data).filter(&query)?;

    Ok(filter_view(&identity, &query, &filtered).into_response())
}
