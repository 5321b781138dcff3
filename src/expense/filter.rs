//! Narrowing expenses down to a day, month or year and adding them up.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::expense::core::{CATEGORY_CHOICES, ExpenseEntry};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The query string of the filter page, e.g. `?filter_type=month&filter_value=2024-01&category=Food`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterQuery {
    /// One of "date", "month" or "year".
    pub filter_type: Option<String>,
    /// "YYYY-MM-DD", "YYYY-MM" or "YYYY" to match `filter_type`.
    pub filter_value: Option<String>,
    /// Only include expenses in this category.
    pub category: Option<String>,
}

impl FilterQuery {
    /// The date filter described by the query.
    ///
    /// Returns `Ok(None)` when the filter type or value is missing, in which
    /// case nothing should be filtered out.
    pub fn date_filter(&self) -> Result<Option<DateFilter>, FilterError> {
        match (non_empty(&self.filter_type), non_empty(&self.filter_value)) {
            (Some(filter_type), Some(filter_value)) => {
                DateFilter::parse(filter_type, filter_value).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// The category to restrict to, if one was picked.
    pub fn category(&self) -> Option<&str> {
        non_empty(&self.category)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Why the filter in a [FilterQuery] could not be understood.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// The filter type is not one of "date", "month" or "year".
    #[error("Unknown filter type \"{0}\". Choose date, month or year.")]
    UnknownType(String),
    /// The value could not be read as a "YYYY-MM-DD" date.
    #[error("\"{0}\" is not a valid date. Use the format YYYY-MM-DD.")]
    InvalidDate(String),
    /// The value could not be read as a "YYYY-MM" month.
    #[error("\"{0}\" is not a valid month. Use the format YYYY-MM.")]
    InvalidMonth(String),
    /// The value could not be read as a "YYYY" year.
    #[error("\"{0}\" is not a valid year. Use the format YYYY.")]
    InvalidYear(String),
}

/// Which dates an expense may have to be included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Exactly this date.
    Day(Date),
    /// Any day in this month.
    Month {
        /// The calendar year.
        year: i32,
        /// The month in `year`.
        month: Month,
    },
    /// Any day in this year.
    Year(i32),
}

impl DateFilter {
    /// Read a filter from the type and value in the query string.
    pub fn parse(filter_type: &str, filter_value: &str) -> Result<Self, FilterError> {
        let filter_value = filter_value.trim();

        match filter_type.trim() {
            "date" => Date::parse(filter_value, DATE_FORMAT)
                .map(DateFilter::Day)
                .map_err(|_| FilterError::InvalidDate(filter_value.to_owned())),
            "month" => {
                let invalid_month = || FilterError::InvalidMonth(filter_value.to_owned());
                let (year, month) = filter_value.split_once('-').ok_or_else(invalid_month)?;
                let year = parse_year(year).ok_or_else(invalid_month)?;
                let month = month
                    .parse::<u8>()
                    .ok()
                    .and_then(|month| Month::try_from(month).ok())
                    .ok_or_else(invalid_month)?;

                Ok(DateFilter::Month { year, month })
            }
            "year" => parse_year(filter_value)
                .map(DateFilter::Year)
                .ok_or_else(|| FilterError::InvalidYear(filter_value.to_owned())),
            other => Err(FilterError::UnknownType(other.to_owned())),
        }
    }

    /// Whether `date` falls within the filter.
    pub fn matches(&self, date: Date) -> bool {
        match *self {
            DateFilter::Day(day) => date == day,
            DateFilter::Month { year, month } => date.year() == year && date.month() == month,
            DateFilter::Year(year) => date.year() == year,
        }
    }

    /// The SQLite `strftime` format that reduces a date to the precision of the filter.
    pub fn strftime_format(&self) -> &'static str {
        match self {
            DateFilter::Day(_) => "%Y-%m-%d",
            DateFilter::Month { .. } => "%Y-%m",
            DateFilter::Year(_) => "%Y",
        }
    }

    /// The value that [DateFilter::strftime_format] must produce for a date to match.
    pub fn strftime_value(&self) -> String {
        match *self {
            DateFilter::Day(day) => format!(
                "{:04}-{:02}-{:02}",
                day.year(),
                u8::from(day.month()),
                day.day()
            ),
            DateFilter::Month { year, month } => format!("{year:04}-{:02}", u8::from(month)),
            DateFilter::Year(year) => format!("{year:04}"),
        }
    }
}

/// Years are limited to four digits so they line up with SQLite's `%Y`.
fn parse_year(raw_year: &str) -> Option<i32> {
    raw_year
        .parse::<i32>()
        .ok()
        .filter(|year| (1..=9999).contains(year))
}

/// The result of filtering a user's or guest's expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredExpenses {
    /// The expenses that passed the filter, or every expense if no filter was applied.
    pub entries: Vec<ExpenseEntry>,
    /// The sum of `entries`, only set when a filter was applied.
    pub total: Option<Decimal>,
    /// The sum of `entries` for each category, only set when a filter was applied.
    pub category_totals: Option<BTreeMap<String, Decimal>>,
    /// The sum of every expense, regardless of the filter.
    pub all_time_total: Decimal,
    /// The preset categories plus any the user made up, sorted.
    pub categories: Vec<String>,
    /// Set when the filter could not be understood and was ignored.
    pub error: Option<FilterError>,
}

/// Add up the amounts of `entries` per category.
pub fn category_totals(entries: &[ExpenseEntry]) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();

    for entry in entries {
        *totals
            .entry(entry.expense.category.clone())
            .or_insert(Decimal::ZERO) += entry.expense.amount;
    }

    totals
}

/// The sorted union of the preset categories and `used_categories`.
pub fn category_choices<I, S>(used_categories: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CATEGORY_CHOICES
        .iter()
        .map(|category| category.to_string())
        .chain(used_categories.into_iter().map(Into::into))
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}
