//! Turns the raw strings of a submitted expense form into a [ValidExpense].
//!
//! Every field is checked independently so that all problems can be reported
//! at once. Nothing here knows or cares where the expense will be stored.

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    database_id::ExpenseId,
    expense::core::{Expense, Owner},
};

/// The longest title an expense can have, in characters.
pub const TITLE_MAX_LENGTH: usize = 100;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The raw data entered by the user in the expense form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseForm {
    pub title: String,
    pub amount: String,
    pub date: String,
    /// The category picked from the drop-down.
    pub category: String,
    /// A category typed in by the user, takes priority over `category`.
    pub new_category: String,
    pub description: String,
}

impl From<&Expense> for ExpenseForm {
    fn from(expense: &Expense) -> Self {
        Self {
            title: expense.title.clone(),
            amount: expense.amount.to_string(),
            date: expense.date.format(DATE_FORMAT).unwrap_or_default(),
            category: expense.category.clone(),
            new_category: String::new(),
            description: expense.description.clone(),
        }
    }
}

/// The error message for each field of an [ExpenseForm] that failed validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFormErrors {
    /// The problem with the title.
    pub title: Option<String>,
    /// The problem with the amount.
    pub amount: Option<String>,
    /// The problem with the date.
    pub date: Option<String>,
    /// Covers both the category drop-down and the new category field.
    pub category: Option<String>,
    /// The problem with the description.
    pub description: Option<String>,
}

impl ExpenseFormErrors {
    /// Whether no field has an error.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.category.is_none()
            && self.description.is_none()
    }
}

impl Display for ExpenseFormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = [
            ("title", &self.title),
            ("amount", &self.amount),
            ("date", &self.date),
            ("category", &self.category),
            ("description", &self.description),
        ];

        let messages: Vec<String> = fields
            .iter()
            .filter_map(|(name, message)| message.as_ref().map(|message| format!("{name}: {message}")))
            .collect();

        write!(f, "{}", messages.join("; "))
    }
}

/// An expense whose fields have passed validation but has not been stored yet.
///
/// The fields are public so the database constraints can be tested without
/// going through [validate_expense].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidExpense {
    pub title: String,
    pub amount: Decimal,
    pub date: Date,
    pub category: String,
    pub description: String,
}

impl ValidExpense {
    /// Attach the storage details to the validated fields.
    pub fn into_expense(self, id: Option<ExpenseId>, owner: Owner) -> Expense {
        Expense {
            id,
            owner,
            title: self.title,
            amount: self.amount,
            date: self.date,
            category: self.category,
            description: self.description,
        }
    }
}

/// Check every field of `form`.
///
/// # Errors
///
/// Returns the error message for every field that failed, not just the first.
pub fn validate_expense(form: &ExpenseForm) -> Result<ValidExpense, ExpenseFormErrors> {
    let title = validate_title(&form.title);
    let amount = validate_amount(&form.amount);
    let date = validate_date(&form.date);
    let category = resolve_category(&form.category, &form.new_category);
    let description = validate_description(&form.description);

    match (title, amount, date, category, description) {
        (Ok(title), Ok(amount), Ok(date), Ok(category), Ok(description)) => Ok(ValidExpense {
            title,
            amount,
            date,
            category,
            description,
        }),
        (title, amount, date, category, description) => Err(ExpenseFormErrors {
            title: title.err(),
            amount: amount.err(),
            date: date.err(),
            category: category.err(),
            description: description.err(),
        }),
    }
}

fn validate_title(raw_title: &str) -> Result<String, String> {
    let title = raw_title.trim();

    if title.is_empty() {
        return Err("Title is required and cannot be blank or just spaces.".to_owned());
    }

    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(format!(
            "Title must be {TITLE_MAX_LENGTH} characters or less."
        ));
    }

    Ok(title.to_owned())
}

fn validate_amount(raw_amount: &str) -> Result<Decimal, String> {
    let raw_amount = raw_amount.trim();

    if raw_amount.is_empty() {
        return Err("Amount is required.".to_owned());
    }

    let amount = Decimal::from_str(raw_amount).map_err(|_| "Enter a number.".to_owned())?;

    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero.".to_owned());
    }

    if amount.normalize().scale() > 2 {
        return Err("Ensure that there are no more than 2 decimal places.".to_owned());
    }

    if amount.trunc() >= Decimal::from(100_000_000) {
        return Err(
            "Ensure that there are no more than 8 digits before the decimal point.".to_owned(),
        );
    }

    Ok(amount)
}

fn validate_date(raw_date: &str) -> Result<Date, String> {
    let raw_date = raw_date.trim();

    if raw_date.is_empty() {
        return Err("Date is required.".to_owned());
    }

    Date::parse(raw_date, DATE_FORMAT).map_err(|_| "Enter a valid date.".to_owned())
}

/// A typed in category overrides the one picked from the drop-down.
fn resolve_category(selected: &str, new_category: &str) -> Result<String, String> {
    if !new_category.is_empty() {
        let new_category = new_category.trim();

        return if new_category.is_empty() {
            Err("New category cannot be blank.".to_owned())
        } else {
            Ok(new_category.to_owned())
        };
    }

    let selected = selected.trim();

    if selected.is_empty() {
        Err("Category is required.".to_owned())
    } else {
        Ok(selected.to_owned())
    }
}

fn validate_description(raw_description: &str) -> Result<String, String> {
    let description = raw_description.trim();

    if !raw_description.is_empty() && description.is_empty() {
        return Err(
            "Description cannot be just spaces. Leave blank or enter valid text.".to_owned(),
        );
    }

    Ok(description.to_owned())
}

#[cfg(test)]
mod validate_expense_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use super::{ExpenseForm, ExpenseFormErrors, ValidExpense, validate_expense};

    fn valid_form() -> ExpenseForm {
        ExpenseForm {
            title: "Lunch".to_owned(),
            amount: "12.50".to_owned(),
            date: "2024-01-15".to_owned(),
            category: "Food".to_owned(),
            new_category: String::new(),
            description: String::new(),
        }
    }

    #[track_caller]
    fn must_fail(form: ExpenseForm) -> ExpenseFormErrors {
        validate_expense(&form).expect_err("want validation to fail")
    }

    #[test]
    fn accepts_valid_form() {
        let got = validate_expense(&valid_form()).unwrap();

        assert_eq!(
            got,
            ValidExpense {
                title: "Lunch".to_owned(),
                amount: dec!(12.50),
                date: date!(2024 - 01 - 15),
                category: "Food".to_owned(),
                description: String::new(),
            }
        );
    }

    #[test]
    fn trims_title_and_description() {
        let form = ExpenseForm {
            title: "  Lunch  ".to_owned(),
            description: "  with Sam ".to_owned(),
            ..valid_form()
        };

        let got = validate_expense(&form).unwrap();

        assert_eq!(got.title, "Lunch");
        assert_eq!(got.description, "with Sam");
    }

    #[test]
    fn rejects_blank_title() {
        for title in ["", "   "] {
            let errors = must_fail(ExpenseForm {
                title: title.to_owned(),
                ..valid_form()
            });

            assert_eq!(
                errors.title.as_deref(),
                Some("Title is required and cannot be blank or just spaces.")
            );
        }
    }

    #[test]
    fn title_length_counts_characters() {
        let form = ExpenseForm {
            title: "é".repeat(100),
            ..valid_form()
        };
        assert!(validate_expense(&form).is_ok());

        let errors = must_fail(ExpenseForm {
            title: "é".repeat(101),
            ..valid_form()
        });
        assert_eq!(
            errors.title.as_deref(),
            Some("Title must be 100 characters or less.")
        );
    }

    #[test]
    fn amount_errors() {
        let cases = [
            ("", "Amount is required."),
            ("  ", "Amount is required."),
            ("twelve", "Enter a number."),
            ("0", "Amount must be greater than zero."),
            ("-5", "Amount must be greater than zero."),
            ("1.234", "Ensure that there are no more than 2 decimal places."),
            (
                "100000000",
                "Ensure that there are no more than 8 digits before the decimal point.",
            ),
        ];

        for (amount, want) in cases {
            let errors = must_fail(ExpenseForm {
                amount: amount.to_owned(),
                ..valid_form()
            });

            assert_eq!(errors.amount.as_deref(), Some(want), "amount {amount:?}");
        }
    }

    #[test]
    fn amount_is_not_rounded() {
        let form = ExpenseForm {
            amount: "0.01".to_owned(),
            ..valid_form()
        };

        assert_eq!(validate_expense(&form).unwrap().amount, dec!(0.01));

        let form = ExpenseForm {
            amount: "99999999.99".to_owned(),
            ..valid_form()
        };

        assert_eq!(validate_expense(&form).unwrap().amount, dec!(99999999.99));
    }

    #[test]
    fn date_errors() {
        let errors = must_fail(ExpenseForm {
            date: String::new(),
            ..valid_form()
        });
        assert_eq!(errors.date.as_deref(), Some("Date is required."));

        let errors = must_fail(ExpenseForm {
            date: "2024-02-30".to_owned(),
            ..valid_form()
        });
        assert_eq!(errors.date.as_deref(), Some("Enter a valid date."));
    }

    #[test]
    fn new_category_overrides_selection() {
        let form = ExpenseForm {
            category: "Food".to_owned(),
            new_category: "Groceries".to_owned(),
            ..valid_form()
        };

        assert_eq!(validate_expense(&form).unwrap().category, "Groceries");
    }

    #[test]
    fn new_category_is_trimmed() {
        let form = ExpenseForm {
            new_category: "  Pets ".to_owned(),
            ..valid_form()
        };

        assert_eq!(validate_expense(&form).unwrap().category, "Pets");
    }

    #[test]
    fn blank_new_category_is_rejected() {
        let errors = must_fail(ExpenseForm {
            new_category: "   ".to_owned(),
            ..valid_form()
        });

        assert_eq!(
            errors.category.as_deref(),
            Some("New category cannot be blank.")
        );
    }

    #[test]
    fn category_is_required() {
        let errors = must_fail(ExpenseForm {
            category: String::new(),
            ..valid_form()
        });

        assert_eq!(errors.category.as_deref(), Some("Category is required."));
    }

    #[test]
    fn whitespace_description_is_rejected() {
        let errors = must_fail(ExpenseForm {
            description: "   ".to_owned(),
            ..valid_form()
        });

        assert_eq!(
            errors.description.as_deref(),
            Some("Description cannot be just spaces. Leave blank or enter valid text.")
        );
    }

    #[test]
    fn reports_every_failing_field() {
        let errors = must_fail(ExpenseForm::default());

        assert!(errors.title.is_some());
        assert!(errors.amount.is_some());
        assert!(errors.date.is_some());
        assert!(errors.category.is_some());
        assert!(errors.description.is_none());
        assert!(!errors.is_empty());
    }

    #[test]
    fn errors_display_names_fields() {
        let errors = must_fail(ExpenseForm {
            title: String::new(),
            ..valid_form()
        });

        assert_eq!(
            errors.to_string(),
            "title: Title is required and cannot be blank or just spaces."
        );
    }
}
