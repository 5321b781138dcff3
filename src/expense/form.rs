//! The form shared by the pages for adding and editing expenses.

use maud::{Markup, html};

use crate::{
    expense::validation::{ExpenseForm, ExpenseFormErrors},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, field_error, submit_button,
        text_input,
    },
};

/// What the expense form should say and where it should be sent.
pub struct ExpenseFormView<'a> {
    /// The endpoint the form is posted to.
    pub action: &'a str,
    pub heading: &'a str,
    pub submit_text: &'a str,
    /// The values to prefill the form with.
    pub form: &'a ExpenseForm,
    pub errors: &'a ExpenseFormErrors,
    /// The options for the category drop-down.
    pub categories: &'a [String],
}

/// Render the expense form.
///
/// The form replaces itself with the server's response, so a submission with
/// errors shows the same form again with a message under each bad field.
pub fn expense_form(view: &ExpenseFormView<'_>) -> Markup {
    let form = view.form;
    let errors = view.errors;

    html! {
        form
            id="expense-form"
            hx-post=(view.action)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { (view.heading) }

            (text_input("title", "Title", &form.title, true, errors.title.as_deref()))

            div
            {
                label
                    for="amount"
                    class=(FORM_LABEL_STYLE)
                {
                    "Amount"
                }

                // w-full needed to ensure input takes the full width when prefilled with a value
                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="number"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        value=(form.amount)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (field_error("amount", errors.amount.as_deref()))
            }

            div
            {
                label
                    for="date"
                    class=(FORM_LABEL_STYLE)
                {
                    "Date"
                }

                input
                    name="date"
                    id="date"
                    type="date"
                    value=(form.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error("date", errors.date.as_deref()))
            }

            (category_fields(form, errors, view.categories))

            div
            {
                label
                    for="description"
                    class=(FORM_LABEL_STYLE)
                {
                    "Description (optional)"
                }

                textarea
                    name="description"
                    id="description"
                    rows="3"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (form.description)
                }

                (field_error("description", errors.description.as_deref()))
            }

            (submit_button(view.submit_text, BUTTON_PRIMARY_STYLE))
        }
    }
}

fn category_fields(form: &ExpenseForm, errors: &ExpenseFormErrors, categories: &[String]) -> Markup {
    html! {
        div
        {
            label
                for="category"
                class=(FORM_LABEL_STYLE)
            {
                "Category"
            }

            select
                name="category"
                id="category"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Select a category" }

                @for category in categories {
                    option value=(category) selected[*category == form.category] { (category) }
                }
            }
        }

        div
        {
            label
                for="new_category"
                class=(FORM_LABEL_STYLE)
            {
                "Or create a new category"
            }

            input
                name="new_category"
                id="new_category"
                type="text"
                placeholder="e.g. Groceries"
                value=(form.new_category)
                class=(FORM_TEXT_INPUT_STYLE);

            (field_error("category", errors.category.as_deref()))
        }
    }
}
