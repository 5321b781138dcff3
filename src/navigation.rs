//! This file defines the templates and a convenience function for creating the navigation bar.

use maud::{Markup, html};

use crate::{auth::Identity, endpoints};

/// Template for a link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        )
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
    is_guest: bool,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    /// Guests are offered links to log in and register, signed in users a
    /// link to log out.
    pub fn new(active_endpoint: &str, identity: &Identity) -> NavBar<'static> {
        let page_link = |url: &'static str, title: &'static str| Link {
            url,
            title,
            is_current: active_endpoint == url,
        };

        let mut links = vec![
            page_link(endpoints::ROOT, "Expenses"),
            page_link(endpoints::ADD_EXPENSE, "Add Expense"),
            page_link(endpoints::FILTER_VIEW, "Filter"),
        ];

        if identity.is_guest() {
            links.push(page_link(endpoints::LOG_IN, "Log in"));
            links.push(page_link(endpoints::REGISTER, "Register"));
        } else {
            links.push(Link {
                url: endpoints::LOG_OUT,
                title: "Log out",
                is_current: false,
            });
        }

        NavBar {
            links,
            is_guest: identity.is_guest(),
        }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Expense Tracker"
                        }
                    }

                    div class="w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in self.links {
                                li { (link.into_html()) }
                            }
                        }
                    }
                }
            }

            @if self.is_guest {
                div
                    id="guest-notice"
                    class="max-w-screen-xl mx-auto px-4 py-2 text-sm text-yellow-800
                    bg-yellow-50 rounded dark:bg-gray-800 dark:text-yellow-300"
                {
                    "You are using the app as a guest. Your expenses are kept until you close \
                    your browser and are not carried over when you register."
                }
            }
        )
    }
}
