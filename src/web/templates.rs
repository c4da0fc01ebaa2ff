//! HTML templates for the web views.
//!
//! Templates are embedded at compile time using `include_str!` and filled in
//! by [`super::views`] through `{{placeholder}}` substitution.

/// The page shell: title, notices, and body content.
pub const BASE_TEMPLATE: &str = include_str!("templates/base.html");

/// The login form with an optional inline error.
pub const LOGIN_TEMPLATE: &str = include_str!("templates/login.html");

/// The task list with the add form and the open and closed tables.
pub const TASKS_TEMPLATE: &str = include_str!("templates/tasks.html");
