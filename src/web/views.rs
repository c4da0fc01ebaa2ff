//! Server-side rendering of the login and task pages.

use super::templates;
use crate::types::{Task, TaskLists, priority_choices};

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Substitute `{{key}}` placeholders in one pass over the template.
///
/// Inserted values are never rescanned, so user text that happens to look
/// like a placeholder is left alone. Unknown keys are kept verbatim.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match values.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn render_flashes(flashes: &[String]) -> String {
    flashes
        .iter()
        .map(|msg| format!(r#"<div class="flash">{}</div>"#, html_escape(msg)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn layout(title: &str, flashes: &[String], content: &str) -> String {
    fill(
        templates::BASE_TEMPLATE,
        &[
            ("title", html_escape(title).as_str()),
            ("flashes", render_flashes(flashes).as_str()),
            ("content", content),
        ],
    )
}

/// Login page. `error` is the inline credential error, if any.
pub fn render_login(flashes: &[String], error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<div class="error"><strong>Error:</strong> {}</div>"#, html_escape(e)))
        .unwrap_or_default();
    let content = fill(templates::LOGIN_TEMPLATE, &[("error", error.as_str())]);
    layout("Login", flashes, &content)
}

fn task_row(task: &Task) -> String {
    let actions = if task.status.is_open() {
        format!(
            r#"<a href="/delete/{id}/">Delete</a> - <a href="/complete/{id}/">Mark as Complete</a>"#,
            id = task.task_id
        )
    } else {
        format!(r#"<a href="/delete/{}/">Delete</a>"#, task.task_id)
    };

    format!(
        r#"<tr data-task-id="{}"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
        task.task_id,
        html_escape(&task.name),
        html_escape(&task.due_date),
        task.priority,
        actions
    )
}

fn task_rows(tasks: &[Task], empty: &str) -> String {
    if tasks.is_empty() {
        return format!(r#"<tr class="empty"><td colspan="4">{}</td></tr>"#, empty);
    }
    tasks.iter().map(task_row).collect::<Vec<_>>().join("\n")
}

/// Task list page with the add form.
pub fn render_tasks(flashes: &[String], lists: &TaskLists) -> String {
    let priority_options = priority_choices()
        .map(|p| format!(r#"<option value="{0}">{0}</option>"#, p))
        .collect::<Vec<_>>()
        .join("\n");

    let content = fill(
        templates::TASKS_TEMPLATE,
        &[
            ("priority_options", priority_options.as_str()),
            ("open_rows", task_rows(&lists.open, "No open tasks").as_str()),
            ("closed_rows", task_rows(&lists.closed, "No closed tasks").as_str()),
        ],
    );
    layout("Tasks", flashes, &content)
}
