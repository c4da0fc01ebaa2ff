//! Task CRUD operations.
//!
//! Each operation runs a single statement on its own connection. Lookups by
//! id are parameter bound and never report a missing row as an error: the
//! affected-row count is returned so callers can decide what to tell the
//! user.

use super::Database;
use crate::error::AppError;
use crate::types::{NewTask, Priority, Task, TaskLists, TaskStatus};
use anyhow::Result;
use rusqlite::{Row, params};

/// Example rows inserted by `init-db --seed`.
pub const SEED_TASKS: [(&str, &str, Priority); 2] = [
    ("Complete this application", "09/30/2014", 10),
    ("Complete portfolio show reel", "09/30/2014", 10),
];

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: i64 = row.get("status")?;
    Ok(Task {
        task_id: row.get("task_id")?,
        name: row.get("name")?,
        due_date: row.get("due_date")?,
        priority: row.get("priority")?,
        status: TaskStatus::from_db(status),
    })
}

/// Presence check for the add form, then priority parsing.
///
/// Empty means empty after trimming whitespace. The stored values are kept
/// exactly as submitted.
fn validate_new_task(input: &NewTask) -> std::result::Result<Priority, AppError> {
    for (field, value) in [
        ("name", &input.name),
        ("due_date", &input.due_date),
        ("priority", &input.priority),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::missing_field(field));
        }
    }

    input
        .priority
        .trim()
        .parse::<Priority>()
        .map_err(|_| AppError::invalid_value("priority", "Priority must be a whole number."))
}

impl Database {
    /// All tasks, partitioned into open and closed, in `task_id` order.
    pub fn list_tasks(&self) -> Result<TaskLists> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT task_id, name, due_date, priority, status FROM tasks ORDER BY task_id",
            )?;
            let rows = stmt.query_map([], parse_task_row)?;

            let mut lists = TaskLists::default();
            for task in rows {
                let task = task?;
                if task.status.is_open() {
                    lists.open.push(task);
                } else {
                    lists.closed.push(task);
                }
            }
            Ok(lists)
        })
    }

    /// Insert an open task. Fails with a validation [`AppError`] and touches
    /// nothing if a field is empty or the priority is not an integer.
    pub fn add_task(&self, input: &NewTask) -> Result<Task> {
        let priority = validate_new_task(input)?;

        let task_id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (name, due_date, priority, status) VALUES (?1, ?2, ?3, ?4)",
                params![
                    input.name,
                    input.due_date,
                    priority,
                    TaskStatus::Open.as_db()
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        tracing::info!(task_id, name = %input.name, "Task added");

        Ok(Task {
            task_id,
            name: input.name.clone(),
            due_date: input.due_date.clone(),
            priority,
            status: TaskStatus::Open,
        })
    }

    /// Mark a task closed. Returns the number of rows matched (0 or 1).
    ///
    /// Completing an already closed task matches the row again and leaves
    /// it unchanged.
    pub fn complete_task(&self, task_id: i64) -> Result<usize> {
        let affected = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE tasks SET status = ?1 WHERE task_id = ?2",
                params![TaskStatus::Closed.as_db(), task_id],
            )?)
        })?;

        if affected == 0 {
            tracing::warn!(task_id, "Complete requested for unknown task");
        } else {
            tracing::info!(task_id, "Task completed");
        }
        Ok(affected)
    }

    /// Permanently remove a task in either status. Returns the number of
    /// rows removed (0 or 1).
    pub fn delete_task(&self, task_id: i64) -> Result<usize> {
        let affected = self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM tasks WHERE task_id = ?1",
                params![task_id],
            )?)
        })?;

        if affected == 0 {
            tracing::warn!(task_id, "Delete requested for unknown task");
        } else {
            tracing::info!(task_id, "Task deleted");
        }
        Ok(affected)
    }

    /// Insert the example rows if the table is empty. Returns how many rows
    /// were inserted.
    pub fn seed_example_tasks(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: i64 = tx.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            if existing > 0 {
                return Ok(0);
            }

            for (name, due_date, priority) in SEED_TASKS {
                tx.execute(
                    "INSERT INTO tasks (name, due_date, priority, status) VALUES (?1, ?2, ?3, ?4)",
                    params![name, due_date, priority, TaskStatus::Open.as_db()],
                )?;
            }

            tx.commit()?;
            Ok(SEED_TASKS.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ALL_FIELDS_REQUIRED, ErrorCode};

    #[test]
    fn validate_accepts_complete_input() {
        let input = NewTask::new("Buy milk", "09/30/2014", "5");
        assert_eq!(validate_new_task(&input).unwrap(), 5);
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let err = validate_new_task(&NewTask::new("", "", "")).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("name"));

        let err = validate_new_task(&NewTask::new("x", "  ", "3")).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert_eq!(err.field.as_deref(), Some("due_date"));
        assert_eq!(err.message, ALL_FIELDS_REQUIRED);

        let err = validate_new_task(&NewTask::new("x", "01/01/2020", "")).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("priority"));
    }

    #[test]
    fn validate_rejects_non_numeric_priority() {
        let err = validate_new_task(&NewTask::new("x", "01/01/2020", "high")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("priority"));
    }

    #[test]
    fn validate_does_not_enforce_priority_range() {
        let input = NewTask::new("x", "01/01/2020", "42");
        assert_eq!(validate_new_task(&input).unwrap(), 42);
    }
}
