//! Core types for the task list.

use serde::{Deserialize, Serialize};

/// Task priority as an integer. The add form offers 1 through 10.
pub type Priority = i64;

/// Lowest priority offered by the add form.
pub const PRIORITY_MIN: Priority = 1;

/// Highest priority offered by the add form.
pub const PRIORITY_MAX: Priority = 10;

/// Priorities offered by the add form's select box.
pub fn priority_choices() -> impl Iterator<Item = Priority> {
    PRIORITY_MIN..=PRIORITY_MAX
}

/// Task status as stored in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    Closed,
}

impl TaskStatus {
    /// Integer representation used in the database.
    pub fn as_db(self) -> i64 {
        match self {
            TaskStatus::Open => 1,
            TaskStatus::Closed => 0,
        }
    }

    /// Parse the database integer. Anything other than `1` is closed.
    pub fn from_db(value: i64) -> Self {
        if value == 1 {
            TaskStatus::Open
        } else {
            TaskStatus::Closed
        }
    }

    pub fn is_open(self) -> bool {
        self == TaskStatus::Open
    }
}

/// A row of the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: i64,
    pub name: String,
    /// Due date as entered, `mm/dd/yyyy`.
    pub due_date: String,
    pub priority: Priority,
    pub status: TaskStatus,
}

/// Input for creating a task, as submitted by the add form.
///
/// Fields stay as raw strings so the presence check can run before any
/// parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub priority: String,
}

impl NewTask {
    pub fn new(
        name: impl Into<String>,
        due_date: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            due_date: due_date.into(),
            priority: priority.into(),
        }
    }
}

/// All tasks partitioned by status, in storage order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskLists {
    pub open: Vec<Task>,
    pub closed: Vec<Task>,
}

impl TaskLists {
    /// Look up a task in either list.
    pub fn find(&self, task_id: i64) -> Option<&Task> {
        self.open
            .iter()
            .chain(self.closed.iter())
            .find(|t| t.task_id == task_id)
    }

    pub fn len(&self) -> usize {
        self.open.len() + self.closed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty() && self.closed.is_empty()
    }
}
