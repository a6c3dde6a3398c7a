//! List and Task data model.
//!
//! Implementers of [`crate::backend::Backend`] choose their own storage
//! record shapes; these types are the normalized form that crosses the
//! backend boundary and the wire.

use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::error::{Error, Result};

define_id! {
    /// Opaque list identifier, scoped to a single backend.
    pub struct ListId("lst-");
}

define_id! {
    /// Opaque task identifier, scoped to a single backend.
    pub struct TaskId("tsk-");
}

/// A task list. Identity is `id` within a backend; `name` is compared
/// case-insensitively for lookup (`GetListByName`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub modified: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl List {
    /// True if this list has been soft-deleted (tombstoned).
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Case-insensitive name comparison, used by `GetListByName`.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Task completion status. `NEEDS-ACTION` is the default for a freshly
/// created task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum TaskStatus {
    NeedsAction,
    InProgress,
    Completed,
    Cancelled,
}

crate::simple_display! {
    TaskStatus {
        NeedsAction => "NEEDS-ACTION",
        InProgress => "IN-PROGRESS",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::NeedsAction
    }
}

/// A single task. `parent_id` forms a DAG that callers are expected to keep
/// a tree (see [`Task::validate`]'s cycle check is the caller's
/// responsibility at parse time — this struct only validates its own
/// fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub list_id: ListId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    /// 0 = none, 1 = highest, 9 = lowest.
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Comma-separated category tags.
    #[serde(default)]
    pub categories: String,
    pub created: i64,
    pub modified: i64,
}

impl Task {
    /// Validate the field-level invariants:
    /// `start_date <= due_date` when both present, `priority in [0,9]`,
    /// summary non-empty. Does not check parent/child cycles — that
    /// requires walking the caller's full task set and is
    /// the responsibility of whatever assembles a task tree (e.g.
    /// `todoat-adapters`' file backend parser).
    pub fn validate(&self) -> Result<()> {
        if self.summary.trim().is_empty() {
            return Err(Error::InvalidInput("summary must not be empty".into()));
        }
        if self.priority > 9 {
            return Err(Error::InvalidInput("priority must be in [0,9]".into()));
        }
        if let (Some(start), Some(due)) = (self.start_date, self.due_date) {
            if start > due {
                return Err(Error::InvalidInput("start_date must not be after due_date".into()));
            }
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ListBuilder => List {
        into { name: String = "Test List" }
        set { modified: i64 = 0 }
        option {
            color: String = None,
            deleted_at: i64 = None,
        }
        computed { id: ListId = ListId::new() }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct TaskBuilder => Task {
        into {
            summary: String = "Test task",
            categories: String = "",
        }
        set {
            status: TaskStatus = TaskStatus::NeedsAction,
            priority: u8 = 0,
            created: i64 = 0,
            modified: i64 = 0,
        }
        option {
            description: String = None,
            due_date: i64 = None,
            start_date: i64 = None,
            completed_at: i64 = None,
            parent_id: TaskId = None,
        }
        computed {
            id: TaskId = TaskId::new(),
            list_id: ListId = ListId::new(),
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
