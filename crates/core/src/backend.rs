//! The uniform capability surface every backend implements.
//!
//! A "backend" is a concrete storage/provider adapter: local SQLite,
//! CalDAV, a vendor REST API, a plain-text file, or anything else behind
//! this trait. The daemon and CLI never name a backend by concrete type,
//! only by the string identifier resolved from config.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{List, ListId, Task, TaskId};

/// Cancellation/deadline context threaded through every operation.
///
/// Backends are expected to honor `is_cancelled` cooperatively; the daemon
/// cannot preempt a backend that ignores it, only out-wait it against
/// `task_timeout`.
#[derive(Clone)]
pub struct Ctx {
    cancelled: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl Ctx {
    pub fn new() -> Self {
        Self { cancelled: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)) }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(std::sync::atomic::Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, std::sync::atomic::Ordering::Relaxed);
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Self::new()
    }
}

/// The capability contract every backend satisfies.
///
/// Missing-entity queries return `Ok(None)`, never an error. Mutations on a
/// missing entity return `Error::NotFound`. `CreateList` is idempotent on
/// exact case-insensitive name match. A backend that cannot support the
/// trash operations returns `Error::Unsupported` for all four, and `Ok(vec![])`
/// / `Ok(None)` for the two "get deleted" queries.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable identifier used as the `backend` field in the list cache and
    /// as a config key (e.g. `"sqlite"`, `"file"`, `"caldav"`).
    fn id(&self) -> &'static str;

    async fn get_lists(&self, ctx: &Ctx) -> Result<Vec<List>>;
    async fn get_list(&self, ctx: &Ctx, id: &ListId) -> Result<Option<List>>;
    async fn get_list_by_name(&self, ctx: &Ctx, name: &str) -> Result<Option<List>>;
    async fn create_list(&self, ctx: &Ctx, name: &str) -> Result<List>;
    async fn update_list(&self, ctx: &Ctx, list: List) -> Result<List>;
    async fn delete_list(&self, ctx: &Ctx, id: &ListId) -> Result<()>;

    /// Returns `Error::Unsupported` on a backend without trash semantics.
    async fn get_deleted_lists(&self, ctx: &Ctx) -> Result<Vec<List>> {
        let _ = ctx;
        Err(crate::error::Error::Unsupported("trash".into()))
    }

    async fn get_deleted_list_by_name(&self, ctx: &Ctx, name: &str) -> Result<Option<List>> {
        let _ = (ctx, name);
        Err(crate::error::Error::Unsupported("trash".into()))
    }

    async fn restore_list(&self, ctx: &Ctx, id: &ListId) -> Result<List> {
        let _ = (ctx, id);
        Err(crate::error::Error::Unsupported("restore_list".into()))
    }

    async fn purge_list(&self, ctx: &Ctx, id: &ListId) -> Result<()> {
        let _ = (ctx, id);
        Err(crate::error::Error::Unsupported("purge_list".into()))
    }

    async fn get_tasks(&self, ctx: &Ctx, list_id: &ListId) -> Result<Vec<Task>>;
    async fn get_task(&self, ctx: &Ctx, list_id: &ListId, task_id: &TaskId) -> Result<Option<Task>>;
    async fn create_task(&self, ctx: &Ctx, list_id: &ListId, task: Task) -> Result<Task>;
    async fn update_task(&self, ctx: &Ctx, list_id: &ListId, task: Task) -> Result<Task>;
    async fn delete_task(&self, ctx: &Ctx, list_id: &ListId, task_id: &TaskId) -> Result<()>;

    /// Release any resources (connections, file handles) held by the
    /// backend. Called once, at CLI/daemon shutdown.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
