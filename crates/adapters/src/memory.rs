use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use todoat_core::{Backend, Ctx, Error, List, ListId, Result, Task, TaskId};

struct State {
    lists: HashMap<ListId, List>,
    deleted_lists: HashMap<ListId, List>,
    tasks: HashMap<ListId, HashMap<TaskId, Task>>,
}

/// In-process reference backend with full trash semantics. Used by the
/// daemon's own tests and as the default backend in `--daemon-foreground`
/// smoke runs; never persists anything to disk.
pub struct MemoryBackend {
    state: Mutex<State>,
    force_offline: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                lists: HashMap::new(),
                deleted_lists: HashMap::new(),
                tasks: HashMap::new(),
            }),
            force_offline: AtomicBool::new(false),
        }
    }

    /// Test hook: make every subsequent call fail with `Error::Offline`
    /// until toggled back off. Used to drive the circuit-breaker and
    /// error-cutoff scenarios without a real network dependency.
    pub fn set_offline(&self, offline: bool) {
        self.force_offline.store(offline, Ordering::SeqCst);
    }

    fn check_offline(&self) -> Result<()> {
        if self.force_offline.load(Ordering::SeqCst) {
            Err(Error::Offline("forced by test harness".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn id(&self) -> &'static str {
        "memory"
    }

    async fn get_lists(&self, _ctx: &Ctx) -> Result<Vec<List>> {
        self.check_offline()?;
        Ok(self.state.lock().lists.values().cloned().collect())
    }

    async fn get_list(&self, _ctx: &Ctx, id: &ListId) -> Result<Option<List>> {
        self.check_offline()?;
        Ok(self.state.lock().lists.get(id).cloned())
    }

    async fn get_list_by_name(&self, _ctx: &Ctx, name: &str) -> Result<Option<List>> {
        self.check_offline()?;
        Ok(self.state.lock().lists.values().find(|l| l.name_matches(name)).cloned())
    }

    async fn create_list(&self, _ctx: &Ctx, name: &str) -> Result<List> {
        self.check_offline()?;
        let mut state = self.state.lock();
        if let Some(existing) = state.lists.values().find(|l| l.name_matches(name)) {
            return Ok(existing.clone());
        }
        let list = List {
            id: ListId::new(),
            name: name.trim().to_string(),
            color: None,
            modified: 0,
            deleted_at: None,
        };
        state.tasks.insert(list.id, HashMap::new());
        state.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn update_list(&self, _ctx: &Ctx, list: List) -> Result<List> {
        self.check_offline()?;
        let mut state = self.state.lock();
        if !state.lists.contains_key(&list.id) {
            return Err(Error::NotFound("list".into()));
        }
        state.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn delete_list(&self, _ctx: &Ctx, id: &ListId) -> Result<()> {
        self.check_offline()?;
        let mut state = self.state.lock();
        match state.lists.remove(id) {
            Some(mut list) => {
                list.deleted_at = Some(list.modified.max(1));
                state.deleted_lists.insert(*id, list);
                Ok(())
            }
            None => Err(Error::NotFound("list".into())),
        }
    }

    async fn get_deleted_lists(&self, _ctx: &Ctx) -> Result<Vec<List>> {
        self.check_offline()?;
        Ok(self.state.lock().deleted_lists.values().cloned().collect())
    }

    async fn get_deleted_list_by_name(&self, _ctx: &Ctx, name: &str) -> Result<Option<List>> {
        self.check_offline()?;
        Ok(self.state.lock().deleted_lists.values().find(|l| l.name_matches(name)).cloned())
    }

    async fn restore_list(&self, _ctx: &Ctx, id: &ListId) -> Result<List> {
        self.check_offline()?;
        let mut state = self.state.lock();
        match state.deleted_lists.remove(id) {
            Some(mut list) => {
                list.deleted_at = None;
                state.lists.insert(*id, list.clone());
                Ok(list)
            }
            None => Err(Error::NotFound("list".into())),
        }
    }

    async fn purge_list(&self, _ctx: &Ctx, id: &ListId) -> Result<()> {
        self.check_offline()?;
        let mut state = self.state.lock();
        state.tasks.remove(id);
        if state.deleted_lists.remove(id).is_none() {
            return Err(Error::NotFound("list".into()));
        }
        Ok(())
    }

    async fn get_tasks(&self, _ctx: &Ctx, list_id: &ListId) -> Result<Vec<Task>> {
        self.check_offline()?;
        let state = self.state.lock();
        let tasks = state.tasks.get(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        Ok(tasks.values().cloned().collect())
    }

    async fn get_task(&self, _ctx: &Ctx, list_id: &ListId, task_id: &TaskId) -> Result<Option<Task>> {
        self.check_offline()?;
        let state = self.state.lock();
        let tasks = state.tasks.get(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        Ok(tasks.get(task_id).cloned())
    }

    async fn create_task(&self, _ctx: &Ctx, list_id: &ListId, mut task: Task) -> Result<Task> {
        self.check_offline()?;
        task.validate()?;
        let mut state = self.state.lock();
        let tasks = state.tasks.get_mut(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        task.id = TaskId::new();
        task.list_id = *list_id;
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, _ctx: &Ctx, list_id: &ListId, task: Task) -> Result<Task> {
        self.check_offline()?;
        task.validate()?;
        let mut state = self.state.lock();
        let tasks = state.tasks.get_mut(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        if !tasks.contains_key(&task.id) {
            return Err(Error::NotFound("task".into()));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn delete_task(&self, _ctx: &Ctx, list_id: &ListId, task_id: &TaskId) -> Result<()> {
        self.check_offline()?;
        let mut state = self.state.lock();
        let tasks = state.tasks.get_mut(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        tasks.remove(task_id).map(|_| ()).ok_or_else(|| Error::NotFound("task".into()))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
