//! Plain-text file backend.
//!
//! Illustrates the format contract a concrete backend may implement, not a
//! prescriptive wire format. Trash semantics are unsupported; this backend
//! reports those operations as unsupported.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use todoat_core::{Backend, Ctx, Error, List, ListId, Result, Task, TaskId, TaskStatus};

#[derive(Debug, Error, PartialEq)]
pub enum FileBackendError {
    #[error("line {line}: unrecognized status marker {marker:?}")]
    UnknownStatusMarker { line: usize, marker: String },
    #[error("line {line}: malformed due date {value:?}")]
    MalformedDate { line: usize, value: String },
    #[error("line {line}: task indentation does not align to a parent")]
    DanglingIndent { line: usize },
}

fn status_marker(status: TaskStatus) -> char {
    match status {
        TaskStatus::NeedsAction => ' ',
        TaskStatus::InProgress => '~',
        TaskStatus::Completed => 'x',
        TaskStatus::Cancelled => '-',
    }
}

fn parse_status_marker(marker: char) -> Option<TaskStatus> {
    match marker {
        ' ' => Some(TaskStatus::NeedsAction),
        '~' => Some(TaskStatus::InProgress),
        'x' | 'X' => Some(TaskStatus::Completed),
        '-' => Some(TaskStatus::Cancelled),
        _ => None,
    }
}

/// Epoch-seconds-at-UTC-midnight <-> `YYYY-MM-DD`. Avoids pulling in a
/// calendar crate for a format this narrow: valid range is the Gregorian
/// proleptic calendar via the civil_from_days algorithm (Howard Hinnant's
/// `days_from_civil`, the same math `chrono` uses internally).
mod date {
    pub fn parse(s: &str) -> Option<i64> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return None;
        }
        let year: i64 = parts[0].parse().ok()?;
        let month: u32 = parts[1].parse().ok()?;
        let day: u32 = parts[2].parse().ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(days_from_civil(year, month, day) * 86_400)
    }

    pub fn format(epoch_secs: i64) -> String {
        let days = epoch_secs.div_euclid(86_400);
        let (y, m, d) = civil_from_days(days);
        format!("{y:04}-{m:02}-{d:02}")
    }

    fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
        let y = if m <= 2 { y - 1 } else { y };
        let era = if y >= 0 { y } else { y - 399 } / 400;
        let yoe = (y - era * 400) as i64;
        let mp = (m as i64 + 9) % 12;
        let doy = (153 * mp + 2) / 5 + d as i64 - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146_097 + doe - 719_468
    }

    fn civil_from_days(z: i64) -> (i64, u32, u32) {
        let z = z + 719_468;
        let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
        let y = yoe + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
        let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
        (if m <= 2 { y + 1 } else { y }, m, d)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn round_trips_a_known_date() {
            let secs = parse("2024-06-15").unwrap();
            assert_eq!(format(secs), "2024-06-15");
        }
    }
}

/// Parse the plain-text format into lists with their tasks (document
/// order preserved, parent/child wired via indentation).
fn parse(text: &str) -> std::result::Result<Vec<(List, Vec<Task>)>, FileBackendError> {
    let mut result: Vec<(List, Vec<Task>)> = Vec::new();
    let mut stack: Vec<(usize, TaskId)> = Vec::new();

    for (line_no, raw_line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        if let Some(name) = raw_line.strip_prefix("## ") {
            result.push((
                List { id: ListId::new(), name: name.trim().to_string(), color: None, modified: 0, deleted_at: None },
                Vec::new(),
            ));
            stack.clear();
            continue;
        }

        let trimmed = raw_line.trim_start();
        if !trimmed.starts_with("- [") {
            continue;
        }
        let Some((list, tasks)) = result.last_mut() else {
            continue; // tasks before any `##` section are ignored
        };
        let list_id = list.id;

        let indent = raw_line.len() - trimmed.len();
        let depth = indent / 2;

        let marker_end = trimmed.find(']').ok_or(FileBackendError::UnknownStatusMarker {
            line: line_no,
            marker: trimmed.to_string(),
        })?;
        let marker = trimmed[3..marker_end].chars().next().unwrap_or(' ');
        let status = parse_status_marker(marker).ok_or_else(|| FileBackendError::UnknownStatusMarker {
            line: line_no,
            marker: marker.to_string(),
        })?;

        let rest = trimmed[marker_end + 1..].trim();
        let (summary, priority, due_date, categories) = parse_tokens(rest, line_no)?;

        while let Some(&(top_depth, _)) = stack.last() {
            if top_depth >= depth {
                stack.pop();
            } else {
                break;
            }
        }
        if depth > 0 && stack.is_empty() {
            return Err(FileBackendError::DanglingIndent { line: line_no });
        }
        let parent_id = stack.last().map(|&(_, id)| id);

        let task = Task {
            id: TaskId::new(),
            list_id,
            parent_id,
            summary,
            description: None,
            status,
            priority,
            due_date,
            start_date: None,
            completed_at: None,
            categories,
            created: 0,
            modified: 0,
        };
        stack.push((depth, task.id));
        tasks.push(task);
    }

    Ok(result)
}

fn parse_tokens(
    rest: &str,
    line_no: usize,
) -> std::result::Result<(String, u8, Option<i64>, String), FileBackendError> {
    let mut summary_words = Vec::new();
    let mut priority = 0u8;
    let mut due_date = None;
    let mut tags = Vec::new();

    for word in rest.split_whitespace() {
        if let Some(n) = word.strip_prefix('!') {
            if let Ok(n) = n.parse::<u8>() {
                priority = n;
                continue;
            }
        }
        if let Some(d) = word.strip_prefix('@') {
            match date::parse(d) {
                Some(secs) => {
                    due_date = Some(secs);
                    continue;
                }
                None => {
                    return Err(FileBackendError::MalformedDate { line: line_no, value: d.to_string() });
                }
            }
        }
        if let Some(tag) = word.strip_prefix('#') {
            tags.push(tag.to_string());
            continue;
        }
        summary_words.push(word);
    }

    Ok((summary_words.join(" "), priority, due_date, tags.join(",")))
}

fn serialize(lists: &[(List, Vec<Task>)]) -> String {
    let mut out = String::from("# Tasks\n");
    for (list, tasks) in lists {
        out.push('\n');
        out.push_str("## ");
        out.push_str(&list.name);
        out.push('\n');
        out.push('\n');
        let roots: Vec<&Task> = tasks.iter().filter(|t| t.parent_id.is_none()).collect();
        for root in roots {
            serialize_task(&mut out, tasks, root, 0);
        }
    }
    out
}

fn serialize_task(out: &mut String, all: &[Task], task: &Task, depth: usize) {
    out.push_str(&"  ".repeat(depth));
    out.push_str("- [");
    out.push(status_marker(task.status));
    out.push(']');
    out.push(' ');
    out.push_str(&task.summary);
    if task.priority > 0 {
        out.push_str(&format!(" !{}", task.priority));
    }
    if let Some(due) = task.due_date {
        out.push_str(&format!(" @{}", date::format(due)));
    }
    for tag in task.categories.split(',').filter(|t| !t.is_empty()) {
        out.push_str(&format!(" #{tag}"));
    }
    out.push('\n');

    for child in all.iter().filter(|t| t.parent_id == Some(task.id)) {
        serialize_task(out, all, child, depth + 1);
    }
}

fn would_cycle(tasks: &HashMap<TaskId, Task>, task_id: TaskId, mut new_parent: Option<TaskId>) -> bool {
    let mut seen = std::collections::HashSet::new();
    while let Some(parent) = new_parent {
        if parent == task_id || !seen.insert(parent) {
            return true;
        }
        new_parent = tasks.get(&parent).and_then(|t| t.parent_id);
    }
    false
}

struct Document {
    lists: Vec<List>,
    tasks: HashMap<ListId, HashMap<TaskId, Task>>,
}

/// A backend reading and writing the plain-text list/task format at a
/// single path. Holds the full document in memory and rewrites the whole
/// file on every mutation — acceptable for the small, local lists this
/// format targets.
pub struct FileBackend {
    path: PathBuf,
    document: Mutex<Document>,
    next_modified: AtomicI64,
}

impl FileBackend {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = match std::fs::read_to_string(&path) {
            Ok(contents) => Self::document_from_text(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Document { lists: Vec::new(), tasks: HashMap::new() },
            Err(e) => return Err(Error::Internal(format!("reading {}: {e}", path.display()))),
        };
        Ok(Self { path, document: Mutex::new(document), next_modified: AtomicI64::new(1) })
    }

    fn document_from_text(text: &str) -> Result<Document> {
        let parsed = parse(text).map_err(|e| Error::InvalidInput(format!("parsing task file: {e}")))?;
        let mut lists = Vec::new();
        let mut tasks = HashMap::new();
        for (list, list_tasks) in parsed {
            let mut by_id = HashMap::new();
            for task in list_tasks {
                by_id.insert(task.id, task);
            }
            tasks.insert(list.id, by_id);
            lists.push(list);
        }
        Ok(Document { lists, tasks })
    }

    fn flush(&self, document: &Document) -> Result<()> {
        let exportable: Vec<(List, Vec<Task>)> = document
            .lists
            .iter()
            .map(|list| {
                let mut tasks: Vec<Task> = document.tasks.get(&list.id).map(|m| m.values().cloned().collect()).unwrap_or_default();
                tasks.sort_by_key(|t| t.created);
                (list.clone(), tasks)
            })
            .collect();
        let text = serialize(&exportable);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Internal(e.to_string()))?;
        }
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, text).map_err(|e| Error::Internal(e.to_string()))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| Error::Internal(e.to_string()))?;
        Ok(())
    }

    fn next_modified(&self) -> i64 {
        self.next_modified.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FileBackend {
    fn id(&self) -> &'static str {
        "file"
    }

    async fn get_lists(&self, _ctx: &Ctx) -> Result<Vec<List>> {
        Ok(self.document.lock().lists.clone())
    }

    async fn get_list(&self, _ctx: &Ctx, id: &ListId) -> Result<Option<List>> {
        Ok(self.document.lock().lists.iter().find(|l| l.id == *id).cloned())
    }

    async fn get_list_by_name(&self, _ctx: &Ctx, name: &str) -> Result<Option<List>> {
        Ok(self.document.lock().lists.iter().find(|l| l.name_matches(name)).cloned())
    }

    async fn create_list(&self, _ctx: &Ctx, name: &str) -> Result<List> {
        let mut document = self.document.lock();
        if let Some(existing) = document.lists.iter().find(|l| l.name_matches(name)) {
            return Ok(existing.clone());
        }
        let list = List {
            id: ListId::new(),
            name: name.trim().to_string(),
            color: None,
            modified: self.next_modified(),
            deleted_at: None,
        };
        document.tasks.insert(list.id, HashMap::new());
        document.lists.push(list.clone());
        self.flush(&document)?;
        Ok(list)
    }

    async fn update_list(&self, _ctx: &Ctx, list: List) -> Result<List> {
        let mut document = self.document.lock();
        let Some(existing) = document.lists.iter_mut().find(|l| l.id == list.id) else {
            return Err(Error::NotFound("list".into()));
        };
        *existing = list.clone();
        self.flush(&document)?;
        Ok(list)
    }

    async fn delete_list(&self, _ctx: &Ctx, id: &ListId) -> Result<()> {
        let mut document = self.document.lock();
        let before = document.lists.len();
        document.lists.retain(|l| l.id != *id);
        if document.lists.len() == before {
            return Err(Error::NotFound("list".into()));
        }
        document.tasks.remove(id);
        self.flush(&document)?;
        Ok(())
    }

    // Trash ops: unsupported (default trait impls); this backend has no trash concept
    // that file-based backends report restore/purge as unsupported.

    async fn get_tasks(&self, _ctx: &Ctx, list_id: &ListId) -> Result<Vec<Task>> {
        let document = self.document.lock();
        let tasks = document.tasks.get(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        Ok(tasks.values().cloned().collect())
    }

    async fn get_task(&self, _ctx: &Ctx, list_id: &ListId, task_id: &TaskId) -> Result<Option<Task>> {
        let document = self.document.lock();
        let tasks = document.tasks.get(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        Ok(tasks.get(task_id).cloned())
    }

    async fn create_task(&self, _ctx: &Ctx, list_id: &ListId, mut task: Task) -> Result<Task> {
        task.validate()?;
        let mut document = self.document.lock();
        let tasks = document.tasks.get_mut(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        task.id = TaskId::new();
        task.list_id = *list_id;
        task.created = self.next_modified();
        task.modified = task.created;
        tasks.insert(task.id, task.clone());
        self.flush(&document)?;
        Ok(task)
    }

    async fn update_task(&self, _ctx: &Ctx, list_id: &ListId, mut task: Task) -> Result<Task> {
        task.validate()?;
        let mut document = self.document.lock();
        let tasks = document.tasks.get(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        if !tasks.contains_key(&task.id) {
            return Err(Error::NotFound("task".into()));
        }
        if would_cycle(tasks, task.id, task.parent_id) {
            return Err(Error::InvalidInput("cycle".into()));
        }
        task.modified = self.next_modified();
        document.tasks.get_mut(list_id).expect("checked above").insert(task.id, task.clone());
        self.flush(&document)?;
        Ok(task)
    }

    async fn delete_task(&self, _ctx: &Ctx, list_id: &ListId, task_id: &TaskId) -> Result<()> {
        let mut document = self.document.lock();
        let tasks = document.tasks.get_mut(list_id).ok_or_else(|| Error::NotFound("list".into()))?;
        tasks.remove(task_id).ok_or_else(|| Error::NotFound("task".into()))?;
        self.flush(&document)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
