// Task store: owns the collection, enforces invariants, persists after each change

use crate::error::TaskError;
use crate::filter::{Filter, PriorityFilter, StatusFilter};
use crate::models::{NewTask, Priority, Task, TaskPatch, now};
use crate::storage::{Storage, load_tasks, save_tasks};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

/// Description attached to tasks created from a suggestion
pub const SUGGESTION_DESCRIPTION: &str = "Suggested from your completed task patterns";

/// Aggregate counts over the whole collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Ordered task collection backed by a [`Storage`]
///
/// Newest tasks come first. Every mutation is validated up front, written to
/// storage as a full overwrite, and only then applied in memory.
pub struct TaskStore<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
}

impl<S: Storage> TaskStore<S> {
    /// Load the collection from `storage`
    ///
    /// Missing or malformed data starts an empty collection.
    pub fn open(storage: S) -> Self {
        let tasks = load_tasks(&storage);
        Self { storage, tasks }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// All tasks in display order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Result<&Task, TaskError> {
        self.position(id)
            .map(|index| &self.tasks[index])
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    /// Resolve a full id or an unambiguous prefix of one
    ///
    /// A blank prefix never matches.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<String, TaskError> {
        if prefix.trim().is_empty() {
            return Err(TaskError::NotFound(prefix.to_string()));
        }
        if self.contains(prefix) {
            return Ok(prefix.to_string());
        }

        let matches: Vec<&Task> = self.tasks.iter().filter(|task| task.id.starts_with(prefix)).collect();
        match matches.as_slice() {
            [task] => Ok(task.id.clone()),
            [] => Err(TaskError::NotFound(prefix.to_string())),
            _ => Err(TaskError::AmbiguousId {
                prefix: prefix.to_string(),
                count: matches.len(),
            }),
        }
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Create a task and place it at the front of the collection
    pub fn create(&mut self, input: NewTask) -> Result<Task, TaskError> {
        let title = Self::validate_title(&input.title)?;

        let task = Task {
            id: self.fresh_id(),
            title,
            description: input.description.as_deref().map(str::trim).unwrap_or_default().to_string(),
            due_date: input.due_date,
            priority: input.priority.unwrap_or_default(),
            completed: false,
            created_at: now(),
            completed_at: None,
        };

        let mut staged = Vec::with_capacity(self.tasks.len() + 1);
        staged.push(task.clone());
        staged.extend(self.tasks.iter().cloned());
        self.commit(staged)?;

        info!(id = %task.id, priority = %task.priority, "Created task");
        Ok(task)
    }

    /// Merge the supplied fields into an existing task
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task, TaskError> {
        let index = self.position(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        let title = patch.title.as_deref().map(Self::validate_title).transpose()?;

        let mut staged = self.tasks.clone();
        let task = &mut staged[index];
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description.trim().to_string();
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        let updated = task.clone();

        self.commit(staged)?;

        info!(id, "Updated task");
        Ok(updated)
    }

    /// Flip completion, stamping or clearing `completed_at`
    pub fn toggle_completion(&mut self, id: &str) -> Result<Task, TaskError> {
        let index = self.position(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        let mut staged = self.tasks.clone();
        let task = &mut staged[index];
        task.completed = !task.completed;
        task.completed_at = if task.completed { Some(now()) } else { None };
        let toggled = task.clone();

        self.commit(staged)?;

        info!(id, completed = toggled.completed, "Toggled task completion");
        Ok(toggled)
    }

    /// Remove a task, returning it
    ///
    /// Unconditional: asking the user for confirmation is up to the caller.
    pub fn delete(&mut self, id: &str) -> Result<Task, TaskError> {
        let index = self.position(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        let mut staged = self.tasks.clone();
        let removed = staged.remove(index);

        self.commit(staged)?;

        info!(id, "Deleted task");
        Ok(removed)
    }

    /// Create a medium-priority task from suggestion text
    pub fn add_suggestion(&mut self, suggestion: &str) -> Result<Task, TaskError> {
        self.create(
            NewTask::new(suggestion)
                .description(SUGGESTION_DESCRIPTION)
                .priority(Priority::Medium),
        )
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Tasks matching both filters, in collection order
    pub fn list(&self, status: StatusFilter, priority: PriorityFilter) -> Vec<&Task> {
        let filter = Filter::new(status, priority);
        self.tasks.iter().filter(|task| filter.matches(task)).collect()
    }

    pub fn stats(&self) -> Stats {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|task| task.completed).count();
        Stats {
            total,
            completed,
            pending: total - completed,
        }
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::now_v7().to_string();
            if !self.contains(&id) {
                return id;
            }
            debug!(id = %id, "Generated id already in use, retrying");
        }
    }

    fn validate_title(title: &str) -> Result<String, TaskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskError::Validation("title cannot be empty".to_string()));
        }
        Ok(title.to_string())
    }

    fn commit(&mut self, staged: Vec<Task>) -> Result<(), TaskError> {
        save_tasks(&mut self.storage, &staged)?;
        self.tasks = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, TASKS_KEY};
    use chrono::NaiveDate;
    use eyre::{Result, eyre};
    use std::collections::HashSet;

    fn store() -> TaskStore<MemoryStorage> {
        TaskStore::open(MemoryStorage::new())
    }

    fn assert_completion_invariant(store: &TaskStore<MemoryStorage>) {
        for task in store.tasks() {
            assert!(task.is_consistent(), "task {} breaks completion invariant", task.id);
        }
    }

    /// Storage that accepts reads and rejects every write
    #[derive(Default)]
    struct ReadOnlyStorage {
        inner: MemoryStorage,
    }

    impl Storage for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(eyre!("storage is read-only"))
        }
    }

    #[test]
    fn test_create_assigns_defaults() {
        let mut store = store();

        let task = store.create(NewTask::new("  Buy milk  ")).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "");
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.due_date.is_none());
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert!(!task.id.is_empty());
    }

    #[test]
    fn test_create_places_newest_first() {
        let mut store = store();
        let first = store.create(NewTask::new("First")).unwrap();
        let second = store.create(NewTask::new("Second")).unwrap();

        let ids: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[test]
    fn test_create_ids_are_unique() {
        let mut store = store();
        let mut seen = HashSet::new();

        for i in 0..50 {
            let task = store.create(NewTask::new(format!("Task {}", i))).unwrap();
            assert!(seen.insert(task.id));
        }
        assert_eq!(store.len(), 50);
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let mut store = store();
        store.create(NewTask::new("Existing")).unwrap();
        let before = store.tasks().to_vec();

        for title in ["", "   ", "\t\n"] {
            let err = store.create(NewTask::new(title)).unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn test_create_persists_collection() {
        let mut store = store();
        store.create(NewTask::new("Persist me")).unwrap();

        let raw = store.storage().get(TASKS_KEY).unwrap().unwrap();
        assert!(raw.contains("Persist me"));
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = store();
        let due = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let task = store
            .create(NewTask::new("Draft").description("first pass").due(due))
            .unwrap();

        let updated = store
            .update(&task.id, TaskPatch::default().title("Final").priority(Priority::High))
            .unwrap();

        assert_eq!(updated.id, task.id);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.description, "first pass");
        assert_eq!(updated.due_date, Some(due));
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(store.get(&task.id).unwrap(), &updated);
    }

    #[test]
    fn test_update_can_clear_due_date() {
        let mut store = store();
        let due = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let task = store.create(NewTask::new("Dated").due(due)).unwrap();

        let updated = store.update(&task.id, TaskPatch::default().due(None)).unwrap();
        assert!(updated.due_date.is_none());
    }

    #[test]
    fn test_update_rejects_blank_title() {
        let mut store = store();
        let task = store.create(NewTask::new("Keep")).unwrap();

        let err = store
            .update(&task.id, TaskPatch::default().title("  ").priority(Priority::High))
            .unwrap_err();
        assert!(err.is_validation());

        let stored = store.get(&task.id).unwrap();
        assert_eq!(stored.title, "Keep");
        assert_eq!(stored.priority, Priority::Medium);
    }

    #[test]
    fn test_update_missing_id() {
        let mut store = store();
        let err = store.update("nope", TaskPatch::default().title("x")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut store = store();
        let task = store.create(NewTask::new("Toggle me")).unwrap();

        let done = store.toggle_completion(&task.id).unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());
        assert_completion_invariant(&store);

        let undone = store.toggle_completion(&task.id).unwrap();
        assert!(!undone.completed);
        assert!(undone.completed_at.is_none());
        assert_completion_invariant(&store);
    }

    #[test]
    fn test_toggle_missing_id() {
        let mut store = store();
        assert!(store.toggle_completion("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_present_and_missing() {
        let mut store = store();
        let keep = store.create(NewTask::new("Keep")).unwrap();
        let gone = store.create(NewTask::new("Gone")).unwrap();

        let err = store.delete("nope").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.len(), 2);

        let removed = store.delete(&gone.id).unwrap();
        assert_eq!(removed.id, gone.id);
        assert_eq!(store.len(), 1);
        assert!(!store.contains(&gone.id));
        assert!(store.contains(&keep.id));

        assert!(store.delete(&gone.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_filters() {
        let mut store = store();
        let high = store.create(NewTask::new("High").priority(Priority::High)).unwrap();
        let low = store.create(NewTask::new("Low").priority(Priority::Low)).unwrap();
        let done_high = store.create(NewTask::new("Done high").priority(Priority::High)).unwrap();
        store.toggle_completion(&done_high.id).unwrap();

        let completed = store.list(StatusFilter::Completed, PriorityFilter::All);
        assert_eq!(completed.len(), 1);
        assert!(completed.iter().all(|t| t.completed));

        let highs: Vec<&str> = store
            .list(StatusFilter::All, Priority::High.into())
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(highs, vec![done_high.id.as_str(), high.id.as_str()]);

        let pending_low = store.list(StatusFilter::Pending, Priority::Low.into());
        assert_eq!(pending_low.len(), 1);
        assert_eq!(pending_low[0].id, low.id);

        assert_eq!(store.list(StatusFilter::All, PriorityFilter::All).len(), 3);
    }

    #[test]
    fn test_stats_add_up() {
        let mut store = store();
        assert_eq!(store.stats(), Stats::default());

        let a = store.create(NewTask::new("A")).unwrap();
        store.create(NewTask::new("B")).unwrap();
        store.create(NewTask::new("C")).unwrap();
        store.toggle_completion(&a.id).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.total, stats.completed + stats.pending);
    }

    #[test]
    fn test_reload_round_trip() {
        let mut store = store();
        let a = store.create(NewTask::new("A").priority(Priority::Low)).unwrap();
        store.create(NewTask::new("B").description("details")).unwrap();
        store.toggle_completion(&a.id).unwrap();

        let snapshot = store.tasks().to_vec();
        let reopened = TaskStore::open(store.storage().clone());
        assert_eq!(reopened.tasks(), snapshot.as_slice());
    }

    #[test]
    fn test_resolve_prefix() {
        let seeded = r#"[
            {"id":"abc-1","title":"First","createdAt":"2024-01-01T00:00:00Z"},
            {"id":"abc-2","title":"Second","createdAt":"2024-01-01T00:00:00Z"},
            {"id":"xyz-9","title":"Third","createdAt":"2024-01-01T00:00:00Z"}
        ]"#;
        let store = TaskStore::open(MemoryStorage::new().with(TASKS_KEY, seeded));

        // Full id and unique prefix
        assert_eq!(store.resolve_prefix("abc-2").unwrap(), "abc-2");
        assert_eq!(store.resolve_prefix("xy").unwrap(), "xyz-9");

        // Ambiguous prefix
        assert!(matches!(
            store.resolve_prefix("abc"),
            Err(TaskError::AmbiguousId { count: 2, .. })
        ));

        // Blank prefixes match nothing
        assert!(store.resolve_prefix("").unwrap_err().is_not_found());
        assert!(store.resolve_prefix("   ").unwrap_err().is_not_found());
        assert!(store.resolve_prefix("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_blank_prefix_does_not_delete_single_task() {
        let mut store = store();
        store.create(NewTask::new("Only task")).unwrap();

        let err = store.resolve_prefix("").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_suggestion() {
        let mut store = store();
        let task = store.add_suggestion("Organize your workspace").unwrap();

        assert_eq!(task.title, "Organize your workspace");
        assert_eq!(task.description, SUGGESTION_DESCRIPTION);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn test_storage_failure_leaves_state_unchanged() {
        let seeded = r#"[{"id":"1","title":"Seeded","createdAt":"2024-01-01T00:00:00Z"}]"#;
        let mut store = TaskStore::open(ReadOnlyStorage {
            inner: MemoryStorage::new().with(TASKS_KEY, seeded),
        });
        let before = store.tasks().to_vec();

        assert!(matches!(store.create(NewTask::new("New")), Err(TaskError::Storage(_))));
        assert!(matches!(store.toggle_completion("1"), Err(TaskError::Storage(_))));
        assert!(matches!(store.delete("1"), Err(TaskError::Storage(_))));
        assert!(matches!(
            store.update("1", TaskPatch::default().title("Changed")),
            Err(TaskError::Storage(_))
        ));

        assert_eq!(store.tasks(), before.as_slice());
    }
}
