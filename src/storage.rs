// Key-value persistence for the task collection and front-end preferences

use crate::models::Task;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Key holding the JSON array of tasks
pub const TASKS_KEY: &str = "tasks";

/// Key holding the `light`/`dark` preference
pub const THEME_KEY: &str = "theme";

/// Minimal local key-value store, the shape of browser local storage
pub trait Storage {
    /// Read the value stored under `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory storage, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value directly, bypassing the task contract
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed storage: one file per key
///
/// `tasks` lives in `tasks.json`; other keys are stored under their own name.
pub struct DirStorage {
    base_path: PathBuf,
}

impl DirStorage {
    /// Open or create storage rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create data directory")?;
        debug!(path = ?base_path, "DirStorage::open");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        let file_name = if key == TASKS_KEY {
            format!("{}.json", key)
        } else {
            key.to_string()
        };
        Ok(self.base_path.join(file_name))
    }

    fn write_replace(tmp_path: &Path, path: &Path, value: &str) -> Result<()> {
        let mut file = File::create(tmp_path).context("Failed to create temporary file")?;
        file.write_all(value.as_bytes()).context("Failed to write temporary file")?;
        file.sync_all().context("Failed to sync temporary file")?;
        drop(file);
        fs::rename(tmp_path, path).with_context(|| format!("Failed to replace {:?}", path))?;
        Ok(())
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(eyre!("Storage key cannot be empty"));
        }
        if key.len() > 64 {
            return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
        }
        if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
        }
        Ok(())
    }
}

impl Storage for DirStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let lock_path = self.base_path.join(".lock");

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .context("Failed to open lock file")?;

        // Acquire exclusive lock before writing
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let tmp_path = path.with_extension("tmp");
        if let Err(e) = Self::write_replace(&tmp_path, &path, value) {
            if tmp_path.exists() {
                if let Err(cleanup) = fs::remove_file(&tmp_path) {
                    warn!(path = ?tmp_path, error = ?cleanup, "Failed to remove temporary file");
                }
            }
            return Err(e);
        }

        debug!(key, bytes = value.len(), "DirStorage::set");
        // Lock is released when `lock` is dropped
        Ok(())
    }
}

/// Load the task collection from `storage`
///
/// Absent or unparseable data yields an empty collection. Elements that fail
/// to parse, have a blank title, repeat an earlier id, or disagree on
/// `completed`/`completedAt` are skipped with a warning.
pub fn load_tasks<S: Storage + ?Sized>(storage: &S) -> Vec<Task> {
    let raw = match storage.get(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored tasks, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = ?e, "Failed to read stored tasks, starting empty");
            return Vec::new();
        }
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(values) => values,
        Err(e) => {
            warn!(error = ?e, "Stored tasks are not a JSON array, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        let task: Task = match serde_json::from_value(value) {
            Ok(t) => t,
            Err(e) => {
                warn!(index, error = ?e, "Failed to parse stored task, skipping");
                continue;
            }
        };

        if task.title.trim().is_empty() {
            warn!(index, id = %task.id, "Stored task has empty title, skipping");
            continue;
        }
        if !task.is_consistent() {
            warn!(index, id = %task.id, "Stored task has inconsistent completion state, skipping");
            continue;
        }
        if !seen.insert(task.id.clone()) {
            warn!(index, id = %task.id, "Duplicate task id, skipping");
            continue;
        }

        tasks.push(task);
    }

    info!(count = tasks.len(), "Loaded tasks");
    tasks
}

/// Overwrite the stored collection with `tasks`
pub fn save_tasks<S: Storage + ?Sized>(storage: &mut S, tasks: &[Task]) -> Result<()> {
    let json = serde_json::to_string(tasks).context("Failed to serialize tasks")?;
    storage.set(TASKS_KEY, &json)?;
    debug!(count = tasks.len(), "Saved tasks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, now};
    use tempfile::TempDir;

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            due_date: None,
            priority: Priority::Medium,
            completed: false,
            created_at: now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_memory_storage_get_set() {
        let mut storage = MemoryStorage::new();
        assert!(storage.get("theme").unwrap().is_none());

        storage.set("theme", "dark").unwrap();
        assert_eq!(storage.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_dir_storage_creates_files() {
        let temp = TempDir::new().unwrap();
        let mut storage = DirStorage::open(temp.path().join("data")).unwrap();

        storage.set(TASKS_KEY, "[]").unwrap();
        storage.set(THEME_KEY, "dark").unwrap();

        let base = temp.path().join("data");
        assert_eq!(fs::read_to_string(base.join("tasks.json")).unwrap(), "[]");
        assert_eq!(fs::read_to_string(base.join("theme")).unwrap(), "dark");
        assert!(!base.join("tasks.tmp").exists());

        assert_eq!(storage.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert!(storage.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_dir_storage_rejects_bad_keys() {
        let temp = TempDir::new().unwrap();
        let mut storage = DirStorage::open(temp.path()).unwrap();

        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.set("", "x").is_err());
        assert!(storage.get(&"k".repeat(65)).is_err());
    }

    #[test]
    fn test_dir_storage_failed_replace_removes_temp_file() {
        let temp = TempDir::new().unwrap();
        let mut storage = DirStorage::open(temp.path()).unwrap();

        // A non-empty directory where tasks.json should be makes the rename fail
        let blocker = temp.path().join("tasks.json");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        let err = storage.set(TASKS_KEY, "[]").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to replace"));
        assert!(!temp.path().join("tasks.tmp").exists());
        assert!(blocker.is_dir());
    }

    #[test]
    fn test_load_tasks_absent_key() {
        let storage = MemoryStorage::new();
        assert!(load_tasks(&storage).is_empty());
    }

    #[test]
    fn test_load_tasks_invalid_json() {
        let storage = MemoryStorage::new().with(TASKS_KEY, "{not json");
        assert!(load_tasks(&storage).is_empty());

        let storage = MemoryStorage::new().with(TASKS_KEY, r#"{"id":"1"}"#);
        assert!(load_tasks(&storage).is_empty());
    }

    #[test]
    fn test_load_tasks_skips_bad_elements() {
        let raw = r#"[
            {"id":"1","title":"Keep me","createdAt":"2024-01-01T00:00:00Z"},
            {"id":"2","title":"   ","createdAt":"2024-01-01T00:00:00Z"},
            {"id":"3","title":"Broken","createdAt":"not a date"},
            {"id":"1","title":"Duplicate","createdAt":"2024-01-01T00:00:00Z"},
            {"id":"4","title":"Half done","completed":true,"createdAt":"2024-01-01T00:00:00Z"},
            {"id":"5","title":"Also keep","priority":"high","createdAt":"2024-01-02T00:00:00Z"}
        ]"#;
        let storage = MemoryStorage::new().with(TASKS_KEY, raw);

        let tasks = load_tasks(&storage);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);
        assert_eq!(tasks[0].title, "Keep me");
        assert_eq!(tasks[1].priority, Priority::High);
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let mut storage = MemoryStorage::new();
        let tasks = vec![task("b", "Second"), task("a", "First"), task("c", "Third")];

        save_tasks(&mut storage, &tasks).unwrap();
        let loaded = load_tasks(&storage);
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn test_save_then_load_through_directory() {
        let temp = TempDir::new().unwrap();
        let tasks = vec![task("x", "On disk")];

        {
            let mut storage = DirStorage::open(temp.path()).unwrap();
            save_tasks(&mut storage, &tasks).unwrap();
        }

        let storage = DirStorage::open(temp.path()).unwrap();
        assert_eq!(load_tasks(&storage), tasks);
    }
}
