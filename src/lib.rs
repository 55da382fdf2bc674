// taskpad - Personal task tracking with local key-value persistence

pub mod config;
pub mod error;
pub mod filter;
pub mod insights;
pub mod models;
pub mod storage;
pub mod store;
pub mod theme;

// Re-export main types for convenience
pub use config::Config;
pub use error::TaskError;
pub use filter::{Filter, PriorityFilter, StatusFilter};
pub use insights::{DailySummary, FALLBACK_SUGGESTIONS, PREVIEW_LIMIT, Recommendation, TaskPatterns};
pub use models::{NewTask, Priority, Task, TaskPatch, now, parse_date, today};
pub use storage::{DirStorage, MemoryStorage, Storage, load_tasks, save_tasks};
pub use store::{Stats, TaskStore};
pub use theme::Theme;
