// Error type for task store operations

/// Failures a caller can recover from by reporting a message and moving on.
/// State is never partially mutated when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("invalid task: {0}")]
    Validation(String),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("id prefix {prefix:?} matches {count} tasks")]
    AmbiguousId { prefix: String, count: usize },
    #[error("failed to persist tasks: {0:#}")]
    Storage(eyre::Report),
}

impl From<eyre::Report> for TaskError {
    fn from(report: eyre::Report) -> Self {
        TaskError::Storage(report)
    }
}

impl TaskError {
    pub fn is_validation(&self) -> bool {
        matches!(self, TaskError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskError::NotFound(_))
    }
}
