// User-facing validation errors

use thiserror::Error;

/// Errors caused by user input rather than the environment
///
/// These travel inside `eyre::Report` like every other error; front ends
/// downcast to tell them apart from storage failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a task!")]
    EmptyText,

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("No task matches '{0}'")]
    UnknownTask(String),

    #[error("Task id '{0}' matches more than one task")]
    AmbiguousId(String),
}

/// Whether `report` carries a [`ValidationError`]
pub fn is_validation(report: &eyre::Report) -> bool {
    report.downcast_ref::<ValidationError>().is_some()
}
