//! 构建任务图
//!
//! A [`TaskGraph`] declares named async tasks and their dependencies; a
//! [`BuildSession`] executes one build over it, running each reachable task
//! at most once.

pub mod session;
pub mod task;

use std::fmt;

pub use session::{BuildSession, TaskRun};
pub use task::{Task, TaskGraph, TaskOutput, TaskResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    UnknownTask { name: String },
    Cycle { path: Vec<String> },
    /// The task's own work reported a failure.
    TaskFailed { task: String, message: String },
    /// A transitive dependency failed; `task` names the one that originated it.
    DependencyFailed { task: String, message: String },
    TaskPanicked { task: String },
}

impl BuildError {
    /// How a dependency's failure is reported to the task that waited on it.
    pub(crate) fn into_dependency_failure(self) -> BuildError {
        match self {
            BuildError::TaskFailed { task, message } => {
                BuildError::DependencyFailed { task, message }
            }
            BuildError::TaskPanicked { task } => BuildError::DependencyFailed {
                task,
                message: "task panicked".to_string(),
            },
            other => other,
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownTask { name } => write!(f, "unknown task \"{}\"", name),
            BuildError::Cycle { path } => {
                write!(f, "dependency cycle: {}", path.join(" -> "))
            }
            BuildError::TaskFailed { task, message } => {
                write!(f, "task \"{}\" failed: {}", task, message)
            }
            BuildError::DependencyFailed { task, message } => {
                write!(f, "dependency \"{}\" failed: {}", task, message)
            }
            BuildError::TaskPanicked { task } => write!(f, "task \"{}\" panicked", task),
        }
    }
}

impl std::error::Error for BuildError {}
