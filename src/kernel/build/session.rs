use compact_str::CompactString;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use super::task::{Task, TaskGraph, TaskOutput};
use super::BuildError;
use crate::kernel::services::ports::BoxFuture;

type RunResult = Result<TaskOutput, BuildError>;

/// Per-session execution record of one task. Its result is computed once
/// and shared by every dependent.
#[derive(Debug)]
pub struct TaskRun {
    task: Arc<Task>,
    result: OnceCell<RunResult>,
}

impl TaskRun {
    fn new(task: Arc<Task>) -> Self {
        Self {
            task,
            result: OnceCell::new(),
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn result(&self) -> Option<&RunResult> {
        self.result.get()
    }
}

struct SessionInner {
    graph: Arc<TaskGraph>,
    runs: Mutex<FxHashMap<CompactString, Arc<TaskRun>>>,
}

impl SessionInner {
    fn ensure_run(&self, name: &str) -> Result<Arc<TaskRun>, BuildError> {
        let task = self
            .graph
            .get(name)
            .ok_or_else(|| BuildError::UnknownTask {
                name: name.to_string(),
            })?;
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        let run = runs
            .entry(CompactString::from(name))
            .or_insert_with(|| Arc::new(TaskRun::new(Arc::clone(task))));
        Ok(Arc::clone(run))
    }
}

/// One build invocation. Sessions never share results; create a new one for
/// every build.
#[derive(Clone)]
pub struct BuildSession {
    inner: Arc<SessionInner>,
}

impl BuildSession {
    pub fn new(graph: Arc<TaskGraph>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                graph,
                runs: Mutex::new(FxHashMap::default()),
            }),
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.inner.graph
    }

    /// Runs `name` after all of its transitive dependencies.
    ///
    /// Independent dependencies run concurrently. When any of them fails,
    /// `name`'s work is skipped and the failure is reported as
    /// [`BuildError::DependencyFailed`] naming the task it started from.
    pub async fn run(&self, name: &str) -> RunResult {
        self.inner.graph.validate(name)?;

        tracing::info!(task = name, "build started");
        let handle = tokio::spawn(execute(
            Arc::clone(&self.inner),
            CompactString::from(name),
        ));
        let result = match handle.await {
            Ok(result) => result,
            Err(_) => Err(BuildError::TaskPanicked {
                task: name.to_string(),
            }),
        };

        match &result {
            Ok(_) => tracing::info!(task = name, runs = self.run_count(), "build finished"),
            Err(err) => tracing::warn!(task = name, error = %err, "build failed"),
        }
        result
    }

    /// Number of distinct tasks this session has started.
    pub fn run_count(&self) -> usize {
        self.inner
            .runs
            .lock()
            .map(|runs| runs.len())
            .unwrap_or_else(|e| e.into_inner().len())
    }

    pub fn task_run(&self, name: &str) -> Option<Arc<TaskRun>> {
        let runs = self.inner.runs.lock().unwrap_or_else(|e| e.into_inner());
        runs.get(name).cloned()
    }
}

fn execute(inner: Arc<SessionInner>, name: CompactString) -> BoxFuture<RunResult> {
    Box::pin(async move {
        let run = inner.ensure_run(&name)?;
        run.result
            .get_or_init(|| run_task(Arc::clone(&inner), Arc::clone(&run)))
            .await
            .clone()
    })
}

async fn run_task(inner: Arc<SessionInner>, run: Arc<TaskRun>) -> RunResult {
    let task = &run.task;
    tracing::debug!(task = %task.name(), deps = task.dependencies().len(), "task started");

    let handles: Vec<_> = task
        .dependencies()
        .iter()
        .map(|dep| {
            let handle = tokio::spawn(execute(Arc::clone(&inner), dep.clone()));
            (dep.clone(), handle)
        })
        .collect();

    let mut failure = None;
    for (dep, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(_) => Err(BuildError::TaskPanicked {
                task: dep.to_string(),
            }),
        };
        if let Err(err) = outcome {
            if failure.is_none() {
                failure = Some(err.into_dependency_failure());
            }
        }
    }
    if let Some(err) = failure {
        tracing::warn!(task = %task.name(), error = %err, "task skipped");
        return Err(err);
    }

    // Work runs in its own task so a panic still settles the cell.
    let work = tokio::spawn({
        let run = Arc::clone(&run);
        async move { run.task.start().await }
    });
    let result = match work.await {
        Ok(outcome) => outcome.map_err(|message| BuildError::TaskFailed {
            task: task.name().to_string(),
            message,
        }),
        Err(_) => Err(BuildError::TaskPanicked {
            task: task.name().to_string(),
        }),
    };
    match &result {
        Ok(_) => tracing::debug!(task = %task.name(), "task finished"),
        Err(err) => tracing::warn!(task = %task.name(), error = %err, "task failed"),
    }
    result
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/build/session.rs"]
mod tests;
