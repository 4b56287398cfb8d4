use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::BuildError;
use crate::kernel::services::ports::BoxFuture;

pub type TaskOutput = serde_json::Value;
pub type TaskResult = Result<TaskOutput, String>;

type TaskWork = Arc<dyn Fn() -> BoxFuture<TaskResult> + Send + Sync>;

pub struct Task {
    name: CompactString,
    dependencies: Vec<CompactString>,
    work: TaskWork,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[CompactString] {
        &self.dependencies
    }

    pub(crate) fn start(&self) -> BoxFuture<TaskResult> {
        (self.work)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Declared build steps keyed by name. Dependencies are resolved by name when
/// a session runs, so tasks may be declared in any order.
#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks: FxHashMap<CompactString, Arc<Task>>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name`. Re-declaring a name replaces the earlier task.
    pub fn task<F, Fut>(&mut self, name: &str, dependencies: &[&str], work: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        let work: TaskWork = Arc::new(move || -> BoxFuture<TaskResult> { Box::pin(work()) });
        let task = Task {
            name: CompactString::from(name),
            dependencies: dependencies.iter().map(|d| CompactString::from(*d)).collect(),
            work,
        };
        if self.tasks.insert(task.name.clone(), Arc::new(task)).is_some() {
            tracing::debug!(task = name, "task redeclared");
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(|n| n.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Checks that every task reachable from `root` is declared and that no
    /// dependency chain loops back on itself.
    pub fn validate(&self, root: &str) -> Result<(), BuildError> {
        let mut visiting = Vec::new();
        let mut done = FxHashSet::default();
        self.visit(root, &mut visiting, &mut done)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        visiting: &mut Vec<&'a str>,
        done: &mut FxHashSet<&'a str>,
    ) -> Result<(), BuildError> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(pos) = visiting.iter().position(|&n| n == name) {
            let mut path: Vec<String> = visiting[pos..].iter().map(|n| n.to_string()).collect();
            path.push(name.to_string());
            return Err(BuildError::Cycle { path });
        }
        let task = self.tasks.get(name).ok_or_else(|| BuildError::UnknownTask {
            name: name.to_string(),
        })?;

        visiting.push(name);
        for dep in &task.dependencies {
            self.visit(dep.as_str(), visiting, done)?;
        }
        visiting.pop();
        done.insert(name);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/build/task.rs"]
mod tests;
