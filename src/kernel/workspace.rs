//! 工作区：组合项目树、编辑器组与构建入口
//!
//! Owns everything a session edits. Signals such as "build requested" live
//! here as channels rather than as process-wide state.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::core::{Callback, EventChannel};
use crate::kernel::build::{BuildError, BuildSession, TaskGraph, TaskOutput};
use crate::kernel::services::adapters::persistence::{
    load_project, to_document, PersistError, ProjectDocument,
};
use crate::kernel::services::ports::Settings;
use crate::models::{DirtyFileUsed, EditorGroup, EditorGroupError, NodeId, ProjectTree, TreeError};

#[derive(Debug)]
pub enum WorkspaceError {
    NotAFile(NodeId),
    Tree(TreeError),
    Group(EditorGroupError),
    Persist(PersistError),
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceError::NotAFile(id) => write!(f, "node {:?} cannot be opened in an editor", id),
            WorkspaceError::Tree(err) => write!(f, "{}", err),
            WorkspaceError::Group(err) => write!(f, "{}", err),
            WorkspaceError::Persist(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for WorkspaceError {}

impl From<TreeError> for WorkspaceError {
    fn from(err: TreeError) -> Self {
        WorkspaceError::Tree(err)
    }
}

impl From<EditorGroupError> for WorkspaceError {
    fn from(err: EditorGroupError) -> Self {
        WorkspaceError::Group(err)
    }
}

impl From<PersistError> for WorkspaceError {
    fn from(err: PersistError) -> Self {
        WorkspaceError::Persist(err)
    }
}

pub struct Workspace {
    tree: ProjectTree,
    groups: Vec<EditorGroup>,
    active_group: usize,
    settings: Settings,
    on_build: EventChannel<()>,
    on_run: EventChannel<()>,
    on_project_change: EventChannel<()>,
    dirty_observer: Callback<DirtyFileUsed>,
}

impl Workspace {
    pub fn new(tree: ProjectTree, settings: Settings) -> Self {
        let dirty_observer: Callback<DirtyFileUsed> = Rc::new(|event: &DirtyFileUsed| {
            tracing::warn!(
                "Changes in {} were ignored, save your changes.",
                event.path
            );
        });
        tree.on_dirty_file_used().register(&dirty_observer);

        Self {
            tree,
            groups: vec![EditorGroup::new()],
            active_group: 0,
            settings,
            on_build: EventChannel::new("Build Requested"),
            on_run: EventChannel::new("Run Requested"),
            on_project_change: EventChannel::new("Project Change"),
            dirty_observer,
        }
    }

    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ProjectTree {
        &mut self.tree
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn groups(&self) -> &[EditorGroup] {
        &self.groups
    }

    pub fn active_group(&self) -> &EditorGroup {
        &self.groups[self.active_group]
    }

    pub fn active_group_index(&self) -> usize {
        self.active_group
    }

    pub fn set_active_group(&mut self, index: usize) -> bool {
        if index < self.groups.len() {
            self.active_group = index;
            true
        } else {
            false
        }
    }

    pub fn on_build(&self) -> &EventChannel<()> {
        &self.on_build
    }

    pub fn on_run(&self) -> &EventChannel<()> {
        &self.on_run
    }

    /// Fired after [`Workspace::load_document`] swaps in a new project.
    /// Unlike the tree's own channel it survives the swap.
    pub fn on_project_change(&self) -> &EventChannel<()> {
        &self.on_project_change
    }

    /// Opens `node` in the active group. `preview` defaults to the
    /// `editor.preview_by_default` setting.
    pub fn open_file(&mut self, node: NodeId, preview: Option<bool>) -> Result<(), WorkspaceError> {
        match self.tree.kind(node) {
            None => return Err(TreeError::InvalidNodeId.into()),
            Some(kind) if kind.is_directory() => return Err(WorkspaceError::NotAFile(node)),
            Some(_) => {}
        }
        let preview = preview.unwrap_or(self.settings.editor.preview_by_default);
        self.groups[self.active_group].open(node, preview);
        Ok(())
    }

    pub fn close_file(&mut self, node: NodeId) -> Result<(), WorkspaceError> {
        self.groups[self.active_group].close(node)?;
        Ok(())
    }

    /// Adds a group showing the last group's active file and makes it
    /// active. Nothing happens while the last group is empty.
    pub fn split_group(&mut self) {
        let Some(last) = self.groups.last() else {
            return;
        };
        let Some(file) = last.active_file() else {
            return;
        };
        self.groups
            .push(EditorGroup::with_files(Some(file), None, vec![file]));
        self.active_group = self.groups.len() - 1;
        tracing::debug!(groups = self.groups.len(), "editor group split");
    }

    /// Closes every tab showing `node` or a descendant, then removes and
    /// frees the subtree.
    pub fn delete_node(&mut self, node: NodeId) -> Result<(), WorkspaceError> {
        if node == self.tree.root() {
            return Err(TreeError::StillAttached(node).into());
        }
        if !self.tree.contains(node) {
            return Err(TreeError::InvalidNodeId.into());
        }

        let doomed = self.tree.subtree(node);
        for group in &mut self.groups {
            for &id in &doomed {
                if group.contains(id) {
                    group.close(id)?;
                }
            }
        }

        if let Some(parent) = self.tree.parent(node) {
            self.tree.remove_child(parent, node)?;
        }
        self.tree.discard(node)?;
        tracing::info!(node = ?node, removed = doomed.len(), "node deleted");
        Ok(())
    }

    pub fn request_build(&self) {
        self.on_build.dispatch(&());
    }

    pub fn request_run(&self) {
        self.on_run.dispatch(&());
    }

    /// Paths of the open tabs, one list per group.
    pub fn opened_files(&self) -> Vec<Vec<String>> {
        self.groups
            .iter()
            .map(|group| {
                group
                    .open_files()
                    .iter()
                    .map(|&id| self.tree.path(id))
                    .collect()
            })
            .collect()
    }

    pub fn to_document(&self) -> ProjectDocument {
        to_document(&self.tree, self.opened_files())
    }

    /// Replaces the project with `doc` and reopens its saved tabs as
    /// permanent tabs. Paths that no longer resolve are skipped.
    pub fn load_document(&mut self, doc: &ProjectDocument) -> Result<(), WorkspaceError> {
        let tree = load_project(doc)?;
        tree.on_dirty_file_used().register(&self.dirty_observer);
        let root = tree.root();

        let mut groups: Vec<EditorGroup> = doc
            .opened_files
            .iter()
            .map(|paths| {
                let files: Vec<NodeId> = paths
                    .iter()
                    .filter_map(|path| tree.resolve_path(root, path))
                    .filter(|&id| !tree.is_dir(id))
                    .collect();
                EditorGroup::with_files(files.first().copied(), None, files)
            })
            .collect();
        if groups.is_empty() {
            groups.push(EditorGroup::new());
        }

        self.tree = tree;
        self.groups = groups;
        self.active_group = 0;
        tracing::info!(project = %doc.name, groups = self.groups.len(), "workspace loaded");
        self.tree.on_project_change().dispatch(&());
        self.on_project_change.dispatch(&());
        Ok(())
    }

    /// Runs the configured default task of `graph` in a fresh session.
    pub async fn build(&self, graph: Arc<TaskGraph>) -> Result<TaskOutput, BuildError> {
        let task = self.settings.build.default_task.clone();
        BuildSession::new(graph).run(&task).await
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("tree", &self.tree)
            .field("groups", &self.groups)
            .field("active_group", &self.active_group)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/workspace.rs"]
mod tests;
