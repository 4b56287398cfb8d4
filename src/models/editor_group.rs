//! 编辑器组：一组打开的标签页与单个可复用的预览槽

use rustc_hash::FxHashSet;
use std::fmt;

use crate::core::EventChannel;
use crate::models::project_tree::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorGroupError {
    NotOpen(NodeId),
}

impl fmt::Display for EditorGroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorGroupError::NotOpen(id) => write!(f, "node {:?} is not open in this group", id),
        }
    }
}

impl std::error::Error for EditorGroupError {}

/// Ordered tabs of one editor pane.
///
/// `active` and `preview`, when set, always refer to an entry of `files`.
/// Opening with `preview = true` reuses the preview tab in place instead of
/// growing the tab list; a permanent open always appends.
#[derive(Debug)]
pub struct EditorGroup {
    files: Vec<NodeId>,
    active: Option<NodeId>,
    preview: Option<NodeId>,
    on_did_change: EventChannel<()>,
}

impl Default for EditorGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorGroup {
    pub fn new() -> Self {
        Self::with_files(None, None, Vec::new())
    }

    /// Restores a group. Repeated ids keep their first position; references
    /// to nodes missing from `files` are dropped.
    pub fn with_files(active: Option<NodeId>, preview: Option<NodeId>, mut files: Vec<NodeId>) -> Self {
        let mut seen = FxHashSet::default();
        files.retain(|id| seen.insert(*id));
        let active = active.filter(|id| files.contains(id));
        let preview = preview.filter(|id| files.contains(id));
        Self {
            files,
            active,
            preview,
            on_did_change: EventChannel::new("Editor Group Change"),
        }
    }

    pub fn on_did_change(&self) -> &EventChannel<()> {
        &self.on_did_change
    }

    pub fn open_files(&self) -> &[NodeId] {
        &self.files
    }

    pub fn active_file(&self) -> Option<NodeId> {
        self.active
    }

    pub fn preview_file(&self) -> Option<NodeId> {
        self.preview
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.files.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn open(&mut self, id: NodeId, preview: bool) {
        if self.files.contains(&id) {
            self.active = Some(id);
            if !preview {
                self.preview = None;
            }
            self.on_did_change.dispatch(&());
            return;
        }

        let preview_index = self
            .preview
            .and_then(|current| self.files.iter().position(|&f| f == current));

        match (preview, preview_index) {
            (true, Some(index)) => {
                self.files[index] = id;
                self.active = Some(id);
                self.preview = Some(id);
            }
            (true, None) => {
                self.files.push(id);
                self.active = Some(id);
                self.preview = Some(id);
            }
            (false, _) => {
                self.files.push(id);
                self.active = Some(id);
                self.preview = None;
            }
        }

        tracing::debug!(node = ?id, preview, tabs = self.files.len(), "file opened");
        self.on_did_change.dispatch(&());
    }

    pub fn close(&mut self, id: NodeId) -> Result<(), EditorGroupError> {
        let index = self
            .files
            .iter()
            .position(|&f| f == id)
            .ok_or(EditorGroupError::NotOpen(id))?;

        if self.preview == Some(id) {
            self.preview = None;
        }
        self.files.remove(index);
        self.active = if self.files.is_empty() {
            None
        } else {
            Some(self.files[index.min(self.files.len() - 1)])
        };

        self.on_did_change.dispatch(&());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/editor_group.rs"]
mod tests;
