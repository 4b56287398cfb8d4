//! 项目文档树
//!
//! Nodes live in a slot-map arena owned by [`ProjectTree`]; a [`NodeId`] is a
//! non-owning handle. Containers own their children, children only record
//! their parent's id. Change notifications walk the parent links iteratively
//! and dispatch on every node up to the top of the chain.

use compact_str::CompactString;
use ropey::Rope;
use slotmap::{new_key_type, SlotMap};
use std::fmt;
use std::ops::Range;

use crate::core::EventChannel;
use crate::models::file_kind::FileKind;
use crate::models::glob::{GlobError, GlobPattern};
use crate::models::problem::{Diagnostic, Problem};

new_key_type! { pub struct NodeId; }

pub const DEFAULT_PROJECT_NAME: &str = "Project";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileData {
    Text(String),
    Binary(Vec<u8>),
}

impl FileData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileData::Text(text) => Some(text),
            FileData::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileData::Text(text) => text.as_bytes(),
            FileData::Binary(bytes) => bytes,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, FileData::Binary(_))
    }
}

impl Default for FileData {
    fn default() -> Self {
        FileData::Text(String::new())
    }
}

impl From<&str> for FileData {
    fn from(value: &str) -> Self {
        FileData::Text(value.to_string())
    }
}

impl From<String> for FileData {
    fn from(value: String) -> Self {
        FileData::Text(value)
    }
}

impl From<Vec<u8>> for FileData {
    fn from(value: Vec<u8>) -> Self {
        FileData::Binary(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    InvalidNodeId,
    NotADirectory(NodeId),
    NotAFile(NodeId),
    AlreadyAttached(NodeId),
    NotAChild { parent: NodeId, child: NodeId },
    WouldCycle(NodeId),
    StillAttached(NodeId),
    ReadOnly(NodeId),
    KindMismatch {
        name: String,
        expected: FileKind,
        found: FileKind,
    },
    InvalidPattern(GlobError),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::InvalidNodeId => write!(f, "invalid node id"),
            TreeError::NotADirectory(id) => write!(f, "node {:?} is not a directory", id),
            TreeError::NotAFile(id) => write!(f, "node {:?} has no editable buffer", id),
            TreeError::AlreadyAttached(id) => write!(f, "node {:?} already has a parent", id),
            TreeError::NotAChild { parent, child } => {
                write!(f, "node {:?} is not a child of {:?}", child, parent)
            }
            TreeError::WouldCycle(id) => {
                write!(f, "cannot attach node {:?} inside its own subtree", id)
            }
            TreeError::StillAttached(id) => write!(f, "node {:?} is still attached", id),
            TreeError::ReadOnly(id) => write!(f, "node {:?} is read-only", id),
            TreeError::KindMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "\"{}\" exists as {:?}, expected {:?}",
                name, found, expected
            ),
            TreeError::InvalidPattern(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for TreeError {}

impl From<GlobError> for TreeError {
    fn from(err: GlobError) -> Self {
        TreeError::InvalidPattern(err)
    }
}

/// Payload of the project-wide "file used while dirty" channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyFileUsed {
    pub node: NodeId,
    pub path: String,
}

struct NodeChannels {
    content: EventChannel<NodeId>,
    buffer: EventChannel<NodeId>,
    problems: EventChannel<NodeId>,
    children: EventChannel<NodeId>,
}

impl NodeChannels {
    fn new() -> Self {
        Self {
            content: EventChannel::new("File Data Change"),
            buffer: EventChannel::new("File Buffer Change"),
            problems: EventChannel::new("File Problems Change"),
            children: EventChannel::new("Directory Children Change"),
        }
    }
}

#[derive(Copy, Clone)]
enum Channel {
    Content,
    Buffer,
    Problems,
    Children,
}

struct Node {
    name: CompactString,
    kind: FileKind,
    content: FileData,
    buffer: Rope,
    parent: Option<NodeId>,
    children: Option<Vec<NodeId>>,
    is_dirty: bool,
    is_expanded: bool,
    description: Option<String>,
    problems: Vec<Problem>,
    markers: Vec<Diagnostic>,
    channels: NodeChannels,
}

impl Node {
    fn new(name: CompactString, kind: FileKind) -> Self {
        let description = kind.is_read_only().then(|| "Read Only".to_string());
        Self {
            name,
            kind,
            content: FileData::default(),
            buffer: Rope::new(),
            parent: None,
            children: kind.is_directory().then(Vec::new),
            is_dirty: false,
            is_expanded: true,
            description,
            problems: Vec::new(),
            markers: Vec::new(),
            channels: NodeChannels::new(),
        }
    }

    fn channel(&self, channel: Channel) -> &EventChannel<NodeId> {
        match channel {
            Channel::Content => &self.channels.content,
            Channel::Buffer => &self.channels.buffer,
            Channel::Problems => &self.channels.problems,
            Channel::Children => &self.channels.children,
        }
    }
}

pub struct ProjectTree {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
    on_dirty_file_used: EventChannel<DirtyFileUsed>,
    on_project_change: EventChannel<()>,
}

impl Default for ProjectTree {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECT_NAME)
    }
}

impl ProjectTree {
    pub fn new(name: impl Into<CompactString>) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node::new(name.into(), FileKind::Directory));
        Self {
            arena,
            root,
            on_dirty_file_used: EventChannel::new("Dirty File Used"),
            on_project_change: EventChannel::new("Project Change"),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains_key(id)
    }

    /// Number of live nodes, the root and detached ones included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// True when nothing is attached under the root.
    pub fn has_no_entries(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn on_dirty_file_used(&self) -> &EventChannel<DirtyFileUsed> {
        &self.on_dirty_file_used
    }

    /// Generic project-level notification; hosts decide what counts as a change.
    pub fn on_project_change(&self) -> &EventChannel<()> {
        &self.on_project_change
    }

    pub fn on_did_change_data(&self, id: NodeId) -> Option<&EventChannel<NodeId>> {
        self.arena.get(id).map(|n| n.channel(Channel::Content))
    }

    pub fn on_did_change_buffer(&self, id: NodeId) -> Option<&EventChannel<NodeId>> {
        self.arena.get(id).map(|n| n.channel(Channel::Buffer))
    }

    pub fn on_did_change_problems(&self, id: NodeId) -> Option<&EventChannel<NodeId>> {
        self.arena.get(id).map(|n| n.channel(Channel::Problems))
    }

    pub fn on_did_change_children(&self, id: NodeId) -> Option<&EventChannel<NodeId>> {
        self.arena
            .get(id)
            .filter(|n| n.kind.is_directory())
            .map(|n| n.channel(Channel::Children))
    }

    // ---- node creation -------------------------------------------------

    /// Creates a detached node. Attach it with [`ProjectTree::add_child`].
    pub fn create_file(&mut self, name: impl Into<CompactString>, kind: FileKind) -> NodeId {
        self.arena.insert(Node::new(name.into(), kind))
    }

    pub fn create_directory(&mut self, name: impl Into<CompactString>) -> NodeId {
        self.create_file(name, FileKind::Directory)
    }

    // ---- structure -----------------------------------------------------

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_node = self.arena.get(parent).ok_or(TreeError::InvalidNodeId)?;
        if !parent_node.kind.is_directory() {
            return Err(TreeError::NotADirectory(parent));
        }
        let child_node = self.arena.get(child).ok_or(TreeError::InvalidNodeId)?;
        if child_node.parent.is_some() || child == self.root {
            tracing::error!(node = ?child, "add_child on a node that is already attached");
            return Err(TreeError::AlreadyAttached(child));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(TreeError::WouldCycle(child));
        }

        if let Some(children) = self
            .arena
            .get_mut(parent)
            .and_then(|n| n.children.as_mut())
        {
            children.push(child);
        }
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }

        tracing::debug!(parent = ?parent, child = ?child, "node attached");
        self.propagate(parent, Channel::Children);
        Ok(())
    }

    /// Detaches `child` from `parent`. The child's subtree stays intact and
    /// may be attached again or freed with [`ProjectTree::discard`].
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let child_parent = self
            .arena
            .get(child)
            .ok_or(TreeError::InvalidNodeId)?
            .parent;
        if child_parent != Some(parent) {
            tracing::error!(parent = ?parent, child = ?child, "remove_child on a foreign node");
            return Err(TreeError::NotAChild { parent, child });
        }

        let children = self
            .arena
            .get_mut(parent)
            .and_then(|n| n.children.as_mut())
            .ok_or(TreeError::NotADirectory(parent))?;
        let index = children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })?;
        children.remove(index);

        if let Some(node) = self.arena.get_mut(child) {
            node.parent = None;
        }

        tracing::debug!(parent = ?parent, child = ?child, "node detached");
        self.propagate(parent, Channel::Children);
        Ok(())
    }

    /// Frees a detached node and its whole subtree from the arena.
    pub fn discard(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.arena.get(id).ok_or(TreeError::InvalidNodeId)?;
        if node.parent.is_some() || id == self.root {
            return Err(TreeError::StillAttached(id));
        }

        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            if let Some(node) = self.arena.remove(node_id) {
                if let Some(children) = node.children {
                    stack.extend(children);
                }
            }
        }
        Ok(())
    }

    pub fn rename(&mut self, id: NodeId, name: impl Into<CompactString>) -> Result<(), TreeError> {
        let node = self.arena.get_mut(id).ok_or(TreeError::InvalidNodeId)?;
        node.name = name.into();
        if let Some(parent) = node.parent {
            self.propagate(parent, Channel::Children);
        }
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, mut descendant: NodeId) -> bool {
        while let Some(node) = self.arena.get(descendant) {
            match node.parent {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => descendant = parent,
                None => break,
            }
        }
        false
    }

    /// Dispatches `channel` on `origin` and every ancestor, innermost first.
    fn propagate(&self, origin: NodeId, channel: Channel) {
        let mut current = Some(origin);
        while let Some(id) = current {
            let Some(node) = self.arena.get(id) else {
                break;
            };
            node.channel(channel).dispatch(&origin);
            current = node.parent;
        }
    }

    // ---- node state ----------------------------------------------------

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.arena.get(id).map(|n| n.name.as_str())
    }

    pub fn kind(&self, id: NodeId) -> Option<FileKind> {
        self.arena.get(id).map(|n| n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id)
            .and_then(|n| n.children.as_deref())
            .unwrap_or(&[])
    }

    pub fn is_dir(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .map(|n| n.kind.is_directory())
            .unwrap_or(false)
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some_and(|n| n.is_dirty)
    }

    pub fn is_read_only(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some_and(|n| n.kind.is_read_only())
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some_and(|n| n.is_expanded)
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        if let Some(node) = self.arena.get_mut(id) {
            node.is_expanded = expanded;
        }
    }

    pub fn description(&self, id: NodeId) -> Option<&str> {
        self.arena.get(id).and_then(|n| n.description.as_deref())
    }

    pub fn set_description(&mut self, id: NodeId, description: Option<String>) {
        if let Some(node) = self.arena.get_mut(id) {
            node.description = description;
        }
    }

    pub fn problems(&self, id: NodeId) -> &[Problem] {
        self.arena
            .get(id)
            .map(|n| n.problems.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_problems(&mut self, id: NodeId, problems: Vec<Problem>) -> Result<(), TreeError> {
        let node = self.arena.get_mut(id).ok_or(TreeError::InvalidNodeId)?;
        node.problems = problems;
        self.propagate(id, Channel::Problems);
        Ok(())
    }

    /// Inline diagnostic markers shown by the editing surface.
    pub fn markers(&self, id: NodeId) -> &[Diagnostic] {
        self.arena
            .get(id)
            .map(|n| n.markers.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_markers(&mut self, id: NodeId, markers: Vec<Diagnostic>) -> Result<(), TreeError> {
        let node = self.arena.get_mut(id).ok_or(TreeError::InvalidNodeId)?;
        node.markers = markers;
        Ok(())
    }

    // ---- content -------------------------------------------------------

    pub fn set_content(
        &mut self,
        id: NodeId,
        data: FileData,
        update_buffer: bool,
    ) -> Result<(), TreeError> {
        let node = self.arena.get_mut(id).ok_or(TreeError::InvalidNodeId)?;
        if update_buffer {
            node.buffer = match &data {
                FileData::Text(text) => Rope::from_str(text),
                FileData::Binary(_) => Rope::new(),
            };
            node.is_dirty = false;
        }
        node.content = data;
        self.propagate(id, Channel::Content);
        Ok(())
    }

    /// Returns the persisted content. Reading a dirty, editable node warns
    /// observers of the owning project that unsaved edits are being ignored.
    pub fn content(&self, id: NodeId) -> Option<&FileData> {
        let node = self.arena.get(id)?;
        if node.is_dirty && !node.kind.is_read_only() && self.project_of(id).is_some() {
            let path = self.path(id);
            tracing::warn!(node = ?id, path = %path, "dirty file content used");
            self.on_dirty_file_used
                .dispatch(&DirtyFileUsed { node: id, path });
        }
        Some(&node.content)
    }

    /// The persisted content, without the dirty check of [`ProjectTree::content`].
    pub fn stored_content(&self, id: NodeId) -> Option<&FileData> {
        self.arena.get(id).map(|n| &n.content)
    }

    pub fn buffer(&self, id: NodeId) -> Option<&Rope> {
        self.arena.get(id).map(|n| &n.buffer)
    }

    pub fn buffer_text(&self, id: NodeId) -> Option<String> {
        self.arena.get(id).map(|n| n.buffer.to_string())
    }

    /// Applies an edit made by the editing surface to the live buffer.
    ///
    /// `range` is in chars and clamped to the buffer. The first edit after a
    /// clean state marks the node dirty and notifies buffer observers once;
    /// every edit drops the inline markers.
    pub fn edit_buffer(&mut self, id: NodeId, range: Range<usize>, text: &str) -> Result<(), TreeError> {
        let node = self.arena.get_mut(id).ok_or(TreeError::InvalidNodeId)?;
        if node.kind.is_directory() {
            return Err(TreeError::NotAFile(id));
        }
        if node.kind.is_read_only() {
            return Err(TreeError::ReadOnly(id));
        }

        let len = node.buffer.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        node.buffer.remove(start..end);
        node.buffer.insert(start, text);

        let first_edit = !node.is_dirty;
        node.is_dirty = true;
        node.markers.clear();

        if first_edit {
            self.propagate(id, Channel::Buffer);
        }
        Ok(())
    }

    /// Copies the live buffer into the persisted content.
    pub fn save(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.arena.get_mut(id).ok_or(TreeError::InvalidNodeId)?;
        if !node.is_dirty {
            return Ok(());
        }
        node.is_dirty = false;
        node.content = FileData::Text(node.buffer.to_string());
        self.propagate(id, Channel::Content);
        Ok(())
    }

    // ---- paths ---------------------------------------------------------

    /// Slash-joined names from just below the top of the chain down to `id`.
    /// Empty for the root and for detached nodes.
    pub fn path(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = id;
        while let Some(node) = self.arena.get(current) {
            match node.parent {
                Some(parent) => {
                    parts.push(node.name.as_str());
                    current = parent;
                }
                None => break,
            }
        }
        parts.reverse();
        parts.join("/")
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    /// The project root when `id` is attached under it.
    pub fn project_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        (current == self.root && self.arena.contains_key(current)).then_some(self.root)
    }

    pub fn immediate_child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.children(dir)
            .iter()
            .copied()
            .find(|&child| self.name(child) == Some(name))
    }

    /// Looks up a descendant by slash-delimited path. Misses return `None`.
    pub fn resolve_path(&self, dir: NodeId, path: &str) -> Option<NodeId> {
        let mut current = dir;
        for segment in path.split('/') {
            if !self.is_dir(current) {
                return None;
            }
            current = self.immediate_child(current, segment)?;
        }
        Some(current)
    }

    /// `mkdir -p`: reuses existing directories, creates the missing ones.
    pub fn ensure_directory(&mut self, dir: NodeId, path: &str) -> Result<NodeId, TreeError> {
        if !self.contains(dir) {
            return Err(TreeError::InvalidNodeId);
        }
        if !self.is_dir(dir) {
            return Err(TreeError::NotADirectory(dir));
        }

        let mut current = dir;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match self.immediate_child(current, segment) {
                Some(existing) => {
                    let found = self.kind(existing).ok_or(TreeError::InvalidNodeId)?;
                    if !found.is_directory() {
                        return Err(TreeError::KindMismatch {
                            name: segment.to_string(),
                            expected: FileKind::Directory,
                            found,
                        });
                    }
                    existing
                }
                None => {
                    let created = self.create_directory(segment);
                    self.add_child(current, created)?;
                    created
                }
            };
        }
        Ok(current)
    }

    /// `touch`: creates the file and missing parents, or reuses an existing
    /// entry of the same kind.
    pub fn ensure_file(&mut self, dir: NodeId, path: &str, kind: FileKind) -> Result<NodeId, TreeError> {
        let (parent, name) = match path.rsplit_once('/') {
            Some((dir_path, name)) => (self.ensure_directory(dir, dir_path)?, name),
            None => (dir, path),
        };
        if !self.is_dir(parent) {
            return Err(TreeError::NotADirectory(parent));
        }

        if let Some(existing) = self.immediate_child(parent, name) {
            let found = self.kind(existing).ok_or(TreeError::InvalidNodeId)?;
            if found != kind {
                return Err(TreeError::KindMismatch {
                    name: name.to_string(),
                    expected: kind,
                    found,
                });
            }
            return Ok(existing);
        }

        let created = self.create_file(name, kind);
        self.add_child(parent, created)?;
        Ok(created)
    }

    /// Paths of every non-directory descendant, relative to `dir`, in child
    /// order (depth first).
    pub fn list(&self, dir: NodeId) -> Vec<String> {
        let mut result = Vec::new();
        let mut stack: Vec<(NodeId, String)> = self
            .children(dir)
            .iter()
            .rev()
            .map(|&child| (child, String::new()))
            .collect();

        while let Some((id, prefix)) = stack.pop() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };
            let path = if prefix.is_empty() {
                node.name.to_string()
            } else {
                format!("{}/{}", prefix, node.name)
            };
            match &node.children {
                Some(children) => {
                    for &child in children.iter().rev() {
                        stack.push((child, path.clone()));
                    }
                }
                None => result.push(path),
            }
        }

        result
    }

    pub fn glob(&self, dir: NodeId, pattern: &str) -> Result<Vec<String>, TreeError> {
        let matcher = GlobPattern::new(pattern)?;
        Ok(self
            .list(dir)
            .into_iter()
            .filter(|path| matcher.is_match(path))
            .collect())
    }

    pub fn glob_nodes(&self, dir: NodeId, pattern: &str) -> Result<Vec<NodeId>, TreeError> {
        Ok(self
            .glob(dir, pattern)?
            .iter()
            .filter_map(|path| self.resolve_path(dir, path))
            .collect())
    }

    /// `id` followed by all of its descendants, depth first.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            if !self.contains(node_id) {
                continue;
            }
            result.push(node_id);
            stack.extend(self.children(node_id).iter().rev().copied());
        }
        result
    }
}

impl fmt::Debug for ProjectTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectTree")
            .field("root", &self.root)
            .field("nodes", &self.arena.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/project_tree.rs"]
mod tests;
