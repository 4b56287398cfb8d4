//! 项目持久化
//!
//! Projects are stored as JSON: containers as `{name, children}`, files as
//! `{name, type, data}`. Text data is a JSON string; binary data is
//! `{"base64": "..."}`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::models::{FileData, FileKind, NodeId, ProjectTree, TreeError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeJson {
    Directory {
        name: String,
        children: Vec<NodeJson>,
    },
    File {
        name: String,
        #[serde(rename = "type", alias = "kind")]
        kind: FileKind,
        #[serde(default)]
        data: Option<DataJson>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataJson {
    Text(String),
    Binary { base64: String },
}

impl From<&FileData> for DataJson {
    fn from(data: &FileData) -> Self {
        match data {
            FileData::Text(text) => DataJson::Text(text.clone()),
            FileData::Binary(bytes) => DataJson::Binary {
                base64: BASE64.encode(bytes),
            },
        }
    }
}

impl DataJson {
    fn decode(&self) -> Result<FileData, PersistError> {
        match self {
            DataJson::Text(text) => Ok(FileData::Text(text.clone())),
            DataJson::Binary { base64 } => BASE64
                .decode(base64)
                .map(FileData::Binary)
                .map_err(|err| PersistError::Invalid(format!("bad base64 payload: {}", err))),
        }
    }
}

/// A whole saved project, including the tabs that were open per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub name: String,
    #[serde(default)]
    pub children: Vec<NodeJson>,
    #[serde(rename = "openedFiles", default)]
    pub opened_files: Vec<Vec<String>>,
}

#[derive(Debug)]
pub enum PersistError {
    Io(io::Error),
    Invalid(String),
    Tree(TreeError),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(err) => write!(f, "project IO error: {}", err),
            PersistError::Invalid(message) => write!(f, "invalid project payload: {}", message),
            PersistError::Tree(err) => write!(f, "cannot rebuild project tree: {}", err),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(err) => Some(err),
            PersistError::Tree(err) => Some(err),
            PersistError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for PersistError {
    fn from(err: io::Error) -> Self {
        PersistError::Io(err)
    }
}

impl From<TreeError> for PersistError {
    fn from(err: TreeError) -> Self {
        PersistError::Tree(err)
    }
}

pub fn serialize_node(tree: &ProjectTree, id: NodeId) -> Option<NodeJson> {
    let name = tree.name(id)?.to_string();
    let kind = tree.kind(id)?;
    if kind.is_directory() {
        let children = tree
            .children(id)
            .iter()
            .filter_map(|&child| serialize_node(tree, child))
            .collect();
        Some(NodeJson::Directory { name, children })
    } else {
        // Unsaved buffer edits are not part of the document.
        let data = tree.stored_content(id).map(DataJson::from);
        Some(NodeJson::File { name, kind, data })
    }
}

/// Builds a detached subtree from `json`. Every node is attached through
/// [`ProjectTree::add_child`].
pub fn deserialize_node(tree: &mut ProjectTree, json: &NodeJson) -> Result<NodeId, PersistError> {
    match json {
        NodeJson::Directory { name, children } => {
            let dir = tree.create_directory(name.as_str());
            for child in children {
                let child_id = deserialize_node(tree, child)?;
                tree.add_child(dir, child_id)?;
            }
            Ok(dir)
        }
        NodeJson::File { name, kind, data } => {
            let file = tree.create_file(name.as_str(), *kind);
            let data = match data {
                Some(data) => data.decode()?,
                None => FileData::default(),
            };
            tree.set_content(file, data, true)?;
            Ok(file)
        }
    }
}

pub fn to_document(tree: &ProjectTree, opened_files: Vec<Vec<String>>) -> ProjectDocument {
    let root = tree.root();
    ProjectDocument {
        name: tree.name(root).unwrap_or_default().to_string(),
        children: tree
            .children(root)
            .iter()
            .filter_map(|&child| serialize_node(tree, child))
            .collect(),
        opened_files,
    }
}

pub fn load_project(doc: &ProjectDocument) -> Result<ProjectTree, PersistError> {
    let mut tree = ProjectTree::new(doc.name.as_str());
    let root = tree.root();
    for child in &doc.children {
        let id = deserialize_node(&mut tree, child)?;
        tree.add_child(root, id)?;
    }
    tracing::info!(project = %doc.name, files = tree.list(root).len(), "project loaded");
    Ok(tree)
}

/// Persists [`ProjectDocument`]s to disk using JSON and atomic writes.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    path: PathBuf,
}

impl ProjectStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `Ok(None)` when the file does not exist.
    pub fn load(&self) -> Result<Option<ProjectDocument>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let doc = serde_json::from_str(&contents)
                    .map_err(|err| PersistError::Invalid(err.to_string()))?;
                Ok(Some(doc))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PersistError::Io(err)),
        }
    }

    pub fn save(&self, doc: &ProjectDocument) -> Result<(), PersistError> {
        let payload = serde_json::to_vec_pretty(doc)
            .map_err(|err| PersistError::Invalid(err.to_string()))?;
        write_atomic(&self.path, &payload)?;
        tracing::info!(path = %self.path.display(), "project saved");
        Ok(())
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/persistence.rs"]
mod tests;
