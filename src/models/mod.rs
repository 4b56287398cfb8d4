//! 数据模型层

pub mod editor_group;
pub mod file_kind;
pub mod glob;
pub mod problem;
pub mod project_tree;

pub use editor_group::{EditorGroup, EditorGroupError};
pub use file_kind::{FileKind, KindInfo};
pub use glob::{GlobError, GlobPattern};
pub use problem::{Diagnostic, Problem, ProblemSeverity};
pub use project_tree::{DirtyFileUsed, FileData, NodeId, ProjectTree, TreeError};
