//! Headless application core: build graph, compile integration, workspace.

pub mod build;
pub mod compile;
pub mod services;
pub mod workspace;

pub use build::{BuildError, BuildSession, TaskGraph, TaskOutput};
pub use compile::compile_file;
pub use workspace::{Workspace, WorkspaceError};
