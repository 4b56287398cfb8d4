//! Service ports: traits + data contracts.

pub mod compile;
pub mod runtime;
pub mod settings;

pub use compile::{CompileError, CompileOutput, CompileRequest, CompileService, Language};
pub use runtime::BoxFuture;
pub use settings::{BuildSettings, EditorSettings, Settings};
