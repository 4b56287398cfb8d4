//! 编译服务端口
//!
//! The remote compiler is an opaque capability: it receives file content and
//! a source/target language pair and answers with a payload plus diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::runtime::BoxFuture;
use crate::models::{Diagnostic, FileData, FileKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Wast,
    Wasm,
    Cretonne,
    X86,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Wast => "wast",
            Language::Wasm => "wasm",
            Language::Cretonne => "cretonne",
            Language::X86 => "x86",
        }
    }

    pub fn from_kind(kind: FileKind) -> Option<Language> {
        match kind {
            FileKind::C => Some(Language::C),
            FileKind::Cpp => Some(Language::Cpp),
            FileKind::Wast => Some(Language::Wast),
            FileKind::Wasm => Some(Language::Wasm),
            FileKind::Cretonne => Some(Language::Cretonne),
            FileKind::X86 => Some(Language::X86),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub source: FileData,
    pub from: Language,
    pub to: Language,
    pub options: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub payload: FileData,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Failed {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },
    Unsupported {
        from: Language,
        to: Language,
    },
    Transport(String),
}

impl CompileError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Failed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Failed { message, .. } => write!(f, "compilation failed: {}", message),
            CompileError::Unsupported { from, to } => write!(
                f,
                "cannot compile {} to {}",
                from.as_str(),
                to.as_str()
            ),
            CompileError::Transport(message) => write!(f, "compile service error: {}", message),
        }
    }
}

impl std::error::Error for CompileError {}

pub trait CompileService: Send + Sync {
    fn compile(&self, request: CompileRequest) -> BoxFuture<Result<CompileOutput, CompileError>>;
}
