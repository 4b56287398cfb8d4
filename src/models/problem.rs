use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemSeverity {
    Error,
    Warning,
    Info,
    Ignore,
}

impl ProblemSeverity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Ignore => "ignore",
        }
    }
}

/// A positioned compiler diagnostic. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: ProblemSeverity,
    pub message: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Diagnostic {
    pub fn at(severity: ProblemSeverity, message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            severity,
            message: message.into(),
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column,
        }
    }
}

/// An entry of a node's problem list, as shown in the Problems view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub description: String,
    pub severity: ProblemSeverity,
    pub marker: Option<Diagnostic>,
}

impl Problem {
    pub fn new(description: impl Into<String>, severity: ProblemSeverity) -> Self {
        Self {
            description: description.into(),
            severity,
            marker: None,
        }
    }

    pub fn from_diagnostic(diagnostic: Diagnostic) -> Self {
        Self {
            description: format!(
                "{} ({}, {})",
                diagnostic.message, diagnostic.start_line, diagnostic.start_column
            ),
            severity: diagnostic.severity,
            marker: Some(diagnostic),
        }
    }
}
