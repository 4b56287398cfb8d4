//! 编译器控制台输出解析
//!
//! Turns clang-style console text into positioned diagnostics. Two line
//! shapes are recognised:
//! - `file:line:col: message`
//! - `file:line:col:{sl:sc-el:ec}: message` (`-fdiagnostics-print-source-range-info`)

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{Diagnostic, ProblemSeverity};

fn point_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^.*?:(\d+?):(\d+?):\s(.*)$").ok())
        .as_ref()
}

fn range_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^.*?:\d+?:\d+?:\{(\d+?):(\d+?)-(\d+?):(\d+?)\}:\s(.*)$").ok()
    })
    .as_ref()
}

fn severity_of(message: &str) -> ProblemSeverity {
    if message.contains("error") {
        ProblemSeverity::Error
    } else if message.contains("warning") {
        ProblemSeverity::Warning
    } else {
        ProblemSeverity::Info
    }
}

fn number(text: &str) -> u32 {
    text.parse().unwrap_or(0)
}

/// Point diagnostics come first, then range diagnostics, each in console
/// order. Text output (a module dump starting with `(module`) has none.
pub fn parse_diagnostics(console: &str) -> Vec<Diagnostic> {
    if console.starts_with("(module") {
        return Vec::new();
    }

    let mut diagnostics = Vec::new();
    let (Some(point), Some(range)) = (point_regex(), range_regex()) else {
        return diagnostics;
    };
    for caps in point.captures_iter(console) {
        let message = caps[3].trim_end_matches('\r');
        let line = number(&caps[1]);
        let column = number(&caps[2]);
        diagnostics.push(Diagnostic::at(severity_of(message), message, line, column));
    }
    for caps in range.captures_iter(console) {
        let message = caps[5].trim_end_matches('\r');
        diagnostics.push(Diagnostic {
            severity: severity_of(message),
            message: message.to_string(),
            start_line: number(&caps[1]),
            start_column: number(&caps[2]),
            end_line: number(&caps[3]),
            end_column: number(&caps[4]),
        });
    }
    diagnostics
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/diagnostics.rs"]
mod tests;
