//! Shell-style wildcard patterns over slash-delimited project paths.
//!
//! Supported syntax: `*` and `?` (never crossing `/`), `[abc]`, `[a-z]`,
//! `[!abc]`, `{a,b}` alternation inside one segment, and `**` as a whole
//! segment matching zero or more directories. Patterns are compiled to an
//! anchored regex.

use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobError {
    pub pattern: String,
    pub message: String,
}

impl fmt::Display for GlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid glob pattern \"{}\": {}", self.pattern, self.message)
    }
}

impl std::error::Error for GlobError {}

#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        let translated = translate(pattern);
        let regex = Regex::new(&translated).map_err(|e| GlobError {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

fn translate(pattern: &str) -> String {
    let segments: Vec<&str> = pattern.split('/').collect();
    let last = segments.len().saturating_sub(1);
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    for (i, segment) in segments.iter().enumerate() {
        if *segment == "**" {
            if i == last {
                out.push_str(".*");
            } else {
                out.push_str("(?:[^/]+/)*");
            }
            continue;
        }
        translate_segment(segment, &mut out);
        if i != last {
            out.push('/');
        }
    }

    out.push('$');
    out
}

fn translate_segment(segment: &str, out: &mut String) {
    let chars: Vec<char> = segment.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                while i + 1 < chars.len() && chars[i + 1] == '*' {
                    i += 1;
                }
                out.push_str("[^/]*");
            }
            '?' => out.push_str("[^/]"),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&chars[i + 1..end], out);
                    i = end;
                }
                None => out.push_str(r"\["),
            },
            '{' => match brace_end(&chars, i) {
                Some(end) => {
                    let inner: String = chars[i + 1..end].iter().collect();
                    let alternatives: Vec<String> = split_alternatives(&inner)
                        .into_iter()
                        .map(|alt| {
                            let mut buf = String::new();
                            translate_segment(&alt, &mut buf);
                            buf
                        })
                        .collect();
                    out.push_str("(?:");
                    out.push_str(&alternatives.join("|"));
                    out.push(')');
                    i = end;
                }
                None => out.push_str(r"\{"),
            },
            '\\' if i + 1 < chars.len() => {
                i += 1;
                push_literal(chars[i], out);
            }
            c => push_literal(c, out),
        }
        i += 1;
    }
}

fn push_literal(c: char, out: &mut String) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Index of the `]` closing the class opened at `start`. A `]` right after
/// the opening bracket (or after `!`/`^`) is a literal member.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if j < chars.len() && (chars[j] == '!' || chars[j] == '^') {
        j += 1;
    }
    if j < chars.len() && chars[j] == ']' {
        j += 1;
    }
    while j < chars.len() {
        if chars[j] == ']' {
            return Some(j);
        }
        j += 1;
    }
    None
}

fn push_class(body: &[char], out: &mut String) {
    let (negated, members) = match body.first() {
        Some('!') | Some('^') => (true, &body[1..]),
        _ => (false, body),
    };

    out.push('[');
    if negated {
        out.push('^');
        out.push('/');
    }
    for (k, &c) in members.iter().enumerate() {
        let is_range = c == '-' && k > 0 && k + 1 < members.len();
        if is_range {
            out.push('-');
        } else {
            push_literal(c, out);
        }
    }
    out.push(']');
}

fn brace_end(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (j, &c) in chars.iter().enumerate().skip(start) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_alternatives(inner: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
#[path = "../../tests/unit/models/glob.rs"]
mod tests;
