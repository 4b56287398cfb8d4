//! 文件类型及其派生属性
//!
//! Every kind-dependent property comes from one static table instead of
//! per-call-site branching.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    JavaScript,
    TypeScript,
    Html,
    Css,
    C,
    Cpp,
    Rust,
    Wast,
    Wasm,
    Log,
    X86,
    Markdown,
    Cretonne,
    Directory,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KindInfo {
    pub kind: FileKind,
    /// Editor language id; empty when the editor has no mode for it.
    pub language: &'static str,
    pub display_name: &'static str,
    pub extension: &'static str,
    pub mime_type: &'static str,
    pub icon: &'static str,
    pub read_only: bool,
}

const fn info(
    kind: FileKind,
    language: &'static str,
    display_name: &'static str,
    extension: &'static str,
    mime_type: &'static str,
    icon: &'static str,
    read_only: bool,
) -> KindInfo {
    KindInfo {
        kind,
        language,
        display_name,
        extension,
        mime_type,
        icon,
        read_only,
    }
}

static KIND_TABLE: [KindInfo; 14] = [
    info(FileKind::JavaScript, "javascript", "JavaScript", "js", "application/javascript", "file_type_js", false),
    info(FileKind::TypeScript, "typescript", "TypeScript", "ts", "", "file_type_typescript", false),
    info(FileKind::Html, "html", "HTML", "html", "text/html", "default_file", false),
    info(FileKind::Css, "css", "CSS", "css", "", "default_file", false),
    info(FileKind::C, "cpp", "C", "c", "", "file_type_c", false),
    info(FileKind::Cpp, "cpp", "C++", "cpp", "", "file_type_cpp", false),
    info(FileKind::Rust, "", "Rust", "rs", "", "default_file", false),
    info(FileKind::Wast, "wast", "Wast", "wast", "", "default_file", false),
    info(FileKind::Wasm, "wast", "Wasm", "wasm", "application/wasm", "default_file", true),
    info(FileKind::Log, "log", "", "", "", "default_file", false),
    info(FileKind::X86, "x86", "", "", "", "default_file", false),
    info(FileKind::Markdown, "markdown", "Markdown", "md", "", "default_file", false),
    info(FileKind::Cretonne, "cton", "Cretonne", "cton", "", "default_file", false),
    info(FileKind::Directory, "", "", "", "", "default_folder", false),
];

impl FileKind {
    pub const ALL: [FileKind; 14] = [
        FileKind::JavaScript,
        FileKind::TypeScript,
        FileKind::Html,
        FileKind::Css,
        FileKind::C,
        FileKind::Cpp,
        FileKind::Rust,
        FileKind::Wast,
        FileKind::Wasm,
        FileKind::Log,
        FileKind::X86,
        FileKind::Markdown,
        FileKind::Cretonne,
        FileKind::Directory,
    ];

    pub fn info(self) -> &'static KindInfo {
        // Table order mirrors declaration order.
        &KIND_TABLE[self as usize]
    }

    pub fn language(self) -> &'static str {
        self.info().language
    }

    pub fn display_name(self) -> &'static str {
        self.info().display_name
    }

    pub fn extension(self) -> &'static str {
        self.info().extension
    }

    pub fn mime_type(self) -> &'static str {
        self.info().mime_type
    }

    pub fn icon(self) -> &'static str {
        self.info().icon
    }

    pub fn is_read_only(self) -> bool {
        self.info().read_only
    }

    pub fn is_directory(self) -> bool {
        self == FileKind::Directory
    }

    pub fn from_extension(ext: &str) -> Option<FileKind> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty() {
            return None;
        }
        KIND_TABLE
            .iter()
            .find(|entry| entry.extension == ext)
            .map(|entry| entry.kind)
    }

    /// Guesses the kind of a file from the extension of `name`.
    pub fn for_file_name(name: &str) -> Option<FileKind> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/file_kind.rs"]
mod tests;
