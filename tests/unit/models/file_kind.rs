use super::*;

#[test]
fn test_table_matches_declaration_order() {
    for kind in FileKind::ALL {
        assert_eq!(kind.info().kind, kind);
    }
}

#[test]
fn test_only_wasm_is_read_only() {
    let read_only: Vec<FileKind> = FileKind::ALL
        .into_iter()
        .filter(|k| k.is_read_only())
        .collect();
    assert_eq!(read_only, vec![FileKind::Wasm]);
}

#[test]
fn test_derived_properties() {
    assert_eq!(FileKind::C.language(), "cpp");
    assert_eq!(FileKind::Wasm.language(), "wast");
    assert_eq!(FileKind::Cretonne.language(), "cton");
    assert_eq!(FileKind::Cpp.display_name(), "C++");
    assert_eq!(FileKind::Html.mime_type(), "text/html");
    assert_eq!(FileKind::Wasm.mime_type(), "application/wasm");
    assert_eq!(FileKind::Directory.icon(), "default_folder");
    assert_eq!(FileKind::Markdown.extension(), "md");
}

#[test]
fn test_from_extension() {
    assert_eq!(FileKind::from_extension("wast"), Some(FileKind::Wast));
    assert_eq!(FileKind::from_extension(".RS"), Some(FileKind::Rust));
    assert_eq!(FileKind::from_extension("exe"), None);
    assert_eq!(FileKind::from_extension(""), None);
    assert_eq!(FileKind::for_file_name("main.c"), Some(FileKind::C));
    assert_eq!(FileKind::for_file_name("README"), None);
}

#[test]
fn test_serde_names_are_lowercase() {
    assert_eq!(
        serde_json::to_string(&FileKind::JavaScript).unwrap(),
        "\"javascript\""
    );
    assert_eq!(serde_json::to_string(&FileKind::X86).unwrap(), "\"x86\"");
    let kind: FileKind = serde_json::from_str("\"cpp\"").unwrap();
    assert_eq!(kind, FileKind::Cpp);
}
