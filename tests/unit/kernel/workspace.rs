use super::*;
use crate::models::{FileData, FileKind};
use serde_json::json;
use std::cell::Cell;

fn sample_workspace() -> (Workspace, NodeId, NodeId, NodeId) {
    let mut tree = ProjectTree::new("demo");
    let root = tree.root();
    let main = tree.ensure_file(root, "src/main.c", FileKind::C).unwrap();
    let util = tree.ensure_file(root, "src/util.c", FileKind::C).unwrap();
    let build = tree.ensure_file(root, "build.ts", FileKind::TypeScript).unwrap();
    (Workspace::new(tree, Settings::default()), main, util, build)
}

fn counter(hits: &Rc<Cell<usize>>) -> Callback<()> {
    let hits = Rc::clone(hits);
    Rc::new(move |_: &()| hits.set(hits.get() + 1))
}

#[test]
fn test_open_file_uses_preview_setting() {
    let (mut ws, main, util, _) = sample_workspace();
    ws.open_file(main, None).unwrap();
    ws.open_file(util, None).unwrap();
    assert_eq!(ws.active_group().open_files(), &[util]);

    let mut settings = Settings::default();
    settings.editor.preview_by_default = false;
    let mut ws = Workspace::new(ProjectTree::new("x"), settings);
    let root = ws.tree().root();
    let a = ws.tree_mut().ensure_file(root, "a.c", FileKind::C).unwrap();
    let b = ws.tree_mut().ensure_file(root, "b.c", FileKind::C).unwrap();
    ws.open_file(a, None).unwrap();
    ws.open_file(b, None).unwrap();
    assert_eq!(ws.active_group().open_files(), &[a, b]);
}

#[test]
fn test_open_directory_is_rejected() {
    let (mut ws, main, _, _) = sample_workspace();
    let src = ws.tree().parent(main).unwrap();
    assert!(matches!(
        ws.open_file(src, Some(false)),
        Err(WorkspaceError::NotAFile(_))
    ));
}

#[test]
fn test_close_file_not_open() {
    let (mut ws, main, _, _) = sample_workspace();
    assert!(matches!(
        ws.close_file(main),
        Err(WorkspaceError::Group(EditorGroupError::NotOpen(_)))
    ));
}

#[test]
fn test_split_group() {
    let (mut ws, main, util, _) = sample_workspace();
    ws.split_group();
    assert_eq!(ws.groups().len(), 1);

    ws.open_file(main, Some(false)).unwrap();
    ws.open_file(util, Some(false)).unwrap();
    ws.split_group();

    assert_eq!(ws.groups().len(), 2);
    assert_eq!(ws.active_group_index(), 1);
    assert_eq!(ws.active_group().open_files(), &[util]);
    assert_eq!(ws.active_group().active_file(), Some(util));
    assert_eq!(ws.active_group().preview_file(), None);
}

#[test]
fn test_delete_node_closes_tabs_in_every_group() {
    let (mut ws, main, util, build) = sample_workspace();
    ws.open_file(main, Some(false)).unwrap();
    ws.open_file(build, Some(false)).unwrap();
    ws.open_file(util, Some(false)).unwrap();
    ws.split_group();

    let src = ws.tree().parent(main).unwrap();
    ws.delete_node(src).unwrap();

    assert_eq!(ws.groups()[0].open_files(), &[build]);
    assert_eq!(ws.groups()[0].active_file(), Some(build));
    assert!(ws.groups()[1].is_empty());
    assert!(!ws.tree().contains(main));
    assert_eq!(ws.tree().list(ws.tree().root()), vec!["build.ts"]);

    let root = ws.tree().root();
    assert!(ws.delete_node(root).is_err());
}

#[test]
fn test_build_and_run_requests() {
    let (ws, ..) = sample_workspace();
    let builds = Rc::new(Cell::new(0));
    let runs = Rc::new(Cell::new(0));
    let on_build = counter(&builds);
    let on_run = counter(&runs);
    ws.on_build().register(&on_build);
    ws.on_run().register(&on_run);

    ws.request_build();
    ws.request_build();
    ws.request_run();
    assert_eq!(builds.get(), 2);
    assert_eq!(runs.get(), 1);
}

#[test]
fn test_document_round_trip_restores_tabs() {
    let (mut ws, main, util, build) = sample_workspace();
    ws.tree_mut()
        .set_content(main, FileData::from("int main;"), true)
        .unwrap();
    ws.open_file(main, Some(false)).unwrap();
    ws.open_file(build, Some(true)).unwrap();
    ws.split_group();
    ws.open_file(util, Some(false)).unwrap();

    let doc = ws.to_document();
    assert_eq!(
        doc.opened_files,
        vec![
            vec!["src/main.c".to_string(), "build.ts".to_string()],
            vec!["build.ts".to_string(), "src/util.c".to_string()],
        ]
    );

    let changes = Rc::new(Cell::new(0));
    let (mut restored, ..) = sample_workspace();
    let on_change = counter(&changes);
    restored.on_project_change().register(&on_change);
    restored.load_document(&doc).unwrap();

    assert_eq!(changes.get(), 1);
    assert_eq!(restored.groups().len(), 2);
    assert_eq!(restored.active_group_index(), 0);
    assert_eq!(restored.opened_files(), doc.opened_files);
    let first = &restored.groups()[0];
    assert_eq!(first.active_file(), Some(first.open_files()[0]));
    assert_eq!(first.preview_file(), None);

    let root = restored.tree().root();
    let main = restored.tree().resolve_path(root, "src/main.c").unwrap();
    assert_eq!(
        restored.tree().stored_content(main),
        Some(&FileData::from("int main;"))
    );
}

#[test]
fn test_load_document_skips_missing_paths() {
    let doc: ProjectDocument = serde_json::from_value(json!({
        "name": "p",
        "children": [{ "name": "a.c", "type": "c", "data": "" }],
        "openedFiles": [["a.c", "gone.c"]]
    }))
    .unwrap();
    let (mut ws, ..) = sample_workspace();
    ws.load_document(&doc).unwrap();
    assert_eq!(ws.opened_files(), vec![vec!["a.c".to_string()]]);
    assert_eq!(ws.tree().name(ws.tree().root()), Some("p"));
}

#[test]
fn test_load_document_collapses_repeated_tabs() {
    let doc: ProjectDocument = serde_json::from_value(json!({
        "name": "p",
        "children": [{ "name": "a.c", "type": "c", "data": "" }],
        "openedFiles": [["a.c", "a.c"]]
    }))
    .unwrap();
    let (mut ws, ..) = sample_workspace();
    ws.load_document(&doc).unwrap();
    assert_eq!(ws.active_group().len(), 1);
    assert_eq!(ws.opened_files(), vec![vec!["a.c".to_string()]]);
}

#[test]
fn test_load_document_without_tabs_has_one_group() {
    let doc = ProjectDocument {
        name: "empty".to_string(),
        children: Vec::new(),
        opened_files: Vec::new(),
    };
    let (mut ws, ..) = sample_workspace();
    ws.load_document(&doc).unwrap();
    assert_eq!(ws.groups().len(), 1);
    assert!(ws.active_group().is_empty());
}

#[tokio::test]
async fn test_build_runs_default_task() {
    let (ws, ..) = sample_workspace();
    let mut graph = TaskGraph::new();
    graph.task("compile", &[], || async { Ok(json!("module.wasm")) });
    graph.task("default", &["compile"], || async { Ok(json!("done")) });

    assert_eq!(ws.build(Arc::new(graph)).await, Ok(json!("done")));
    assert!(matches!(
        ws.build(Arc::new(TaskGraph::new())).await,
        Err(BuildError::UnknownTask { .. })
    ));
}
