use super::*;
use crate::core::Callback;
use crate::models::problem::ProblemSeverity;
use std::cell::RefCell;
use std::rc::Rc;

fn recorder(log: &Rc<RefCell<Vec<NodeId>>>) -> Callback<NodeId> {
    let log = Rc::clone(log);
    Rc::new(move |origin: &NodeId| log.borrow_mut().push(*origin))
}

/// root/src/{main.c, lib/util.c}, root/out.wasm
fn sample_tree() -> (ProjectTree, NodeId, NodeId, NodeId) {
    let mut tree = ProjectTree::new("demo");
    let root = tree.root();
    let main = tree.ensure_file(root, "src/main.c", FileKind::C).unwrap();
    let util = tree.ensure_file(root, "src/lib/util.c", FileKind::C).unwrap();
    tree.ensure_file(root, "out.wasm", FileKind::Wasm).unwrap();
    let src = tree.resolve_path(root, "src").unwrap();
    (tree, src, main, util)
}

#[test]
fn test_new_tree() {
    let tree = ProjectTree::new("demo");
    assert!(tree.is_dir(tree.root()));
    assert!(tree.is_expanded(tree.root()));
    assert_eq!(tree.name(tree.root()), Some("demo"));
    assert_eq!(tree.path(tree.root()), "");
    assert!(tree.has_no_entries());
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.on_project_change().name(), "Project Change");
    assert_eq!(tree.on_dirty_file_used().name(), "Dirty File Used");
}

#[test]
fn test_new_file_defaults() {
    let mut tree = ProjectTree::default();
    let file = tree.create_file("a.wast", FileKind::Wast);
    assert_eq!(tree.kind(file), Some(FileKind::Wast));
    assert_eq!(tree.parent(file), None);
    assert!(!tree.is_dirty(file));
    assert_eq!(tree.description(file), None);
    assert_eq!(tree.content(file), Some(&FileData::Text(String::new())));

    let wasm = tree.create_file("a.wasm", FileKind::Wasm);
    assert!(tree.is_read_only(wasm));
    assert_eq!(tree.description(wasm), Some("Read Only"));
}

#[test]
fn test_add_child_sets_parent_and_order() {
    let mut tree = ProjectTree::new("p");
    let root = tree.root();
    let a = tree.create_file("a.c", FileKind::C);
    let b = tree.create_file("b.c", FileKind::C);
    tree.add_child(root, a).unwrap();
    tree.add_child(root, b).unwrap();

    assert_eq!(tree.children(root), &[a, b]);
    assert_eq!(tree.parent(a), Some(root));
    assert_eq!(tree.depth(a), 1);
    assert_eq!(tree.project_of(a), Some(root));
}

#[test]
fn test_add_child_rejects_attached_node() {
    let mut tree = ProjectTree::new("p");
    let root = tree.root();
    let dir = tree.create_directory("d");
    let file = tree.create_file("a.c", FileKind::C);
    tree.add_child(root, dir).unwrap();
    tree.add_child(root, file).unwrap();

    assert_eq!(tree.add_child(dir, file), Err(TreeError::AlreadyAttached(file)));
    assert_eq!(tree.children(dir), &[] as &[NodeId]);
}

#[test]
fn test_add_child_rejects_file_parent_and_cycles() {
    let mut tree = ProjectTree::new("p");
    let root = tree.root();
    let file = tree.create_file("a.c", FileKind::C);
    let other = tree.create_file("b.c", FileKind::C);
    assert_eq!(tree.add_child(file, other), Err(TreeError::NotADirectory(file)));

    let outer = tree.create_directory("outer");
    let inner = tree.create_directory("inner");
    tree.add_child(outer, inner).unwrap();
    assert_eq!(tree.add_child(inner, outer), Err(TreeError::WouldCycle(outer)));
    assert_eq!(tree.add_child(outer, outer), Err(TreeError::WouldCycle(outer)));

    assert_eq!(
        tree.add_child(inner, root),
        Err(TreeError::AlreadyAttached(root))
    );
}

#[test]
fn test_remove_child_detaches_and_allows_reattach() {
    let (mut tree, src, main, _) = sample_tree();
    let root = tree.root();

    tree.remove_child(src, main).unwrap();
    assert_eq!(tree.parent(main), None);
    assert!(!tree.children(src).contains(&main));
    assert_eq!(tree.project_of(main), None);

    tree.add_child(root, main).unwrap();
    assert_eq!(tree.path(main), "main.c");
}

#[test]
fn test_remove_child_requires_membership() {
    let (mut tree, src, main, _) = sample_tree();
    let root = tree.root();
    assert_eq!(
        tree.remove_child(root, main),
        Err(TreeError::NotAChild {
            parent: root,
            child: main
        })
    );
    assert_eq!(tree.parent(main), Some(src));
}

#[test]
fn test_discard_frees_subtree() {
    let (mut tree, src, main, util) = sample_tree();
    let root = tree.root();

    assert_eq!(tree.discard(src), Err(TreeError::StillAttached(src)));

    assert_eq!(tree.node_count(), 6);
    tree.remove_child(root, src).unwrap();
    assert_eq!(tree.node_count(), 6);
    tree.discard(src).unwrap();
    assert_eq!(tree.node_count(), 2);
    assert!(!tree.has_no_entries());
    assert!(!tree.contains(src));
    assert!(!tree.contains(main));
    assert!(!tree.contains(util));
    assert_eq!(tree.list(root), vec!["out.wasm"]);
}

#[test]
fn test_path_and_depth() {
    let (tree, src, main, util) = sample_tree();
    assert_eq!(tree.path(src), "src");
    assert_eq!(tree.path(main), "src/main.c");
    assert_eq!(tree.path(util), "src/lib/util.c");
    assert_eq!(tree.depth(util), 3);
}

#[test]
fn test_children_changed_propagates_to_ancestors() {
    let (mut tree, src, _, _) = sample_tree();
    let root = tree.root();
    let lib = tree.resolve_path(root, "src/lib").unwrap();

    let root_log = Rc::new(RefCell::new(Vec::new()));
    let src_log = Rc::new(RefCell::new(Vec::new()));
    let root_cb = recorder(&root_log);
    let src_cb = recorder(&src_log);
    tree.on_did_change_children(root).unwrap().register(&root_cb);
    tree.on_did_change_children(src).unwrap().register(&src_cb);

    let extra = tree.create_file("extra.c", FileKind::C);
    tree.add_child(lib, extra).unwrap();

    assert_eq!(*root_log.borrow(), vec![lib]);
    assert_eq!(*src_log.borrow(), vec![lib]);
}

#[test]
fn test_files_have_no_children_channel() {
    let (tree, _, main, _) = sample_tree();
    assert!(tree.on_did_change_children(main).is_none());
    assert!(tree.on_did_change_buffer(main).is_some());
}

#[test]
fn test_edit_buffer_marks_dirty_once() {
    let (mut tree, src, main, _) = sample_tree();
    let root = tree.root();
    tree.set_content(main, FileData::from("int x;"), true).unwrap();

    let file_log = Rc::new(RefCell::new(Vec::new()));
    let root_log = Rc::new(RefCell::new(Vec::new()));
    let file_cb = recorder(&file_log);
    let root_cb = recorder(&root_log);
    tree.on_did_change_buffer(main).unwrap().register(&file_cb);
    tree.on_did_change_buffer(root).unwrap().register(&root_cb);

    tree.edit_buffer(main, 6..6, "\nint y;").unwrap();
    tree.edit_buffer(main, 0..0, "// c\n").unwrap();

    assert!(tree.is_dirty(main));
    assert_eq!(tree.buffer_text(main).unwrap(), "// c\nint x;\nint y;");
    assert_eq!(*file_log.borrow(), vec![main]);
    assert_eq!(*root_log.borrow(), vec![main]);
    assert!(!tree.is_dirty(src));
}

#[test]
fn test_edit_buffer_clears_markers() {
    let (mut tree, _, main, _) = sample_tree();
    tree.set_markers(
        main,
        vec![Diagnostic::at(ProblemSeverity::Error, "bad", 1, 1)],
    )
    .unwrap();
    assert_eq!(tree.markers(main).len(), 1);

    tree.edit_buffer(main, 0..0, "x").unwrap();
    assert!(tree.markers(main).is_empty());
}

#[test]
fn test_edit_buffer_clamps_range() {
    let (mut tree, _, main, _) = sample_tree();
    tree.set_content(main, FileData::from("abc"), true).unwrap();
    tree.edit_buffer(main, 2..100, "Z").unwrap();
    assert_eq!(tree.buffer_text(main).unwrap(), "abZ");
}

#[test]
fn test_read_only_file_rejects_edits() {
    let mut tree = ProjectTree::new("p");
    let root = tree.root();
    let wasm = tree.ensure_file(root, "a.wasm", FileKind::Wasm).unwrap();
    assert_eq!(tree.edit_buffer(wasm, 0..0, "x"), Err(TreeError::ReadOnly(wasm)));
    assert!(!tree.is_dirty(wasm));
    assert_eq!(
        tree.edit_buffer(root, 0..0, "x"),
        Err(TreeError::NotAFile(root))
    );
}

#[test]
fn test_save_copies_buffer_and_notifies_content() {
    let (mut tree, _, main, _) = sample_tree();
    let root = tree.root();
    tree.edit_buffer(main, 0..0, "int main;").unwrap();

    let data_log = Rc::new(RefCell::new(Vec::new()));
    let buffer_log = Rc::new(RefCell::new(Vec::new()));
    let data_cb = recorder(&data_log);
    let buffer_cb = recorder(&buffer_log);
    tree.on_did_change_data(root).unwrap().register(&data_cb);
    tree.on_did_change_buffer(root).unwrap().register(&buffer_cb);

    tree.save(main).unwrap();
    assert!(!tree.is_dirty(main));
    assert_eq!(tree.content(main), Some(&FileData::from("int main;")));
    assert_eq!(*data_log.borrow(), vec![main]);
    assert!(buffer_log.borrow().is_empty());

    // Saving a clean file is a no-op.
    tree.save(main).unwrap();
    assert_eq!(data_log.borrow().len(), 1);
}

#[test]
fn test_set_content_resets_buffer_and_dirty() {
    let (mut tree, _, main, _) = sample_tree();
    tree.edit_buffer(main, 0..0, "draft").unwrap();

    tree.set_content(main, FileData::from("clean"), false).unwrap();
    assert!(tree.is_dirty(main));
    assert_eq!(tree.buffer_text(main).unwrap(), "draft");

    tree.set_content(main, FileData::from("clean"), true).unwrap();
    assert!(!tree.is_dirty(main));
    assert_eq!(tree.buffer_text(main).unwrap(), "clean");
}

#[test]
fn test_dirty_content_read_warns_project() {
    let (mut tree, _, main, _) = sample_tree();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let cb: Callback<DirtyFileUsed> = {
        let seen = Rc::clone(&seen);
        Rc::new(move |event: &DirtyFileUsed| seen.borrow_mut().push(event.path.clone()))
    };
    tree.on_dirty_file_used().register(&cb);

    tree.content(main);
    assert!(seen.borrow().is_empty());

    tree.edit_buffer(main, 0..0, "x").unwrap();
    assert_eq!(tree.content(main), Some(&FileData::default()));
    assert_eq!(*seen.borrow(), vec!["src/main.c".to_string()]);
}

#[test]
fn test_detached_dirty_read_is_silent() {
    let mut tree = ProjectTree::new("p");
    let loose = tree.create_file("a.c", FileKind::C);
    tree.edit_buffer(loose, 0..0, "x").unwrap();

    let hits = Rc::new(RefCell::new(0));
    let cb: Callback<DirtyFileUsed> = {
        let hits = Rc::clone(&hits);
        Rc::new(move |_: &DirtyFileUsed| *hits.borrow_mut() += 1)
    };
    tree.on_dirty_file_used().register(&cb);
    tree.content(loose);
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn test_set_problems_propagates() {
    let (mut tree, src, main, _) = sample_tree();
    let log = Rc::new(RefCell::new(Vec::new()));
    let cb = recorder(&log);
    tree.on_did_change_problems(src).unwrap().register(&cb);

    tree.set_problems(main, vec![Problem::new("oops", ProblemSeverity::Error)])
        .unwrap();
    assert_eq!(tree.problems(main).len(), 1);
    assert_eq!(*log.borrow(), vec![main]);
}

#[test]
fn test_resolve_path() {
    let (tree, src, main, util) = sample_tree();
    let root = tree.root();
    assert_eq!(tree.resolve_path(root, "src"), Some(src));
    assert_eq!(tree.resolve_path(root, "src/main.c"), Some(main));
    assert_eq!(tree.resolve_path(src, "lib/util.c"), Some(util));
    assert_eq!(tree.resolve_path(root, "src/missing.c"), None);
    assert_eq!(tree.resolve_path(root, "src/main.c/x"), None);
    assert_eq!(tree.resolve_path(root, ""), None);
}

#[test]
fn test_ensure_directory_is_idempotent() {
    let mut tree = ProjectTree::new("p");
    let root = tree.root();
    let first = tree.ensure_directory(root, "a/b/c").unwrap();
    let second = tree.ensure_directory(root, "a/b/c").unwrap();
    assert_eq!(first, second);
    assert_eq!(tree.path(first), "a/b/c");
    assert_eq!(tree.children(root).len(), 1);
}

#[test]
fn test_ensure_directory_over_file_is_kind_mismatch() {
    let (mut tree, _, _, _) = sample_tree();
    let root = tree.root();
    let err = tree.ensure_directory(root, "src/main.c/inner").unwrap_err();
    assert_eq!(
        err,
        TreeError::KindMismatch {
            name: "main.c".to_string(),
            expected: FileKind::Directory,
            found: FileKind::C,
        }
    );
}

#[test]
fn test_ensure_file_reuses_or_rejects() {
    let (mut tree, _, main, _) = sample_tree();
    let root = tree.root();
    assert_eq!(tree.ensure_file(root, "src/main.c", FileKind::C), Ok(main));
    assert!(matches!(
        tree.ensure_file(root, "src/main.c", FileKind::Rust),
        Err(TreeError::KindMismatch { .. })
    ));
}

#[test]
fn test_list_depth_first_in_child_order() {
    let (tree, src, _, _) = sample_tree();
    let root = tree.root();
    assert_eq!(
        tree.list(root),
        vec!["src/main.c", "src/lib/util.c", "out.wasm"]
    );
    assert_eq!(tree.list(src), vec!["main.c", "lib/util.c"]);
}

#[test]
fn test_glob() {
    let (tree, _, main, util) = sample_tree();
    let root = tree.root();
    assert_eq!(
        tree.glob(root, "**/*.c").unwrap(),
        vec!["src/main.c", "src/lib/util.c"]
    );
    assert_eq!(tree.glob(root, "*.wasm").unwrap(), vec!["out.wasm"]);
    assert_eq!(tree.glob_nodes(root, "src/**/*.c").unwrap(), vec![main, util]);
    assert!(tree.glob(root, "*.rs").unwrap().is_empty());
}

#[test]
fn test_subtree_order() {
    let (tree, src, main, util) = sample_tree();
    let lib = tree.parent(util).unwrap();
    assert_eq!(tree.subtree(src), vec![src, main, lib, util]);
}

#[test]
fn test_rename_notifies_parent() {
    let (mut tree, src, main, _) = sample_tree();
    let log = Rc::new(RefCell::new(Vec::new()));
    let cb = recorder(&log);
    tree.on_did_change_children(src).unwrap().register(&cb);

    tree.rename(main, "entry.c").unwrap();
    assert_eq!(tree.path(main), "src/entry.c");
    assert_eq!(*log.borrow(), vec![src]);
}
