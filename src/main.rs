use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fiddle::kernel::build::TaskGraph;
use fiddle::kernel::services::adapters::{load_settings, parse_diagnostics, ProjectStore};
use fiddle::kernel::Workspace;
use fiddle::models::FileKind;
use serde_json::json;

mod logging;

const USAGE: &str = "usage:
  fiddle list <project.json> [glob]
  fiddle build <project.json>
  fiddle diagnostics <console.log>";

enum Command {
    List { project: PathBuf, pattern: Option<String> },
    Build { project: PathBuf },
    Diagnostics { console: PathBuf },
}

fn parse_args(args: &[String]) -> Option<Command> {
    match args {
        [cmd, project] if cmd == "list" => Some(Command::List {
            project: PathBuf::from(project),
            pattern: None,
        }),
        [cmd, project, pattern] if cmd == "list" => Some(Command::List {
            project: PathBuf::from(project),
            pattern: Some(pattern.clone()),
        }),
        [cmd, project] if cmd == "build" => Some(Command::Build {
            project: PathBuf::from(project),
        }),
        [cmd, console] if cmd == "diagnostics" => Some(Command::Diagnostics {
            console: PathBuf::from(console),
        }),
        _ => None,
    }
}

fn load_workspace(path: &Path) -> io::Result<Workspace> {
    let settings = load_settings().unwrap_or_default();
    let doc = ProjectStore::new(path)
        .load()
        .map_err(io::Error::other)?
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no project at {}", path.display()),
            )
        })?;

    let mut workspace = Workspace::new(Default::default(), settings);
    workspace.load_document(&doc).map_err(io::Error::other)?;
    Ok(workspace)
}

/// Summarises the project: one task per file kind present, all feeding the
/// configured default task.
fn summary_graph(workspace: &Workspace, default_task: &str) -> TaskGraph {
    let tree = workspace.tree();
    let root = tree.root();
    let files: Vec<(String, FileKind)> = tree
        .list(root)
        .into_iter()
        .filter_map(|path| {
            let kind = tree.kind(tree.resolve_path(root, &path)?)?;
            Some((path, kind))
        })
        .collect();
    let files = Arc::new(files);

    let mut graph = TaskGraph::new();
    let mut kinds: Vec<String> = Vec::new();
    for kind in FileKind::ALL {
        if !files.iter().any(|(_, k)| *k == kind) {
            continue;
        }
        let name = format!("{:?}", kind).to_lowercase();
        let files = Arc::clone(&files);
        graph.task(&name, &[], move || {
            let files = Arc::clone(&files);
            async move {
                let paths: Vec<&str> = files
                    .iter()
                    .filter(|(_, k)| *k == kind)
                    .map(|(p, _)| p.as_str())
                    .collect();
                Ok(json!(paths))
            }
        });
        kinds.push(name);
    }

    let total = files.len();
    let deps: Vec<&str> = kinds.iter().map(String::as_str).collect();
    graph.task(default_task, &deps, move || async move {
        Ok(json!({ "files": total }))
    });
    graph
}

fn main() -> io::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = parse_args(&args) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let settings = load_settings().unwrap_or_default();
    let _logging = logging::init(settings.log_filter.as_deref(), false);

    match command {
        Command::List { project, pattern } => {
            let workspace = load_workspace(&project)?;
            let tree = workspace.tree();
            let paths = match pattern {
                Some(pattern) => tree
                    .glob(tree.root(), &pattern)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?,
                None => tree.list(tree.root()),
            };
            for path in paths {
                println!("{}", path);
            }
        }
        Command::Build { project } => {
            let workspace = load_workspace(&project)?;
            let graph = summary_graph(&workspace, &workspace.settings().build.default_task);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()?;
            match runtime.block_on(workspace.build(Arc::new(graph))) {
                Ok(output) => println!("{}", output),
                Err(err) => {
                    eprintln!("build failed: {}", err);
                    std::process::exit(1);
                }
            }
        }
        Command::Diagnostics { console } => {
            let text = std::fs::read_to_string(&console)?;
            for diagnostic in parse_diagnostics(&text) {
                println!(
                    "{}:{}:{}: {}",
                    diagnostic.severity.label(),
                    diagnostic.start_line,
                    diagnostic.start_column,
                    diagnostic.message
                );
            }
        }
    }

    Ok(())
}
