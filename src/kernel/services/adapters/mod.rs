//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod diagnostics;
pub mod paths;
pub mod persistence;
pub mod settings;

pub use diagnostics::parse_diagnostics;
pub use paths::{ensure_log_dir, get_log_dir};
pub use persistence::{
    deserialize_node, load_project, serialize_node, to_document, DataJson, NodeJson,
    PersistError, ProjectDocument, ProjectStore,
};
pub use settings::{
    ensure_settings_file, get_settings_path, load_settings, load_settings_from,
    write_default_settings,
};
