use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    #[serde(default)]
    pub editor: EditorSettings,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    #[serde(default = "default_preview")]
    pub preview_by_default: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            preview_by_default: default_preview(),
        }
    }
}

fn default_preview() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_task")]
    pub default_task: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            default_task: default_task(),
        }
    }
}

fn default_task() -> String {
    "default".to_string()
}
