//! fiddle - 项目文档模型与构建任务图
//!
//! 模块结构：
//! - core: 事件通道（EventChannel）
//! - models: 数据模型（ProjectTree, EditorGroup, FileKind, glob）
//! - kernel: 构建会话、编译集成、持久化与工作区

pub mod core;
pub mod kernel;
pub mod models;
