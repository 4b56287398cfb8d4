//! 核心框架模块
//!
//! - Event: 一对多的同步事件通道

pub mod event;

pub use event::{Callback, EventChannel, EventError};
