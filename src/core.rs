//! # Core Module / 核心模块
//!
//! This module contains the reconciliation engine: configuration, the namespace
//! catalog, the merge model, the diff engine and the pull-request lifecycle.
//!
//! 此模块包含协调引擎：配置、命名空间目录、合并模型、差异引擎以及拉取请求生命周期。

pub mod best_effort;
pub mod catalog;
pub mod config;
pub mod diff;
pub mod integrator;
pub mod keys;
pub mod models;
pub mod namespace;
pub mod remote;
pub mod workflow;

// Re-exports
pub use config::Settings;
pub use models::{RemoteSnapshot, TranslationMap};
pub use remote::{ChangeRequestHost, Clock, NotificationSink, TranslationProvider, WorkingTree};
