//! # Infrastructure Module / 基础设施模块
//!
//! This module provides the adapters behind the engine's collaborator traits:
//! process execution, file system helpers, git, GitHub, Phrase and Slack.
//!
//! 此模块提供引擎协作接口背后的适配器：
//! 进程执行、文件系统辅助、git、GitHub、Phrase 和 Slack。

pub mod clock;
pub mod command;
pub mod fs;
pub mod git;
pub mod github;
pub mod phrase;
pub mod slack;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
