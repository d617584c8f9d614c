//! # Locsync Library / Locsync 库
//!
//! This library reconciles per-namespace localization files in a repository with a
//! remote translation service, and lands the resulting changes through an automated
//! pull-request workflow that always cleans up after itself.
//!
//! 此库将仓库中按命名空间划分的本地化文件与远程翻译服务进行协调，
//! 并通过自动化的拉取请求流程将结果合并回仓库，且总能自行清理。
//!
//! ## Modules / 模块
//!
//! - `core` - Namespace catalog, merge model, diff engine and the pull-request lifecycle
//! - `infra` - Adapters for git, GitHub, Phrase and Slack
//! - `reporting` - Console summaries and the non-Latin-script report
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 命名空间目录、合并模型、差异引擎以及拉取请求生命周期
//! - `infra` - git、GitHub、Phrase 和 Slack 的适配器
//! - `reporting` - 控制台摘要和非拉丁文字报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod commands;
pub mod core;
pub mod error;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::catalog::NamespaceCatalog;
pub use crate::core::config::Settings;
pub use crate::core::diff::{KeyDiff, compute_diff};
pub use crate::core::integrator::ChangeIntegrator;
pub use crate::core::namespace::LocalizationNamespace;
pub use error::{Result, SyncError};

/// Picks the language for console messages.
///
/// An explicit choice wins. Otherwise the system locale is used: first the full
/// locale (e.g. "zh-CN"), then its language part (e.g. "en" from "en-US"), and
/// finally "en".
pub fn resolve_language(explicit: Option<&str>) -> String {
    let available_locales = rust_i18n::available_locales!();
    let requested = explicit
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());

    if available_locales.contains(&requested.as_str()) {
        return requested;
    }

    requested
        .split('-')
        .next()
        .filter(|lang_code| available_locales.contains(lang_code))
        .unwrap_or("en")
        .to_string()
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
