//! # Reporting Module / 报告模块
//!
//! This module prints colorful, localized run summaries to the console and
//! generates the non-Latin-script line report consumed by the lint step.
//!
//! 此模块在控制台打印带颜色的本地化运行摘要，
//! 并生成供 lint 步骤使用的非拉丁文字行报告。

pub mod console;
pub mod script_report;

// Re-export common reporting functions
pub use console::{
    print_apply_summary, print_diff_summary, print_landing_summary, print_reclaim_summary,
};
pub use script_report::{count_script_lines, write_script_report};
