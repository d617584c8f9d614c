//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the end-of-run summaries of every command in the console,
//! colorful and localized.
//!
//! 此模块在控制台打印每个命令运行结束时的摘要，带颜色并支持国际化。

use colored::*;

use crate::core::integrator::{LandingOutcome, ReclaimReport, TerminalOutcome};
use crate::core::workflow::{PullSummary, PushSummary};
use crate::infra::t;

/// Prints what a pull merged into the working tree.
///
/// # Output Format / 输出格式
/// ```text
/// --- Pull Summary ---
///   - Locale   | Remote keys | Added | Changed
///   - en       |         120 |     2 |       1
///   - ru       |         118 |     0 |       0
/// ```
pub fn print_apply_summary(summary: &PullSummary, locale: &str) {
    println!("\n{}", t!("summary.pull_banner", locale = locale).bold());
    println!(
        "  - {:<8} | {:>11} | {:>5} | {:>7}",
        t!("summary.column_locale", locale = locale),
        t!("summary.column_remote", locale = locale),
        t!("summary.column_added", locale = locale),
        t!("summary.column_changed", locale = locale)
    );

    for report in &summary.locales {
        let added = report.added_count();
        let changed = report.changed_count();
        let line = format!(
            "  - {:<8} | {:>11} | {:>5} | {:>7}",
            report.locale, report.snapshot_size, added, changed
        );
        if added + changed > 0 {
            println!("{}", line.green());
        } else {
            println!("{}", line.dimmed());
        }
    }

    if !summary.removal_candidates.is_empty() {
        println!(
            "{}",
            t!(
                "summary.removal_candidates",
                locale = locale,
                count = summary.removal_candidates.len()
            )
            .yellow()
        );
    }
}

/// Prints the reference diff and the uploads of a push.
pub fn print_diff_summary(summary: &PushSummary, locale: &str) {
    println!("\n{}", t!("summary.push_banner", locale = locale).bold());

    if summary.diff.is_empty() && summary.uploaded.is_empty() {
        println!("{}", t!("summary.nothing_to_push", locale = locale).green());
        return;
    }

    for key in &summary.diff.added_keys {
        println!("  {} {}", "+".green(), key);
    }
    for key in &summary.diff.removed_keys {
        println!("  {} {}", "-".red(), key);
    }
    for (locale_name, namespace) in &summary.uploaded {
        println!(
            "{}",
            t!("summary.uploaded", locale = locale, namespace = namespace, name = locale_name).cyan()
        );
    }

    print_best_effort_count(summary.best_effort_failures.len(), locale);
}

/// Prints how a change attempt ended.
pub fn print_landing_summary(outcome: &LandingOutcome, locale: &str) {
    let report = match outcome {
        LandingOutcome::NoChanges => {
            println!("{}", t!("summary.no_changes", locale = locale).green());
            return;
        }
        LandingOutcome::Completed(report) => report,
    };

    print_reclaim_summary(&report.reclaimed, locale);

    let link = report.link.as_str();
    let line = match &report.outcome {
        TerminalOutcome::Merged { by_us: true } => {
            t!("summary.merged", locale = locale, link = link).green()
        }
        TerminalOutcome::Merged { by_us: false } => {
            t!("summary.merged_externally", locale = locale, link = link).green()
        }
        TerminalOutcome::HandedOff => {
            t!("summary.handed_off", locale = locale, link = link).cyan()
        }
        TerminalOutcome::Failed { detail } => {
            t!("summary.failed", locale = locale, link = link, detail = detail).red()
        }
        TerminalOutcome::TimedOut { waits } => {
            t!("summary.timed_out", locale = locale, link = link, waits = waits).red()
        }
    };
    println!("{}", line.bold());

    print_best_effort_count(report.best_effort_failures.len(), locale);
}

pub fn print_reclaim_summary(report: &ReclaimReport, locale: &str) {
    if report.is_empty() {
        return;
    }
    println!(
        "{}",
        t!(
            "summary.reclaimed",
            locale = locale,
            requests = report.closed_requests.len(),
            branches = report.deleted_branches.len()
        )
        .yellow()
    );
}

fn print_best_effort_count(count: usize, locale: &str) {
    if count > 0 {
        println!(
            "{}",
            t!("summary.best_effort_failures", locale = locale, count = count).yellow()
        );
    }
}
