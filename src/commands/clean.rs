// src/commands/clean.rs

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use crate::commands::{build_integrator, load_session, setup_signal_handler};
use crate::core::config::Requirements;
use crate::infra::t;
use crate::reporting::print_reclaim_summary;

/// Closes stale automation pull requests and deletes their branches.
pub async fn execute(config: PathBuf, language: Option<String>) -> Result<()> {
    let requirements = Requirements {
        provider: false,
        host: true,
    };
    let session = load_session(&config, requirements, language)?;
    let locale = session.locale.clone();

    let cancel = setup_signal_handler(&locale, None);
    let integrator = build_integrator(&session, cancel)?;
    let report = integrator
        .reclaim_stale()
        .await
        .with_context(|| t!("clean.failed", locale = &locale))?;

    if report.is_empty() {
        println!("{}", t!("clean.nothing_to_clean", locale = &locale).green());
    } else {
        print_reclaim_summary(&report, &locale);
    }
    println!("\n{}", t!("clean.done", locale = &locale).green().bold());
    Ok(())
}
