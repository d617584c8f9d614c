// src/commands/pull.rs

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;
use std::time::Duration;

use crate::commands::{build_integrator, build_sync_context, load_session, setup_signal_handler};
use crate::core::config::Requirements;
use crate::core::workflow::pull_translations;
use crate::infra::t;
use crate::reporting::{print_apply_summary, print_landing_summary, write_script_report};

/// Merges every locale from the provider into the working tree, regenerates the
/// script report and lands the result through a pull request.
pub async fn execute(config: PathBuf, jobs: Option<usize>, language: Option<String>) -> Result<()> {
    let requirements = Requirements {
        provider: true,
        host: true,
    };
    let session = load_session(&config, requirements, language)?;
    let locale = session.locale.clone();

    let deadline = session
        .settings
        .integration
        .overall_timeout_secs
        .map(Duration::from_secs);
    let cancel = setup_signal_handler(&locale, deadline);

    let ctx = build_sync_context(&session, jobs)?;
    let summary = pull_translations(&ctx)
        .await
        .with_context(|| t!("pull.failed", locale = &locale))?;
    print_apply_summary(&summary, &locale);

    if session.settings.script_report.enabled {
        let path = write_script_report(&session.root, &session.settings.script_report)?;
        println!(
            "{}",
            t!("pull.script_report_written", locale = &locale, path = path.display()).cyan()
        );
    }

    let integrator = build_integrator(&session, cancel)?;
    let outcome = integrator
        .land()
        .await
        .with_context(|| t!("pull.landing_failed", locale = &locale))?;
    print_landing_summary(&outcome, &locale);
    outcome.into_result()?;

    println!("\n{}", t!("pull.done", locale = &locale).green().bold());
    Ok(())
}
