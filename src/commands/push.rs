// src/commands/push.rs

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use crate::commands::{build_sync_context, load_session};
use crate::core::config::Requirements;
use crate::core::workflow::push_translations;
use crate::infra::t;
use crate::reporting::print_diff_summary;

/// Publishes local key additions and removals to the provider.
pub async fn execute(config: PathBuf, jobs: Option<usize>, language: Option<String>) -> Result<()> {
    let requirements = Requirements {
        provider: true,
        host: false,
    };
    let session = load_session(&config, requirements, language)?;
    let locale = session.locale.clone();

    let ctx = build_sync_context(&session, jobs)?;
    let summary = push_translations(&ctx)
        .await
        .with_context(|| t!("push.failed", locale = &locale))?;
    print_diff_summary(&summary, &locale);

    println!("\n{}", t!("push.done", locale = &locale).green().bold());
    Ok(())
}
