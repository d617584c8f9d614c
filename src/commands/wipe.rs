// src/commands/wipe.rs

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::path::PathBuf;

use crate::commands::load_session;
use crate::core::config::Requirements;
use crate::core::workflow::wipe_translations;
use crate::infra::phrase::PhraseClient;
use crate::infra::t;

/// Deletes every key of every configured locale from the provider.
pub async fn execute(config: PathBuf, assume_yes: bool, language: Option<String>) -> Result<()> {
    let requirements = Requirements {
        provider: true,
        host: false,
    };
    let session = load_session(&config, requirements, language)?;
    let locale = session.locale.clone();

    if !assume_yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("wipe.confirm_prompt", locale = &locale).to_string())
            .default(false)
            .interact()
            .with_context(|| t!("wipe.confirmation_failed", locale = &locale))?;
        if !confirmed {
            println!("{}", t!("wipe.aborted", locale = &locale).yellow());
            return Ok(());
        }
    }

    let provider = PhraseClient::new(&session.settings.provider)?;
    let wiped = wipe_translations(&session.settings.locales, &provider, &locale).await?;
    println!(
        "\n{}",
        t!("wipe.done", locale = &locale, count = wiped.len()).green().bold()
    );
    Ok(())
}
