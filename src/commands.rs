//! # Commands / 命令
//!
//! One module per subcommand, plus the setup they share: loading and validating
//! the configuration, choosing the console language, wiring the production
//! adapters and handling Ctrl-C.
//!
//! 每个子命令一个模块，以及它们共享的准备工作：加载并校验配置、
//! 选择控制台语言、组装生产适配器以及处理 Ctrl-C。

pub mod clean;
pub mod pull;
pub mod push;
pub mod wipe;

use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::catalog::{NamespaceCatalog, PathFilter};
use crate::core::config::{Requirements, Settings};
use crate::core::integrator::ChangeIntegrator;
use crate::core::namespace::NamespaceLayout;
use crate::core::remote::NotificationSink;
use crate::core::workflow::SyncContext;
use crate::infra::clock::TokioClock;
use crate::infra::git::{GitWorkingTree, authenticated_remote};
use crate::infra::github::GitHubClient;
use crate::infra::phrase::PhraseClient;
use crate::infra::slack::SlackWebhook;
use crate::infra::t;
use crate::resolve_language;

/// A loaded configuration together with the language chosen for the run.
pub(crate) struct Session {
    pub settings: Settings,
    pub locale: String,
    pub root: PathBuf,
}

/// Reads `.env`, the configuration file and the environment, then validates the
/// result for the services the command is about to use.
pub(crate) fn load_session(
    config: &Path,
    requirements: Requirements,
    explicit_language: Option<String>,
) -> Result<Session> {
    // For config parsing, we don't have the locale yet.
    let early_locale = resolve_language(explicit_language.as_deref());

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    let mut settings = Settings::load(config).with_context(|| {
        t!("config_read_failed_path", locale = &early_locale, path = config.display())
    })?;
    settings
        .apply_env_overrides(|name| std::env::var(name).ok())
        .with_context(|| t!("config_invalid", locale = &early_locale))?;
    settings
        .validate(requirements)
        .with_context(|| t!("config_invalid", locale = &early_locale))?;

    let locale = resolve_language(explicit_language.or_else(|| settings.language.clone()).as_deref());
    rust_i18n::set_locale(&locale);

    let root = settings.resolved_working_directory()?;
    let root = root.canonicalize().with_context(|| {
        t!("working_dir_not_found", locale = &locale, path = root.display())
    })?;
    println!(
        "{}",
        t!("working_dir_detected", locale = &locale, path = root.display())
    );

    Ok(Session {
        settings,
        locale,
        root,
    })
}

pub(crate) fn default_jobs() -> usize {
    num_cpus::get() / 2 + 1
}

/// Cancels the returned token on Ctrl-C and, when configured, once the overall
/// deadline passes.
pub(crate) fn setup_signal_handler(locale: &str, deadline: Option<Duration>) -> CancellationToken {
    let token = CancellationToken::new();

    let token_clone = token.clone();
    let locale_owned = locale.to_string();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", t!("shutdown_signal", locale = &locale_owned).yellow());
                token_clone.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {e}"),
        }
    });

    if let Some(deadline) = deadline {
        let token_clone = token.clone();
        let locale_owned = locale.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = token_clone.cancelled() => {}
                _ = tokio::time::sleep(deadline) => {
                    println!(
                        "{}",
                        t!("deadline_reached", locale = &locale_owned, secs = deadline.as_secs()).yellow()
                    );
                    token_clone.cancel();
                }
            }
        });
    }

    token
}

/// Discovers the catalog and wires the provider and the notification sink.
pub(crate) fn build_sync_context(session: &Session, jobs: Option<usize>) -> Result<SyncContext> {
    let settings = &session.settings;
    let reference = settings.reference_locale()?.clone();

    let filter = PathFilter::default().with_extra(settings.forbidden_paths.iter().cloned());
    let catalog = NamespaceCatalog::discover(&reference.name, &session.root, &filter)
        .with_context(|| t!("catalog_failed", locale = &session.locale))?
        .with_layout(NamespaceLayout::from(&settings.layout));
    println!(
        "{}",
        t!(
            "namespaces_found",
            locale = &session.locale,
            count = catalog.len(),
            reference = &reference.name
        )
        .cyan()
    );

    let provider = Arc::new(PhraseClient::new(&settings.provider)?);
    let notifier: Option<Arc<dyn NotificationSink>> = match &settings.notifications.webhook_url {
        Some(url) if !url.is_empty() => Some(Arc::new(SlackWebhook::new(url.clone())?)),
        _ => None,
    };

    Ok(SyncContext {
        locales: settings.locales.clone(),
        reference,
        catalog,
        provider,
        notifier,
        notifications: settings.notifications.clone(),
        jobs: jobs.unwrap_or_else(default_jobs),
        language: session.locale.clone(),
    })
}

/// Wires git, GitHub and the clock into a [`ChangeIntegrator`].
pub(crate) fn build_integrator(session: &Session, cancel: CancellationToken) -> Result<ChangeIntegrator> {
    let settings = &session.settings;
    let host = &settings.host;

    let remote = authenticated_remote(&host.git_url, &host.owner, &host.repository, &host.token)?;
    let tree = GitWorkingTree::new(
        &session.root,
        &settings.integration.commit_name,
        &settings.integration.commit_email,
    )
    .with_push_remote(remote.to_string(), Some(host.token.clone()));

    Ok(ChangeIntegrator::new(
        settings.lifecycle_settings(),
        Arc::new(tree),
        Arc::new(GitHubClient::new(host)?),
        Arc::new(TokioClock),
        cancel,
    ))
}
