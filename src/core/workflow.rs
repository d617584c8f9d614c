//! # Synchronization Workflows / 同步工作流
//!
//! The pull and push halves of the reconciliation loop, plus the destructive
//! wipe. Each workflow receives everything it needs through a [`SyncContext`];
//! nothing here reads process-wide state.
//!
//! 协调循环的拉取与推送两部分，以及破坏性的清空操作。
//! 每个工作流都通过 [`SyncContext`] 获得所需的一切，不读取进程级状态。

use colored::*;
use futures::{StreamExt, stream};
use std::io;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::best_effort::{BestEffort, BestEffortFailure};
use crate::core::catalog::NamespaceCatalog;
use crate::core::config::{LocaleInfo, NotificationSettings};
use crate::core::diff::{KeyDiff, compute_diff};
use crate::core::models::{LocalePullReport, RemoteSnapshot};
use crate::core::remote::{Notification, NotificationSink, TranslationProvider};
use crate::error::{Result, SyncError};
use crate::infra::t;

/// Everything a workflow needs for one run.
pub struct SyncContext {
    pub locales: Vec<LocaleInfo>,
    pub reference: LocaleInfo,
    pub catalog: NamespaceCatalog,
    pub provider: Arc<dyn TranslationProvider>,
    pub notifier: Option<Arc<dyn NotificationSink>>,
    pub notifications: NotificationSettings,
    /// Upper bound on locales processed concurrently.
    pub jobs: usize,
    /// Language of console and notification text.
    pub language: String,
}

#[derive(Debug, Clone, Default)]
pub struct PullSummary {
    /// One report per configured locale, in configuration order.
    pub locales: Vec<LocalePullReport>,
    /// Keys still present locally that the reference snapshot no longer has.
    pub removal_candidates: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PushSummary {
    pub diff: KeyDiff,
    /// `(locale name, namespace)` of every uploaded file.
    pub uploaded: Vec<(String, String)>,
    pub best_effort_failures: Vec<BestEffortFailure>,
}

/// Fetches every locale and merges it into the local namespace files.
///
/// Locales run concurrently, bounded by `ctx.jobs`; the namespaces of one
/// locale are merged in parallel on the blocking pool against a shared,
/// read-only snapshot.
///
/// 获取每个语言区域并合并到本地命名空间文件中。语言区域并发执行，
/// 同一语言区域的命名空间在阻塞线程池中并行合并。
pub async fn pull_translations(ctx: &SyncContext) -> Result<PullSummary> {
    let lang = ctx.language.as_str();

    let results: Vec<(usize, Result<(LocalePullReport, Arc<RemoteSnapshot>)>)> =
        stream::iter(ctx.locales.iter().cloned().enumerate())
            .map(|(index, locale)| async move { (index, pull_locale(ctx, locale).await) })
            .buffer_unordered(ctx.jobs.max(1))
            .collect()
            .await;

    let mut ordered = Vec::with_capacity(results.len());
    for (index, result) in results {
        ordered.push((index, result?));
    }
    ordered.sort_by_key(|(index, _)| *index);

    let mut summary = PullSummary::default();
    let mut reference_snapshot = None;
    for (_, (report, snapshot)) in ordered {
        if report.locale == ctx.reference.name {
            reference_snapshot = Some(snapshot);
        }
        summary.locales.push(report);
    }

    if let Some(reference) = reference_snapshot {
        let namespaces = ctx.catalog.namespaces(&ctx.reference);
        summary.removal_candidates = compute_diff(&namespaces, &reference)?.added_keys;
        for key in &summary.removal_candidates {
            println!("{}", t!("pull.removal_candidate", locale = lang, key = key).yellow());
        }
    }

    Ok(summary)
}

async fn pull_locale(
    ctx: &SyncContext,
    locale: LocaleInfo,
) -> Result<(LocalePullReport, Arc<RemoteSnapshot>)> {
    let lang = ctx.language.as_str();
    println!("{}", t!("pull.fetching_locale", locale = lang, name = &locale.name).blue());

    let snapshot = Arc::new(ctx.provider.fetch_snapshot(&locale.id).await?);
    info!(locale = %locale.name, keys = snapshot.len(), "Fetched snapshot");

    let handles: Vec<_> = ctx
        .catalog
        .namespaces(&locale)
        .into_iter()
        .map(|namespace| {
            let snapshot = Arc::clone(&snapshot);
            tokio::task::spawn_blocking(move || namespace.apply_translations(&snapshot))
        })
        .collect();

    let mut namespaces = Vec::with_capacity(handles.len());
    for joined in futures::future::join_all(handles).await {
        let report = joined.map_err(|e| SyncError::Io(io::Error::other(e)))??;
        if report.has_changes() {
            println!(
                "{}",
                t!(
                    "pull.namespace_updated",
                    locale = lang,
                    namespace = &report.namespace,
                    added = report.added.len(),
                    changed = report.changed.len()
                )
                .green()
            );
        }
        namespaces.push(report);
    }

    let report = LocalePullReport {
        locale: locale.name,
        snapshot_size: snapshot.len(),
        namespaces,
    };
    Ok((report, snapshot))
}

/// Publishes local changes: deletes keys the reference copy lost, uploads every
/// namespace file with keys the provider does not know yet and announces both.
///
/// 发布本地更改：删除参考副本中已丢失的键，上传包含新键的命名空间文件，并发送通知。
pub async fn push_translations(ctx: &SyncContext) -> Result<PushSummary> {
    let lang = ctx.language.as_str();
    let mut best_effort = BestEffort::new();

    println!("{}", t!("push.diff_check", locale = lang).blue());
    let reference = ctx.provider.fetch_snapshot(&ctx.reference.id).await?;
    let diff = compute_diff(&ctx.catalog.namespaces(&ctx.reference), &reference)?;

    for key in &diff.removed_keys {
        println!("{}", t!("push.removing_key", locale = lang, key = key).yellow());
        ctx.provider.delete_key(key).await?;
    }
    let header = t!("push.notify_removed_header", locale = lang);
    notify_keys(ctx, &mut best_effort, &header, &diff.removed_keys).await;

    let results: Vec<Result<Vec<(String, String)>>> = stream::iter(ctx.locales.iter().cloned())
        .map(|locale| push_locale(ctx, locale))
        .buffer_unordered(ctx.jobs.max(1))
        .collect()
        .await;

    let mut uploaded = Vec::new();
    for result in results {
        uploaded.extend(result?);
    }
    uploaded.sort();

    let header = t!("push.notify_added_header", locale = lang);
    notify_keys(ctx, &mut best_effort, &header, &diff.added_keys).await;

    Ok(PushSummary {
        diff,
        uploaded,
        best_effort_failures: best_effort.into_failures(),
    })
}

async fn push_locale(ctx: &SyncContext, locale: LocaleInfo) -> Result<Vec<(String, String)>> {
    let lang = ctx.language.as_str();
    let snapshot = ctx.provider.fetch_snapshot(&locale.id).await?;
    let mut uploaded = Vec::new();

    for namespace in ctx.catalog.namespaces(&locale) {
        if !namespace.has_data() {
            continue;
        }
        if namespace.added_keys_relative_to(&snapshot)?.is_empty() {
            debug!(
                "Nothing to push in namespace {}: {}",
                namespace.name(),
                namespace.data_file().display()
            );
            continue;
        }

        println!(
            "{}",
            t!(
                "push.uploading",
                locale = lang,
                namespace = namespace.name(),
                path = namespace.data_file().display()
            )
            .blue()
        );
        namespace.validate()?;
        ctx.provider
            .upload(&locale.id, namespace.name(), namespace.data_file())
            .await?;
        uploaded.push((locale.name.clone(), namespace.name().to_string()));
    }

    Ok(uploaded)
}

async fn notify_keys(ctx: &SyncContext, best_effort: &mut BestEffort, header: &str, keys: &[String]) {
    let Some(notifier) = &ctx.notifier else {
        debug!("No notification sink configured, skipping: {header}");
        return;
    };
    let Some(notification) = key_notification(
        header,
        keys,
        ctx.provider.as_ref(),
        &ctx.notifications,
        &ctx.language,
    ) else {
        return;
    };
    best_effort
        .run("send notification", notifier.send(&notification))
        .await;
}

/// Builds the channel message announcing `keys`: at most
/// `settings.max_listed_keys` links, then a line counting the rest.
/// Returns `None` when there is nothing to announce.
pub fn key_notification(
    header: &str,
    keys: &[String],
    provider: &dyn TranslationProvider,
    settings: &NotificationSettings,
    language: &str,
) -> Option<Notification> {
    if keys.is_empty() {
        return None;
    }

    let mut text = format!("{header}\n");
    let links: Vec<String> = keys
        .iter()
        .take(settings.max_listed_keys)
        .map(|key| format!("<{}|{}>", provider.key_link(key), key))
        .collect();
    text.push_str(&links.join("\n"));
    text.push('\n');

    if keys.len() > settings.max_listed_keys {
        let rest = keys.len() - settings.max_listed_keys;
        text.push_str(&t!("push.notify_more_keys", locale = language, count = rest));
        text.push('\n');
    }

    Some(Notification {
        channel: settings.channel.clone(),
        author: settings.author.clone(),
        icon: settings.icon.clone(),
        text,
    })
}

/// Deletes every remote key, locale by locale. Returns the wiped locale names.
/// Needs no catalog, so the working tree is never scanned.
pub async fn wipe_translations(
    locales: &[LocaleInfo],
    provider: &dyn TranslationProvider,
    language: &str,
) -> Result<Vec<String>> {
    let mut wiped = Vec::with_capacity(locales.len());
    for locale in locales {
        println!("{}", t!("wipe.wiping_locale", locale = language, name = &locale.name).yellow());
        provider.delete_all(&locale.id).await?;
        wiped.push(locale.name.clone());
    }
    Ok(wiped)
}
