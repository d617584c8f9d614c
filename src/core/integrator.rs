//! # Change Integrator / 变更集成器
//!
//! Lands the working tree's changes through one branch and one change request,
//! and leaves the remote clean however the attempt ends.
//!
//! ```text
//! INIT -> BRANCH_CREATED -> REQUEST_OPENED -> {AUTO_MERGE_ENABLED | POLLING}
//! POLLING --(in-process)--> POLLING
//! POLLING --(mergeable)----> MERGE_REQUESTED --> MERGED
//! POLLING --(already merged)--> MERGED
//! POLLING --(rejected)--> FAILED
//! POLLING --(bound exceeded)--> TIMED_OUT
//! {MERGED | FAILED | TIMED_OUT | AUTO_MERGE_ENABLED} -> CLEANUP -> TERMINAL
//! ```
//!
//! Leftovers of earlier runs (open requests and branches carrying the reserved
//! prefix) are reclaimed before a new attempt starts. This is only correct when a
//! single run is active at a time.
//!
//! 通过一个分支和一个拉取请求落地工作树的更改，并且无论尝试以何种方式结束，
//! 都会保持远程状态干净。新尝试开始前会回收先前运行遗留的请求和分支，
//! 这仅在同一时间只有一个运行实例时才正确。

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::best_effort::{BestEffort, BestEffortFailure};
use crate::core::remote::{ChangeRequest, ChangeRequestHost, Clock, PollOutcome, WorkingTree};
use crate::error::{Result, SyncError};

/// How an opened request is driven to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionStrategy {
    /// Poll the request and merge it explicitly.
    Poll,
    /// Ask the host (through a label, its native auto-merge, or both) to merge
    /// when ready. Falls back to [`CompletionStrategy::Poll`] if nothing could be
    /// enabled.
    AutoMerge { label: Option<String>, native: bool },
}

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub branch_prefix: String,
    pub base_branch: String,
    pub commit_message: String,
    pub commit_email: String,
    pub poll_interval: Duration,
    /// Maximum number of sleeps before the attempt times out.
    pub max_waits: u32,
    pub strategy: CompletionStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Init,
    BranchCreated,
    RequestOpened,
    AutoMergeEnabled,
    Polling,
    MergeRequested,
    Merged,
    Failed,
    TimedOut,
    Cleanup,
    Terminal,
}

/// One branch plus the change request landing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeAttempt {
    pub branch: String,
    pub request: Option<ChangeRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOutcome {
    /// `by_us` is `false` when the request was found merged by someone else.
    Merged { by_us: bool },
    /// Auto-merge was enabled; the host merges after this run ends.
    HandedOff,
    Failed { detail: String },
    TimedOut { waits: u32 },
}

/// What startup compensation removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    pub closed_requests: Vec<u64>,
    pub deleted_branches: Vec<String>,
}

impl ReclaimReport {
    pub fn is_empty(&self) -> bool {
        self.closed_requests.is_empty() && self.deleted_branches.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IntegrationReport {
    pub attempt: ChangeAttempt,
    pub outcome: TerminalOutcome,
    /// Every state visited, in order.
    pub trace: Vec<LifecycleState>,
    pub waits: u32,
    pub reclaimed: ReclaimReport,
    pub best_effort_failures: Vec<BestEffortFailure>,
    /// Link to the change request, for reporting.
    pub link: String,
}

impl IntegrationReport {
    /// Turns `Failed` and `TimedOut` into errors. Cleanup has already run by the
    /// time a report exists.
    pub fn into_result(self) -> Result<Self> {
        match &self.outcome {
            TerminalOutcome::Failed { detail } => Err(SyncError::MergeRejected {
                link: self.link.clone(),
                detail: detail.clone(),
            }),
            TerminalOutcome::TimedOut { waits } => Err(SyncError::Timeout {
                link: self.link.clone(),
                waits: *waits,
            }),
            TerminalOutcome::Merged { .. } | TerminalOutcome::HandedOff => Ok(self),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LandingOutcome {
    /// The working tree matched its last commit; nothing remote was touched.
    NoChanges,
    Completed(IntegrationReport),
}

impl LandingOutcome {
    pub fn into_result(self) -> Result<Self> {
        match self {
            LandingOutcome::NoChanges => Ok(LandingOutcome::NoChanges),
            LandingOutcome::Completed(report) => report.into_result().map(LandingOutcome::Completed),
        }
    }
}

pub struct ChangeIntegrator {
    settings: LifecycleSettings,
    tree: Arc<dyn WorkingTree>,
    host: Arc<dyn ChangeRequestHost>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

/// Mutable bookkeeping of one attempt.
struct AttemptState {
    trace: Vec<LifecycleState>,
    waits: u32,
    best_effort: BestEffort,
}

impl AttemptState {
    fn enter(&mut self, state: LifecycleState) {
        info!(state = ?state, "Change attempt transition");
        self.trace.push(state);
    }
}

impl ChangeIntegrator {
    pub fn new(
        settings: LifecycleSettings,
        tree: Arc<dyn WorkingTree>,
        host: Arc<dyn ChangeRequestHost>,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            tree,
            host,
            clock,
            cancel,
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Closes every open request whose head branch carries the reserved prefix,
    /// then deletes every remaining branch with that prefix. All calls of one
    /// kind run concurrently; every failure is logged and the first one returned.
    ///
    /// 关闭所有头分支带有保留前缀的打开请求，然后删除所有带该前缀的剩余分支。
    pub async fn reclaim_stale(&self) -> Result<ReclaimReport> {
        let prefix = self.settings.branch_prefix.as_str();
        let host = self.host.as_ref();

        let stale_requests: Vec<u64> = host
            .list_open_requests()
            .await?
            .into_iter()
            .filter(|request| request.head_ref.starts_with(prefix))
            .map(|request| request.number)
            .collect();

        let closes = join_all(stale_requests.iter().map(|&number| async move {
            info!(number, "Closing stale change request");
            host.close(number).await.map(|_| number)
        }))
        .await;
        let closed = collect_all(closes, "close stale change request");

        // Branches are reclaimed even when a close failed.
        let deleted = async {
            let stale_branches: Vec<String> = host
                .list_branches()
                .await?
                .into_iter()
                .filter(|branch| branch.starts_with(prefix))
                .collect();

            let deletes = join_all(stale_branches.into_iter().map(|branch| async move {
                info!(branch = %branch, "Deleting stale branch");
                host.delete_branch(&branch).await.map(|_| branch)
            }))
            .await;
            collect_all(deletes, "delete stale branch")
        }
        .await;

        let closed_requests = closed?;
        let deleted_branches = deleted?;
        Ok(ReclaimReport {
            closed_requests,
            deleted_branches,
        })
    }

    /// Runs one complete change attempt if the working tree has changes.
    ///
    /// Primary failures (push, open, status, merge, close, delete) are returned as
    /// errors after cleanup ran. `Failed` and `TimedOut` come back as values; use
    /// [`LandingOutcome::into_result`] to turn them into errors.
    pub async fn land(&self) -> Result<LandingOutcome> {
        if !self.tree.has_changes().await? {
            info!("There are no changes in translations, nothing to land");
            return Ok(LandingOutcome::NoChanges);
        }

        let reclaimed = self.reclaim_stale().await?;

        let mut state = AttemptState {
            trace: vec![LifecycleState::Init],
            waits: 0,
            best_effort: BestEffort::new(),
        };

        let branch = format!(
            "{}{}",
            self.settings.branch_prefix,
            self.clock.timestamp_millis()
        );
        self.tree
            .commit_all_and_push(&branch, &self.settings.commit_message)
            .await?;
        state.enter(LifecycleState::BranchCreated);

        let mut attempt = ChangeAttempt {
            branch,
            request: None,
        };

        let title = format!("Automatic pull request for branch {}", attempt.branch);
        let outcome = match self
            .host
            .open_change_request(&title, &attempt.branch, &self.settings.base_branch)
            .await
        {
            Ok(request) => {
                state.enter(LifecycleState::RequestOpened);
                let outcome = self.complete(&request, &mut state).await;
                attempt.request = Some(request);
                outcome
            }
            Err(e) => Err(e),
        };

        state.enter(LifecycleState::Cleanup);
        let cleanup = self.cleanup(&attempt, outcome.as_ref().ok()).await;
        state.enter(LifecycleState::Terminal);

        let outcome = match (outcome, cleanup) {
            (Err(primary), cleanup) => {
                if let Err(e) = cleanup {
                    error!(error = %e, "Cleanup failed after a failed change attempt");
                }
                return Err(primary);
            }
            (Ok(_), Err(e)) => return Err(e),
            (Ok(outcome), Ok(())) => outcome,
        };

        let link = attempt
            .request
            .as_ref()
            .map(|request| self.host.request_link(request.number))
            .unwrap_or_default();

        Ok(LandingOutcome::Completed(IntegrationReport {
            attempt,
            outcome,
            trace: state.trace,
            waits: state.waits,
            reclaimed,
            best_effort_failures: state.best_effort.into_failures(),
            link,
        }))
    }

    async fn complete(
        &self,
        request: &ChangeRequest,
        state: &mut AttemptState,
    ) -> Result<TerminalOutcome> {
        if let CompletionStrategy::AutoMerge { label, native } = &self.settings.strategy {
            let mut enabled = false;

            if let Some(label) = label {
                let labels = [label.clone()];
                enabled |= state
                    .best_effort
                    .run("add auto-merge label", self.host.add_labels(request.number, &labels))
                    .await
                    .is_some();
            }
            if *native {
                enabled |= state
                    .best_effort
                    .run(
                        "enable native auto-merge",
                        self.host
                            .enable_auto_merge(request, &self.settings.commit_email),
                    )
                    .await
                    .is_some();
            }

            if enabled {
                state.enter(LifecycleState::AutoMergeEnabled);
                return Ok(TerminalOutcome::HandedOff);
            }
            warn!("Auto-merge could not be enabled, falling back to polling");
        }

        self.poll(request, state).await
    }

    async fn poll(
        &self,
        request: &ChangeRequest,
        state: &mut AttemptState,
    ) -> Result<TerminalOutcome> {
        state.enter(LifecycleState::Polling);
        let link = self.host.request_link(request.number);

        loop {
            let status = self.host.status(request.number).await?;
            match status.poll_outcome() {
                PollOutcome::InProcess => {
                    if state.waits >= self.settings.max_waits {
                        state.enter(LifecycleState::TimedOut);
                        return Ok(TerminalOutcome::TimedOut { waits: state.waits });
                    }
                    info!("Pull request {link} is in process, waiting.");
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => {
                            state.enter(LifecycleState::Failed);
                            return Ok(TerminalOutcome::Failed {
                                detail: "cancelled while waiting".to_string(),
                            });
                        }
                        _ = self.clock.sleep(self.settings.poll_interval) => {}
                    }
                    state.waits += 1;
                }
                PollOutcome::Mergeable => {
                    state.enter(LifecycleState::MergeRequested);
                    self.host.merge(request.number, &request.head_sha).await?;
                    info!("Pull request {link} merged.");
                    state.enter(LifecycleState::Merged);
                    return Ok(TerminalOutcome::Merged { by_us: true });
                }
                PollOutcome::AlreadyMerged => {
                    info!("Pull request {link} was already merged.");
                    state.enter(LifecycleState::Merged);
                    return Ok(TerminalOutcome::Merged { by_us: false });
                }
                PollOutcome::Rejected(detail) => {
                    state.enter(LifecycleState::Failed);
                    return Ok(TerminalOutcome::Failed { detail });
                }
            }
        }
    }

    /// Closes the request unless it merged and deletes the branch. Both steps are
    /// attempted even if the first fails. A hand-off leaves both in place.
    async fn cleanup(&self, attempt: &ChangeAttempt, outcome: Option<&TerminalOutcome>) -> Result<()> {
        if matches!(outcome, Some(TerminalOutcome::HandedOff)) {
            info!(branch = %attempt.branch, "Request handed off to auto-merge, leaving it open");
            return Ok(());
        }

        let merged = matches!(outcome, Some(TerminalOutcome::Merged { .. }));
        let close = match &attempt.request {
            Some(request) if !merged => self.host.close(request.number).await,
            _ => Ok(()),
        };
        if let Err(e) = &close {
            error!(error = %e, "Failed to close change request during cleanup");
        }

        let delete = self.host.delete_branch(&attempt.branch).await;
        if let Err(e) = &delete {
            error!(error = %e, branch = %attempt.branch, "Failed to delete branch during cleanup");
        }

        close.and(delete)
    }
}

fn collect_all<T>(results: Vec<Result<T>>, operation: &str) -> Result<Vec<T>> {
    let mut values = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(e) => {
                error!(error = %e, "Failed to {operation}");
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(values),
    }
}
