//! # Remote Collaborators / 远程协作者
//!
//! The engine talks to the outside world only through the traits in this
//! module: the translation provider, the local working tree, the change-request
//! host, the notification sink and the clock. Production implementations live in
//! [`crate::infra`]; tests substitute in-memory fakes.
//!
//! 引擎只通过本模块中的 trait 与外部交互：翻译服务、本地工作树、
//! 拉取请求托管平台、通知渠道和时钟。生产实现位于 [`crate::infra`]，
//! 测试则使用内存中的替身。

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::models::RemoteSnapshot;
use crate::error::Result;

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Downloads every key of `locale_id` as one immutable snapshot.
    async fn fetch_snapshot(&self, locale_id: &str) -> Result<RemoteSnapshot>;

    /// Uploads a namespace file, tagged with the namespace name.
    async fn upload(&self, locale_id: &str, tag: &str, file: &Path) -> Result<()>;

    async fn delete_key(&self, key: &str) -> Result<()>;

    /// Removes every key of the project for `locale_id`.
    async fn delete_all(&self, locale_id: &str) -> Result<()>;

    /// A human-facing URL pointing at `key`.
    fn key_link(&self, key: &str) -> String;
}

/// The local checkout the merged files were written to.
#[async_trait]
pub trait WorkingTree: Send + Sync {
    /// `true` when the tree differs from its last commit.
    async fn has_changes(&self) -> Result<bool>;

    /// Creates `branch`, stages everything, commits with `message` and pushes.
    async fn commit_all_and_push(&self, branch: &str, message: &str) -> Result<()>;
}

/// A freshly opened change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub number: u64,
    /// Host-global identifier, needed by the auto-merge mutation.
    pub node_id: String,
    /// Head commit at creation; the merge is rejected if the branch moved.
    pub head_sha: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Open,
    Closed,
}

/// The host's own view of whether a request can be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeableState {
    Clean,
    HasHooks,
    Unstable,
    Blocked,
    Behind,
    Dirty,
    Draft,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStatus {
    pub state: RequestState,
    pub merged: bool,
    /// `None` while the host is still computing mergeability.
    pub mergeable: Option<bool>,
    pub mergeable_state: MergeableState,
}

/// What one status check means for the polling loop.
/// 一次状态检查对轮询循环的意义。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Checks are still running; wait and look again.
    InProcess,
    /// Ready; merge with the head SHA.
    Mergeable,
    /// Someone merged it already. Accepted without further checks.
    AlreadyMerged,
    Rejected(String),
}

impl RequestStatus {
    pub fn poll_outcome(&self) -> PollOutcome {
        if self.merged {
            return PollOutcome::AlreadyMerged;
        }
        if self.state == RequestState::Closed {
            return PollOutcome::Rejected("request was closed".to_string());
        }
        match (self.mergeable, self.mergeable_state) {
            (None, _) => PollOutcome::InProcess,
            (_, MergeableState::Unknown | MergeableState::Blocked | MergeableState::Unstable) => {
                PollOutcome::InProcess
            }
            (Some(true), MergeableState::Clean | MergeableState::HasHooks) => PollOutcome::Mergeable,
            (Some(false), state) => {
                PollOutcome::Rejected(format!("not mergeable (state: {state:?})"))
            }
            (Some(true), state) => PollOutcome::Rejected(format!("unexpected state {state:?}")),
        }
    }
}

/// An open request as listed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub number: u64,
    pub head_ref: String,
}

#[async_trait]
pub trait ChangeRequestHost: Send + Sync {
    async fn open_change_request(&self, title: &str, head: &str, base: &str)
    -> Result<ChangeRequest>;

    async fn status(&self, number: u64) -> Result<RequestStatus>;

    /// Merges only if the head still points at `head_sha`.
    async fn merge(&self, number: u64, head_sha: &str) -> Result<()>;

    async fn close(&self, number: u64) -> Result<()>;

    async fn delete_branch(&self, branch: &str) -> Result<()>;

    async fn list_open_requests(&self) -> Result<Vec<OpenRequest>>;

    async fn list_branches(&self) -> Result<Vec<String>>;

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()>;

    async fn enable_auto_merge(&self, request: &ChangeRequest, author_email: &str) -> Result<()>;

    fn request_link(&self, number: u64) -> String;
}

/// A message for the team channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: String,
    pub author: String,
    pub icon: String,
    pub text: String,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

#[async_trait]
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch, UTC.
    fn timestamp_millis(&self) -> i64;

    async fn sleep(&self, duration: Duration);
}
