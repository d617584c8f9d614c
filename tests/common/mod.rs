// Shared test helpers: temporary working trees and in-memory collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use walkdir::WalkDir;

use locsync::core::catalog::{NamespaceCatalog, PathFilter};
use locsync::core::config::{LocaleInfo, NotificationSettings};
use locsync::core::integrator::{CompletionStrategy, LifecycleSettings};
use locsync::core::workflow::SyncContext;
use locsync::core::models::{RemoteSnapshot, TranslationMap};
use locsync::core::remote::{
    ChangeRequest, ChangeRequestHost, Clock, MergeableState, Notification, NotificationSink,
    OpenRequest, RequestState, RequestStatus, TranslationProvider, WorkingTree,
};
use locsync::{Result, SyncError};

pub const PREFIX: &str = "LocalizationPull";

pub const MINIMAL_CSPROJ: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
</Project>
"#;

/// Writes `content` to `root/relative`, creating directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

pub fn snapshot(locale_id: &str, entries: &[(&str, &str)]) -> RemoteSnapshot {
    RemoteSnapshot::new(locale_id, entries.iter().copied().collect::<TranslationMap>())
}

/// A project directory `App` with a manifest and an empty localization folder.
pub fn project_tree() -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    write_file(temp_dir.path(), "App/App.csproj", MINIMAL_CSPROJ);
    fs::create_dir_all(temp_dir.path().join("App/Resources/Localization")).unwrap();
    temp_dir
}

pub fn localization_path(root: &Path, namespace: &str, locale: &str) -> PathBuf {
    root.join("App/Resources/Localization")
        .join(format!("{namespace}.{locale}.i18n.json"))
}

pub fn locales() -> Vec<LocaleInfo> {
    vec![
        LocaleInfo {
            name: "en".to_string(),
            id: "en-id".to_string(),
            is_reference: true,
        },
        LocaleInfo {
            name: "ru".to_string(),
            id: "ru-id".to_string(),
            is_reference: false,
        },
    ]
}

/// A context over `root` with the `en`/`ru` locales and the default layout.
pub fn sync_context(
    root: &Path,
    provider: Arc<FakeProvider>,
    notifier: Option<Arc<FakeNotifier>>,
) -> SyncContext {
    let locales = locales();
    let catalog = NamespaceCatalog::discover("en", root, &PathFilter::default()).unwrap();
    SyncContext {
        reference: locales[0].clone(),
        locales,
        catalog,
        provider,
        notifier: notifier.map(|n| n as Arc<dyn NotificationSink>),
        notifications: NotificationSettings::default(),
        jobs: 2,
        language: "en".to_string(),
    }
}

pub fn lifecycle(strategy: CompletionStrategy, max_waits: u32) -> LifecycleSettings {
    LifecycleSettings {
        branch_prefix: PREFIX.to_string(),
        base_branch: "master".to_string(),
        commit_message: "fix: localization (automatic integration commit)".to_string(),
        commit_email: "bot@example.com".to_string(),
        poll_interval: Duration::from_secs(60),
        max_waits,
        strategy,
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

pub fn in_process() -> RequestStatus {
    RequestStatus {
        state: RequestState::Open,
        merged: false,
        mergeable: None,
        mergeable_state: MergeableState::Unknown,
    }
}

pub fn mergeable() -> RequestStatus {
    RequestStatus {
        state: RequestState::Open,
        merged: false,
        mergeable: Some(true),
        mergeable_state: MergeableState::Clean,
    }
}

pub fn merged_elsewhere() -> RequestStatus {
    RequestStatus {
        state: RequestState::Closed,
        merged: true,
        mergeable: None,
        mergeable_state: MergeableState::Unknown,
    }
}

pub fn conflicting() -> RequestStatus {
    RequestStatus {
        state: RequestState::Open,
        merged: false,
        mergeable: Some(false),
        mergeable_state: MergeableState::Dirty,
    }
}

/// Remote repository state as the fake host sees it.
#[derive(Debug, Default)]
pub struct HostState {
    /// Open requests by number, with their head branch.
    pub open_requests: BTreeMap<u64, String>,
    pub branches: BTreeSet<String>,
    pub closed: Vec<u64>,
    pub deleted_branches: Vec<String>,
    pub merges: Vec<(u64, String)>,
    pub labels: Vec<(u64, Vec<String>)>,
    pub auto_merge: Vec<u64>,
    pub status_calls: u32,
    pub next_number: u64,
}

/// In-memory change-request host. Status checks pop `script`, then repeat `fallback`.
pub struct FakeHost {
    pub state: Mutex<HostState>,
    script: Mutex<VecDeque<RequestStatus>>,
    fallback: RequestStatus,
    pub fail_open: bool,
    pub fail_merge: bool,
    pub fail_labels: bool,
    pub fail_auto_merge: bool,
    pub fail_close: bool,
    /// Fails `close` for this request number only.
    pub fail_close_for: Option<u64>,
    pub fail_delete: bool,
}

impl FakeHost {
    pub fn new(script: Vec<RequestStatus>, fallback: RequestStatus) -> Self {
        Self {
            state: Mutex::new(HostState {
                next_number: 100,
                branches: BTreeSet::from(["master".to_string()]),
                ..HostState::default()
            }),
            script: Mutex::new(script.into()),
            fallback,
            fail_open: false,
            fail_merge: false,
            fail_labels: false,
            fail_auto_merge: false,
            fail_close: false,
            fail_close_for: None,
            fail_delete: false,
        }
    }

    pub fn with_stale(self, requests: &[(u64, &str)], branches: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for (number, head) in requests {
                state.open_requests.insert(*number, head.to_string());
            }
            for branch in branches {
                state.branches.insert(branch.to_string());
            }
        }
        self
    }

    /// No open request and no branch carrying the reserved prefix.
    pub fn is_clean(&self) -> bool {
        let state = self.state.lock().unwrap();
        !state.open_requests.values().any(|head| head.starts_with(PREFIX))
            && !state.branches.iter().any(|branch| branch.starts_with(PREFIX))
    }

    fn failure(operation: &str) -> SyncError {
        SyncError::remote("FakeHost", Some(500), format!("{operation} failed"))
    }
}

#[async_trait]
impl ChangeRequestHost for FakeHost {
    async fn open_change_request(&self, _title: &str, head: &str, _base: &str) -> Result<ChangeRequest> {
        if self.fail_open {
            return Err(Self::failure("open"));
        }
        let mut state = self.state.lock().unwrap();
        state.next_number += 1;
        let number = state.next_number;
        state.open_requests.insert(number, head.to_string());
        Ok(ChangeRequest {
            number,
            node_id: format!("PR_{number}"),
            head_sha: format!("sha-{number}"),
            url: format!("https://example.com/pull/{number}"),
        })
    }

    async fn status(&self, number: u64) -> Result<RequestStatus> {
        let next = self.script.lock().unwrap().pop_front();
        let status = next.unwrap_or_else(|| self.fallback.clone());
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        // Someone else merged or closed it.
        if status.merged || status.state == RequestState::Closed {
            state.open_requests.remove(&number);
        }
        Ok(status)
    }

    async fn merge(&self, number: u64, head_sha: &str) -> Result<()> {
        if self.fail_merge {
            return Err(Self::failure("merge"));
        }
        let mut state = self.state.lock().unwrap();
        state.open_requests.remove(&number);
        state.merges.push((number, head_sha.to_string()));
        Ok(())
    }

    async fn close(&self, number: u64) -> Result<()> {
        if self.fail_close || self.fail_close_for == Some(number) {
            return Err(Self::failure("close"));
        }
        let mut state = self.state.lock().unwrap();
        state.open_requests.remove(&number);
        state.closed.push(number);
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        if self.fail_delete {
            return Err(Self::failure("delete"));
        }
        let mut state = self.state.lock().unwrap();
        state.branches.remove(branch);
        state.deleted_branches.push(branch.to_string());
        Ok(())
    }

    async fn list_open_requests(&self) -> Result<Vec<OpenRequest>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .open_requests
            .iter()
            .map(|(number, head)| OpenRequest {
                number: *number,
                head_ref: head.clone(),
            })
            .collect())
    }

    async fn list_branches(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().branches.iter().cloned().collect())
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        if self.fail_labels {
            return Err(Self::failure("label"));
        }
        self.state.lock().unwrap().labels.push((number, labels.to_vec()));
        Ok(())
    }

    async fn enable_auto_merge(&self, request: &ChangeRequest, _author_email: &str) -> Result<()> {
        if self.fail_auto_merge {
            return Err(Self::failure("auto-merge"));
        }
        self.state.lock().unwrap().auto_merge.push(request.number);
        Ok(())
    }

    fn request_link(&self, number: u64) -> String {
        format!("https://example.com/pull/{number}")
    }
}

// ---------------------------------------------------------------------------
// Working trees
// ---------------------------------------------------------------------------

/// A working tree with a fixed answer to `has_changes`. Pushing creates the branch
/// on the fake host.
pub struct FakeTree {
    pub changes: bool,
    pub host: Arc<FakeHost>,
    pub pushed: Mutex<Vec<(String, String)>>,
    pub fail_push: bool,
}

impl FakeTree {
    pub fn new(changes: bool, host: Arc<FakeHost>) -> Self {
        Self {
            changes,
            host,
            pushed: Mutex::new(Vec::new()),
            fail_push: false,
        }
    }
}

#[async_trait]
impl WorkingTree for FakeTree {
    async fn has_changes(&self) -> Result<bool> {
        Ok(self.changes)
    }

    async fn commit_all_and_push(&self, branch: &str, message: &str) -> Result<()> {
        if self.fail_push {
            return Err(SyncError::VersionControl {
                command: format!("git push origin {branch}"),
                output: "rejected".to_string(),
            });
        }
        self.pushed
            .lock()
            .unwrap()
            .push((branch.to_string(), message.to_string()));
        self.host
            .state
            .lock()
            .unwrap()
            .branches
            .insert(branch.to_string());
        Ok(())
    }
}

/// A working tree that compares the directory with the contents captured at
/// construction time, the way `git status` compares with the last commit.
pub struct DirectoryTree {
    root: PathBuf,
    committed: BTreeMap<PathBuf, Vec<u8>>,
    host: Arc<FakeHost>,
}

impl DirectoryTree {
    pub fn capture(root: &Path, host: Arc<FakeHost>) -> Self {
        Self {
            root: root.to_path_buf(),
            committed: read_tree(root),
            host,
        }
    }
}

fn read_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| (entry.path().to_path_buf(), fs::read(entry.path()).unwrap()))
        .collect()
}

#[async_trait]
impl WorkingTree for DirectoryTree {
    async fn has_changes(&self) -> Result<bool> {
        Ok(read_tree(&self.root) != self.committed)
    }

    async fn commit_all_and_push(&self, branch: &str, _message: &str) -> Result<()> {
        self.host
            .state
            .lock()
            .unwrap()
            .branches
            .insert(branch.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Clock, provider, notifications
// ---------------------------------------------------------------------------

/// Never actually sleeps; counts the calls.
#[derive(Default)]
pub struct FakeClock {
    pub sleeps: AtomicU32,
}

impl FakeClock {
    pub fn sleeps(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn timestamp_millis(&self) -> i64 {
        1_700_000_000_000
    }

    async fn sleep(&self, _duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeProvider {
    pub snapshots: HashMap<String, RemoteSnapshot>,
    pub uploads: Mutex<Vec<(String, String, PathBuf)>>,
    pub deleted: Mutex<Vec<String>>,
    pub wiped: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn with_snapshot(mut self, snapshot: RemoteSnapshot) -> Self {
        self.snapshots
            .insert(snapshot.locale_id().to_string(), snapshot);
        self
    }
}

#[async_trait]
impl TranslationProvider for FakeProvider {
    async fn fetch_snapshot(&self, locale_id: &str) -> Result<RemoteSnapshot> {
        Ok(self
            .snapshots
            .get(locale_id)
            .cloned()
            .unwrap_or_else(|| RemoteSnapshot::new(locale_id, TranslationMap::new())))
    }

    async fn upload(&self, locale_id: &str, tag: &str, file: &Path) -> Result<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((locale_id.to_string(), tag.to_string(), file.to_path_buf()));
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn delete_all(&self, locale_id: &str) -> Result<()> {
        self.wiped.lock().unwrap().push(locale_id.to_string());
        Ok(())
    }

    fn key_link(&self, key: &str) -> String {
        format!("https://translations.example.com/keys?q={key}")
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
}

#[async_trait]
impl NotificationSink for FakeNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        if self.fail {
            return Err(SyncError::remote("FakeNotifier", Some(503), "unavailable"));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
