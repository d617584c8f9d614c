//! # Git Working Tree / Git 工作树
//!
//! Drives the `git` executable inside the configured working directory. Every
//! invocation passes the committer identity with `-c`, so no repository or
//! global configuration is changed.
//!
//! 在配置的工作目录中调用 `git` 可执行文件。每次调用都通过 `-c`
//! 传递提交者身份，因此不会修改仓库或全局配置。

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::core::remote::WorkingTree;
use crate::error::{Result, SyncError};
use crate::infra::command::{display_command, spawn_and_capture};

const CLEAN_MARKERS: &[&str] = &["nothing to commit"];
const DIRTY_MARKERS: &[&str] = &[
    "Changes not staged for commit",
    "Untracked files",
    "Changes to be committed",
];

/// Interprets `git status` output by its known phrases.
///
/// # Errors
/// `UnrecognizedOutput` when none of the phrases is present.
pub fn parse_status(output: &str) -> Result<bool> {
    if CLEAN_MARKERS.iter().any(|marker| output.contains(marker)) {
        return Ok(false);
    }
    if DIRTY_MARKERS.iter().any(|marker| output.contains(marker)) {
        return Ok(true);
    }
    Err(SyncError::UnrecognizedOutput {
        command: "git status".to_string(),
        output: output.trim().to_string(),
    })
}

/// Builds the authenticated push URL for `owner/repository` on `base`.
pub fn authenticated_remote(base: &str, owner: &str, repository: &str, token: &str) -> Result<Url> {
    let invalid = |e: String| SyncError::Configuration(format!("invalid git remote '{base}': {e}"));
    let mut url = Url::parse(base)
        .and_then(|base| base.join(&format!("{owner}/{repository}.git")))
        .map_err(|e| invalid(e.to_string()))?;
    let credentials = url
        .set_username("x-access-token")
        .and(url.set_password(Some(token)));
    credentials.map_err(|_| invalid("cannot carry credentials".to_string()))?;
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct GitWorkingTree {
    root: PathBuf,
    author_name: String,
    author_email: String,
    push_remote: String,
    /// Replaced by `***` whenever a command line is logged or reported.
    secret: Option<String>,
}

impl GitWorkingTree {
    pub fn new(root: impl Into<PathBuf>, author_name: impl Into<String>, author_email: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            author_name: author_name.into(),
            author_email: author_email.into(),
            push_remote: "origin".to_string(),
            secret: None,
        }
    }

    /// Pushes to `remote` instead of `origin`. `secret` is redacted from logs.
    pub fn with_push_remote(mut self, remote: impl Into<String>, secret: Option<String>) -> Self {
        self.push_remote = remote.into();
        self.secret = secret.filter(|s| !s.is_empty());
        self
    }

    fn redact(&self, text: &str) -> String {
        match &self.secret {
            Some(secret) => text.replace(secret.as_str(), "***"),
            None => text.to_string(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        let shown = self.redact(&display_command("git", args.iter().copied()));
        info!("{shown}");

        let mut cmd = Command::new("git");
        cmd.current_dir(&self.root)
            .arg("-c")
            .arg(format!("user.name={}", self.author_name))
            .arg("-c")
            .arg(format!("user.email={}", self.author_email))
            .args(args)
            .env("LC_ALL", "C")
            .kill_on_drop(true);

        let (status, output) = spawn_and_capture(cmd).await;
        let output = self.redact(&output);
        debug!("{output}");

        match status {
            Ok(status) if status.success() => Ok(output),
            Ok(_) => Err(SyncError::VersionControl {
                command: shown,
                output: output.trim().to_string(),
            }),
            Err(e) => Err(SyncError::VersionControl {
                command: shown,
                output: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl WorkingTree for GitWorkingTree {
    async fn has_changes(&self) -> Result<bool> {
        let output = self.git(&["status"]).await?;
        parse_status(&output)
    }

    async fn commit_all_and_push(&self, branch: &str, message: &str) -> Result<()> {
        self.git(&["checkout", "-b", branch]).await?;
        self.git(&["add", "-A"]).await?;
        self.git(&["commit", "-m", message]).await?;
        self.git(&["push", self.push_remote.as_str(), branch]).await?;
        Ok(())
    }
}
