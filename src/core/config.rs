//! # Configuration Module / 配置模块
//!
//! Settings are read once from a TOML file, overlaid with environment variables
//! and validated before anything touches a remote service. The resulting
//! [`Settings`] value is immutable for the run and passed explicitly to every
//! component.
//!
//! 配置从 TOML 文件读取一次，叠加环境变量后在任何远程操作之前完成校验。
//! 生成的 [`Settings`] 在整个运行期间不可变，并显式传递给每个组件。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::integrator::{CompletionStrategy, LifecycleSettings};
use crate::error::{Result, SyncError};

/// A locale known to the translation service.
/// 翻译服务中的一个语言区域。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocaleInfo {
    /// File-name token, e.g. `en` in `Common.en.i18n.json`.
    pub name: String,
    /// The provider's identifier for this locale.
    pub id: String,
    /// Exactly one configured locale is the reference.
    #[serde(default, alias = "isReference")]
    pub is_reference: bool,
}

/// How a change request is driven to completion.
/// 拉取请求的完成方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionMode {
    /// Poll the request and merge it explicitly.
    #[default]
    Poll,
    /// Hand the request to the host's auto-merge, polling only if that fails.
    AutoMerge,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_provider_api_url")]
    pub api_url: String,
    /// Web console URL of the project; used to build key links in notifications.
    #[serde(default)]
    pub console_url: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            token: String::new(),
            api_url: default_provider_api_url(),
            console_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostSettings {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default = "default_host_api_url")]
    pub api_url: String,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    /// Base URL the branch is pushed to, e.g. `https://github.com`.
    #[serde(default = "default_git_url")]
    pub git_url: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner: String::new(),
            repository: String::new(),
            api_url: default_host_api_url(),
            base_branch: default_base_branch(),
            git_url: default_git_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Keys listed individually before the message switches to "and N more".
    #[serde(default = "default_max_listed_keys")]
    pub max_listed_keys: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            channel: default_channel(),
            author: default_author(),
            icon: default_icon(),
            max_listed_keys: default_max_listed_keys(),
        }
    }
}

/// Settings of the pull-request lifecycle.
/// 拉取请求生命周期的设置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntegrationSettings {
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
    #[serde(default = "default_commit_name")]
    pub commit_name: String,
    #[serde(default = "default_commit_email")]
    pub commit_email: String,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    #[serde(default)]
    pub completion: CompletionMode,
    #[serde(default = "default_auto_merge_label")]
    pub auto_merge_label: Option<String>,
    #[serde(default = "default_true")]
    pub native_auto_merge: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_waits")]
    pub max_waits: u32,
    /// Optional deadline for the whole landing; cancels polling when reached.
    #[serde(default)]
    pub overall_timeout_secs: Option<u64>,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            branch_prefix: default_branch_prefix(),
            commit_name: default_commit_name(),
            commit_email: default_commit_email(),
            commit_message: default_commit_message(),
            completion: CompletionMode::default(),
            auto_merge_label: default_auto_merge_label(),
            native_auto_merge: true,
            poll_interval_secs: default_poll_interval_secs(),
            max_waits: default_max_waits(),
            overall_timeout_secs: None,
        }
    }
}

/// Where namespace files live relative to the project that ships them.
/// 命名空间文件相对于所属项目的位置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutSettings {
    #[serde(default = "default_localization_dir")]
    pub localization_dir: String,
    #[serde(default = "default_project_extension")]
    pub project_extension: String,
    /// Path marker of namespaces consumed by a front-end build.
    #[serde(default = "default_frontend_marker")]
    pub frontend_marker: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            localization_dir: default_localization_dir(),
            project_extension: default_project_extension(),
            frontend_marker: default_frontend_marker(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptReportSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_report_output")]
    pub output: PathBuf,
    #[serde(default = "default_report_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_report_pattern")]
    pub pattern: String,
}

impl Default for ScriptReportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            output: default_report_output(),
            extensions: default_report_extensions(),
            pattern: default_report_pattern(),
        }
    }
}

/// The complete, immutable configuration of a run.
/// 一次运行的完整且不可变的配置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// The language for console messages (e.g., "en", "zh-CN").
    /// 控制台消息的语言（例如 "en", "zh-CN"）。
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,
    pub locales: Vec<LocaleInfo>,
    /// Extra path fragments excluded from namespace discovery.
    #[serde(default)]
    pub forbidden_paths: Vec<String>,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub host: HostSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub integration: IntegrationSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub script_report: ScriptReportSettings,
}

/// Which remote services a command is about to talk to.
#[derive(Debug, Clone, Copy, Default)]
pub struct Requirements {
    pub provider: bool,
    pub host: bool,
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SyncError::Configuration(e.to_string()))
    }

    /// Reads and parses the configuration file. Environment overrides are applied
    /// separately with [`Settings::apply_env_overrides`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Overlays values supplied by the environment. Both the current names and the
    /// camel-case names used by older pipelines are accepted.
    ///
    /// 叠加由环境提供的值。同时接受当前名称和旧流水线使用的驼峰名称。
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| names.iter().find_map(|name| lookup(name));

        if let Some(token) = first(&["PHRASE_TOKEN", "phraseAppToken"]) {
            self.provider.token = token;
        }
        if let Some(token) = first(&["GITHUB_TOKEN", "gitHubToken"]) {
            self.host.token = token;
        }
        if let Some(url) = first(&["SLACK_WEBHOOK_URL", "slackWebhookUrl"]) {
            self.notifications.webhook_url = Some(url);
        }
        if let Some(workspace) = lookup("GITHUB_WORKSPACE") {
            self.working_directory = PathBuf::from(workspace);
        }
        if let Some(repository) = lookup("GITHUB_REPOSITORY") {
            let (owner, name) = repository.split_once('/').ok_or_else(|| {
                SyncError::Configuration(format!(
                    "GITHUB_REPOSITORY must look like owner/name, got '{repository}'"
                ))
            })?;
            self.host.owner = owner.to_string();
            self.host.repository = name.to_string();
        }
        Ok(())
    }

    /// Checks every invariant the run relies on.
    pub fn validate(&self, requirements: Requirements) -> Result<()> {
        if self.locales.is_empty() {
            return Err(SyncError::Configuration("no locales configured".to_string()));
        }

        let mut seen = HashSet::new();
        for locale in &self.locales {
            if locale.name.trim().is_empty() || locale.id.trim().is_empty() {
                return Err(SyncError::Configuration(
                    "every locale needs a name and an id".to_string(),
                ));
            }
            if !seen.insert(locale.name.to_lowercase()) {
                return Err(SyncError::Configuration(format!(
                    "locale '{}' is configured twice",
                    locale.name
                )));
            }
        }
        self.reference_locale()?;

        if requirements.provider {
            if self.provider.project_id.is_empty() {
                return Err(SyncError::Configuration("provider.project_id is missing".to_string()));
            }
            if self.provider.token.is_empty() {
                return Err(SyncError::Configuration("provider token is missing".to_string()));
            }
        }

        if requirements.host {
            if self.host.token.is_empty() {
                return Err(SyncError::Configuration("host token is missing".to_string()));
            }
            if self.host.owner.is_empty() || self.host.repository.is_empty() {
                return Err(SyncError::Configuration(
                    "host.owner and host.repository are required".to_string(),
                ));
            }
            if self.integration.branch_prefix.is_empty() {
                return Err(SyncError::Configuration(
                    "integration.branch_prefix must not be empty".to_string(),
                ));
            }
            if self.integration.max_waits == 0 {
                return Err(SyncError::Configuration(
                    "integration.max_waits must be greater than zero".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// The single locale marked as reference.
    /// 唯一被标记为参考的语言区域。
    pub fn reference_locale(&self) -> Result<&LocaleInfo> {
        let mut references = self.locales.iter().filter(|l| l.is_reference);
        match (references.next(), references.next()) {
            (Some(locale), None) => Ok(locale),
            (None, _) => Err(SyncError::Configuration(
                "exactly one locale must be marked as reference, found none".to_string(),
            )),
            (Some(_), Some(_)) => Err(SyncError::Configuration(
                "exactly one locale must be marked as reference, found several".to_string(),
            )),
        }
    }

    /// The working directory with `~` and environment variables expanded.
    pub fn resolved_working_directory(&self) -> Result<PathBuf> {
        let raw = self.working_directory.to_string_lossy();
        let expanded = shellexpand::full(&raw).map_err(|e| {
            SyncError::Configuration(format!("cannot expand working directory '{raw}': {e}"))
        })?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    pub fn completion_strategy(&self) -> CompletionStrategy {
        match self.integration.completion {
            CompletionMode::Poll => CompletionStrategy::Poll,
            CompletionMode::AutoMerge => CompletionStrategy::AutoMerge {
                label: self.integration.auto_merge_label.clone(),
                native: self.integration.native_auto_merge,
            },
        }
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            branch_prefix: self.integration.branch_prefix.clone(),
            base_branch: self.host.base_branch.clone(),
            commit_message: self.integration.commit_message.clone(),
            commit_email: self.integration.commit_email.clone(),
            poll_interval: Duration::from_secs(self.integration.poll_interval_secs),
            max_waits: self.integration.max_waits,
            strategy: self.completion_strategy(),
        }
    }
}

fn default_working_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_provider_api_url() -> String {
    "https://api.phrase.com".to_string()
}

fn default_host_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_base_branch() -> String {
    "master".to_string()
}

fn default_git_url() -> String {
    "https://github.com".to_string()
}

fn default_channel() -> String {
    "#new-translations".to_string()
}

fn default_author() -> String {
    "locsync".to_string()
}

fn default_icon() -> String {
    ":flag-gb:".to_string()
}

fn default_max_listed_keys() -> usize {
    10
}

fn default_branch_prefix() -> String {
    "LocalizationPull".to_string()
}

fn default_commit_name() -> String {
    "Localization Bot".to_string()
}

fn default_commit_email() -> String {
    "localization-bot@users.noreply.github.com".to_string()
}

fn default_commit_message() -> String {
    "fix: localization (automatic integration commit)".to_string()
}

fn default_auto_merge_label() -> Option<String> {
    Some("Merge when ready".to_string())
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_max_waits() -> u32 {
    50
}

fn default_localization_dir() -> String {
    "Resources/Localization".to_string()
}

fn default_project_extension() -> String {
    "csproj".to_string()
}

fn default_frontend_marker() -> String {
    "Frontend".to_string()
}

fn default_report_output() -> PathBuf {
    PathBuf::from("build/cyrillic-lines-exceptions.json")
}

fn default_report_extensions() -> Vec<String> {
    ["cs", "tsx", "ts", "cshtml", "js", "py", "sql"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_report_pattern() -> String {
    "[а-яА-ЯЁё]".to_string()
}
