//! # Error Taxonomy / 错误分类
//!
//! Every fatal condition the engine can raise is one variant of [`SyncError`].
//! Best-effort failures (labels, auto-merge enablement, notifications) are not
//! part of this enum; they travel through [`crate::core::best_effort`].
//!
//! 引擎可能产生的每一种致命错误都是 [`SyncError`] 的一个变体。
//! 尽力而为的失败（标签、自动合并、通知）不属于此枚举。

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or invalid settings. Raised before any remote mutation.
    /// 缺失或无效的配置，在任何远程修改之前抛出。
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Non-success response from the translation provider or the source-control host.
    /// 翻译服务或代码托管平台返回了非成功响应。
    #[error("{service} call failed (status: {}): {message}", describe_status(.status))]
    RemoteCallFailed {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("malformed catalog entry {}: expected <namespace>.<locale>.i18n.json", .path.display())]
    MalformedCatalogEntry { path: PathBuf },

    #[error("Key {key} is invalid. Valid key is <namespace>:<key>.")]
    InvalidKeyFormat { key: String },

    #[error("localization data in {} is corrupt: {reason}", .path.display())]
    DataCorrupt { path: PathBuf, reason: String },

    /// The project manifest for a new namespace file cannot be located.
    /// 无法为新的命名空间文件定位项目清单。
    #[error("unsupported localization layout at {}: {reason}", .path.display())]
    UnsupportedLayout { path: PathBuf, reason: String },

    #[error("`{command}` failed: {output}")]
    VersionControl { command: String, output: String },

    #[error("`{command}` produced unexpected output: {output}")]
    UnrecognizedOutput { command: String, output: String },

    /// Polling exceeded its bound. The request has already been closed.
    /// 轮询超出上限，请求已被关闭。
    #[error("have waited for {link} for too long ({waits} waits)")]
    Timeout { link: String, waits: u32 },

    #[error("can't merge pull request {link}: {detail}")]
    MergeRejected { link: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn describe_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

impl SyncError {
    pub fn remote(service: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        SyncError::RemoteCallFailed {
            service,
            status,
            message: message.into(),
        }
    }

    pub fn invalid_key(key: impl Into<String>) -> Self {
        SyncError::InvalidKeyFormat { key: key.into() }
    }

    /// Returns `true` for errors caused by local data violating its invariants.
    pub fn is_local_data_error(&self) -> bool {
        matches!(
            self,
            SyncError::MalformedCatalogEntry { .. }
                | SyncError::InvalidKeyFormat { .. }
                | SyncError::DataCorrupt { .. }
                | SyncError::UnsupportedLayout { .. }
        )
    }
}
