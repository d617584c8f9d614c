//! # Localization Keys / 本地化键
//!
//! Keys have the exact shape `<namespace>:<identifier>`. The namespace prefix,
//! not the file a key currently lives in, decides which namespace owns it.
//!
//! 键的格式严格为 `<namespace>:<identifier>`。
//! 键归属于哪个命名空间由前缀决定，而不是由它当前所在的文件决定。

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::borrow::Cow;

use crate::error::{Result, SyncError};

/// Matches a `$` separated from its opening brace by whitespace.
static MANGLED_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s+\{").expect("placeholder pattern is valid"));

/// A key split into its namespace and identifier parts.
/// 拆分为命名空间和标识符两部分的键。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalizationKey<'a> {
    pub namespace: &'a str,
    pub identifier: &'a str,
}

impl<'a> LocalizationKey<'a> {
    /// Splits `key` into its parts, or returns `None` if it does not have exactly
    /// one `:` with non-empty text on both sides.
    pub fn parse(key: &'a str) -> Option<Self> {
        let mut parts = key.split(':');
        let namespace = parts.next()?;
        let identifier = parts.next()?;
        if parts.next().is_some() || namespace.is_empty() || identifier.is_empty() {
            return None;
        }
        Some(Self {
            namespace,
            identifier,
        })
    }

    /// Like [`LocalizationKey::parse`], but a malformed key is an error.
    pub fn require(key: &'a str) -> Result<Self> {
        Self::parse(key).ok_or_else(|| SyncError::invalid_key(key))
    }

    pub fn belongs_to(&self, namespace: &str) -> bool {
        self.namespace.to_lowercase() == namespace.to_lowercase()
    }
}

/// Checks the shape of `key` and reports whether it belongs to `namespace`
/// (case-insensitive).
pub fn key_in_namespace(key: &str, namespace: &str) -> Result<bool> {
    Ok(LocalizationKey::require(key)?.belongs_to(namespace))
}

/// Undoes the provider's placeholder mangling: `$ {` becomes `${`.
/// Everything else, including spacing inside the braces, is left alone.
///
/// 撤销翻译服务对占位符的破坏：`$ {` 还原为 `${`。其余内容保持不变。
pub fn normalize_template_syntax(value: &str) -> Cow<'_, str> {
    MANGLED_PLACEHOLDER.replace_all(value, NoExpand("${"))
}
