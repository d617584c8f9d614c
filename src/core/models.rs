//! # Data Models Module / 数据模型模块
//!
//! This module defines the documents the engine moves around: ordered key/value
//! translation maps, immutable remote snapshots and the notes produced when a
//! snapshot is merged into a namespace file.
//!
//! 此模块定义引擎处理的文档：有序的键值翻译表、不可变的远程快照，
//! 以及将快照合并到命名空间文件时生成的记录。

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::io;
use std::path::PathBuf;

use crate::core::keys::LocalizationKey;
use crate::error::{Result, SyncError};

/// An insertion-ordered mapping of translation keys to string values.
///
/// Order is preserved on read and on write so that rewritten files produce
/// minimal diffs in source control.
///
/// 按插入顺序排列的翻译键到字符串值的映射。
/// 读写时均保持顺序，以便重写后的文件在版本控制中产生最小的差异。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationMap(Map<String, Value>);

impl TranslationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a flat JSON object whose values are all strings.
    /// The error is a human-readable reason.
    pub fn from_json_str(content: &str) -> std::result::Result<Self, String> {
        let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
        match value {
            Value::Object(map) => Self::try_from(map),
            other => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Inserts or replaces a value. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0
            .insert(key.into(), Value::String(value.into()))
            .and_then(|previous| match previous {
                Value::String(s) => Some(s),
                _ => None,
            })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the map tab-indented, in insertion order, without a trailing newline.
    /// 以制表符缩进、按插入顺序渲染，不带结尾换行。
    pub fn to_pretty_string(&self) -> io::Result<String> {
        let mut buffer = Vec::with_capacity(256);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.0.serialize(&mut serializer).map_err(io::Error::other)?;
        String::from_utf8(buffer).map_err(io::Error::other)
    }
}

impl TryFrom<Map<String, Value>> for TranslationMap {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        if let Some((key, value)) = map.iter().find(|(_, v)| !v.is_string()) {
            return Err(format!(
                "value of '{key}' is {}, expected a string",
                json_kind(value)
            ));
        }
        Ok(Self(map))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TranslationMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for TranslationMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Key/value data fetched from the translation service for one locale at one
/// point in time. It is complete or it does not exist; nothing mutates it.
///
/// 某一时刻从翻译服务获取的某个语言区域的键值数据。
/// 要么完整，要么不存在；任何操作都不会修改它。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    locale_id: String,
    entries: TranslationMap,
}

impl RemoteSnapshot {
    pub fn new(locale_id: impl Into<String>, entries: TranslationMap) -> Self {
        Self {
            locale_id: locale_id.into(),
            entries,
        }
    }

    pub fn locale_id(&self) -> &str {
        &self.locale_id
    }

    pub fn entries(&self) -> &TranslationMap {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose key prefix names `namespace`, in snapshot order.
    /// Every key is shape-checked; one malformed key fails the whole call.
    ///
    /// 返回键前缀为 `namespace` 的条目。每个键都会检查格式，任一错误即整体失败。
    pub fn entries_for(&self, namespace: &str) -> Result<Vec<(&str, &str)>> {
        let mut matching = Vec::new();
        for (key, value) in self.entries.iter() {
            if LocalizationKey::require(key)?.belongs_to(namespace) {
                matching.push((key, value));
            }
        }
        Ok(matching)
    }
}

/// A value that was overwritten during a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange {
    pub key: String,
    pub previous: String,
    pub new: String,
}

/// What merging one snapshot into one namespace file did.
/// 将一个快照合并到一个命名空间文件的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub namespace: String,
    pub locale: String,
    pub path: PathBuf,
    /// Keys that did not exist locally, with their new values.
    pub added: Vec<(String, String)>,
    pub changed: Vec<ValueChange>,
    /// `false` when the snapshot had no keys for this namespace.
    pub written: bool,
    /// The file did not exist before this merge.
    pub created: bool,
    pub manifest_updated: bool,
}

impl ApplyReport {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.changed.is_empty()
    }
}

/// Result of one locale's pull: the reports of every namespace it touched.
#[derive(Debug, Clone, Default)]
pub struct LocalePullReport {
    pub locale: String,
    pub snapshot_size: usize,
    pub namespaces: Vec<ApplyReport>,
}

impl LocalePullReport {
    pub fn added_count(&self) -> usize {
        self.namespaces.iter().map(|r| r.added.len()).sum()
    }

    pub fn changed_count(&self) -> usize {
        self.namespaces.iter().map(|r| r.changed.len()).sum()
    }
}

pub(crate) fn corrupt(path: &std::path::Path, reason: impl Into<String>) -> SyncError {
    SyncError::DataCorrupt {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
