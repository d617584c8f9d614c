//! # Diff Engine / 差异引擎
//!
//! Compares the reference locale's namespaces with the reference snapshot. The
//! result decides whether push work is needed, which keys are deleted remotely
//! and what gets announced.
//!
//! 将参考语言的命名空间与参考快照进行比较。结果决定是否需要推送、
//! 哪些键需要远程删除以及需要通知哪些内容。

use crate::core::models::RemoteSnapshot;
use crate::core::namespace::LocalizationNamespace;
use crate::error::Result;

/// Keys that changed locally relative to the authoritative snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDiff {
    /// Present locally, absent from the snapshot.
    pub added_keys: Vec<String>,
    /// Present in the snapshot, absent locally.
    pub removed_keys: Vec<String>,
}

impl KeyDiff {
    pub fn is_empty(&self) -> bool {
        self.added_keys.is_empty() && self.removed_keys.is_empty()
    }
}

/// Concatenates the per-namespace diffs in the order given. The namespace prefix
/// partitions keys, so no key can appear under two namespaces.
///
/// 按给定顺序拼接各命名空间的差异。命名空间前缀对键进行了划分，因此不会重复。
pub fn compute_diff(
    namespaces: &[LocalizationNamespace],
    reference: &RemoteSnapshot,
) -> Result<KeyDiff> {
    let mut diff = KeyDiff::default();
    for namespace in namespaces {
        diff.added_keys
            .extend(namespace.added_keys_relative_to(reference)?);
        diff.removed_keys
            .extend(namespace.removed_keys_relative_to(reference)?);
    }
    Ok(diff)
}
