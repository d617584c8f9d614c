//! # Best-effort Operations / 尽力而为的操作
//!
//! Side effects such as labelling a request, enabling auto-merge or posting a
//! notification must never abort the primary flow. They run through
//! [`BestEffort::run`], which logs a failure, records it and carries on.
//!
//! 诸如添加标签、启用自动合并或发送通知之类的副作用绝不能中断主流程。
//! 它们通过 [`BestEffort::run`] 执行：记录失败并继续。

use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// A swallowed failure of a best-effort operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestEffortFailure {
    pub operation: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct BestEffort {
    failures: Vec<BestEffortFailure>,
}

impl BestEffort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Awaits `operation`. On failure the error is logged at `warn`, recorded and
    /// `None` is returned.
    pub async fn run<T, E, F>(&mut self, name: &str, operation: F) -> Option<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        match operation.await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(operation = name, error = %e, "Best-effort operation failed, continuing");
                self.failures.push(BestEffortFailure {
                    operation: name.to_string(),
                    message: e.to_string(),
                });
                None
            }
        }
    }

    pub fn failures(&self) -> &[BestEffortFailure] {
        &self.failures
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<BestEffortFailure> {
        self.failures
    }
}
