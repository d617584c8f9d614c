//! # Key Module Unit Tests / 键模块单元测试
//!
//! Tests for key parsing, namespace membership and placeholder normalization.
//!
//! 测试键的解析、命名空间归属以及占位符规范化。

use locsync::SyncError;
use locsync::core::keys::{LocalizationKey, key_in_namespace, normalize_template_syntax};

#[cfg(test)]
mod key_shape_tests {
    use super::*;

    #[test]
    fn test_parse_splits_namespace_and_identifier() {
        let key = LocalizationKey::parse("Common:hello").unwrap();
        assert_eq!(key.namespace, "Common");
        assert_eq!(key.identifier, "hello");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for malformed in ["hello", "a:b:c", ":hello", "Common:", ""] {
            assert!(
                LocalizationKey::parse(malformed).is_none(),
                "'{malformed}' should be rejected"
            );
        }
    }

    #[test]
    fn test_require_reports_the_offending_key() {
        let err = LocalizationKey::require("no-colon").unwrap_err();
        match err {
            SyncError::InvalidKeyFormat { key } => assert_eq!(key, "no-colon"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Membership is decided by the prefix, ignoring case.
    /// 归属由前缀决定，不区分大小写。
    #[test]
    fn test_key_in_namespace_is_case_insensitive() {
        assert!(key_in_namespace("common:hello", "Common").unwrap());
        assert!(key_in_namespace("COMMON:hello", "common").unwrap());
        assert!(!key_in_namespace("Other:hello", "Common").unwrap());
        assert!(key_in_namespace("a:b:c", "a").is_err());
    }
}

#[cfg(test)]
mod normalization_tests {
    use super::*;

    #[test]
    fn test_mangled_placeholder_is_repaired() {
        assert_eq!(normalize_template_syntax("Hello $ {name}"), "Hello ${name}");
        assert_eq!(normalize_template_syntax("$  \t{a} and $ {b}"), "${a} and ${b}");
    }

    #[test]
    fn test_other_text_is_untouched() {
        assert_eq!(normalize_template_syntax("${ name }"), "${ name }");
        assert_eq!(normalize_template_syntax("costs $ 5"), "costs $ 5");
        assert_eq!(normalize_template_syntax("plain"), "plain");
    }
}
