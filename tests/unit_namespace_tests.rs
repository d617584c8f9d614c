//! # Namespace Unit Tests / 命名空间单元测试
//!
//! Merge, validation, diff and manifest registration of a single namespace file.
//!
//! 单个命名空间文件的合并、校验、差异计算以及项目清单注册。

mod common;

use common::{MINIMAL_CSPROJ, localization_path, project_tree, snapshot, write_file};
use locsync::core::namespace::{LocalizationNamespace, NamespaceLayout};
use locsync::SyncError;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn namespace(root: &Path, name: &str, locale: &str) -> LocalizationNamespace {
    LocalizationNamespace::new(
        name,
        locale,
        localization_path(root, name, locale),
        Arc::new(NamespaceLayout::default()),
    )
}

fn keys(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod apply_tests {
    use super::*;

    #[test]
    fn test_apply_creates_file_with_namespace_keys_only() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        let remote = snapshot("en-id", &[("ns1:hello", "Hello"), ("other:x", "X")]);

        let report = ns.apply_translations(&remote).unwrap();

        assert!(report.written);
        assert!(report.created);
        assert_eq!(report.added, vec![("ns1:hello".to_string(), "Hello".to_string())]);
        let content = fs::read_to_string(ns.data_file()).unwrap();
        assert_eq!(content, "{\n\t\"ns1:hello\": \"Hello\"\n}");
    }

    /// Existing keys keep their position, new keys are appended, local-only keys
    /// survive.
    /// 已有键保持原位置，新键追加在末尾，仅本地存在的键保留。
    #[test]
    fn test_apply_preserves_order_and_local_keys() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        fs::write(
            ns.data_file(),
            "{\n\t\"ns1:b\": \"old\",\n\t\"ns1:local\": \"mine\"\n}",
        )
        .unwrap();
        let remote = snapshot("en-id", &[("ns1:a", "A"), ("ns1:b", "new")]);

        let report = ns.apply_translations(&remote).unwrap();

        assert!(!report.created);
        assert_eq!(report.changed.len(), 1);
        assert_eq!(report.changed[0].previous, "old");
        assert_eq!(report.changed[0].new, "new");
        let local = ns.read_local().unwrap();
        let order: Vec<&str> = local.keys().collect();
        assert_eq!(order, vec!["ns1:b", "ns1:local", "ns1:a"]);
        assert_eq!(local.get("ns1:local"), Some("mine"));
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        let remote = snapshot("en-id", &[("ns1:a", "A $ {x}"), ("ns1:b", "B")]);

        ns.apply_translations(&remote).unwrap();
        let first = fs::read_to_string(ns.data_file()).unwrap();
        let manifest_first = fs::read_to_string(temp_dir.path().join("App/App.csproj")).unwrap();

        let report = ns.apply_translations(&remote).unwrap();

        assert!(!report.has_changes());
        assert!(!report.manifest_updated);
        assert_eq!(fs::read_to_string(ns.data_file()).unwrap(), first);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("App/App.csproj")).unwrap(),
            manifest_first
        );
    }

    #[test]
    fn test_apply_normalizes_placeholders() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        let remote = snapshot("en-id", &[("ns1:greet", "Hi $ {name}")]);

        ns.apply_translations(&remote).unwrap();

        assert_eq!(ns.read_local().unwrap().get("ns1:greet"), Some("Hi ${name}"));
    }

    #[test]
    fn test_apply_without_matching_keys_touches_nothing() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "ru");
        let remote = snapshot("ru-id", &[("other:x", "X")]);

        let report = ns.apply_translations(&remote).unwrap();

        assert!(!report.written);
        assert!(!ns.has_data());
        let manifest = fs::read_to_string(temp_dir.path().join("App/App.csproj")).unwrap();
        assert_eq!(manifest, MINIMAL_CSPROJ);
    }

    #[test]
    fn test_apply_rejects_malformed_remote_key() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        let remote = snapshot("en-id", &[("ns1:ok", "fine"), ("broken", "value")]);

        let err = ns.apply_translations(&remote).unwrap_err();

        assert!(matches!(err, SyncError::InvalidKeyFormat { ref key } if key == "broken"));
        assert!(err.is_local_data_error());
        assert!(!ns.has_data());
    }

    #[test]
    fn test_corrupt_local_file_is_reported() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        fs::write(ns.data_file(), "{\"ns1:a\": 5}").unwrap();

        let err = ns.read_local().unwrap_err();
        assert!(matches!(err, SyncError::DataCorrupt { .. }));
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        fs::write(ns.data_file(), "\u{feff}{\"ns1:a\": \"A\"}").unwrap();

        assert_eq!(ns.read_local().unwrap().get("ns1:a"), Some("A"));
    }
}

#[cfg(test)]
mod manifest_tests {
    use super::*;

    #[test]
    fn test_new_file_is_registered_in_manifest() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "ru");

        let report = ns
            .apply_translations(&snapshot("ru-id", &[("ns1:hello", "Привет")]))
            .unwrap();

        assert!(report.manifest_updated);
        let manifest = fs::read_to_string(temp_dir.path().join("App/App.csproj")).unwrap();
        assert!(manifest.contains(
            "<Content Include=\"Resources\\Localization\\ns1.ru.i18n.json\">"
        ));
        assert!(manifest.contains("<CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory>"));
        assert!(manifest.trim_end().ends_with("</Project>"));
    }

    /// Two namespaces of one project share the manifest; both entries end up in it.
    /// 同一项目的两个命名空间共享清单，两个条目都会写入。
    #[test]
    fn test_two_namespaces_share_one_manifest() {
        let temp_dir = project_tree();
        let layout = Arc::new(NamespaceLayout::default());
        let first = LocalizationNamespace::new(
            "ns1",
            "ru",
            localization_path(temp_dir.path(), "ns1", "ru"),
            Arc::clone(&layout),
        );
        let second = LocalizationNamespace::new(
            "ns2",
            "ru",
            localization_path(temp_dir.path(), "ns2", "ru"),
            layout,
        );
        let remote = snapshot("ru-id", &[("ns1:a", "A"), ("ns2:b", "B")]);

        let handles = [first, second].map(|ns| {
            let remote = remote.clone();
            std::thread::spawn(move || ns.apply_translations(&remote))
        });
        for handle in handles {
            assert!(handle.join().unwrap().unwrap().manifest_updated);
        }

        let manifest = fs::read_to_string(temp_dir.path().join("App/App.csproj")).unwrap();
        assert!(manifest.contains("ns1.ru.i18n.json"));
        assert!(manifest.contains("ns2.ru.i18n.json"));
    }

    #[test]
    fn test_frontend_namespace_skips_manifest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_file = temp_dir
            .path()
            .join("Frontend/Resources/Localization/ui.ru.i18n.json");
        fs::create_dir_all(data_file.parent().unwrap()).unwrap();
        let ns = LocalizationNamespace::new("ui", "ru", data_file, Arc::new(NamespaceLayout::default()));

        let report = ns.apply_translations(&snapshot("ru-id", &[("ui:ok", "OK")])).unwrap();

        assert!(ns.is_frontend());
        assert!(report.created);
        assert!(!report.manifest_updated);
    }

    #[test]
    fn test_unexpected_directory_is_unsupported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_file = temp_dir.path().join("App/Strings/ns1.ru.i18n.json");
        fs::create_dir_all(data_file.parent().unwrap()).unwrap();
        let ns = LocalizationNamespace::new("ns1", "ru", data_file, Arc::new(NamespaceLayout::default()));

        let err = ns.apply_translations(&snapshot("ru-id", &[("ns1:a", "A")])).unwrap_err();

        assert!(matches!(err, SyncError::UnsupportedLayout { .. }));
    }

    #[test]
    fn test_ambiguous_project_is_unsupported() {
        let temp_dir = project_tree();
        write_file(temp_dir.path(), "App/Second.csproj", MINIMAL_CSPROJ);
        let ns = namespace(temp_dir.path(), "ns1", "ru");

        let err = ns.apply_translations(&snapshot("ru-id", &[("ns1:a", "A")])).unwrap_err();

        assert!(matches!(err, SyncError::UnsupportedLayout { .. }));
    }
}

#[cfg(test)]
mod diff_side_tests {
    use super::*;

    #[test]
    fn test_added_and_removed_keys() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        fs::write(ns.data_file(), "{\"ns1:a\": \"A\", \"ns1:b\": \"B\"}").unwrap();
        let remote = snapshot("en-id", &[("ns1:b", "B"), ("ns1:c", "C"), ("other:z", "Z")]);

        assert_eq!(ns.added_keys_relative_to(&remote).unwrap(), keys(&["ns1:a"]));
        assert_eq!(ns.removed_keys_relative_to(&remote).unwrap(), keys(&["ns1:c"]));
    }

    /// Keys of another namespace that ended up in this file are ignored.
    /// 误放入此文件的其他命名空间的键会被忽略。
    #[test]
    fn test_foreign_local_keys_are_ignored() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        fs::write(ns.data_file(), "{\"ns1:a\": \"A\", \"stray:b\": \"B\"}").unwrap();

        let added = ns.added_keys_relative_to(&snapshot("en-id", &[])).unwrap();
        assert_eq!(added, keys(&["ns1:a"]));
    }

    #[test]
    fn test_missing_file_has_no_added_keys() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        let remote = snapshot("en-id", &[("ns1:a", "A")]);

        assert!(ns.added_keys_relative_to(&remote).unwrap().is_empty());
        assert_eq!(ns.removed_keys_relative_to(&remote).unwrap(), keys(&["ns1:a"]));
    }

    #[test]
    fn test_validate_rejects_malformed_local_key() {
        let temp_dir = project_tree();
        let ns = namespace(temp_dir.path(), "ns1", "en");
        fs::write(ns.data_file(), "{\"ns1:a\": \"A\"}").unwrap();
        assert!(ns.validate().is_ok());

        fs::write(ns.data_file(), "{\"ns1:a\": \"A\", \"nonsense\": \"B\"}").unwrap();
        assert!(matches!(
            ns.validate().unwrap_err(),
            SyncError::InvalidKeyFormat { .. }
        ));
    }
}
