//! # Script Report Unit Tests / 文字报告单元测试

mod common;

use common::write_file;
use locsync::core::config::ScriptReportSettings;
use locsync::reporting::{count_script_lines, write_script_report};
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_counts_cyrillic_lines_per_file() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write_file(root, "src/Greeter.cs", "// Привет\nvar x = 1;\n// Пока\n");
    write_file(root, "src/Plain.cs", "var y = 2;\n");
    write_file(root, "docs/readme.md", "Привет\n");
    write_file(root, ".git/COMMIT.cs", "// Привет\n");

    let counts = count_script_lines(root, &ScriptReportSettings::default()).unwrap();

    let expected: BTreeMap<String, usize> = [("src/Greeter.cs".to_string(), 2)].into();
    assert_eq!(counts, expected);
}

/// The report is rewritten from scratch on every run.
/// 报告在每次运行时都会重新生成。
#[test]
fn test_report_is_written_under_root() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write_file(root, "web/app.ts", "const a = 'Ёлка';\n");

    let path = write_script_report(root, &ScriptReportSettings::default()).unwrap();

    assert_eq!(path, root.join("build/cyrillic-lines-exceptions.json"));
    let written: BTreeMap<String, usize> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.get("web/app.ts"), Some(&1));
}

#[test]
fn test_invalid_pattern_is_a_configuration_error() {
    let temp_dir = tempdir().unwrap();
    let settings = ScriptReportSettings {
        pattern: "[unclosed".to_string(),
        ..ScriptReportSettings::default()
    };

    assert!(count_script_lines(temp_dir.path(), &settings).is_err());
}
