//! # Non-Latin Script Report / 非拉丁文字报告
//!
//! Counts, per source file, the lines that contain characters of a given script
//! (Cyrillic by default). The lint step of the repository uses the generated
//! file as its list of accepted exceptions, so it is regenerated on every pull.
//!
//! 统计每个源文件中包含指定文字（默认西里尔字母）字符的行数。
//! 仓库的 lint 步骤将生成的文件作为允许的例外列表，因此每次拉取都会重新生成。

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::core::config::ScriptReportSettings;
use crate::error::{Result, SyncError};
use crate::infra::fs::{relative_slash_path, write_with_parents};

/// Relative path (`/`-separated) to the number of matching lines. Files without
/// a match are left out.
pub fn count_script_lines(root: &Path, settings: &ScriptReportSettings) -> Result<BTreeMap<String, usize>> {
    let pattern = Regex::new(&settings.pattern).map_err(|e| {
        SyncError::Configuration(format!("invalid script_report.pattern: {e}"))
    })?;

    let mut counts = BTreeMap::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches_extension = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| settings.extensions.iter().any(|e| e == ext));
        if !matches_extension {
            continue;
        }

        let bytes = fs::read(entry.path())?;
        let content = String::from_utf8_lossy(&bytes);
        let count = content.lines().filter(|line| pattern.is_match(line)).count();
        if count > 0 {
            counts.insert(relative_slash_path(root, entry.path()), count);
        }
    }

    debug!(files = counts.len(), "Counted non-Latin script lines");
    Ok(counts)
}

/// Regenerates the report under `root` and returns the path written.
pub fn write_script_report(root: &Path, settings: &ScriptReportSettings) -> Result<PathBuf> {
    let counts = count_script_lines(root, settings)?;
    let path = root.join(&settings.output);
    let json = serde_json::to_string_pretty(&counts).map_err(io::Error::other)?;
    write_with_parents(&path, json)?;
    info!(path = %path.display(), files = counts.len(), "Wrote script report");
    Ok(path)
}
