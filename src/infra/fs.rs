//! # File System Operations Module / 文件系统操作模块
//!
//! Small helpers shared by catalog discovery and report generation.
//!
//! 目录发现和报告生成共享的小工具。

use std::fs;
use std::io;
use std::path::Path;

/// Writes `contents` to `path`, creating missing parent directories first.
///
/// 将 `contents` 写入 `path`，必要时先创建缺失的父目录。
pub fn write_with_parents(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// `path` relative to `root`, `/`-separated. Paths outside `root` are returned whole.
pub fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}
