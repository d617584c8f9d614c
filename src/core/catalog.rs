//! # Namespace Catalog / 命名空间目录
//!
//! Discovers localization namespaces by scanning the working tree for the
//! reference locale's data files. The catalog is rebuilt on every run and is a
//! pure function of the file system at call time.
//!
//! 通过扫描工作目录中参考语言的数据文件来发现本地化命名空间。
//! 目录在每次运行时重新构建，完全取决于调用时的文件系统。

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::config::LocaleInfo;
use crate::core::namespace::{LocalizationNamespace, NamespaceLayout};
use crate::error::{Result, SyncError};
use crate::infra::fs::relative_slash_path;

static FILE_STEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?<namespace>[^.]+)\.(?<locale>[^.]+)\.i18n$").expect("file stem pattern is valid")
});

/// Path fragments that mark copies which must never be treated as sources:
/// test fixtures, build output, dependency folders and generated content.
///
/// 标记不应被视为源文件的副本的路径片段：测试夹具、构建输出、依赖目录和生成内容。
pub const DEFAULT_FORBIDDEN_PATHS: &[&str] = &[
    "Tests",
    "Administration.Web/Content",
    "/bin/",
    "/obj/",
    "TestResults/",
    "IntegrationTestSources/",
    "/node_modules/",
    "/.git/",
];

/// Decides which discovered files are excluded.
///
/// Fragments are matched against the path relative to the working directory,
/// `/`-separated and starting with `/`, so `/bin/` also matches a top-level
/// `bin` directory.
#[derive(Debug, Clone)]
pub struct PathFilter {
    forbidden: Vec<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            forbidden: DEFAULT_FORBIDDEN_PATHS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PathFilter {
    /// A filter with no exclusions at all.
    pub fn empty() -> Self {
        Self { forbidden: Vec::new() }
    }

    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forbidden.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn is_forbidden(&self, relative_path: &str) -> bool {
        self.forbidden
            .iter()
            .any(|fragment| relative_path.contains(fragment.as_str()))
    }

    pub fn fragments(&self) -> &[String] {
        &self.forbidden
    }
}

/// Where one namespace lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// The namespace name as spelled by the winning file.
    pub name: String,
    pub directory: PathBuf,
}

/// The namespaces of the working tree, keyed case-insensitively.
/// 工作目录中的命名空间，键不区分大小写。
#[derive(Debug, Clone)]
pub struct NamespaceCatalog {
    reference_locale: String,
    entries: BTreeMap<String, CatalogEntry>,
    root: PathBuf,
    layout: Arc<NamespaceLayout>,
}

impl NamespaceCatalog {
    /// Scans `working_directory` for `*.<reference_locale>.i18n.json` files.
    ///
    /// # Errors
    /// `MalformedCatalogEntry` if a matching file name is not
    /// `<namespace>.<locale>.i18n.json`; `Io` if the tree cannot be walked.
    pub fn discover(
        reference_locale: &str,
        working_directory: &Path,
        filter: &PathFilter,
    ) -> Result<Self> {
        let suffix = format!(".{reference_locale}.i18n.json");
        let mut entries: BTreeMap<String, CatalogEntry> = BTreeMap::new();

        let walker = WalkDir::new(working_directory)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                // A directory whose own path already contains a fragment can only hold
                // forbidden files.
                !entry.file_type().is_dir()
                    || entry.depth() == 0
                    || !filter.is_forbidden(&format!(
                        "{}/",
                        relative_display(working_directory, entry.path())
                    ))
            });

        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if !file_name.ends_with(&suffix) {
                continue;
            }

            let relative = relative_display(working_directory, entry.path());
            if filter.is_forbidden(&relative) {
                debug!(path = %relative, "Skipping forbidden localization file");
                continue;
            }

            let name = namespace_from_file_name(entry.path())?;
            let directory = entry
                .path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| working_directory.to_path_buf());

            debug!("Located namespace {} in directory {}", name, directory.display());

            let new_entry = CatalogEntry { name, directory };
            if let Some(previous) = entries.insert(new_entry.name.to_lowercase(), new_entry.clone()) {
                warn!(
                    namespace = %new_entry.name,
                    kept = %new_entry.directory.display(),
                    dropped = %previous.directory.display(),
                    "Namespace discovered twice, the last one wins"
                );
            }
        }

        Ok(Self {
            reference_locale: reference_locale.to_string(),
            entries,
            root: working_directory.to_path_buf(),
            layout: Arc::new(NamespaceLayout::default().with_root(working_directory)),
        })
    }

    /// Replaces the layout shared by every namespace this catalog hands out.
    /// The layout is rooted at the scanned directory.
    pub fn with_layout(mut self, layout: NamespaceLayout) -> Self {
        self.layout = Arc::new(layout.with_root(&self.root));
        self
    }

    pub fn reference_locale(&self) -> &str {
        &self.reference_locale
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks a namespace up case-insensitively.
    pub fn get(&self, namespace: &str) -> Option<&CatalogEntry> {
        self.entries.get(&namespace.to_lowercase())
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// One namespace instance per catalog entry for `locale`, in catalog order.
    /// 为 `locale` 按目录顺序生成每个命名空间实例。
    pub fn namespaces(&self, locale: &LocaleInfo) -> Vec<LocalizationNamespace> {
        self.namespaces_for(&locale.name)
    }

    pub fn namespaces_for(&self, locale_name: &str) -> Vec<LocalizationNamespace> {
        self.entries
            .values()
            .map(|entry| {
                let file_name = format!("{}.{}.i18n.json", entry.name, locale_name);
                LocalizationNamespace::new(
                    entry.name.clone(),
                    locale_name.to_string(),
                    entry.directory.join(file_name),
                    Arc::clone(&self.layout),
                )
            })
            .collect()
    }
}

/// Extracts `Common` from `.../Common.en.i18n.json`.
pub fn namespace_from_file_name(path: &Path) -> Result<String> {
    let malformed = || SyncError::MalformedCatalogEntry {
        path: path.to_path_buf(),
    };
    let stem = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(".json"))
        .ok_or_else(malformed)?;
    let captures = FILE_STEM.captures(stem).ok_or_else(malformed)?;
    Ok(captures["namespace"].to_string())
}

fn relative_display(root: &Path, path: &Path) -> String {
    format!("/{}", relative_slash_path(root, path))
}
