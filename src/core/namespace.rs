//! # Localization Namespace / 本地化命名空间
//!
//! One (namespace, locale) data file and the operations on its content: read,
//! merge a remote snapshot into it, validate its keys and diff it against a
//! snapshot.
//!
//! 一个（命名空间，语言区域）数据文件及其内容上的操作：
//! 读取、合并远程快照、校验键以及与快照求差异。

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::core::config::LayoutSettings;
use crate::core::keys::{LocalizationKey, normalize_template_syntax};
use crate::core::models::{ApplyReport, RemoteSnapshot, TranslationMap, ValueChange, corrupt};
use crate::error::{Result, SyncError};
use crate::infra::fs::relative_slash_path;

/// Conventions shared by every namespace of a catalog: where namespace files sit
/// inside their project, how the project manifest is found, and which paths
/// belong to front-end builds that manage their own manifest.
///
/// 目录中所有命名空间共享的约定：命名空间文件在项目中的位置、
/// 如何找到项目清单，以及哪些路径属于自行管理清单的前端构建。
#[derive(Debug)]
pub struct NamespaceLayout {
    pub localization_dir: PathBuf,
    pub project_extension: String,
    pub frontend_marker: String,
    /// Root the front-end marker is matched under. Without one the whole path is used.
    root: Option<PathBuf>,
    /// Serializes manifest edits; several namespaces may share one project file.
    manifest_lock: Mutex<()>,
}

impl NamespaceLayout {
    pub fn new(
        localization_dir: impl Into<PathBuf>,
        project_extension: impl Into<String>,
        frontend_marker: impl Into<String>,
    ) -> Self {
        Self {
            localization_dir: localization_dir.into(),
            project_extension: project_extension.into(),
            frontend_marker: frontend_marker.into(),
            root: None,
            manifest_lock: Mutex::new(()),
        }
    }

    /// Matches the front-end marker only below `root`, so a checkout directory
    /// whose own name carries the marker does not count.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

impl Default for NamespaceLayout {
    fn default() -> Self {
        Self::from(&LayoutSettings::default())
    }
}

impl From<&LayoutSettings> for NamespaceLayout {
    fn from(settings: &LayoutSettings) -> Self {
        Self::new(
            &settings.localization_dir,
            &settings.project_extension,
            &settings.frontend_marker,
        )
    }
}

#[derive(Debug, Clone)]
pub struct LocalizationNamespace {
    name: String,
    locale: String,
    data_file: PathBuf,
    layout: Arc<NamespaceLayout>,
}

impl LocalizationNamespace {
    pub fn new(
        name: impl Into<String>,
        locale: impl Into<String>,
        data_file: impl Into<PathBuf>,
        layout: Arc<NamespaceLayout>,
    ) -> Self {
        Self {
            name: name.into(),
            locale: locale.into(),
            data_file: data_file.into(),
            layout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// A missing file means "nothing pushed yet", not an error.
    pub fn has_data(&self) -> bool {
        self.data_file.is_file()
    }

    /// The namespace is consumed by a front-end build with its own manifest.
    pub fn is_frontend(&self) -> bool {
        if self.layout.frontend_marker.is_empty() {
            return false;
        }
        let path = match self.layout.root() {
            Some(root) => relative_slash_path(root, &self.data_file),
            None => self.data_file.to_string_lossy().into_owned(),
        };
        path.contains(self.layout.frontend_marker.as_str())
    }

    /// Reads the on-disk document; empty when there is no file yet.
    ///
    /// # Errors
    /// `DataCorrupt` when the file is not a flat JSON object of strings.
    pub fn read_local(&self) -> Result<TranslationMap> {
        if !self.has_data() {
            return Ok(TranslationMap::new());
        }
        let content = fs::read_to_string(&self.data_file)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        TranslationMap::from_json_str(content).map_err(|reason| corrupt(&self.data_file, reason))
    }

    /// Merges the keys of `snapshot` that belong to this namespace into the file.
    ///
    /// Values are normalized with [`normalize_template_syntax`]. Existing keys keep
    /// their position; new keys are appended in snapshot order. When no snapshot
    /// key belongs to this namespace, nothing is written and no file is created.
    /// A file that gains data for the first time is registered in its project
    /// manifest unless the namespace is front-end.
    ///
    /// 将 `snapshot` 中属于此命名空间的键合并到文件中。
    /// 若快照中没有属于此命名空间的键，则不写入任何内容，也不会创建文件。
    pub fn apply_translations(&self, snapshot: &RemoteSnapshot) -> Result<ApplyReport> {
        info!("Applying translations for {}: {}", self.name, self.data_file.display());

        let mut report = ApplyReport {
            namespace: self.name.clone(),
            locale: self.locale.clone(),
            path: self.data_file.clone(),
            ..ApplyReport::default()
        };

        let incoming = snapshot.entries_for(&self.name)?;
        if incoming.is_empty() {
            info!("No keys found for namespace {}", self.name);
            return Ok(report);
        }

        let existed = self.has_data();
        let mut local = self.read_local()?;

        for (key, value) in incoming {
            let new_value = normalize_template_syntax(value).into_owned();
            match local.get(key) {
                Some(previous) if previous != new_value => {
                    debug!("Replaced value for key {key}\nPrevious: {previous}\nNew: {new_value}");
                    report.changed.push(ValueChange {
                        key: key.to_string(),
                        previous: previous.to_string(),
                        new: new_value.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    debug!("Key {key} did not exist locally, added\nValue: {new_value}");
                    report.added.push((key.to_string(), new_value.clone()));
                }
            }
            local.insert(key, new_value);
        }

        if !existed {
            report.created = true;
            report.manifest_updated = self.register_in_manifest()?;
        }

        fs::write(&self.data_file, local.to_pretty_string()?)?;
        report.written = true;

        Ok(report)
    }

    /// Fails on the first key that is not `<namespace>:<identifier>`.
    pub fn validate(&self) -> Result<()> {
        let local = self.read_local()?;
        for key in local.keys() {
            LocalizationKey::require(key)?;
        }
        Ok(())
    }

    /// Keys present locally but gone from the snapshot (stale from the remote's view).
    /// 本地存在但快照中已不存在的键。
    pub fn added_keys_relative_to(&self, snapshot: &RemoteSnapshot) -> Result<BTreeSet<String>> {
        let local = self.local_keys()?;
        let remote = self.remote_keys(snapshot)?;
        Ok(local.difference(&remote).cloned().collect())
    }

    /// Keys the snapshot has but the local copy lost (deletion candidates upstream).
    /// 快照中存在但本地副本已丢失的键。
    pub fn removed_keys_relative_to(&self, snapshot: &RemoteSnapshot) -> Result<BTreeSet<String>> {
        let local = self.local_keys()?;
        let remote = self.remote_keys(snapshot)?;
        Ok(remote.difference(&local).cloned().collect())
    }

    fn local_keys(&self) -> Result<BTreeSet<String>> {
        let local = self.read_local()?;
        let mut keys = BTreeSet::new();
        for key in local.keys() {
            if LocalizationKey::require(key)?.belongs_to(&self.name) {
                keys.insert(key.to_string());
            }
        }
        Ok(keys)
    }

    fn remote_keys(&self, snapshot: &RemoteSnapshot) -> Result<BTreeSet<String>> {
        Ok(snapshot
            .entries_for(&self.name)?
            .into_iter()
            .map(|(key, _)| key.to_string())
            .collect())
    }

    /// Adds the data file to the project manifest. Returns `false` when nothing had
    /// to change (front-end namespace, or the file is already listed).
    fn register_in_manifest(&self) -> Result<bool> {
        if self.is_frontend() {
            debug!("{} is a front-end namespace, manifest left alone", self.name);
            return Ok(false);
        }

        let _guard = self
            .layout
            .manifest_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let manifest_path = self.project_manifest_path()?;
        let content = fs::read_to_string(&manifest_path)?;

        let include = format!(
            "{}\\{}.{}.i18n.json",
            self.layout.localization_dir.to_string_lossy().replace('/', "\\"),
            self.name,
            self.locale
        );
        if content.contains(&format!("Include=\"{include}\"")) {
            return Ok(false);
        }

        let closing = content.rfind("</Project>").ok_or_else(|| SyncError::UnsupportedLayout {
            path: manifest_path.clone(),
            reason: "no closing </Project> element".to_string(),
        })?;

        let item_group = format!(
            "  <ItemGroup>\n    <Content Include=\"{include}\">\n      <CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory>\n    </Content>\n  </ItemGroup>\n"
        );
        let mut updated = String::with_capacity(content.len() + item_group.len());
        updated.push_str(&content[..closing]);
        updated.push_str(&item_group);
        updated.push_str(&content[closing..]);
        fs::write(&manifest_path, updated)?;

        info!("Registered {} in {}", include, manifest_path.display());
        Ok(true)
    }

    fn project_manifest_path(&self) -> Result<PathBuf> {
        let localization_dir = &self.layout.localization_dir;
        let directory = self.data_file.parent().unwrap_or(Path::new(""));
        let unsupported = |reason: String| SyncError::UnsupportedLayout {
            path: directory.to_path_buf(),
            reason,
        };

        if !directory.ends_with(localization_dir) {
            return Err(unsupported(format!(
                "localization directory must end with {}",
                localization_dir.display()
            )));
        }

        let depth = localization_dir.components().count();
        let project_dir = directory
            .ancestors()
            .nth(depth)
            .ok_or_else(|| unsupported("no project directory above it".to_string()))?;

        let extension = self.layout.project_extension.as_str();
        let mut manifests = Vec::new();
        for entry in fs::read_dir(project_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
                manifests.push(path);
            }
        }

        match manifests.len() {
            1 => Ok(manifests.remove(0)),
            found => Err(unsupported(format!(
                "expected exactly one *.{extension} in {}, found {found}",
                project_dir.display()
            ))),
        }
    }
}
