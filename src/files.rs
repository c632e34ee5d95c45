use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::backup::BACKUP_SUFFIX;
use crate::file_filter::FileFilter;

const PO_EXTENSION: &str = "po";

/// A language directory and the PO file names it contributes to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageFiles {
    pub dir: PathBuf,
    pub files: Vec<String>,
}

impl LanguageFiles {
    pub fn new<I, S>(dir: impl Into<PathBuf>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let files = files
            .into_iter()
            .map(|name| normalize_name(name.as_ref()))
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect::<Vec<_>>();
        Self {
            dir: dir.into(),
            files,
        }
    }

    /// Lists the `*.po` files directly inside `dir`, sorted by name. A
    /// `<name>.po.bak` left by an interrupted merge lists `<name>.po` even when
    /// the live file is gone, so the run can restore it.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read language directory: {}", dir.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| "failed to read directory entry")?;
            let file_type = entry
                .file_type()
                .with_context(|| "failed to read file type")?;
            if !file_type.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let live = name.strip_suffix(BACKUP_SUFFIX).unwrap_or(name);
            if Path::new(live).extension().and_then(|ext| ext.to_str()) == Some(PO_EXTENSION) {
                files.push(live.to_string());
            }
        }
        files.sort();
        Ok(Self::new(dir, files))
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn paths(&self) -> impl Iterator<Item = (&str, PathBuf)> + '_ {
        self.files
            .iter()
            .map(|name| (name.as_str(), self.path_of(name)))
    }

    pub fn apply_filter(&mut self, filter: &FileFilter) {
        self.files.retain(|name| !filter.is_ignored(Path::new(name)));
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Canonical form of a file name used to pair target and reference files.
pub fn normalize_name(name: &str) -> String {
    let unified = name.trim().replace('\\', "/");
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts.join("/")
}
