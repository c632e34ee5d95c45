use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub ends_with: Option<String>,
    /// `None` means one task per CPU.
    pub concurrency: Option<usize>,
    pub ignore_files: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    search: Option<SearchSettings>,
    merge: Option<MergeSettings>,
    files: Option<FilesSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchSettings {
    ends_with: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MergeSettings {
    concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct FilesSettings {
    ignore: Option<Vec<String>>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    settings.merge(parse_settings(DEFAULT_SETTINGS_TOML, Path::new("<default settings>"))?);
    ensure_home_settings_file()?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(dir) = paths::settings_dir() {
        ordered_paths.push(dir.join("settings.toml"));
        ordered_paths.push(dir.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings.merge(parse_settings(&content, &path)?);
        }
    }

    Ok(settings)
}

fn parse_settings(content: &str, path: &Path) -> Result<SettingsFile> {
    toml::from_str(content).with_context(|| format!("failed to parse settings: {}", path.display()))
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(search) = incoming.search {
            if let Some(suffix) = search.ends_with {
                self.ends_with = if suffix.is_empty() { None } else { Some(suffix) };
            }
        }
        if let Some(merge) = incoming.merge {
            if let Some(concurrency) = merge.concurrency {
                self.concurrency = if concurrency == 0 {
                    None
                } else {
                    Some(concurrency)
                };
            }
        }
        if let Some(files) = incoming.files {
            if let Some(ignore) = files.ignore {
                self.ignore_files = ignore;
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(dir) = paths::settings_dir() else {
        return Ok(());
    };
    let path = dir.join("settings.toml");
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create settings directory: {}", dir.display()))?;
    fs::write(&path, DEFAULT_SETTINGS_TOML)
        .with_context(|| format!("failed to write settings: {}", path.display()))?;
    Ok(())
}
