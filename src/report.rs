use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use time::{OffsetDateTime, format_description};

use crate::diff::DiffEntry;
use crate::events::EventLog;
use crate::files::LanguageFiles;
use crate::pipeline::RunOptions;
use crate::po::SearchMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Target,
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Merged {
        substitutions: usize,
        unresolved: usize,
    },
    /// Dry run: what a merge would do.
    Planned {
        substitutions: usize,
        unresolved: usize,
    },
    UpToDate,
    Skipped {
        reason: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub role: FileRole,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Aggregate result of one run: which files merged, which were skipped and
/// which failed, plus the plan and every progress event.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub target_dir: String,
    pub reference_dir: String,
    pub search: SearchMode,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub plan: Vec<DiffEntry>,
    pub events: EventLog,
}

impl RunReport {
    pub(crate) fn new(
        target: &LanguageFiles,
        reference: &LanguageFiles,
        options: &RunOptions,
        files: Vec<FileReport>,
        plan: Vec<DiffEntry>,
        events: EventLog,
    ) -> Self {
        let generated_at = OffsetDateTime::now_utc()
            .format(&format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            generated_at,
            target_dir: target.dir.display().to_string(),
            reference_dir: reference.dir.display().to_string(),
            search: options.search.clone(),
            dry_run: options.dry_run,
            files,
            plan,
            events,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failures().count() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|file| matches!(file.status, FileStatus::Failed { .. }))
    }

    pub fn substitutions(&self) -> usize {
        self.files
            .iter()
            .map(|file| match file.status {
                FileStatus::Merged { substitutions, .. } => substitutions,
                _ => 0,
            })
            .sum()
    }

    /// Human readable summary, one line per file.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for file in &self.files {
            let name = match file.role {
                FileRole::Target => file.file.clone(),
                FileRole::Reference => format!("{} (reference)", file.file),
            };
            let line = match &file.status {
                FileStatus::Merged {
                    substitutions,
                    unresolved,
                } => format!(
                    "merged     {} ({} substitutions, {} unresolved)",
                    name, substitutions, unresolved
                ),
                FileStatus::Planned {
                    substitutions,
                    unresolved,
                } => format!(
                    "planned    {} ({} substitutions, {} unresolved)",
                    name, substitutions, unresolved
                ),
                FileStatus::UpToDate => format!("up-to-date {}", name),
                FileStatus::Skipped { reason } => format!("skipped    {}: {}", name, reason),
                FileStatus::Failed { error } => format!("failed     {}: {}", name, error),
            };
            lines.push(line);
        }

        let warnings = self.events.warnings().count();
        let failures = self.failures().count();
        let mut totals = vec![format!("substitutions: {}", self.substitutions())];
        if warnings > 0 {
            totals.push(format!("warnings: {}", warnings));
        }
        if failures > 0 {
            totals.push(format!("failed files: {}", failures));
        }
        if self.dry_run {
            totals.push("dry run, no file changed".to_string());
        }
        lines.push(totals.join(", "));
        lines.join("\n")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create report dir: {}", dir.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to write report: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ProgressEvent;
    use tempfile::tempdir;

    fn report(files: Vec<FileReport>, events: EventLog) -> RunReport {
        RunReport::new(
            &LanguageFiles::new("/locales/fr", ["messages.po"]),
            &LanguageFiles::new("/locales/en", ["messages.po"]),
            &RunOptions {
                search: SearchMode::default(),
                concurrency: 1,
                dry_run: false,
            },
            files,
            Vec::new(),
            events,
        )
    }

    #[test]
    fn counts_failures_and_substitutions() {
        let report = report(
            vec![
                FileReport {
                    file: "a.po".to_string(),
                    role: FileRole::Target,
                    status: FileStatus::Merged {
                        substitutions: 3,
                        unresolved: 1,
                    },
                },
                FileReport {
                    file: "b.po".to_string(),
                    role: FileRole::Reference,
                    status: FileStatus::Failed {
                        error: "boom".to_string(),
                    },
                },
            ],
            EventLog::default(),
        );
        assert!(report.has_failures());
        assert_eq!(report.substitutions(), 3);
    }

    #[test]
    fn json_report_flattens_status() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("out/report.json");
        let mut events = EventLog::default();
        events.push(ProgressEvent::MissingReferenceFile {
            file: "extra.po".to_string(),
        });
        let report = report(
            vec![FileReport {
                file: "extra.po".to_string(),
                role: FileRole::Target,
                status: FileStatus::Skipped {
                    reason: "no reference file".to_string(),
                },
            }],
            events,
        );

        report.write_json(&path).expect("write report");
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).expect("parse");
        assert_eq!(value["files"][0]["status"], "skipped");
        assert_eq!(value["files"][0]["role"], "target");
        assert_eq!(value["events"][0]["event"], "missing_reference_file");
        assert_eq!(value["target_dir"], "/locales/fr");
    }
}
