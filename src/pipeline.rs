use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::backup;
use crate::batch::{Batch, for_each_file};
use crate::diff::build_plan;
use crate::error::FileFailure;
use crate::events::{EventLog, ProgressEvent};
use crate::files::LanguageFiles;
use crate::index::{IndexSet, build_indexes};
use crate::merge::{MergeOutcome, merge_all};
use crate::missing::extract_missing;
use crate::po::SearchMode;
use crate::report::{FileReport, FileRole, FileStatus, RunReport};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub search: SearchMode,
    pub concurrency: usize,
    /// Stop after the diff; no file is touched.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            search: SearchMode::default(),
            concurrency: crate::batch::default_concurrency(),
            dry_run: false,
        }
    }
}

/// Scan, diff and merge one target language against one reference language.
pub async fn run_merge(
    target: &LanguageFiles,
    reference: &LanguageFiles,
    options: &RunOptions,
) -> RunReport {
    let mut events = EventLog::default();
    let mut failed: Vec<(FileRole, FileFailure)> = Vec::new();

    let mut target = target.clone();
    if !options.dry_run {
        let recovery = recover_leftovers(&target, options.concurrency).await;
        let broken = recovery
            .failures
            .iter()
            .map(|failure| failure.file.clone())
            .collect::<HashSet<_>>();
        target.files.retain(|name| !broken.contains(name));
        events.extend(recovery.events);
        failed.extend(
            recovery
                .failures
                .into_iter()
                .map(|failure| (FileRole::Target, failure)),
        );
    }

    let present = present_references(reference).await;
    info!("searching for missing and available translations");
    let (missing, available) = tokio::join!(
        extract_missing(&target, &options.search, options.concurrency),
        build_indexes(&present, options.concurrency)
    );
    events.extend(missing.events);
    events.extend(available.events);
    failed.extend(
        missing
            .failures
            .into_iter()
            .map(|failure| (FileRole::Target, failure)),
    );
    failed.extend(
        available
            .failures
            .into_iter()
            .map(|failure| (FileRole::Reference, failure)),
    );

    info!("building diff");
    let indexes = available.found.into_iter().collect::<IndexSet>();
    let plan = build_plan(&missing.found, &indexes);
    events.extend(plan.events);

    let merged = if options.dry_run {
        Batch::default()
    } else {
        info!("merging {} files", plan.entries.len());
        merge_all(&plan.entries, &target, options.concurrency).await
    };
    events.extend(merged.events);
    failed.extend(
        merged
            .failures
            .into_iter()
            .map(|failure| (FileRole::Target, failure)),
    );

    let mut outcomes: HashMap<&str, &MergeOutcome> = HashMap::new();
    for outcome in &merged.found {
        outcomes.insert(outcome.file.as_str(), outcome);
    }
    let failures: HashMap<(FileRole, &str), &FileFailure> = failed
        .iter()
        .map(|(role, failure)| ((*role, failure.file.as_str()), failure))
        .collect();
    let skipped = plan
        .skipped
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>();

    let mut files = Vec::new();
    let mut target_names = target.files.clone();
    for (role, failure) in &failed {
        if *role == FileRole::Target && !target_names.contains(&failure.file) {
            target_names.push(failure.file.clone());
        }
    }
    target_names.sort();
    for name in &target_names {
        let status = if let Some(failure) = failures.get(&(FileRole::Target, name.as_str())) {
            FileStatus::Failed {
                error: failure.error.to_string(),
            }
        } else if skipped.contains(name.as_str()) {
            FileStatus::Skipped {
                reason: "no reference file".to_string(),
            }
        } else if let Some(entry) = plan.entries.iter().find(|entry| &entry.file == name) {
            match outcomes.get(name.as_str()) {
                Some(outcome) => FileStatus::Merged {
                    substitutions: outcome.substitutions,
                    unresolved: outcome.unresolved,
                },
                None => FileStatus::Planned {
                    substitutions: entry.resolved(),
                    unresolved: entry.unresolved(),
                },
            }
        } else {
            FileStatus::UpToDate
        };
        files.push(FileReport {
            file: name.clone(),
            role: FileRole::Target,
            status,
        });
    }
    for (role, failure) in &failed {
        if *role == FileRole::Reference {
            files.push(FileReport {
                file: failure.file.clone(),
                role: FileRole::Reference,
                status: FileStatus::Failed {
                    error: failure.error.to_string(),
                },
            });
        }
    }

    RunReport::new(
        &target,
        reference,
        options,
        files,
        plan.entries,
        events,
    )
}

/// Drops reference names with nothing on disk. Their targets then take the
/// missing-reference path; a reference that exists but cannot be read still
/// fails.
async fn present_references(reference: &LanguageFiles) -> LanguageFiles {
    let mut present = reference.clone();
    present.files.clear();
    for (name, path) in reference.paths() {
        if tokio::fs::try_exists(&path).await.unwrap_or(true) {
            present.files.push(name.to_string());
        } else {
            debug!("reference file not found: {}", path.display());
        }
    }
    present
}

async fn recover_leftovers(target: &LanguageFiles, concurrency: usize) -> Batch<String> {
    let files = target
        .paths()
        .map(|(name, path)| (name.to_string(), path))
        .collect::<Vec<_>>();
    let results = for_each_file(files, concurrency, |_, path| async move {
        backup::restore_leftover(&path).await
    })
    .await;

    let mut batch = Batch::default();
    for (file, result) in results {
        match result {
            Ok(true) => {
                batch.events.push(ProgressEvent::BackupRecovered {
                    backup: backup::backup_path(&target.path_of(&file))
                        .display()
                        .to_string(),
                    file: file.clone(),
                });
                batch.found.push(file);
            }
            Ok(false) => {}
            Err(error) => batch.fail(FileFailure { file, error }),
        }
    }
    batch
}
