use serde::Serialize;
use std::path::Path;

use crate::backup;
use crate::batch::{Batch, for_each_file};
use crate::error::{FileFailure, MergeResult};
use crate::events::ProgressEvent;
use crate::files::LanguageFiles;
use crate::po::{LineScanner, ScanItem, ScanMode, SearchMode};

/// An identifier of a target file whose translation still needs work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingEntry {
    pub identifier: String,
    pub identifier_line: usize,
    pub translation_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingEntries {
    pub file: String,
    pub entries: Vec<MissingEntry>,
}

pub async fn scan_missing(path: &Path, search: &SearchMode) -> MergeResult<Vec<MissingEntry>> {
    let source = backup::current_source(path).await?;
    let mut scanner = LineScanner::open(&source, ScanMode::ExtractMissing(search.clone())).await?;
    let mut entries = Vec::new();
    while let Some(item) = scanner.next_item().await? {
        if let ScanItem::Missing {
            identifier,
            identifier_line,
            translation_line,
        } = item
        {
            entries.push(MissingEntry {
                identifier,
                identifier_line,
                translation_line,
            });
        }
    }
    Ok(entries)
}

/// Scans every target file concurrently. Files without missing entries are
/// left out of `found`.
pub async fn extract_missing(
    target: &LanguageFiles,
    search: &SearchMode,
    concurrency: usize,
) -> Batch<MissingEntries> {
    let files = target
        .paths()
        .map(|(name, path)| (name.to_string(), path))
        .collect::<Vec<_>>();
    let results = for_each_file(files, concurrency, |_, path| async move {
        scan_missing(&path, search).await
    })
    .await;

    let mut batch = Batch::default();
    for (file, result) in results {
        match result {
            Ok(entries) if entries.is_empty() => {}
            Ok(entries) => {
                batch.events.push(ProgressEvent::MissingFound {
                    file: file.clone(),
                    count: entries.len(),
                });
                batch.found.push(MissingEntries { file, entries });
            }
            Err(error) => batch.fail(FileFailure { file, error }),
        }
    }
    batch
}
