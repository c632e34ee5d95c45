use std::collections::HashMap;
use std::path::Path;

use crate::batch::{Batch, for_each_file};
use crate::error::{FileFailure, MergeResult};
use crate::events::ProgressEvent;
use crate::files::LanguageFiles;
use crate::po::{LineScanner, ScanItem, ScanMode};

/// Identifier line -> translation line, for one reference file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableIndex {
    pub file: String,
    translations: HashMap<String, String>,
}

impl AvailableIndex {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            translations: HashMap::new(),
        }
    }

    /// Later duplicates replace earlier ones.
    pub fn insert(&mut self, identifier: String, translation: String) {
        self.translations.insert(identifier, translation);
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.translations.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

/// Indexes of one run, looked up by file name.
#[derive(Debug, Clone, Default)]
pub struct IndexSet {
    by_file: HashMap<String, AvailableIndex>,
}

impl IndexSet {
    pub fn get(&self, file: &str) -> Option<&AvailableIndex> {
        self.by_file.get(file)
    }

    pub fn len(&self) -> usize {
        self.by_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }
}

impl FromIterator<AvailableIndex> for IndexSet {
    fn from_iter<T: IntoIterator<Item = AvailableIndex>>(iter: T) -> Self {
        Self {
            by_file: iter
                .into_iter()
                .map(|index| (index.file.clone(), index))
                .collect(),
        }
    }
}

pub async fn build_index(file: &str, path: &Path) -> MergeResult<AvailableIndex> {
    let mut scanner = LineScanner::open(path, ScanMode::BuildIndex).await?;
    let mut index = AvailableIndex::new(file);
    while let Some(item) = scanner.next_item().await? {
        if let ScanItem::Indexed {
            identifier,
            translation,
        } = item
        {
            index.insert(identifier, translation);
        }
    }
    Ok(index)
}

pub async fn build_indexes(reference: &LanguageFiles, concurrency: usize) -> Batch<AvailableIndex> {
    let files = reference
        .paths()
        .map(|(name, path)| (name.to_string(), path))
        .collect::<Vec<_>>();
    let results = for_each_file(files, concurrency, |file, path| async move {
        build_index(&file, &path).await
    })
    .await;

    let mut batch = Batch::default();
    for (file, result) in results {
        match result {
            Ok(index) => {
                batch.events.push(ProgressEvent::IndexBuilt {
                    file,
                    count: index.len(),
                });
                batch.found.push(index);
            }
            Err(error) => batch.fail(FileFailure { file, error }),
        }
    }
    batch
}
