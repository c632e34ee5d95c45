use serde::Serialize;

use crate::events::{EventLog, ProgressEvent};
use crate::index::IndexSet;
use crate::missing::{MissingEntries, MissingEntry};
use crate::po::EMPTY_TRANSLATION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "translation", rename_all = "snake_case")]
pub enum Resolution {
    Found(String),
    /// No counterpart in the reference index; the merge leaves the line alone.
    Unresolved,
}

impl Resolution {
    pub fn translation(&self) -> Option<&str> {
        match self {
            Resolution::Found(line) => Some(line),
            Resolution::Unresolved => None,
        }
    }

    /// Line shown for this resolution; unresolved entries read as `msgstr ""`.
    pub fn translation_line(&self) -> &str {
        self.translation().unwrap_or(EMPTY_TRANSLATION)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub identifier: String,
    pub identifier_line: usize,
    pub translation_line: usize,
    pub resolution: Resolution,
}

impl Replacement {
    pub fn new(entry: &MissingEntry, resolution: Resolution) -> Self {
        Self {
            identifier: entry.identifier.clone(),
            identifier_line: entry.identifier_line,
            translation_line: entry.translation_line,
            resolution,
        }
    }
}

/// Replacement plan for one target file, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub file: String,
    pub replacements: Vec<Replacement>,
}

impl DiffEntry {
    pub fn resolved(&self) -> usize {
        self.replacements
            .iter()
            .filter(|replacement| replacement.resolution.translation().is_some())
            .count()
    }

    pub fn unresolved(&self) -> usize {
        self.replacements.len() - self.resolved()
    }
}

#[derive(Debug, Default)]
pub struct Plan {
    pub entries: Vec<DiffEntry>,
    /// Target files with no reference counterpart; never touched by the merge.
    pub skipped: Vec<String>,
    pub events: EventLog,
}

/// Joins missing entries against the reference indexes. No I/O.
pub fn build_plan(missing: &[MissingEntries], indexes: &IndexSet) -> Plan {
    let mut plan = Plan::default();
    for target in missing {
        let Some(index) = indexes.get(&target.file) else {
            plan.events.push(ProgressEvent::MissingReferenceFile {
                file: target.file.clone(),
            });
            plan.skipped.push(target.file.clone());
            continue;
        };

        let mut entry = DiffEntry {
            file: target.file.clone(),
            replacements: Vec::with_capacity(target.entries.len()),
        };
        for missing_entry in &target.entries {
            let resolution = match index.get(&missing_entry.identifier) {
                Some(translation) => Resolution::Found(translation.to_string()),
                None => {
                    plan.events.push(ProgressEvent::UnresolvedIdentifier {
                        file: target.file.clone(),
                        identifier: missing_entry.identifier.clone(),
                    });
                    Resolution::Unresolved
                }
            };
            entry
                .replacements
                .push(Replacement::new(missing_entry, resolution));
        }
        plan.events.push(ProgressEvent::PlanReady {
            file: entry.file.clone(),
            count: entry.resolved(),
        });
        plan.entries.push(entry);
    }
    plan
}
