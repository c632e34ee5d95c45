use serde::Serialize;
use tracing::{error, info, warn};

/// Structured progress record for one step of a run. Every event is logged
/// when it is produced and kept in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    MissingFound {
        file: String,
        count: usize,
    },
    IndexBuilt {
        file: String,
        count: usize,
    },
    PlanReady {
        file: String,
        count: usize,
    },
    UnresolvedIdentifier {
        file: String,
        identifier: String,
    },
    MissingReferenceFile {
        file: String,
    },
    BackupRecovered {
        file: String,
        backup: String,
    },
    FileMerged {
        file: String,
        substitutions: usize,
    },
    FileFailed {
        file: String,
        error: String,
    },
}

impl ProgressEvent {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ProgressEvent::UnresolvedIdentifier { .. }
                | ProgressEvent::MissingReferenceFile { .. }
                | ProgressEvent::BackupRecovered { .. }
        )
    }

    pub(crate) fn log(&self) {
        match self {
            ProgressEvent::MissingFound { file, count } => {
                info!("found {} missing translations in {}", count, file)
            }
            ProgressEvent::IndexBuilt { file, count } => {
                info!("found {} available translations in {}", count, file)
            }
            ProgressEvent::PlanReady { file, count } => {
                info!("found {} messages ready to translate in {}", count, file)
            }
            ProgressEvent::UnresolvedIdentifier { file, identifier } => {
                warn!(
                    "cannot find available translation for [{}] in [{}]",
                    identifier, file
                )
            }
            ProgressEvent::MissingReferenceFile { file } => {
                warn!("cannot find [{}] in available translations", file)
            }
            ProgressEvent::BackupRecovered { file, backup } => {
                warn!("recovering {} from leftover backup {}", file, backup)
            }
            ProgressEvent::FileMerged {
                file,
                substitutions,
            } => info!("{} merged ({} substitutions)", file, substitutions),
            ProgressEvent::FileFailed { file, error } => {
                error!("{} failed: {}", file, error)
            }
        }
    }
}

/// Ordered collection of events produced by one pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<ProgressEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: ProgressEvent) {
        event.log();
        self.events.push(event);
    }

    pub fn extend(&mut self, other: EventLog) {
        self.events.extend(other.events);
    }

    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ProgressEvent> {
        self.events.iter().filter(|event| event.is_warning())
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_are_filtered_from_progress() {
        let mut log = EventLog::default();
        log.push(ProgressEvent::MissingFound {
            file: "messages.po".to_string(),
            count: 2,
        });
        log.push(ProgressEvent::MissingReferenceFile {
            file: "extra.po".to_string(),
        });
        assert_eq!(log.events().len(), 2);
        assert_eq!(log.warnings().count(), 1);
    }

    #[test]
    fn events_serialize_with_a_tag() {
        let event = ProgressEvent::FileMerged {
            file: "messages.po".to_string(),
            substitutions: 3,
        };
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["event"], "file_merged");
        assert_eq!(value["substitutions"], 3);
    }
}
