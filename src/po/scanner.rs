use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::File;

use crate::error::{MergeError, MergeResult};

use super::lines::LineReader;
use super::{EMPTY_TRANSLATION, LineKind, classify};

/// Decides which translations still need work.
///
/// An empty `msgstr ""` always counts. When `ends_with` holds a non-empty
/// suffix, a translation whose quoted text ends with it counts too (e.g. a
/// fuzzy marker); `#fuzzy` and `#fuzzy"` both match `msgstr "draft#fuzzy"`.
/// Only the `msgstr` line right after a pending `msgid` is checked, so every
/// missing entry has a translation line to substitute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchMode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_with: Option<String>,
}

impl SearchMode {
    pub fn ends_with(suffix: impl Into<String>) -> Self {
        Self {
            ends_with: Some(suffix.into()),
        }
    }

    pub fn suffix(&self) -> Option<&str> {
        self.ends_with.as_deref().filter(|value| !value.is_empty())
    }

    pub fn is_missing(&self, translation_line: &str) -> bool {
        if translation_line.starts_with(EMPTY_TRANSLATION) {
            return true;
        }
        let Some(suffix) = self.suffix() else {
            return false;
        };
        let line = translation_line.trim_end();
        line.ends_with(suffix)
            || line
                .strip_suffix('"')
                .is_some_and(|content| content.ends_with(suffix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    ExtractMissing(SearchMode),
    BuildIndex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanItem {
    Missing {
        identifier: String,
        identifier_line: usize,
        translation_line: usize,
    },
    Indexed {
        identifier: String,
        translation: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Idle,
    Header,
    PendingId { identifier: String, line: usize },
}

/// Line classification state machine, independent of any I/O.
#[derive(Debug, Clone)]
pub struct ScanMachine {
    mode: ScanMode,
    state: ScanState,
}

impl ScanMachine {
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            state: ScanState::Idle,
        }
    }

    pub fn feed(&mut self, line_no: usize, text: &str) -> Option<ScanItem> {
        match classify(text) {
            LineKind::HeaderId => {
                self.state = ScanState::Header;
                None
            }
            LineKind::MsgId => {
                self.state = ScanState::PendingId {
                    identifier: text.to_string(),
                    line: line_no,
                };
                None
            }
            LineKind::MsgStr => {
                let (identifier, line) = match std::mem::replace(&mut self.state, ScanState::Idle)
                {
                    ScanState::PendingId { identifier, line } => (identifier, line),
                    other => {
                        self.state = other;
                        return None;
                    }
                };
                match &self.mode {
                    ScanMode::ExtractMissing(search) => {
                        search.is_missing(text).then(|| ScanItem::Missing {
                            identifier,
                            identifier_line: line,
                            translation_line: line_no,
                        })
                    }
                    ScanMode::BuildIndex => Some(ScanItem::Indexed {
                        identifier,
                        translation: text.to_string(),
                    }),
                }
            }
            LineKind::Other => None,
        }
    }
}

/// Lazy, forward-only pass over one PO file. Not restartable: open a new
/// scanner for a new pass.
pub struct LineScanner {
    path: PathBuf,
    reader: LineReader<File>,
    machine: ScanMachine,
}

impl LineScanner {
    pub async fn open(path: &Path, mode: ScanMode) -> MergeResult<Self> {
        let file = File::open(path)
            .await
            .map_err(|err| MergeError::read(path, err))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: LineReader::new(file),
            machine: ScanMachine::new(mode),
        })
    }

    pub async fn next_item(&mut self) -> MergeResult<Option<ScanItem>> {
        loop {
            let Some(line) = self
                .reader
                .next_line()
                .await
                .map_err(|err| MergeError::read(&self.path, err))?
            else {
                return Ok(None);
            };
            if let Some(item) = self.machine.feed(line.number, &line.text()) {
                return Ok(Some(item));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run(mode: ScanMode, lines: &[&str]) -> Vec<ScanItem> {
        let mut machine = ScanMachine::new(mode);
        lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| machine.feed(idx + 1, line))
            .collect()
    }

    #[test]
    fn extracts_empty_translations_after_header() {
        let items = run(
            ScanMode::ExtractMissing(SearchMode::default()),
            &[
                "msgid \"\"",
                "msgstr \"\"",
                "\"Language: fr\\n\"",
                "",
                "msgid \"hello\"",
                "msgstr \"\"",
                "",
                "msgid \"bye\"",
                "msgstr \"au revoir\"",
            ],
        );
        assert_eq!(
            items,
            vec![ScanItem::Missing {
                identifier: "msgid \"hello\"".to_string(),
                identifier_line: 5,
                translation_line: 6,
            }]
        );
    }

    #[test]
    fn suffix_marks_non_empty_translations_as_missing() {
        let mode = ScanMode::ExtractMissing(SearchMode::ends_with("#fuzzy"));
        let items = run(
            mode,
            &[
                "msgid \"draft\"",
                "msgstr \"draft#fuzzy\"",
                "msgid \"done\"",
                "msgstr \"done\"",
            ],
        );
        assert_eq!(items.len(), 1);
        assert!(matches!(
            &items[0],
            ScanItem::Missing { identifier, .. } if identifier == "msgid \"draft\""
        ));
    }

    #[test]
    fn suffix_matches_with_or_without_closing_quote() {
        assert!(SearchMode::ends_with("#fuzzy").is_missing("msgstr \"draft#fuzzy\""));
        assert!(SearchMode::ends_with("#fuzzy\"").is_missing("msgstr \"draft#fuzzy\""));
        assert!(SearchMode::ends_with("#fuzzy").is_missing("msgstr \"draft#fuzzy\"  "));
        assert!(!SearchMode::ends_with("#fuzzy").is_missing("msgstr \"done\""));
        assert!(!SearchMode::ends_with("#fuzzy").is_missing("msgstr \"#fuzzy draft\""));
    }

    #[test]
    fn empty_suffix_only_matches_empty_translations() {
        let search = SearchMode::ends_with("");
        assert!(search.is_missing("msgstr \"\""));
        assert!(!search.is_missing("msgstr \"done\""));
    }

    #[test]
    fn duplicates_are_kept_in_encounter_order() {
        let items = run(
            ScanMode::ExtractMissing(SearchMode::default()),
            &[
                "msgid \"a\"",
                "msgstr \"\"",
                "msgid \"a\"",
                "msgstr \"\"",
            ],
        );
        let lines = items
            .iter()
            .map(|item| match item {
                ScanItem::Missing {
                    identifier_line, ..
                } => *identifier_line,
                ScanItem::Indexed { .. } => 0,
            })
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn index_mode_consumes_every_translation() {
        let items = run(
            ScanMode::BuildIndex,
            &[
                "msgid \"\"",
                "msgstr \"\"",
                "msgid \"a\"",
                "msgstr \"A\"",
                "msgid \"b\"",
                "msgstr \"\"",
                "msgstr \"orphan\"",
            ],
        );
        assert_eq!(
            items,
            vec![
                ScanItem::Indexed {
                    identifier: "msgid \"a\"".to_string(),
                    translation: "msgstr \"A\"".to_string(),
                },
                ScanItem::Indexed {
                    identifier: "msgid \"b\"".to_string(),
                    translation: "msgstr \"\"".to_string(),
                },
            ]
        );
    }

    #[test]
    fn header_state_ignores_its_translation() {
        let mut machine = ScanMachine::new(ScanMode::BuildIndex);
        assert!(machine.feed(1, "msgid \"\"").is_none());
        assert_eq!(machine.state, ScanState::Header);
        assert!(machine.feed(2, "msgstr \"\"").is_none());
        assert!(machine.feed(3, "msgid \"x\"").is_none());
        assert_ne!(machine.state, ScanState::Header);
    }

    #[tokio::test]
    async fn scanner_streams_items_from_disk() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("messages.po");
        std::fs::write(&path, "msgid \"a\"\r\nmsgstr \"\"\r\nmsgid \"b\"\r\nmsgstr \"\"\r\n")
            .expect("write po");

        let mut scanner = LineScanner::open(&path, ScanMode::ExtractMissing(SearchMode::default()))
            .await
            .expect("open");
        let mut identifiers = Vec::new();
        while let Some(item) = scanner.next_item().await.expect("scan") {
            if let ScanItem::Missing { identifier, .. } = item {
                identifiers.push(identifier);
            }
        }
        assert_eq!(identifiers, vec!["msgid \"a\"", "msgid \"b\""]);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("absent.po");
        let err = LineScanner::open(&path, ScanMode::BuildIndex)
            .await
            .err()
            .expect("should fail");
        assert!(matches!(err, MergeError::FileRead { .. }));
        assert_eq!(err.path(), path.as_path());
    }
}
