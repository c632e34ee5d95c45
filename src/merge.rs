use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::slice;

use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::backup::{BackupGuard, backup_path};
use crate::batch::{Batch, for_each_file};
use crate::diff::{DiffEntry, Replacement};
use crate::error::{FileFailure, MergeError, MergeResult};
use crate::events::ProgressEvent;
use crate::files::LanguageFiles;
use crate::po::lines::{LineReader, RawLine};
use crate::po::{LineKind, classify};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub file: String,
    pub substitutions: usize,
    pub unresolved: usize,
    pub recovered: bool,
}

/// What to emit for one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutput<'a> {
    Copy,
    Replace(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Substitution<'a> {
    Idle,
    /// An identifier from the plan was seen; its translation sits at `at_line`.
    Pending {
        at_line: usize,
        translation: Option<&'a str>,
    },
}

/// Two-state rewrite machine driven line by line over the original file.
pub struct Rewriter<'a> {
    path: &'a Path,
    plan: Peekable<slice::Iter<'a, Replacement>>,
    state: Substitution<'a>,
    substitutions: usize,
}

impl<'a> Rewriter<'a> {
    pub fn new(path: &'a Path, replacements: &'a [Replacement]) -> Self {
        Self {
            path,
            plan: replacements.iter().peekable(),
            state: Substitution::Idle,
            substitutions: 0,
        }
    }

    pub fn step(&mut self, number: usize, text: &str) -> MergeResult<LineOutput<'a>> {
        match self.state {
            Substitution::Pending {
                at_line,
                translation,
            } if number == at_line => {
                if classify(text) != LineKind::MsgStr {
                    return Err(self.stale(number));
                }
                self.state = Substitution::Idle;
                Ok(match translation {
                    Some(line) => {
                        self.substitutions += 1;
                        LineOutput::Replace(line)
                    }
                    None => LineOutput::Copy,
                })
            }
            Substitution::Pending { .. } => Ok(LineOutput::Copy),
            Substitution::Idle => {
                let Some(&next) = self.plan.peek() else {
                    return Ok(LineOutput::Copy);
                };
                if next.identifier_line == number {
                    if text != next.identifier || next.translation_line <= number {
                        return Err(self.stale(number));
                    }
                    self.state = Substitution::Pending {
                        at_line: next.translation_line,
                        translation: next.resolution.translation(),
                    };
                    self.plan.next();
                } else if next.identifier_line < number {
                    return Err(self.stale(next.identifier_line));
                }
                Ok(LineOutput::Copy)
            }
        }
    }

    /// Fails when the input ended before every planned line was reached.
    pub fn finish(mut self, last_line: usize) -> MergeResult<usize> {
        if self.state != Substitution::Idle || self.plan.peek().is_some() {
            return Err(self.stale(last_line));
        }
        Ok(self.substitutions)
    }

    fn stale(&self, line: usize) -> MergeError {
        MergeError::StalePlan {
            path: self.path.to_path_buf(),
            line,
        }
    }
}

/// Rewrites `live` in place following `entry`. The original content stays
/// under the backup name until the new file is completely written.
pub async fn merge_file(live: &Path, entry: &DiffEntry) -> MergeResult<MergeOutcome> {
    let guard = BackupGuard::acquire(live).await?;
    let backup = guard.backup().to_path_buf();

    let input = File::open(&backup)
        .await
        .map_err(|err| MergeError::read(&backup, err))?;
    let output = File::create(live)
        .await
        .map_err(|err| MergeError::write(live, err))?;
    let mut reader = LineReader::new(input);
    let mut writer = BufWriter::new(output);
    let mut rewriter = Rewriter::new(live, &entry.replacements);

    let mut last_line = 0;
    while let Some(line) = reader
        .next_line()
        .await
        .map_err(|err| MergeError::read(&backup, err))?
    {
        last_line = line.number;
        let output = rewriter.step(line.number, &line.text())?;
        write_line(&mut writer, &line, &output)
            .await
            .map_err(|err| MergeError::write(live, err))?;
    }
    let substitutions = rewriter.finish(last_line)?;

    writer
        .flush()
        .await
        .map_err(|err| MergeError::write(live, err))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|err| MergeError::write(live, err))?;

    let recovered = guard.recovered();
    guard.commit().await?;
    Ok(MergeOutcome {
        file: entry.file.clone(),
        substitutions,
        unresolved: entry.unresolved(),
        recovered,
    })
}

async fn write_line(
    writer: &mut BufWriter<File>,
    line: &RawLine,
    output: &LineOutput<'_>,
) -> std::io::Result<()> {
    match output {
        LineOutput::Copy => writer.write_all(line.as_bytes()).await,
        LineOutput::Replace(translation) => {
            writer.write_all(translation.as_bytes()).await?;
            writer.write_all(line.terminator()).await
        }
    }
}

/// Applies every plan entry concurrently; each file succeeds or fails alone.
pub async fn merge_all(
    plan: &[DiffEntry],
    target: &LanguageFiles,
    concurrency: usize,
) -> Batch<MergeOutcome> {
    let files: Vec<(String, (PathBuf, &DiffEntry))> = plan
        .iter()
        .map(|entry| (entry.file.clone(), (target.path_of(&entry.file), entry)))
        .collect();

    let results = for_each_file(files, concurrency, |_, (path, entry)| async move {
        merge_file(&path, entry).await
    })
    .await;

    let mut batch = Batch::default();
    for (file, result) in results {
        match result {
            Ok(outcome) => {
                if outcome.recovered {
                    batch.events.push(ProgressEvent::BackupRecovered {
                        file: file.clone(),
                        backup: backup_path(&target.path_of(&file))
                            .display()
                            .to_string(),
                    });
                }
                batch.events.push(ProgressEvent::FileMerged {
                    file,
                    substitutions: outcome.substitutions,
                });
                batch.found.push(outcome);
            }
            Err(error) => batch.fail(FileFailure { file, error }),
        }
    }
    batch
}
