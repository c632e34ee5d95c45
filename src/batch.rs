use futures_util::stream::{self, StreamExt};
use std::future::Future;

use crate::error::{FileFailure, MergeResult};
use crate::events::{EventLog, ProgressEvent};

/// Outcome of a fan-out over files: successes and failures side by side.
#[derive(Debug)]
pub struct Batch<T> {
    pub found: Vec<T>,
    pub failures: Vec<FileFailure>,
    pub events: EventLog,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            found: Vec::new(),
            failures: Vec::new(),
            events: EventLog::default(),
        }
    }
}

impl<T> Batch<T> {
    pub(crate) fn fail(&mut self, failure: FileFailure) {
        self.events.push(ProgressEvent::FileFailed {
            file: failure.file.clone(),
            error: failure.error.to_string(),
        });
        self.failures.push(failure);
    }
}

pub(crate) fn default_concurrency() -> usize {
    num_cpus::get().max(1)
}

/// Runs `task` once per file with at most `concurrency` tasks in flight.
/// A failing file never cancels its siblings. Results come back sorted by
/// file name, whatever order the tasks finished in.
pub(crate) async fn for_each_file<I, T, F, Fut>(
    files: Vec<(String, I)>,
    concurrency: usize,
    task: F,
) -> Vec<(String, MergeResult<T>)>
where
    F: Fn(String, I) -> Fut,
    Fut: Future<Output = MergeResult<T>>,
{
    let mut results: Vec<(String, MergeResult<T>)> = stream::iter(files)
        .map(|(file, item)| {
            let outcome = task(file.clone(), item);
            async move { (file, outcome.await) }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MergeError;
    use std::io;
    use std::path::PathBuf;

    #[tokio::test]
    async fn failures_do_not_cancel_siblings() {
        let files = vec![
            ("b.po".to_string(), PathBuf::from("b.po")),
            ("a.po".to_string(), PathBuf::from("a.po")),
            ("c.po".to_string(), PathBuf::from("c.po")),
        ];
        let results = for_each_file(files, 2, |file, path: PathBuf| async move {
            if file == "b.po" {
                Err(MergeError::read(&path, io::Error::other("boom")))
            } else {
                Ok(file.len())
            }
        })
        .await;

        let names = results.iter().map(|(file, _)| file.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.po", "b.po", "c.po"]);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_ok());
    }

    #[test]
    fn default_concurrency_is_positive() {
        assert!(default_concurrency() >= 1);
    }
}
