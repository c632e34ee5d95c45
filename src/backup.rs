use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{MergeError, MergeResult};

pub const BACKUP_SUFFIX: &str = ".bak";

/// `<dir>/<name>.po` -> `<dir>/<name>.po.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// The file holding the current content of `path`. A leftover backup from an
/// interrupted merge wins over the (possibly partial) live file.
pub async fn current_source(path: &Path) -> MergeResult<PathBuf> {
    let backup = backup_path(path);
    let exists = tokio::fs::try_exists(&backup)
        .await
        .map_err(|err| MergeError::read(&backup, err))?;
    Ok(if exists { backup } else { path.to_path_buf() })
}

/// Moves a leftover backup back over its live file. Returns `true` when a
/// backup was found and restored.
pub async fn restore_leftover(path: &Path) -> MergeResult<bool> {
    let backup = backup_path(path);
    let exists = tokio::fs::try_exists(&backup)
        .await
        .map_err(|err| MergeError::read(&backup, err))?;
    if !exists {
        return Ok(false);
    }
    tokio::fs::rename(&backup, path)
        .await
        .map_err(|err| MergeError::write(path, err))?;
    Ok(true)
}

/// Holds the original bytes of a file under its backup name while the live
/// path is regenerated. Dropping the guard without `commit` keeps the backup.
#[derive(Debug)]
pub(crate) struct BackupGuard {
    live: PathBuf,
    backup: PathBuf,
    recovered: bool,
    committed: bool,
}

impl BackupGuard {
    pub(crate) async fn acquire(live: &Path) -> MergeResult<Self> {
        let backup = backup_path(live);
        let recovered = tokio::fs::try_exists(&backup)
            .await
            .map_err(|err| MergeError::read(&backup, err))?;
        if recovered {
            warn!(
                "backup {} already exists; using it as the merge source",
                backup.display()
            );
        } else {
            tokio::fs::rename(live, &backup)
                .await
                .map_err(|err| rename_error(live, err))?;
            debug!("moved {} to {}", live.display(), backup.display());
        }
        Ok(Self {
            live: live.to_path_buf(),
            backup,
            recovered,
            committed: false,
        })
    }

    pub(crate) fn backup(&self) -> &Path {
        &self.backup
    }

    pub(crate) fn recovered(&self) -> bool {
        self.recovered
    }

    pub(crate) async fn commit(mut self) -> MergeResult<()> {
        tokio::fs::remove_file(&self.backup)
            .await
            .map_err(|err| MergeError::write(&self.backup, err))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for BackupGuard {
    fn drop(&mut self) {
        if !self.committed {
            warn!(
                "keeping {} for manual recovery of {}",
                self.backup.display(),
                self.live.display()
            );
        }
    }
}

fn rename_error(live: &Path, err: io::Error) -> MergeError {
    if err.kind() == io::ErrorKind::NotFound {
        MergeError::read(live, err)
    } else {
        MergeError::write(live, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/x/locales/fr/messages.po")),
            PathBuf::from("/x/locales/fr/messages.po.bak")
        );
    }

    #[tokio::test]
    async fn guard_renames_and_commit_removes_backup() {
        let dir = tempdir().expect("tempdir");
        let live = dir.path().join("messages.po");
        fs::write(&live, "original").expect("write");

        let guard = BackupGuard::acquire(&live).await.expect("acquire");
        assert!(!guard.recovered());
        assert!(!live.exists());
        assert_eq!(fs::read_to_string(guard.backup()).unwrap(), "original");

        fs::write(&live, "rewritten").expect("rewrite");
        guard.commit().await.expect("commit");
        assert!(!backup_path(&live).exists());
        assert_eq!(fs::read_to_string(&live).unwrap(), "rewritten");
    }

    #[tokio::test]
    async fn dropped_guard_keeps_backup() {
        let dir = tempdir().expect("tempdir");
        let live = dir.path().join("messages.po");
        fs::write(&live, "original").expect("write");

        {
            let _guard = BackupGuard::acquire(&live).await.expect("acquire");
        }
        assert!(backup_path(&live).exists());
    }

    #[tokio::test]
    async fn existing_backup_is_the_source_of_truth() {
        let dir = tempdir().expect("tempdir");
        let live = dir.path().join("messages.po");
        fs::write(&live, "partial").expect("write");
        fs::write(backup_path(&live), "original").expect("write backup");

        assert_eq!(current_source(&live).await.unwrap(), backup_path(&live));
        let guard = BackupGuard::acquire(&live).await.expect("acquire");
        assert!(guard.recovered());
        assert_eq!(fs::read_to_string(guard.backup()).unwrap(), "original");
        assert_eq!(fs::read_to_string(&live).unwrap(), "partial");
    }

    #[tokio::test]
    async fn restore_leftover_replaces_partial_file() {
        let dir = tempdir().expect("tempdir");
        let live = dir.path().join("messages.po");
        fs::write(&live, "partial").expect("write");
        fs::write(backup_path(&live), "original").expect("write backup");

        assert!(restore_leftover(&live).await.unwrap());
        assert_eq!(fs::read_to_string(&live).unwrap(), "original");
        assert!(!backup_path(&live).exists());
        assert!(!restore_leftover(&live).await.unwrap());
    }

    #[tokio::test]
    async fn acquiring_a_missing_file_is_a_read_error() {
        let dir = tempdir().expect("tempdir");
        let live = dir.path().join("absent.po");
        let err = BackupGuard::acquire(&live).await.unwrap_err();
        assert!(matches!(err, MergeError::FileRead { .. }));
    }
}
