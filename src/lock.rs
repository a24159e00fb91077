//! Exclusive run lock for a project directory.
//!
//! Only one queue run may target a project at a time. The lock is an OS
//! advisory lock on a file under the config directory, keyed by a hash of the
//! project path. The OS drops the lock when the holder exits, even when it is
//! killed, so a leftover file never blocks a later run.
use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const LOCKS_DIR_NAME: &str = "locks";

#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

/// Directory holding run locks for a given config file.
pub fn lock_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) => parent.join(LOCKS_DIR_NAME),
        None => PathBuf::from(LOCKS_DIR_NAME),
    }
}

/// Lock file for `project_dir` inside `lock_dir`.
pub fn lock_path(lock_dir: &Path, project_dir: &Path) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(project_dir.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    lock_dir.join(format!("{digest:x}.lock"))
}

impl RunLock {
    pub fn acquire(lock_dir: &Path, project_dir: &Path) -> Result<Self> {
        fs::create_dir_all(lock_dir)
            .with_context(|| format!("create lock dir {}", lock_dir.display()))?;
        let path = lock_path(lock_dir, project_dir);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("open run lock {}", path.display()))?;

        if let Err(err) = file.try_lock_exclusive() {
            if err.kind() != fs2::lock_contended_error().kind() {
                return Err(err).with_context(|| format!("lock {}", path.display()));
            }
            let mut holder = String::new();
            let _ = file.read_to_string(&mut holder);
            return Err(anyhow!(
                "a run is already in progress for {} (pid {})",
                project_dir.display(),
                holder.trim()
            ));
        }

        write_holder(&mut file).with_context(|| format!("write run lock {}", path.display()))?;
        tracing::debug!(path = %path.display(), project_dir = %project_dir.display(), "run lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_holder(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to release run lock");
        }
    }
}
