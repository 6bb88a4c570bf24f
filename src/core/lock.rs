//! core::lock
//!
//! Exclusive lock on a project's state.
//!
//! # Architecture
//!
//! Reconciliation of one content type must run to completion before another
//! starts against the same identity. The host gets that guarantee by taking
//! one OS-level lock on `.ctsync/lock` for the whole command, which covers
//! every identity recorded in the project's state file.
//!
//! The holder writes `<pid> <command>` into the lock file once it owns the
//! lock, so a second invocation can say who it is waiting on.
//!
//! # Invariants
//!
//! - Held from the first state read to the last state write
//! - Released on drop; the holder line is left behind and overwritten by the
//!   next holder
//! - Never blocks: a held lock is reported immediately
//!
//! # Example
//!
//! ```no_run
//! use ctsync::core::lock::StateLock;
//! use ctsync::core::state::StatePaths;
//! use std::path::Path;
//!
//! let paths = StatePaths::new(Path::new("/project"));
//! let lock = StateLock::acquire(&paths, "apply")?;
//! assert_eq!(lock.command(), "apply");
//! # Ok::<(), ctsync::core::lock::LockError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::state::StatePaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("state is locked by another ctsync process ({holder})")]
    Held { holder: String },

    #[error("cannot prepare lock file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An exclusive lock on the project state, released when dropped.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
    command: String,
    file: File,
}

impl StateLock {
    /// Take the state lock on behalf of `command`.
    ///
    /// # Errors
    ///
    /// - [`LockError::Held`] if another process holds the lock
    /// - [`LockError::Io`] if the lock file cannot be created or written
    pub fn acquire(paths: &StatePaths, command: &str) -> Result<Self, LockError> {
        let path = paths.lock_file();
        let io_error = |source| LockError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(paths.state_dir()).map_err(io_error)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_error)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() != std::io::ErrorKind::WouldBlock {
                return Err(io_error(e));
            }
            return Err(LockError::Held {
                holder: read_holder(&mut file),
            });
        }

        let holder = format!("{} {}", std::process::id(), command);
        file.set_len(0)
            .and_then(|()| file.seek(SeekFrom::Start(0)))
            .and_then(|_| file.write_all(holder.as_bytes()))
            .and_then(|()| file.flush())
            .map_err(io_error)?;

        tracing::debug!(path = %path.display(), %command, "acquired state lock");
        Ok(Self {
            path,
            command: command.to_string(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The command this lock was taken for.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn read_holder(file: &mut File) -> String {
    let mut text = String::new();
    match file.read_to_string(&mut text) {
        Ok(_) if !text.trim().is_empty() => {
            let mut parts = text.trim().splitn(2, ' ');
            let pid = parts.next().unwrap_or_default();
            let command = parts.next().unwrap_or("unknown command");
            format!("pid {}, {}", pid, command)
        }
        _ => "holder unknown".to_string(),
    }
}
