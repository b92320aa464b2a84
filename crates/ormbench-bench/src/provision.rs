//! Per-run database targets.
//!
//! Every run gets its own temp file, so two runs never share storage. The
//! file is removed when the [`Target`] is dropped.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::TempPath;

use crate::backends::BackendKind;
use crate::error::{BenchError, Result};

/// Where a provisioned database lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Shared-cache in-memory database named after the temp file.
    #[default]
    SharedMemory,
    /// On-disk database in the temp file.
    File,
}

impl StorageMode {
    pub const ALL: [StorageMode; 2] = [StorageMode::SharedMemory, StorageMode::File];

    pub fn name(self) -> &'static str {
        match self {
            StorageMode::SharedMemory => "shared-memory",
            StorageMode::File => "file",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StorageMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        StorageMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| BenchError::Config(format!("unknown storage mode: {}", s)))
    }
}

/// A private database target for one run.
#[derive(Debug)]
pub struct Target {
    backend: BackendKind,
    dsn: String,
    path: TempPath,
}

impl Target {
    /// Backend the connection string was rendered for.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Connection string to pass to `Orm::init`.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Path of the backing temp file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Creates isolated targets.
#[derive(Debug, Clone, Default)]
pub struct Provisioner {
    mode: StorageMode,
    dir: Option<PathBuf>,
}

impl Provisioner {
    /// Provision targets in the system temp directory.
    pub fn new(mode: StorageMode) -> Self {
        Self { mode, dir: None }
    }

    /// Provision targets in `dir` instead of the system temp directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Storage mode of provisioned targets.
    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Create a fresh target for `backend`.
    pub fn provision(&self, backend: BackendKind) -> Result<Target> {
        let prefix = format!("{}_", backend.name());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".db");

        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let path = file.into_temp_path();
        let dsn = backend.connection_string(&path, self.mode);

        Ok(Target { backend, dsn, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_never_collide() {
        let provisioner = Provisioner::new(StorageMode::File);
        let a = provisioner.provision(BackendKind::Direct).unwrap();
        let b = provisioner.provision(BackendKind::Direct).unwrap();

        assert_ne!(a.path(), b.path());
        assert_ne!(a.dsn(), b.dsn());
    }

    #[test]
    fn test_target_file_removed_on_drop() {
        let target = Provisioner::default()
            .provision(BackendKind::TxLoop)
            .unwrap();
        let path = target.path().to_path_buf();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("txloop_"));

        drop(target);
        assert!(!path.exists());
    }

    #[test]
    fn test_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = Provisioner::new(StorageMode::File)
            .in_dir(dir.path())
            .provision(BackendKind::Direct)
            .unwrap();
        assert_eq!(target.path().parent().unwrap(), dir.path());
        assert_eq!(target.dsn(), target.path().display().to_string());
    }

    #[test]
    fn test_storage_mode_parse() {
        assert_eq!("file".parse::<StorageMode>().unwrap(), StorageMode::File);
        assert_eq!(
            "shared-memory".parse::<StorageMode>().unwrap(),
            StorageMode::SharedMemory
        );
        assert!("disk".parse::<StorageMode>().is_err());
    }
}
