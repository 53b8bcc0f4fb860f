//! Scratch-file management for a single conversion.
//!
//! Every intermediate artifact (staged stylesheet, intermediate PDF, page
//! staging directory) is allocated through a [`TempResources`] instance that
//! the orchestrator receives per invocation. Allocation returns an RAII guard
//! ([`ScratchFile`] / [`ScratchDir`]) that removes the resource when dropped,
//! so early returns, `?` and panics all clean up the same way.
//!
//! Names come from [`tempfile::Builder`]: a fixed prefix plus random
//! characters, created with `O_EXCL`, so concurrent conversions sharing a
//! root never collide.
//!
//! The ledger records every live allocation. It exists for auditing:
//! [`TempResources::outstanding`] lets tests (and paranoid callers) assert
//! that nothing leaked after a run.

use crate::error::DocPressError;
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, warn};

const RANDOM_LEN: usize = 16;

#[derive(Debug, Default, Clone)]
struct Ledger(Arc<Mutex<Vec<PathBuf>>>);

impl Ledger {
    fn record(&self, path: &Path) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_path_buf());
    }

    fn forget(&self, path: &Path) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|p| p != path);
    }

    fn snapshot(&self) -> Vec<PathBuf> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Allocator for uniquely-named scratch files under one root directory.
#[derive(Debug, Clone)]
pub struct TempResources {
    root: PathBuf,
    ledger: Ledger,
}

impl TempResources {
    /// A manager rooted at `root`. The directory is created on first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ledger: Ledger::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create an empty scratch file named `{prefix}{random}{suffix}`.
    pub fn file(&self, prefix: &str, suffix: &str) -> Result<ScratchFile, DocPressError> {
        self.ensure_root()?;
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .rand_bytes(RANDOM_LEN)
            .tempfile_in(&self.root)
            .map_err(|e| DocPressError::resource(format!("create {prefix}*{suffix}"), e))?;

        let path = file.path().to_path_buf();
        debug!("Allocated scratch file {}", path.display());
        self.ledger.record(&path);
        Ok(ScratchFile {
            file: Some(file),
            path,
            ledger: self.ledger.clone(),
        })
    }

    /// Create an empty scratch directory named `{prefix}{random}`.
    pub fn dir(&self, prefix: &str) -> Result<ScratchDir, DocPressError> {
        self.ensure_root()?;
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .rand_bytes(RANDOM_LEN)
            .tempdir_in(&self.root)
            .map_err(|e| DocPressError::resource(format!("create {prefix}* directory"), e))?;

        let path = dir.path().to_path_buf();
        debug!("Allocated scratch directory {}", path.display());
        self.ledger.record(&path);
        Ok(ScratchDir {
            dir: Some(dir),
            path,
            ledger: self.ledger.clone(),
        })
    }

    /// Paths allocated through this manager that have not been released yet.
    pub fn outstanding(&self) -> Vec<PathBuf> {
        self.ledger.snapshot()
    }

    fn ensure_root(&self) -> Result<(), DocPressError> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            DocPressError::resource(format!("create temp root {}", self.root.display()), e)
        })
    }
}

/// A scratch file that is deleted on drop unless [`ScratchFile::persist`]ed.
#[derive(Debug)]
pub struct ScratchFile {
    file: Option<NamedTempFile>,
    path: PathBuf,
    ledger: Ledger,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file's contents with `bytes` and flush to disk.
    pub fn write_contents(&mut self, bytes: &[u8]) -> Result<(), DocPressError> {
        let path = self.path.clone();
        let file = self.handle()?;
        let mut write = || -> io::Result<()> {
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(bytes)?;
            file.sync_all()
        };
        write().map_err(|e| DocPressError::resource(format!("write {}", path.display()), e))
    }

    /// Delete the file now, reporting any failure.
    pub fn close(mut self) -> Result<(), DocPressError> {
        self.ledger.forget(&self.path);
        match self.file.take() {
            Some(file) => file
                .close()
                .map_err(|e| DocPressError::resource(format!("remove {}", self.path.display()), e)),
            None => Ok(()),
        }
    }

    /// Keep the file on disk and hand ownership of it to the caller.
    ///
    /// After this the pipeline no longer deletes the file; removing it is the
    /// caller's job.
    pub fn persist(mut self) -> Result<PathBuf, DocPressError> {
        self.ledger.forget(&self.path);
        let file = self.file.take().ok_or_else(|| {
            DocPressError::Internal(format!("{} already released", self.path.display()))
        })?;
        let (_, path) = file
            .keep()
            .map_err(|e| DocPressError::resource(format!("keep {}", self.path.display()), e.error))?;
        debug!("Persisted artifact {}", path.display());
        Ok(path)
    }

    fn handle(&mut self) -> Result<&mut File, DocPressError> {
        match self.file.as_mut() {
            Some(f) => Ok(f.as_file_mut()),
            None => Err(DocPressError::Internal(format!(
                "{} already released",
                self.path.display()
            ))),
        }
    }

    fn io_handle(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .map(|f| f.as_file_mut())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "scratch file released"))
    }
}

impl Write for ScratchFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.io_handle()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.io_handle()?.flush()
    }
}

impl Seek for ScratchFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.io_handle()?.seek(pos)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            self.ledger.forget(&self.path);
            if let Err(e) = file.close() {
                warn!("Failed to remove scratch file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// A scratch directory removed recursively on drop.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
    ledger: Ledger,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything in it now, reporting any failure.
    pub fn close(mut self) -> Result<(), DocPressError> {
        self.ledger.forget(&self.path);
        match self.dir.take() {
            Some(dir) => dir
                .close()
                .map_err(|e| DocPressError::resource(format!("remove {}", self.path.display()), e)),
            None => Ok(()),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            self.ledger.forget(&self.path);
            if let Err(e) = dir.close() {
                warn!(
                    "Failed to remove scratch directory {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(root: &Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn file_is_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let temps = TempResources::new(root.path());

        let mut f = temps.file("custom_", ".css").unwrap();
        f.write_contents(b"body { color: red }").unwrap();
        let path = f.path().to_path_buf();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("custom_"));
        assert!(path.extension().is_some_and(|e| e == "css"));
        assert_eq!(temps.outstanding(), vec![path.clone()]);

        drop(f);
        assert!(!path.exists());
        assert!(temps.outstanding().is_empty());
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn names_are_unique() {
        let root = TempDir::new().unwrap();
        let temps = TempResources::new(root.path());
        let a = temps.file("temp_", ".pdf").unwrap();
        let b = temps.file("temp_", ".pdf").unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(temps.outstanding().len(), 2);
    }

    #[test]
    fn dir_is_removed_recursively() {
        let root = TempDir::new().unwrap();
        let temps = TempResources::new(root.path());

        let dir = temps.dir("pages_").unwrap();
        std::fs::write(dir.path().join("page_001.png"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let path = dir.path().to_path_buf();

        dir.close().unwrap();
        assert!(!path.exists());
        assert!(temps.outstanding().is_empty());
    }

    #[test]
    fn persisted_file_survives() {
        let root = TempDir::new().unwrap();
        let temps = TempResources::new(root.path());

        let mut f = temps.file("out_", ".pdf").unwrap();
        f.write_contents(b"%PDF-1.7").unwrap();
        let kept = f.persist().unwrap();

        assert!(kept.exists());
        assert!(temps.outstanding().is_empty());
        assert_eq!(std::fs::read(&kept).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn write_contents_replaces_previous_bytes() {
        let root = TempDir::new().unwrap();
        let temps = TempResources::new(root.path());
        let mut f = temps.file("x_", ".bin").unwrap();
        f.write_contents(b"a much longer first payload").unwrap();
        f.write_contents(b"short").unwrap();
        assert_eq!(std::fs::read(f.path()).unwrap(), b"short");
    }

    #[test]
    fn root_is_created_on_demand() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a/b");
        let temps = TempResources::new(&nested);
        let f = temps.file("x_", "").unwrap();
        assert!(f.path().starts_with(&nested));
    }
}
