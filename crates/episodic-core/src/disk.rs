//! # Filesystem Access
//!
//! [`DiskProvider`] is everything the import engine needs from the disk.
//! [`LocalDisk`] implements it over `std::fs`, sending deletions through an
//! optional [`RecycleBin`].

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{EpisodicError, Result};

/// Filesystem operations used while importing.
pub trait DiskProvider: Send + Sync {
    /// Returns `true` if `path` exists and is a regular file.
    fn file_exists(&self, path: &Path) -> bool;

    /// Size of the file in bytes.
    fn file_size(&self, path: &Path) -> Result<u64>;

    /// Returns `true` if `path` is `root` itself or nested below it.
    fn is_path_under_root(&self, path: &Path, root: &Path) -> bool;

    /// Removes a superseded file, through the trash when one is configured.
    fn delete_file(&self, path: &Path) -> Result<()>;
}

/// Soft-delete target for replaced files.
#[derive(Debug, Clone)]
pub struct RecycleBin {
    dir: PathBuf,
}

impl RecycleBin {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Moves `path` into the bin and returns its new location.
    ///
    /// A name already present in the bin gets a timestamp suffix instead of
    /// being overwritten.
    pub fn recycle(&self, path: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|e| EpisodicError::io(&self.dir, e))?;

        let name = path
            .file_name()
            .ok_or_else(|| EpisodicError::io(path, std::io::ErrorKind::InvalidInput.into()))?;
        let mut target = self.dir.join(name);
        if target.exists() {
            let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");
            let mut renamed = name.to_os_string();
            renamed.push(format!(".{stamp}"));
            target = self.dir.join(renamed);
        }

        if std::fs::rename(path, &target).is_err() {
            // rename cannot cross filesystems
            std::fs::copy(path, &target).map_err(|e| EpisodicError::io(path, e))?;
            std::fs::remove_file(path).map_err(|e| EpisodicError::io(path, e))?;
        }

        info!(from = %path.display(), to = %target.display(), "Moved file to recycle bin");
        Ok(target)
    }
}

/// [`DiskProvider`] backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalDisk {
    recycle_bin: Option<RecycleBin>,
}

impl LocalDisk {
    /// Disk access that deletes superseded files outright.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disk access that moves superseded files into `bin`.
    pub fn with_recycle_bin(bin: RecycleBin) -> Self {
        Self {
            recycle_bin: Some(bin),
        }
    }
}

impl DiskProvider for LocalDisk {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| EpisodicError::io(path, e))
    }

    fn is_path_under_root(&self, path: &Path, root: &Path) -> bool {
        is_child_of(path, root)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        match self.recycle_bin {
            Some(ref bin) => bin.recycle(path).map(|_| ()),
            None => {
                debug!(path = %path.display(), "Deleting file");
                std::fs::remove_file(path).map_err(|e| EpisodicError::io(path, e))
            }
        }
    }
}

/// Component-wise containment on lexically normalized paths.
pub fn is_child_of(path: &Path, root: &Path) -> bool {
    let root = normalize(root);
    if root.as_os_str().is_empty() {
        return false;
    }
    normalize(path).starts_with(root)
}

/// Resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_paths() {
        let root = Path::new("/tv/30 Rock");
        assert!(is_child_of(Path::new("/tv/30 Rock/30.rock.s01e01.mkv"), root));
        assert!(is_child_of(Path::new("/tv/30 Rock/Season 1/x.mkv"), root));
        assert!(is_child_of(Path::new("/tv/30 Rock/./Season 1/x.mkv"), root));
        assert!(!is_child_of(Path::new("/tv/Unsorted TV/30 Rock/x.mkv"), root));
        assert!(!is_child_of(Path::new("/tv/30 Rock 2/x.mkv"), root));
        assert!(!is_child_of(Path::new("/tv/30 Rock/../Weeds/x.mkv"), root));
        assert!(!is_child_of(Path::new("/tv/x.mkv"), Path::new("")));
    }

    #[test]
    fn local_disk_size_and_existence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.mkv");
        std::fs::write(&file, vec![0u8; 1234]).unwrap();

        let disk = LocalDisk::new();
        assert!(disk.file_exists(&file));
        assert!(!disk.file_exists(dir.path()));
        assert_eq!(disk.file_size(&file).unwrap(), 1234);
        assert!(matches!(
            disk.file_size(&dir.path().join("missing.mkv")),
            Err(EpisodicError::Io { .. })
        ));
    }

    #[test]
    fn delete_without_bin_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("old.avi");
        std::fs::write(&file, b"x").unwrap();

        LocalDisk::new().delete_file(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn delete_with_bin_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let bin_dir = dir.path().join("trash");
        let disk = LocalDisk::with_recycle_bin(RecycleBin::new(&bin_dir));

        let first = dir.path().join("old.avi");
        std::fs::write(&first, b"first").unwrap();
        disk.delete_file(&first).unwrap();
        assert!(!first.exists());
        assert_eq!(std::fs::read(bin_dir.join("old.avi")).unwrap(), b"first");

        // Same name again must not clobber the earlier copy
        std::fs::write(&first, b"second").unwrap();
        disk.delete_file(&first).unwrap();
        assert_eq!(std::fs::read(bin_dir.join("old.avi")).unwrap(), b"first");
        assert_eq!(std::fs::read_dir(&bin_dir).unwrap().count(), 2);
    }
}
