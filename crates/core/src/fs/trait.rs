//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// Abstraction over file system operations for testability
pub trait FileSystem: Send + Sync {
    /// Check if a path exists (following links)
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory (following links)
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path is a file (following links)
    fn is_file(&self, path: &Path) -> bool;

    /// Check if the entry itself is a symbolic link
    fn is_symlink(&self, path: &Path) -> bool;

    /// Read the immediate target of a symbolic link
    fn read_link(&self, path: &Path) -> Result<PathBuf>;

    /// Absolute physical path with every link and `..` resolved; fails if it does not exist
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Create a directory and any missing parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove a directory and everything beneath it
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Move an entry to a new location on the same volume
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Recursively copy the contents of `from` into `to`, returning the number of files copied
    fn copy_dir_all(&self, from: &Path, to: &Path) -> Result<u64>;

    /// Add write permission for all users to `path` and everything beneath it
    fn grant_write_recursive(&self, path: &Path) -> Result<()>;
}
