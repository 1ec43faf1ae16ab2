use super::FileSystem;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        fs::read_link(path).context(format!("Failed to read link {:?}", path))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).context(format!("Failed to resolve {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context(format!("Failed to create directory {:?}", path))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).context(format!("Failed to remove directory {:?}", path))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).context(format!("Failed to move {:?} to {:?}", from, to))
    }

    fn copy_dir_all(&self, from: &Path, to: &Path) -> Result<u64> {
        if !from.is_dir() {
            bail!("Source directory {:?} does not exist", from);
        }

        fs::create_dir_all(to).context(format!("Failed to create directory {:?}", to))?;

        let mut copied = 0;
        for entry in WalkDir::new(from).follow_links(true).min_depth(1) {
            let entry = entry.context(format!("Failed to walk {:?}", from))?;
            let relative = entry
                .path()
                .strip_prefix(from)
                .context("Walked outside of the source directory")?;
            let dest = to.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest)
                    .context(format!("Failed to create directory {:?}", dest))?;
            } else {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)
                        .context(format!("Failed to create directory {:?}", parent))?;
                }
                fs::copy(entry.path(), &dest)
                    .context(format!("Failed to copy {:?} to {:?}", entry.path(), dest))?;
                copied += 1;
            }
        }

        Ok(copied)
    }

    fn grant_write_recursive(&self, path: &Path) -> Result<()> {
        for entry in WalkDir::new(path) {
            let entry = entry.context(format!("Failed to walk {:?}", path))?;
            if entry.path_is_symlink() {
                continue;
            }
            grant_write(entry.path())?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn grant_write(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .context(format!("Failed to get metadata for {:?}", path))?
        .permissions();
    perms.set_mode(perms.mode() | 0o222);
    fs::set_permissions(path, perms).context(format!("Failed to change permissions of {:?}", path))
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn grant_write(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path)
        .context(format!("Failed to get metadata for {:?}", path))?
        .permissions();
    perms.set_readonly(false);
    fs::set_permissions(path, perms).context(format!("Failed to change permissions of {:?}", path))
}
