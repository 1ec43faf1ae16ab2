//! Discovery of the host tool installation the worker is deployed into

use crate::error::PipelineError;
use crate::fs::FileSystem;
use crate::layout::WorkerLayout;
use serde::Serialize;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Upper bound on symbolic link hops before a chain is treated as a cycle.
pub const MAX_LINK_HOPS: usize = 40;

const INSTALL_HINT: &str = "Install Azure Functions Core Tools \
    (https://github.com/Azure/azure-functions-core-tools#installing) and make sure it is on PATH.";

/// Resolves a launcher name to a path, like a shell would.
pub trait LauncherLookup: Send + Sync {
    fn find(&self, name: &str) -> Option<PathBuf>;
}

/// Looks a launcher up in the directories of a search path.
#[derive(Debug, Clone, Default)]
pub struct SearchPathLookup {
    dirs: Vec<PathBuf>,
}

impl SearchPathLookup {
    pub fn from_env() -> Self {
        Self::with_path(env::var_os("PATH").unwrap_or_default())
    }

    pub fn with_path(path: impl Into<OsString>) -> Self {
        let path = path.into();
        Self {
            dirs: env::split_paths(&path).collect(),
        }
    }

    fn candidates(name: &str) -> Vec<String> {
        if cfg!(windows) {
            ["exe", "cmd", "bat"]
                .iter()
                .map(|ext| format!("{}.{}", name, ext))
                .collect()
        } else {
            vec![name.to_string()]
        }
    }
}

impl LauncherLookup for SearchPathLookup {
    fn find(&self, name: &str) -> Option<PathBuf> {
        let candidates = Self::candidates(name);
        self.dirs
            .iter()
            .filter(|dir| !dir.as_os_str().is_empty())
            .flat_map(|dir| candidates.iter().map(move |file| dir.join(file)))
            .find(|path| is_executable(path))
    }
}

/// Regular file a shell would run; on Unix at least one execute bit must be set.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// A located host tool installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInstallation {
    pub root_directory: PathBuf,
}

pub struct ToolLocator<'a> {
    fs: &'a dyn FileSystem,
    lookup: &'a dyn LauncherLookup,
    layout: &'a WorkerLayout,
}

impl<'a> ToolLocator<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        lookup: &'a dyn LauncherLookup,
        layout: &'a WorkerLayout,
    ) -> Self {
        Self { fs, lookup, layout }
    }

    /// Finds the installation root.
    ///
    /// A non-empty override is returned as given without any checks.
    pub fn locate(&self, override_dir: Option<&Path>) -> Result<ToolInstallation, PipelineError> {
        if let Some(dir) = override_dir.filter(|d| !d.as_os_str().is_empty()) {
            info!(path = %dir.display(), "Using host tool directory override");
            return Ok(ToolInstallation {
                root_directory: dir.to_path_buf(),
            });
        }

        let launcher = self
            .lookup
            .find(self.layout.launcher)
            .ok_or_else(|| PipelineError::ToolNotFound {
                launcher: self.layout.launcher.to_string(),
                hint: INSTALL_HINT.to_string(),
            })?;
        debug!(launcher = %launcher.display(), "Found launcher on search path");

        let resolved = self.resolve_links(&launcher)?;
        let root = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let workers = self.layout.workers_dir(&root);
        if !self.fs.is_dir(&workers) {
            return Err(PipelineError::ToolInstallationInvalid {
                checked: workers,
                hint: "Pass the installation directory explicitly with --core-tools-dir."
                    .to_string(),
            });
        }

        info!(path = %root.display(), "Located host tool installation");
        Ok(ToolInstallation {
            root_directory: root,
        })
    }

    /// Follows symbolic links until a non-link entry is reached and returns
    /// its physical path.
    ///
    /// Relative targets are resolved against the physical directory holding
    /// the link, so linked directories on the search path are handled the way
    /// the kernel handles them.
    pub fn resolve_links(&self, start: &Path) -> Result<PathBuf, PipelineError> {
        let mut current = start.to_path_buf();
        let mut hops = 0;

        while self.fs.is_symlink(&current) {
            if hops == MAX_LINK_HOPS {
                return Err(PipelineError::SymlinkCycle {
                    start: start.to_path_buf(),
                    max_hops: MAX_LINK_HOPS,
                });
            }
            hops += 1;

            let target = self
                .fs
                .read_link(&current)
                .map_err(|e| PipelineError::filesystem(&current, e))?;
            debug!(from = %current.display(), to = %target.display(), "Following link");

            current = if target.is_absolute() {
                target
            } else {
                let parent = match current.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                self.fs
                    .canonicalize(&parent)
                    .map_err(|e| PipelineError::filesystem(&parent, e))?
                    .join(target)
            };
        }

        if !self.fs.exists(&current) {
            return Err(PipelineError::ToolInstallationInvalid {
                checked: current,
                hint: format!(
                    "The link chain starting at {} ends at a missing entry. \
                     Pass the installation directory explicitly with --core-tools-dir.",
                    start.display()
                ),
            });
        }

        self.fs
            .canonicalize(&current)
            .map_err(|e| PipelineError::filesystem(&current, e))
    }
}
