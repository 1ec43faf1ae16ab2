use super::{FileSystem, FileType};
use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

const MAX_MOCK_LINK_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Option<String>,
    pub file_type: FileType,
    pub link_target: Option<PathBuf>,
}

impl MockEntry {
    fn dir() -> Self {
        Self {
            content: None,
            file_type: FileType::Directory,
            link_target: None,
        }
    }
}

/// Mutating calls recorded by [`MockFileSystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOperation {
    CreateDir(PathBuf),
    RemoveDir(PathBuf),
    Rename { from: PathBuf, to: PathBuf },
    Copy { from: PathBuf, to: PathBuf },
    GrantWrite(PathBuf),
}

pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, MockEntry>>,
    operations: RwLock<Vec<FsOperation>>,
    queries: AtomicUsize,
    rename_failures: RwLock<Vec<PathBuf>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            operations: RwLock::new(Vec::new()),
            queries: AtomicUsize::new(0),
            rename_failures: RwLock::new(Vec::new()),
            root,
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            ensure_parents(&mut files, parent);
        }

        files.insert(
            path,
            MockEntry {
                content: Some(content.to_string()),
                file_type: FileType::File,
                link_target: None,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        ensure_parents(&mut files, &path);
        files.insert(path, MockEntry::dir());
    }

    /// Adds a symbolic link at `path` pointing at `target` (absolute or relative to the link's directory).
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            ensure_parents(&mut files, parent);
        }

        files.insert(
            path,
            MockEntry {
                content: None,
                file_type: FileType::Symlink,
                link_target: Some(target.as_ref().to_path_buf()),
            },
        );
    }

    /// Makes the next rename onto `to` fail.
    pub fn fail_rename_to(&self, to: impl AsRef<Path>) {
        let to = self.normalize_path(to.as_ref());
        self.rename_failures.write().unwrap().push(to);
    }

    /// Mutating calls in the order they were made.
    pub fn operations(&self) -> Vec<FsOperation> {
        self.operations.read().unwrap().clone()
    }

    /// Number of read-only calls made so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn file_content(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = self.normalize_path(path.as_ref());
        self.files
            .read()
            .unwrap()
            .get(&path)
            .and_then(|e| e.content.clone())
    }

    /// Files beneath `dir`, relative to it, sorted.
    pub fn files_under(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = self.normalize_path(dir.as_ref());
        let files = self.files.read().unwrap();
        let mut found: Vec<PathBuf> = files
            .iter()
            .filter(|(path, entry)| entry.file_type == FileType::File && path.starts_with(&dir))
            .filter_map(|(path, _)| path.strip_prefix(&dir).ok().map(Path::to_path_buf))
            .collect();
        found.sort();
        found
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn record(&self, operation: FsOperation) {
        self.operations.write().unwrap().push(operation);
    }

    fn query(&self, path: &Path) -> Option<MockEntry> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        resolve(&files, &path).and_then(|resolved| files.get(&resolved).cloned())
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_parents(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        files.entry(current.clone()).or_insert_with(MockEntry::dir);
    }
}

enum Step {
    Anchor(OsString),
    Parent,
    Name(OsString),
}

/// Pending steps for `path`, last component on top.
fn steps(path: &Path) -> Vec<Step> {
    path.components()
        .rev()
        .filter_map(|component| match component {
            Component::Prefix(_) | Component::RootDir => {
                Some(Step::Anchor(component.as_os_str().to_os_string()))
            }
            Component::CurDir => None,
            Component::ParentDir => Some(Step::Parent),
            Component::Normal(name) => Some(Step::Name(name.to_os_string())),
        })
        .collect()
}

/// Physical path of `path` with every link resolved, component by component,
/// the way the kernel walks it. `None` when an entry is missing or links loop.
fn resolve(files: &HashMap<PathBuf, MockEntry>, path: &Path) -> Option<PathBuf> {
    let mut resolved = PathBuf::new();
    let mut pending = steps(path);
    let mut hops = 0;

    while let Some(step) = pending.pop() {
        match step {
            Step::Anchor(anchor) => resolved.push(anchor),
            Step::Parent => {
                resolved.pop();
            }
            Step::Name(name) => {
                let candidate = resolved.join(&name);
                let entry = files.get(&candidate)?;
                match &entry.link_target {
                    Some(target) => {
                        hops += 1;
                        if hops > MAX_MOCK_LINK_DEPTH {
                            return None;
                        }
                        if target.has_root() {
                            resolved = PathBuf::new();
                        }
                        pending.extend(steps(target));
                    }
                    None => resolved = candidate,
                }
            }
        }
    }

    Some(resolved)
}

/// Location of the entry itself: the parent is resolved, the last component is not.
fn locate_entry(files: &HashMap<PathBuf, MockEntry>, path: &Path) -> Option<PathBuf> {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => resolve(files, parent).map(|parent| parent.join(name)),
        _ => Some(path.to_path_buf()),
    }
}

fn subtree(files: &HashMap<PathBuf, MockEntry>, root: &Path) -> Vec<(PathBuf, MockEntry)> {
    files
        .iter()
        .filter(|(path, _)| path.starts_with(root))
        .map(|(path, entry)| (path.clone(), entry.clone()))
        .collect()
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.query(path).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.query(path)
            .map(|e| e.file_type == FileType::Directory)
            .unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.query(path)
            .map(|e| e.file_type == FileType::File)
            .unwrap_or(false)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        locate_entry(&files, &path)
            .and_then(|entry| files.get(&entry))
            .map(|e| e.file_type == FileType::Symlink)
            .unwrap_or(false)
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        let entry = locate_entry(&files, &path)
            .and_then(|entry| files.get(&entry))
            .ok_or_else(|| anyhow!("Path not found: {:?}", path))?;

        entry
            .link_target
            .clone()
            .ok_or_else(|| anyhow!("Not a symbolic link: {:?}", path))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        resolve(&files, &path).ok_or_else(|| anyhow!("No such file or directory: {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = self.normalize_path(path);
        self.record(FsOperation::CreateDir(path.clone()));

        let mut files = self.files.write().unwrap();
        if let Some(entry) = files.get(&path) {
            if entry.file_type != FileType::Directory {
                bail!("Not a directory: {:?}", path);
            }
        }
        ensure_parents(&mut files, &path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let path = self.normalize_path(path);
        self.record(FsOperation::RemoveDir(path.clone()));

        let mut files = self.files.write().unwrap();
        if !files.contains_key(&path) {
            bail!("Directory not found: {:?}", path);
        }
        files.retain(|p, _| !p.starts_with(&path));
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = self.normalize_path(from);
        let to = self.normalize_path(to);
        self.record(FsOperation::Rename {
            from: from.clone(),
            to: to.clone(),
        });

        {
            let mut failures = self.rename_failures.write().unwrap();
            if let Some(pos) = failures.iter().position(|p| p == &to) {
                failures.remove(pos);
                bail!("Permission denied: {:?}", to);
            }
        }

        let mut files = self.files.write().unwrap();
        if !files.contains_key(&from) {
            bail!("Path not found: {:?}", from);
        }
        if files.contains_key(&to) {
            bail!("Destination already exists: {:?}", to);
        }

        let moved = subtree(&files, &from);
        files.retain(|p, _| !p.starts_with(&from));
        for (path, entry) in moved {
            if let Ok(relative) = path.strip_prefix(&from) {
                files.insert(to.join(relative), entry);
            }
        }
        Ok(())
    }

    fn copy_dir_all(&self, from: &Path, to: &Path) -> Result<u64> {
        let from = self.normalize_path(from);
        let to = self.normalize_path(to);
        self.record(FsOperation::Copy {
            from: from.clone(),
            to: to.clone(),
        });

        let mut files = self.files.write().unwrap();
        match files.get(&from) {
            Some(entry) if entry.file_type == FileType::Directory => {}
            _ => bail!("Source directory {:?} does not exist", from),
        }

        ensure_parents(&mut files, &to);
        let mut copied = 0;
        for (path, entry) in subtree(&files, &from) {
            if path == from {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&from) {
                if entry.file_type == FileType::File {
                    copied += 1;
                }
                files.insert(to.join(relative), entry);
            }
        }
        Ok(copied)
    }

    fn grant_write_recursive(&self, path: &Path) -> Result<()> {
        let path = self.normalize_path(path);
        self.record(FsOperation::GrantWrite(path.clone()));

        if !self.files.read().unwrap().contains_key(&path) {
            bail!("Path not found: {:?}", path);
        }
        Ok(())
    }
}
