// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, executable: bool },
    Dir,
}

/// In-memory filesystem for tests. Parent directories are created
/// implicitly; paths are used as given (no normalisation).
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("/"), MockEntry::Dir);

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert_file(path.as_ref(), content.into(), false);
    }

    /// Add a file with the execute bit set.
    pub fn add_executable(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert_file(path.as_ref(), content.into(), true);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock();
        ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Contents of a file, if present. Convenient for assertions.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.files.lock().get(path.as_ref()) {
            Some(MockEntry::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    /// All file paths currently stored below `dir`.
    pub fn files_in(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = dir.as_ref();
        let mut out: Vec<PathBuf> = self
            .files
            .lock()
            .iter()
            .filter(|(p, e)| matches!(e, MockEntry::File { .. }) && p.parent() == Some(dir))
            .map(|(p, _)| p.clone())
            .collect();
        out.sort();
        out
    }

    fn insert_file(&self, path: &Path, content: Vec<u8>, executable: bool) {
        let mut files = self.files.lock();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir_entry(&mut files, parent);
            }
        }
        files.insert(
            path.to_path_buf(),
            MockEntry::File {
                content,
                executable,
            },
        );
    }
}

fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if files.contains_key(path) {
        return;
    }
    files.insert(path.to_path_buf(), MockEntry::Dir);
    if let Some(parent) = path.parent() {
        // Avoid infinite loop at root
        if parent != path && !parent.as_os_str().is_empty() {
            ensure_dir_entry(files, parent);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let files = self.files.lock();
        match files.get(path) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.is_dir(path) {
            return Err(anyhow!("Is a directory: {:?}", path));
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = self.files.lock();
        let entry = files
            .remove(from)
            .ok_or_else(|| anyhow!("File not found: {:?}", from))?;
        files.insert(to.to_path_buf(), entry);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut files = self.files.lock();
        if let Some(MockEntry::File { .. }) = files.get(path) {
            return Err(anyhow!("Not a directory: {:?}", path));
        }
        ensure_dir_entry(&mut files, path);
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.files.lock().get(path), Some(MockEntry::Dir))
    }

    fn is_executable(&self, path: &Path) -> bool {
        matches!(
            self.files.lock().get(path),
            Some(MockEntry::File {
                executable: true,
                ..
            })
        )
    }

}
