//! In-memory file system
//!
//! The default backing store for the sandbox. Paths are absolute and
//! normalized; writing a file creates its parent directories, which keeps
//! test setup short.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::fs::types::{FileKind, FsError, FsMetadata, Fs};
use crate::fs::resolve_path;

#[derive(Debug, Clone)]
enum MemEntry {
    File { content: String, executable: bool },
    Dir,
    BlockDevice,
}

/// Pure in-memory `Fs` implementation.
pub struct MemFs {
    entries: Mutex<BTreeMap<String, MemEntry>>,
}

impl MemFs {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("/".to_string(), MemEntry::Dir);
        Self { entries: Mutex::new(entries) }
    }

    fn norm(path: &str) -> String {
        resolve_path("/", path)
    }

    fn ensure_parents(entries: &mut BTreeMap<String, MemEntry>, path: &str) {
        let mut dir = String::new();
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        for part in &parts[..parts.len().saturating_sub(1)] {
            dir.push('/');
            dir.push_str(part);
            entries.entry(dir.clone()).or_insert(MemEntry::Dir);
        }
    }

    /// Create a directory (and its parents).
    pub fn add_dir(&self, path: &str) {
        let path = Self::norm(path);
        let mut entries = self.entries.lock().unwrap();
        Self::ensure_parents(&mut entries, &path);
        entries.insert(path, MemEntry::Dir);
    }

    /// Create a regular file with the given content.
    pub fn add_file(&self, path: &str, content: &str) {
        let path = Self::norm(path);
        let mut entries = self.entries.lock().unwrap();
        Self::ensure_parents(&mut entries, &path);
        entries.insert(path, MemEntry::File { content: content.to_string(), executable: false });
    }

    /// Create an executable file (a script findable through `PATH`).
    pub fn add_executable(&self, path: &str, content: &str) {
        let path = Self::norm(path);
        let mut entries = self.entries.lock().unwrap();
        Self::ensure_parents(&mut entries, &path);
        entries.insert(path, MemEntry::File { content: content.to_string(), executable: true });
    }

    /// Create a block-device node.
    pub fn add_block_device(&self, path: &str) {
        let path = Self::norm(path);
        let mut entries = self.entries.lock().unwrap();
        Self::ensure_parents(&mut entries, &path);
        entries.insert(path, MemEntry::BlockDevice);
    }
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl Fs for MemFs {
    fn read_file(&self, path: &str) -> Result<String, FsError> {
        let path = Self::norm(path);
        let entries = self.entries.lock().unwrap();
        match entries.get(&path) {
            Some(MemEntry::File { content, .. }) => Ok(content.clone()),
            Some(MemEntry::Dir) => Err(FsError::IsDirectory),
            Some(MemEntry::BlockDevice) => Err(FsError::PermissionDenied),
            None => Err(FsError::NotFound),
        }
    }

    fn write_file(&self, path: &str, contents: &str) -> Result<(), FsError> {
        let path = Self::norm(path);
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&path) {
            Some(MemEntry::Dir) => return Err(FsError::IsDirectory),
            Some(MemEntry::BlockDevice) => return Err(FsError::PermissionDenied),
            _ => {}
        }
        Self::ensure_parents(&mut entries, &path);
        let executable = matches!(entries.get(&path), Some(MemEntry::File { executable: true, .. }));
        entries.insert(path, MemEntry::File { content: contents.to_string(), executable });
        Ok(())
    }

    fn append_file(&self, path: &str, contents: &str) -> Result<(), FsError> {
        let path = Self::norm(path);
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(&path) {
            Some(MemEntry::File { content, .. }) => {
                content.push_str(contents);
                Ok(())
            }
            Some(MemEntry::Dir) => Err(FsError::IsDirectory),
            Some(MemEntry::BlockDevice) => Err(FsError::PermissionDenied),
            None => {
                Self::ensure_parents(&mut entries, &path);
                entries
                    .insert(path, MemEntry::File { content: contents.to_string(), executable: false });
                Ok(())
            }
        }
    }

    fn metadata(&self, path: &str) -> Result<FsMetadata, FsError> {
        let path = Self::norm(path);
        let entries = self.entries.lock().unwrap();
        match entries.get(&path) {
            Some(MemEntry::File { content, executable }) => Ok(FsMetadata {
                kind: FileKind::File,
                executable: *executable,
                size: content.len() as u64,
            }),
            Some(MemEntry::Dir) => {
                Ok(FsMetadata { kind: FileKind::Dir, executable: true, size: 0 })
            }
            Some(MemEntry::BlockDevice) => {
                Ok(FsMetadata { kind: FileKind::BlockDevice, executable: false, size: 0 })
            }
            None => Err(FsError::NotFound),
        }
    }

    fn read_dir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let path = Self::norm(path);
        let entries = self.entries.lock().unwrap();
        match entries.get(&path) {
            Some(MemEntry::Dir) => {}
            Some(_) => return Err(FsError::NotDirectory),
            None => return Err(FsError::NotFound),
        }
        let prefix = if path == "/" { "/".to_string() } else { format!("{}/", path) };
        let mut names: Vec<String> = entries
            .keys()
            .filter_map(|k| {
                let rest = k.strip_prefix(&prefix)?;
                if rest.is_empty() || rest.contains('/') {
                    None
                } else {
                    Some(rest.to_string())
                }
            })
            .collect();
        names.sort();
        Ok(names)
    }
}
