//! File system interface types.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FsError {
    #[error("No such file or directory")]
    NotFound,
    #[error("Is a directory")]
    IsDirectory,
    #[error("Not a directory")]
    NotDirectory,
    #[error("Permission denied")]
    PermissionDenied,
}

/// What kind of object a path names. Block devices exist so that the
/// dot-script resolver can reject them the way it rejects directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    BlockDevice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsMetadata {
    pub kind: FileKind,
    pub executable: bool,
    pub size: u64,
}

impl FsMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_block_device(&self) -> bool {
        self.kind == FileKind::BlockDevice
    }
}

/// File system operations the shell needs. Implementations must be safe to
/// share between the shell and the child states it forks (they all see the
/// same tree, the way processes share a kernel).
pub trait Fs {
    fn read_file(&self, path: &str) -> Result<String, FsError>;

    /// Create or truncate, then write.
    fn write_file(&self, path: &str, contents: &str) -> Result<(), FsError>;

    fn append_file(&self, path: &str, contents: &str) -> Result<(), FsError>;

    fn metadata(&self, path: &str) -> Result<FsMetadata, FsError>;

    fn exists(&self, path: &str) -> bool {
        self.metadata(path).is_ok()
    }

    /// Names (not paths) of directory entries, sorted.
    fn read_dir(&self, path: &str) -> Result<Vec<String>, FsError>;
}
