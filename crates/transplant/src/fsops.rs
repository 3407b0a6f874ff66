//! Thin wrappers over the filesystem contract `spec.md` §6 asks the core to
//! consume as an abstract capability: enumerate a directory's children,
//! create a directory with permissions, change a path's permissions, open a
//! file for reading or truncating writes, and read a file's type/mode/size.
//!
//! The recursive traversal/reconstruction state machines in
//! [`crate::serialize`] and [`crate::deserialize`] call only these functions
//! for filesystem access, never `std::fs` directly, so the codec's logic
//! stays readable independent of error-wrapping boilerplate.

use std::fs;
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

use crate::error::{Result, TransplantError};

/// Mask applied to `st_mode` when serializing: file-type bits plus the low 9
/// permission bits. Matches the original C source's
/// `S_IFMT | S_IRWXU | S_IRWXG | S_IRWXO` exactly (no setuid/setgid/sticky).
pub const MODE_MASK: u32 = (libc::S_IFMT | libc::S_IRWXU | libc::S_IRWXG | libc::S_IRWXO) as u32;

/// Low 9 permission bits only, applied when restoring (`chmod`).
pub const PERMISSION_MASK: u32 = (libc::S_IRWXU | libc::S_IRWXG | libc::S_IRWXO) as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Regular,
    Other,
}

pub struct DirEntryInfo {
    pub name: Vec<u8>,
    pub kind: EntryKind,
    pub mode: u32,
    pub size: u64,
}

fn fs_err(path: &Path, source: io::Error) -> TransplantError {
    TransplantError::fs(path, source)
}

/// Enumerates a directory's immediate children. `std::fs::read_dir` never
/// yields `.` or `..` (unlike raw `readdir(3)`), so there is no need for the
/// byte-exact "is this entry `..`" check the original C source performs.
pub fn read_dir_entries(path: &Path) -> Result<Vec<DirEntryInfo>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| fs_err(path, e))? {
        let entry = entry.map_err(|e| fs_err(path, e))?;
        let metadata = entry.metadata().map_err(|e| fs_err(&entry.path(), e))?;
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else if metadata.is_file() {
            EntryKind::Regular
        } else {
            EntryKind::Other
        };
        entries.push(DirEntryInfo {
            name: std::os::unix::ffi::OsStrExt::as_bytes(entry.file_name().as_os_str()).to_vec(),
            kind,
            mode: metadata.mode() & MODE_MASK,
            size: metadata.size(),
        });
    }
    Ok(entries)
}

/// `true` if anything (file, directory, dangling symlink, ...) currently
/// occupies `path`.
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// `true` if `path` exists and is a directory.
pub fn is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path).map_err(|e| fs_err(path, e))
}

pub fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode & PERMISSION_MASK))
        .map_err(|e| fs_err(path, e))
}

pub fn open_read(path: &Path) -> Result<fs::File> {
    fs::File::open(path).map_err(|e| fs_err(path, e))
}

pub fn create_truncate(path: &Path) -> Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| fs_err(path, e))
}
