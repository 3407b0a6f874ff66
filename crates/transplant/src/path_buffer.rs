use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error::{Result, TransplantError};

/// Bound on the total length of a reconstructed path, kept as a
/// format-portability guard rather than a real allocation limit: names and
/// paths that would overflow it are rejected so a stream stays restorable on
/// any host, not just the one that produced it.
pub const PATH_MAX: usize = 4096;

/// Bound on a single path component (a directory entry's base name).
pub const NAME_MAX: usize = 255;

/// A mutable path, built up one component at a time during tree traversal.
///
/// Names are kept as raw bytes (`spec.md` imposes no character encoding on
/// them) and converted to an [`OsStr`] only at the point of use, via
/// [`OsStrExt`] on Unix.
#[derive(Debug, Clone, Default)]
pub struct PathBuffer {
    buf: Vec<u8>,
}

impl PathBuffer {
    /// Copies `name` into a fresh buffer. Fails if `name` (plus an implicit
    /// terminator byte) would exceed [`PATH_MAX`].
    pub fn init(name: &[u8]) -> Result<Self> {
        if name.len() + 1 > PATH_MAX {
            return Err(TransplantError::PathBuffer(format!(
                "initial path of {} bytes exceeds PATH_MAX ({PATH_MAX})",
                name.len()
            )));
        }
        Ok(PathBuffer {
            buf: name.to_vec(),
        })
    }

    /// Appends `component` to the path. Separates it with `/` unless the
    /// buffer is empty or already ends in `/`. Rejects a component containing
    /// `/`.
    pub fn push(&mut self, component: &[u8]) -> Result<()> {
        if component.contains(&b'/') {
            return Err(TransplantError::PathBuffer(
                "component contains the separator character '/'".into(),
            ));
        }

        let needs_separator = !self.buf.is_empty() && *self.buf.last().unwrap() != b'/';
        let extra = usize::from(needs_separator) + component.len();
        if self.buf.len() + extra + 1 > PATH_MAX {
            return Err(TransplantError::PathBuffer(format!(
                "pushing {} more bytes would exceed PATH_MAX ({PATH_MAX})",
                extra
            )));
        }

        if needs_separator {
            self.buf.push(b'/');
        }
        self.buf.extend_from_slice(component);
        Ok(())
    }

    /// Removes the last component: everything from (and including) the last
    /// `/`, or the whole buffer if there is no `/`. Fails on an empty buffer.
    pub fn pop(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Err(TransplantError::PathBuffer(
                "cannot pop an empty path buffer".into(),
            ));
        }
        match self.buf.iter().rposition(|&b| b == b'/') {
            Some(idx) => self.buf.truncate(idx),
            None => self.buf.clear(),
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_os_str(&self) -> &OsStr {
        OsStr::from_bytes(&self.buf)
    }

    pub fn as_path(&self) -> &Path {
        Path::new(self.as_os_str())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sets_contents() {
        let pb = PathBuffer::init(b".").unwrap();
        assert_eq!(pb.as_bytes(), b".");
        assert_eq!(pb.len(), 1);
    }

    #[test]
    fn push_appends_with_separator() {
        let mut pb = PathBuffer::init(b".").unwrap();
        pb.push(b"a").unwrap();
        assert_eq!(pb.as_bytes(), b"./a");
        pb.push(b"b").unwrap();
        assert_eq!(pb.as_bytes(), b"./a/b");
    }

    #[test]
    fn push_rejects_embedded_separator() {
        let mut pb = PathBuffer::init(b".").unwrap();
        pb.push(b"a").unwrap();
        assert!(pb.push(b"c/d").is_err());
        // failed push must not have mutated the buffer
        assert_eq!(pb.as_bytes(), b"./a");
    }

    #[test]
    fn pop_removes_last_component() {
        let mut pb = PathBuffer::init(b".").unwrap();
        pb.push(b"a").unwrap();
        pb.push(b"b").unwrap();
        pb.pop().unwrap();
        assert_eq!(pb.as_bytes(), b"./a");
    }

    #[test]
    fn pop_with_no_separator_clears_buffer() {
        let mut pb = PathBuffer::init(b"root").unwrap();
        pb.pop().unwrap();
        assert_eq!(pb.as_bytes(), b"");
        assert!(pb.is_empty());
    }

    #[test]
    fn pop_on_empty_fails() {
        let mut pb = PathBuffer::default();
        assert!(pb.pop().is_err());
    }

    #[test]
    fn init_rejects_overflow() {
        let too_long = vec![b'a'; PATH_MAX];
        assert!(PathBuffer::init(&too_long).is_err());
    }

    #[test]
    fn push_does_not_double_separator() {
        let mut pb = PathBuffer::init(b"root/").unwrap();
        pb.push(b"a").unwrap();
        assert_eq!(pb.as_bytes(), b"root/a");
    }
}
