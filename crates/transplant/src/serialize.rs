//! The serializer (C3): walks a directory tree and emits a well-bracketed
//! record stream describing it.

use std::io::Write;

use crate::context::RunContext;
use crate::error::{Result, TransplantError};
use crate::fsops::{self, EntryKind};
use crate::record::{self, RecordType, DIRECTORY_ENTRY_METADATA_LEN, HEADER_LEN};

/// Serializes the tree rooted at `ctx.path` to `out`:
/// `START_OF_TRANSMISSION`, the root's contents, `END_OF_TRANSMISSION`. The
/// root directory itself is represented only by the outer bracket pair —
/// its name is never emitted.
pub fn serialize(ctx: &mut RunContext, out: &mut impl Write) -> Result<()> {
    record::write_bracket(out, RecordType::StartOfTransmission, 0)?;
    serialize_directory(ctx, out, 1)?;
    record::write_bracket(out, RecordType::EndOfTransmission, 0)?;
    Ok(())
}

/// Serializes the directory currently named by `ctx.path` as one bracketed
/// sequence of `DIRECTORY_ENTRY` groups at `depth`.
pub fn serialize_directory(ctx: &mut RunContext, out: &mut impl Write, depth: u32) -> Result<()> {
    record::write_bracket(out, RecordType::StartOfDirectory, depth)?;

    let entries = fsops::read_dir_entries(ctx.path.as_path())?;
    for entry in entries {
        ctx.path.push(&entry.name)?;

        let result = (|| -> Result<()> {
            match entry.kind {
                EntryKind::Directory => {
                    write_directory_entry(out, depth, entry.mode, entry.size, &entry.name)?;
                    serialize_directory(ctx, out, depth + 1)
                }
                EntryKind::Regular => {
                    write_directory_entry(out, depth, entry.mode, entry.size, &entry.name)?;
                    serialize_file(ctx, out, depth, entry.size)
                }
                EntryKind::Other => Err(TransplantError::fs(
                    ctx.path.as_path(),
                    std::io::Error::new(
                        std::io::ErrorKind::Unsupported,
                        "entry is neither a regular file nor a directory",
                    ),
                )),
            }
        })();

        ctx.path.pop()?;
        result?;
    }

    record::write_bracket(out, RecordType::EndOfDirectory, depth)?;
    Ok(())
}

fn write_directory_entry(
    out: &mut impl Write,
    depth: u32,
    mode: u32,
    size: u64,
    name: &[u8],
) -> Result<()> {
    let total_size = HEADER_LEN + DIRECTORY_ENTRY_METADATA_LEN + name.len() as u64;
    record::write_header(out, RecordType::DirectoryEntry, depth, total_size)?;
    record::write_be_u32(out, mode, "directory entry mode")?;
    record::write_be_u64(out, size, "directory entry size")?;
    out.write_all(name)
        .map_err(|e| TransplantError::Io(format!("writing directory entry name: {e}")))?;
    Ok(())
}

/// Serializes the file currently named by `ctx.path` as a single `FILE_DATA`
/// record of `size` bytes.
pub fn serialize_file(ctx: &mut RunContext, out: &mut impl Write, depth: u32, size: u64) -> Result<()> {
    record::write_header(out, RecordType::FileData, depth, HEADER_LEN + size)?;

    let mut file = fsops::open_read(ctx.path.as_path())?;
    record::copy_exact(&mut file, out, size)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn run_serialize(root: &std::path::Path) -> Vec<u8> {
        let mut ctx = RunContext::new(
            std::os::unix::ffi::OsStrExt::as_bytes(root.as_os_str()),
            false,
        )
        .unwrap();
        let mut out = Vec::new();
        serialize(&mut ctx, &mut out).unwrap();
        out
    }

    #[test]
    fn empty_directory_is_four_records_64_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_serialize(dir.path());
        assert_eq!(out.len(), 64);

        let mut cur = std::io::Cursor::new(&out);
        let h1 = record::read_header(&mut cur).unwrap();
        assert_eq!(h1.record_type, RecordType::StartOfTransmission);
        assert_eq!(h1.depth, 0);

        let h2 = record::read_header(&mut cur).unwrap();
        assert_eq!(h2.record_type, RecordType::StartOfDirectory);
        assert_eq!(h2.depth, 1);

        let h3 = record::read_header(&mut cur).unwrap();
        assert_eq!(h3.record_type, RecordType::EndOfDirectory);
        assert_eq!(h3.depth, 1);

        let h4 = record::read_header(&mut cur).unwrap();
        assert_eq!(h4.record_type, RecordType::EndOfTransmission);
        assert_eq!(h4.depth, 0);
    }

    #[test]
    fn single_file_round_trips_through_framing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello"), b"Hello\n").unwrap();
        fs::set_permissions(dir.path().join("hello"), fs::Permissions::from_mode(0o644)).unwrap();

        let out = run_serialize(dir.path());
        let mut cur = std::io::Cursor::new(&out);

        record::read_header(&mut cur).unwrap(); // START_OF_TRANSMISSION
        record::read_header(&mut cur).unwrap(); // START_OF_DIRECTORY

        let entry_header = record::read_header(&mut cur).unwrap();
        assert_eq!(entry_header.record_type, RecordType::DirectoryEntry);
        let mode = record::read_be_u32(&mut cur, "mode").unwrap();
        let _size = record::read_be_u64(&mut cur, "size").unwrap();
        assert_eq!(mode & 0o777, 0o644);
        let name_len = entry_header.size - HEADER_LEN - DIRECTORY_ENTRY_METADATA_LEN;
        let name = record::read_exact_vec(&mut cur, name_len).unwrap();
        assert_eq!(name, b"hello");

        let file_header = record::read_header(&mut cur).unwrap();
        assert_eq!(file_header.record_type, RecordType::FileData);
        let content_len = file_header.size - HEADER_LEN;
        let content = record::read_exact_vec(&mut cur, content_len).unwrap();
        assert_eq!(content, b"Hello\n");
    }

    #[test]
    fn nested_directory_has_matching_depth_brackets() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("dir")).unwrap();
        fs::write(dir.path().join("dir").join("inner"), b"x").unwrap();

        let out = run_serialize(dir.path());
        let mut cur = std::io::Cursor::new(&out);

        let mut depths = Vec::new();
        loop {
            let pos = cur.position();
            let header = match record::read_header(&mut cur) {
                Ok(h) => h,
                Err(_) => break,
            };
            depths.push((header.record_type, header.depth));
            let remaining = header.size - HEADER_LEN;
            if remaining > 0 {
                record::read_exact_vec(&mut cur, remaining).unwrap();
            }
            if pos == cur.position() {
                break;
            }
        }

        assert_eq!(depths[0], (RecordType::StartOfTransmission, 0));
        assert_eq!(depths[1], (RecordType::StartOfDirectory, 1));
        assert_eq!(depths[2].0, RecordType::DirectoryEntry);
        assert_eq!(depths[2].1, 1);
        assert_eq!(depths[3], (RecordType::StartOfDirectory, 2));
        assert_eq!(depths.last().unwrap().1, 0);
    }
}
