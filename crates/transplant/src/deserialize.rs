//! The deserializer (C4): consumes a record stream and materializes the
//! files and directories it describes.

use std::io::{self, Read};

use crate::context::RunContext;
use crate::error::{Result, TransplantError};
use crate::fsops;
use crate::record::{self, RecordHeader, RecordType, DIRECTORY_ENTRY_METADATA_LEN, HEADER_LEN};

/// Consumes `START_OF_TRANSMISSION`, the root's contents, then
/// `END_OF_TRANSMISSION`. `ctx.path` must already name an existing directory
/// to reconstruct into.
pub fn deserialize(ctx: &mut RunContext, input: &mut impl Read) -> Result<()> {
    let header = record::read_header(input)?;
    record::expect_bracket(&header, RecordType::StartOfTransmission, 0)?;

    deserialize_directory(ctx, input, 1)?;

    let header = record::read_header(input)?;
    record::expect_bracket(&header, RecordType::EndOfTransmission, 0)?;
    Ok(())
}

/// Consumes one bracketed directory level at `depth`: its own
/// `START_OF_DIRECTORY`, a run of `DIRECTORY_ENTRY` groups, and the matching
/// `END_OF_DIRECTORY`. The opening bracket is consumed here rather than by
/// the caller, mirroring how [`crate::serialize::serialize_directory`]
/// writes its own opening bracket (see `SPEC_FULL.md`'s note on this).
pub fn deserialize_directory(ctx: &mut RunContext, input: &mut impl Read, depth: u32) -> Result<()> {
    let open = record::read_header(input)?;
    record::expect_bracket(&open, RecordType::StartOfDirectory, depth)?;

    loop {
        let header = record::read_header(input)?;
        if header.depth != depth {
            return Err(TransplantError::Framing(format!(
                "expected depth {depth} at directory level, found {}",
                header.depth
            )));
        }

        match header.record_type {
            RecordType::EndOfDirectory => {
                if header.size != HEADER_LEN {
                    return Err(TransplantError::Framing(format!(
                        "END_OF_DIRECTORY size must be {HEADER_LEN}, found {}",
                        header.size
                    )));
                }
                ctx.path.pop()?;
                return Ok(());
            }
            RecordType::DirectoryEntry => {
                deserialize_entry(ctx, input, depth, header)?;
            }
            other => {
                return Err(TransplantError::Structural(format!(
                    "unexpected {other:?} at depth {depth} inside a directory"
                )))
            }
        }
    }
}

fn deserialize_entry(
    ctx: &mut RunContext,
    input: &mut impl Read,
    depth: u32,
    header: RecordHeader,
) -> Result<()> {
    let fixed = HEADER_LEN + DIRECTORY_ENTRY_METADATA_LEN;
    if header.size <= fixed {
        return Err(TransplantError::Framing(
            "DIRECTORY_ENTRY has no room for a name".into(),
        ));
    }

    let mode = record::read_be_u32(input, "directory entry mode")?;
    let _declared_size = record::read_be_u64(input, "directory entry size")?;
    let name_len = header.size - fixed;
    if name_len as usize > crate::path_buffer::NAME_MAX {
        return Err(TransplantError::PathBuffer(format!(
            "entry name of {name_len} bytes exceeds NAME_MAX ({})",
            crate::path_buffer::NAME_MAX
        )));
    }
    let name = record::read_exact_vec(input, name_len)?;

    ctx.path.push(&name)?;

    let file_type = mode & libc::S_IFMT as u32;
    if file_type == libc::S_IFDIR as u32 {
        deserialize_entry_directory(ctx, input, depth, mode)
    } else if file_type == libc::S_IFREG as u32 {
        let result =
            deserialize_file(ctx, input, depth).and_then(|()| fsops::set_permissions(ctx.path.as_path(), mode));
        ctx.path.pop()?;
        result
    } else {
        ctx.path.pop()?;
        Err(TransplantError::Structural(
            "DIRECTORY_ENTRY mode is neither a regular file nor a directory".into(),
        ))
    }
}

fn deserialize_entry_directory(ctx: &mut RunContext, input: &mut impl Read, depth: u32, mode: u32) -> Result<()> {
    let path = ctx.path.as_path();
    if fsops::is_dir(path) {
        if !ctx.clobber {
            return Err(TransplantError::fs(
                path,
                io::Error::new(io::ErrorKind::AlreadyExists, "directory exists, clobber not set"),
            ));
        }
        // Clobber accepted: reuse the existing directory. Don't hold an open
        // directory handle across the recursive call below (see
        // `SPEC_FULL.md`'s note on the original's unreachable `closedir`).
    } else if fsops::exists(path) {
        return Err(TransplantError::fs(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path exists but is not a directory"),
        ));
    } else {
        fsops::create_dir(path)?;
        fsops::set_permissions(path, mode)?;
    }

    deserialize_directory(ctx, input, depth + 1)
}

/// Consumes the single `FILE_DATA` record that follows a regular-file
/// `DIRECTORY_ENTRY`, at the *same* depth as the entry, and writes its
/// content to `ctx.path`.
pub fn deserialize_file(ctx: &mut RunContext, input: &mut impl Read, depth: u32) -> Result<()> {
    let path = ctx.path.as_path();
    if fsops::exists(path) && !ctx.clobber {
        return Err(TransplantError::fs(
            path,
            io::Error::new(io::ErrorKind::AlreadyExists, "file exists, clobber not set"),
        ));
    }

    let header = record::read_header(input)?;
    if header.record_type != RecordType::FileData {
        return Err(TransplantError::Structural(format!(
            "expected FILE_DATA, found {:?}",
            header.record_type
        )));
    }
    if header.depth != depth {
        return Err(TransplantError::Framing(format!(
            "FILE_DATA depth mismatch: expected {depth}, found {}",
            header.depth
        )));
    }
    let content_size = header
        .size
        .checked_sub(HEADER_LEN)
        .ok_or_else(|| TransplantError::Framing("FILE_DATA size smaller than the header".into()))?;

    // Truncate-and-create up front, matching the original C source (`fopen`
    // in mode "wb"): a short read below leaves whatever partial content was
    // already written, rather than leaving no file at all. Implementation
    // defined per `spec.md` §8 scenario 6.
    let mut file = fsops::create_truncate(ctx.path.as_path())?;
    record::copy_exact(input, &mut file, content_size)?;
    Ok(())
}
