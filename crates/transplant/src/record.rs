//! Record framing (C2) and the byte-oriented I/O shim (C5).
//!
//! Every multi-byte field in a record header is read or written as a
//! sequence of single-byte operations with explicit big-endian shifting, so
//! no assumption is made about the host's in-memory integer layout. The
//! underlying [`Read`]/[`Write`] are expected to be buffered by the caller
//! (stdin/stdout are wrapped in a `BufReader`/`BufWriter` at the top level);
//! this module never assumes anything about their buffering.

use std::io::{self, Read, Write};

use crate::error::{Result, TransplantError};

/// The three-byte sequence that must open every record.
pub const MAGIC: [u8; 3] = [0x0C, 0x0D, 0xED];

/// Size in bytes of a record header, and of any bracket record in full.
pub const HEADER_LEN: u64 = 16;

/// Size in bytes of a `DIRECTORY_ENTRY` record's fixed metadata (mode + file
/// size), not counting the trailing name.
pub const DIRECTORY_ENTRY_METADATA_LEN: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    StartOfTransmission = 0,
    EndOfTransmission = 1,
    StartOfDirectory = 2,
    EndOfDirectory = 3,
    DirectoryEntry = 4,
    FileData = 5,
}

impl RecordType {
    fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => RecordType::StartOfTransmission,
            1 => RecordType::EndOfTransmission,
            2 => RecordType::StartOfDirectory,
            3 => RecordType::EndOfDirectory,
            4 => RecordType::DirectoryEntry,
            5 => RecordType::FileData,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordHeader {
    pub record_type: RecordType,
    pub depth: u32,
    pub size: u64,
}

/// Reads one byte, distinguishing a clean EOF (`Ok(None)`) from an I/O error.
fn read_byte(r: &mut impl Read) -> io::Result<Option<u8>> {
    let mut b = [0u8; 1];
    loop {
        return match r.read(&mut b) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(b[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Err(e),
        };
    }
}

fn write_byte(w: &mut impl Write, byte: u8) -> io::Result<()> {
    w.write_all(&[byte])
}

fn require_byte(r: &mut impl Read, what: &str) -> Result<u8> {
    read_byte(r)
        .map_err(|e| TransplantError::Io(format!("reading {what}: {e}")))?
        .ok_or_else(|| TransplantError::Framing(format!("unexpected EOF reading {what}")))
}

fn read_u32_be(r: &mut impl Read, what: &str) -> Result<u32> {
    let mut v: u32 = 0;
    for _ in 0..4 {
        v = (v << 8) | u32::from(require_byte(r, what)?);
    }
    Ok(v)
}

fn read_u64_be(r: &mut impl Read, what: &str) -> Result<u64> {
    let mut v: u64 = 0;
    for _ in 0..8 {
        v = (v << 8) | u64::from(require_byte(r, what)?);
    }
    Ok(v)
}

fn write_u32_be(w: &mut impl Write, v: u32) -> io::Result<()> {
    for i in (0..4).rev() {
        write_byte(w, ((v >> (i * 8)) & 0xFF) as u8)?;
    }
    Ok(())
}

fn write_u64_be(w: &mut impl Write, v: u64) -> io::Result<()> {
    for i in (0..8).rev() {
        write_byte(w, ((v >> (i * 8)) & 0xFF) as u8)?;
    }
    Ok(())
}

/// Reads a big-endian `u32`, one byte at a time.
pub fn read_be_u32(r: &mut impl Read, what: &str) -> Result<u32> {
    read_u32_be(r, what)
}

/// Reads a big-endian `u64`, one byte at a time.
pub fn read_be_u64(r: &mut impl Read, what: &str) -> Result<u64> {
    read_u64_be(r, what)
}

/// Writes a big-endian `u32`, one byte at a time.
pub fn write_be_u32(w: &mut impl Write, v: u32, what: &str) -> Result<()> {
    write_u32_be(w, v).map_err(|e| TransplantError::Io(format!("writing {what}: {e}")))
}

/// Writes a big-endian `u64`, one byte at a time.
pub fn write_be_u64(w: &mut impl Write, v: u64, what: &str) -> Result<()> {
    write_u64_be(w, v).map_err(|e| TransplantError::Io(format!("writing {what}: {e}")))
}

/// Reads and decodes one 16-byte record header. Fails on EOF mid-header,
/// magic mismatch, or an unrecognized type byte.
pub fn read_header(r: &mut impl Read) -> Result<RecordHeader> {
    let mut magic = [0u8; 3];
    for slot in &mut magic {
        *slot = require_byte(r, "magic prefix")?;
    }
    if magic != MAGIC {
        return Err(TransplantError::Framing(format!(
            "magic mismatch: expected {MAGIC:02X?}, got {magic:02X?}"
        )));
    }

    let type_byte = require_byte(r, "record type")?;
    let record_type = RecordType::from_u8(type_byte)
        .ok_or_else(|| TransplantError::Framing(format!("unknown record type code {type_byte}")))?;

    let depth = read_u32_be(r, "record depth")?;
    let size = read_u64_be(r, "record size")?;

    Ok(RecordHeader {
        record_type,
        depth,
        size,
    })
}

/// Writes a 16-byte record header. Big-endian throughout, high-order byte
/// first.
pub fn write_header(w: &mut impl Write, record_type: RecordType, depth: u32, size: u64) -> Result<()> {
    w.write_all(&MAGIC)
        .map_err(|e| TransplantError::Io(format!("writing magic prefix: {e}")))?;
    write_byte(w, record_type as u8).map_err(|e| TransplantError::Io(format!("writing record type: {e}")))?;
    write_u32_be(w, depth).map_err(|e| TransplantError::Io(format!("writing depth: {e}")))?;
    write_u64_be(w, size).map_err(|e| TransplantError::Io(format!("writing size: {e}")))?;
    Ok(())
}

/// Writes a bracket record (`START_OF_TRANSMISSION`, `END_OF_TRANSMISSION`,
/// `START_OF_DIRECTORY`, `END_OF_DIRECTORY`): header only, size fixed at 16.
pub fn write_bracket(w: &mut impl Write, record_type: RecordType, depth: u32) -> Result<()> {
    write_header(w, record_type, depth, HEADER_LEN)
}

/// Validates that `header` is the expected bracket record at the expected
/// depth, with the fixed size of 16 bytes that all bracket records carry.
pub fn expect_bracket(header: &RecordHeader, expected: RecordType, expected_depth: u32) -> Result<()> {
    if header.record_type != expected {
        return Err(TransplantError::Structural(format!(
            "expected {expected:?} at depth {expected_depth}, found {:?}",
            header.record_type
        )));
    }
    if header.depth != expected_depth {
        return Err(TransplantError::Framing(format!(
            "{expected:?} depth mismatch: expected {expected_depth}, found {}",
            header.depth
        )));
    }
    if header.size != HEADER_LEN {
        return Err(TransplantError::Framing(format!(
            "{expected:?} size must be {HEADER_LEN}, found {}",
            header.size
        )));
    }
    Ok(())
}

/// Copies exactly `len` bytes from `r` to `w`, failing on a short read. Used
/// for `DIRECTORY_ENTRY` names and `FILE_DATA` payloads alike, both of which
/// carry their length in the preceding header rather than a terminator.
pub fn copy_exact(r: &mut impl Read, w: &mut impl Write, len: u64) -> Result<()> {
    let mut remaining = len;
    let mut buf = [0u8; 8192];
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        r.read_exact(&mut buf[..chunk])
            .map_err(|e| TransplantError::Io(format!("short read copying payload: {e}")))?;
        w.write_all(&buf[..chunk])
            .map_err(|e| TransplantError::Io(format!("short write copying payload: {e}")))?;
        remaining -= chunk as u64;
    }
    Ok(())
}

/// Reads exactly `len` bytes from `r` into a freshly allocated `Vec<u8>`.
pub fn read_exact_vec(r: &mut impl Read, len: u64) -> Result<Vec<u8>> {
    let mut out = vec![0u8; len as usize];
    r.read_exact(&mut out)
        .map_err(|e| TransplantError::Io(format!("short read of {len} bytes: {e}")))?;
    Ok(out)
}
