//! Packed archive format — header, entry table, payloads.
//!
//! # On-disk layout (all integer fields little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0      4   version        = 1        (LE u32, ≥ 1)
//!    4      4   entries_count  = N        (LE u32)
//!    8      4   checksum       CRC32 of the serialized entry table,
//!                              0 = not recorded                (LE u32)
//!   12     64   padding        zero on write, ignored on read
//!   76   N×20   entries:
//!                 u32 name     seeded basename hash
//!                 u32 ty       unseeded extension hash
//!                 u64 offset   absolute offset of the payload
//!                 u32 size     payload length in bytes
//!  var    ...   payloads, each at its entry's offset
//! ```
//!
//! # Compatibility
//! A runtime built for version V reads any archive with `1 ≤ version ≤ V`
//! and refuses anything newer.  The padding is reserved for additive
//! fields: writers zero it, readers never interpret it, so a minor bump
//! can claim bytes from it without breaking old archives.
//!
//! # Constraints
//! Every payload offset is ≥ `76 + N×20`.  Payloads may leave gaps for
//! alignment but must not overlap; `size` is the exact byte count handed
//! to the codec.
//!
//! The runtime never writes archives — [`ArchiveWriter`] exists for the
//! offline bundler and for tests.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Current archive layout version.
pub const ARCHIVE_VERSION: u32 = 1;

/// Byte size of the fixed header (including padding).
pub const ARCHIVE_HEADER_SIZE: usize = 76;

/// Byte size of one serialized entry.
pub const ARCHIVE_ENTRY_SIZE: usize = 20;

const PADDING_SIZE: usize = 64;

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Version 0 or newer than this build understands.  Fatal at bundle
    /// construction; the manager never starts on such an archive.
    #[error("unsupported archive version {0} (this build reads 1..={ARCHIVE_VERSION})")]
    UnsupportedVersion(u32),
    #[error("entry table checksum mismatch — archive is corrupted")]
    ChecksumMismatch,
    #[error("entry {index} offset {offset:#x} overlaps header or entry table")]
    BadEntryOffset { index: u32, offset: u64 },
    #[error("duplicate entry {name:08x}{ty:08x}")]
    DuplicateEntry { name: u32, ty: u32 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct ArchiveHeader {
    pub version: u32,
    pub entries_count: u32,
    /// CRC32 of the `entries_count × 20` table bytes; 0 = not recorded.
    pub checksum: u32,
}

impl ArchiveHeader {
    /// Write the 76-byte header; padding is zeroed.
    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.version)?;
        w.write_u32::<LittleEndian>(self.entries_count)?;
        w.write_u32::<LittleEndian>(self.checksum)?;
        w.write_all(&[0u8; PADDING_SIZE])
    }

    /// Read and validate the header.  The padding is consumed and ignored.
    pub fn read<R: Read>(mut r: R) -> Result<Self, ArchiveError> {
        let version = r.read_u32::<LittleEndian>()?;
        if version == 0 || version > ARCHIVE_VERSION {
            return Err(ArchiveError::UnsupportedVersion(version));
        }

        let entries_count = r.read_u32::<LittleEndian>()?;
        let checksum = r.read_u32::<LittleEndian>()?;

        let mut padding = [0u8; PADDING_SIZE];
        r.read_exact(&mut padding)?;

        Ok(Self { version, entries_count, checksum })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: u32,
    pub ty: u32,
    pub offset: u64,
    pub size: u32,
}

impl ArchiveEntry {
    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.name)?;
        w.write_u32::<LittleEndian>(self.ty)?;
        w.write_u64::<LittleEndian>(self.offset)?;
        w.write_u32::<LittleEndian>(self.size)
    }

    pub fn read<R: Read>(mut r: R) -> io::Result<Self> {
        Ok(Self {
            name: r.read_u32::<LittleEndian>()?,
            ty: r.read_u32::<LittleEndian>()?,
            offset: r.read_u64::<LittleEndian>()?,
            size: r.read_u32::<LittleEndian>()?,
        })
    }
}

/// Read the header and the full entry table.
///
/// Verifies the table CRC32 when the header records one, and rejects any
/// entry whose offset would land inside the header or the table itself.
pub fn read_toc<R: Read>(mut r: R) -> Result<(ArchiveHeader, Vec<ArchiveEntry>), ArchiveError> {
    let header = ArchiveHeader::read(&mut r)?;

    let mut table = vec![0u8; header.entries_count as usize * ARCHIVE_ENTRY_SIZE];
    r.read_exact(&mut table)?;

    if header.checksum != 0 {
        let mut h = Hasher::new();
        h.update(&table);
        if h.finalize() != header.checksum {
            return Err(ArchiveError::ChecksumMismatch);
        }
    }

    let payload_base = (ARCHIVE_HEADER_SIZE + table.len()) as u64;
    let mut entries = Vec::with_capacity(header.entries_count as usize);
    let mut cursor = &table[..];
    for index in 0..header.entries_count {
        let entry = ArchiveEntry::read(&mut cursor)?;
        if entry.offset < payload_base {
            return Err(ArchiveError::BadEntryOffset { index, offset: entry.offset });
        }
        entries.push(entry);
    }

    Ok((header, entries))
}

// ── Offline writer ───────────────────────────────────────────────────────────

/// Accumulates `(name, ty, payload)` triples and emits a complete archive.
///
/// Payloads are packed contiguously right after the entry table; the table
/// CRC32 is recorded in the header.  Duplicate `(name, ty)` pairs are
/// rejected — one bundle, one identity.
#[derive(Default)]
pub struct ArchiveWriter {
    entries: Vec<(u32, u32, Vec<u8>)>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: u32, ty: u32, payload: Vec<u8>) -> Result<(), ArchiveError> {
        if self.entries.iter().any(|(n, t, _)| *n == name && *t == ty) {
            return Err(ArchiveError::DuplicateEntry { name, ty });
        }
        self.entries.push((name, ty, payload));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write header, entry table, and payloads.  Consumes the writer.
    pub fn finalize<W: Write>(self, mut w: W) -> Result<ArchiveHeader, ArchiveError> {
        let count = self.entries.len() as u32;
        let mut offset = (ARCHIVE_HEADER_SIZE + self.entries.len() * ARCHIVE_ENTRY_SIZE) as u64;

        // Serialize the table first so it can be CRC'd before anything is
        // written out.
        let mut table = Vec::with_capacity(self.entries.len() * ARCHIVE_ENTRY_SIZE);
        for (name, ty, payload) in &self.entries {
            let entry = ArchiveEntry {
                name: *name,
                ty: *ty,
                offset,
                size: payload.len() as u32,
            };
            entry.write(&mut table)?;
            offset += payload.len() as u64;
        }

        let mut h = Hasher::new();
        h.update(&table);
        let header = ArchiveHeader {
            version: ARCHIVE_VERSION,
            entries_count: count,
            checksum: h.finalize(),
        };

        header.write(&mut w)?;
        w.write_all(&table)?;
        for (_, _, payload) in &self.entries {
            w.write_all(payload)?;
        }

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn header_roundtrip() {
        let mut buf = Vec::new();
        let header = ArchiveHeader { version: 1, entries_count: 3, checksum: 0xDEAD_BEEF };
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), ARCHIVE_HEADER_SIZE);

        let back = ArchiveHeader::read(Cursor::new(&buf)).unwrap();
        assert_eq!(back.version, 1);
        assert_eq!(back.entries_count, 3);
        assert_eq!(back.checksum, 0xDEAD_BEEF);
    }

    #[test]
    fn version_gate_refuses_newer() {
        let mut buf = Vec::new();
        let header = ArchiveHeader {
            version: ARCHIVE_VERSION + 1,
            entries_count: 0,
            checksum: 0,
        };
        header.write(&mut buf).unwrap();

        match ArchiveHeader::read(Cursor::new(&buf)) {
            Err(ArchiveError::UnsupportedVersion(v)) => assert_eq!(v, ARCHIVE_VERSION + 1),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn version_zero_is_invalid() {
        let mut buf = Vec::new();
        ArchiveHeader { version: 0, entries_count: 0, checksum: 0 }.write(&mut buf).unwrap();
        assert!(matches!(
            ArchiveHeader::read(Cursor::new(&buf)),
            Err(ArchiveError::UnsupportedVersion(0))
        ));
    }

    #[test]
    fn padding_is_ignored_on_read() {
        let mut buf = Vec::new();
        ArchiveHeader { version: 1, entries_count: 0, checksum: 0 }.write(&mut buf).unwrap();
        // Scribble over the reserved area; a reader must not care.
        for b in &mut buf[12..ARCHIVE_HEADER_SIZE] {
            *b = 0xAB;
        }
        assert!(ArchiveHeader::read(Cursor::new(&buf)).is_ok());
    }

    #[test]
    fn checksum_detects_table_corruption() {
        let mut writer = ArchiveWriter::new();
        writer.add(1, 2, b"payload".to_vec()).unwrap();
        let mut buf = Vec::new();
        writer.finalize(&mut buf).unwrap();

        // Flip a bit inside the entry table.
        buf[ARCHIVE_HEADER_SIZE + 1] ^= 0x01;
        assert!(matches!(
            read_toc(Cursor::new(&buf)),
            Err(ArchiveError::ChecksumMismatch)
        ));
    }

    #[test]
    fn zero_checksum_skips_verification() {
        let mut writer = ArchiveWriter::new();
        writer.add(1, 2, b"x".to_vec()).unwrap();
        let mut buf = Vec::new();
        writer.finalize(&mut buf).unwrap();

        // Blank the checksum field, then corrupt the table: must still load.
        buf[8..12].copy_from_slice(&0u32.to_le_bytes());
        buf[ARCHIVE_HEADER_SIZE] ^= 0x01;
        assert!(read_toc(Cursor::new(&buf)).is_ok());
    }

    #[test]
    fn duplicate_entries_rejected() {
        let mut writer = ArchiveWriter::new();
        writer.add(7, 8, b"a".to_vec()).unwrap();
        assert!(matches!(
            writer.add(7, 8, b"b".to_vec()),
            Err(ArchiveError::DuplicateEntry { name: 7, ty: 8 })
        ));
    }

    #[test]
    fn offsets_start_after_table() {
        let mut writer = ArchiveWriter::new();
        writer.add(1, 10, b"aaaa".to_vec()).unwrap();
        writer.add(2, 10, b"bb".to_vec()).unwrap();
        let mut buf = Vec::new();
        writer.finalize(&mut buf).unwrap();

        let (header, entries) = read_toc(Cursor::new(&buf)).unwrap();
        assert_eq!(header.entries_count, 2);
        let base = (ARCHIVE_HEADER_SIZE + 2 * ARCHIVE_ENTRY_SIZE) as u64;
        assert_eq!(entries[0].offset, base);
        assert_eq!(entries[1].offset, base + 4);
        assert_eq!(&buf[entries[0].offset as usize..][..4], b"aaaa");
        assert_eq!(&buf[entries[1].offset as usize..][..2], b"bb");
    }

    proptest! {
        // Any set of payloads packed into an archive comes back byte for
        // byte at the recorded offsets.
        #[test]
        fn archive_roundtrip(payloads in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..256), 1..16)
        ) {
            let mut writer = ArchiveWriter::new();
            for (i, p) in payloads.iter().enumerate() {
                writer.add(i as u32, 0x7e57, p.clone()).unwrap();
            }
            let mut buf = Vec::new();
            writer.finalize(&mut buf).unwrap();

            let (header, entries) = read_toc(Cursor::new(&buf)).unwrap();
            prop_assert_eq!(header.entries_count as usize, payloads.len());
            for (entry, expected) in entries.iter().zip(&payloads) {
                let start = entry.offset as usize;
                let end = start + entry.size as usize;
                prop_assert_eq!(&buf[start..end], &expected[..]);
            }
        }
    }
}
