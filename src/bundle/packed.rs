//! Packed-archive bundle: one file, header + entry table + payloads.

use std::io::{Seek, SeekFrom};
use std::sync::{Arc, Mutex};

use crate::archive::{read_toc, ArchiveEntry, ArchiveHeader};
use crate::bundle::{Bundle, BundleError, BundleStream};
use crate::fs::{FileStream, FilesystemOps};
use crate::id::ResourceId;

/// Bundle over a packed archive file.
///
/// The entry table is read and validated once at construction (the version
/// gate lives there — an archive this build cannot read fails here, before
/// the manager ever starts).  Lookups are a linear scan over the table;
/// entry counts are small enough that nothing smarter has paid for itself.
pub struct PackedBundle {
    file: Arc<Mutex<Box<dyn FileStream>>>,
    header: ArchiveHeader,
    entries: Vec<ArchiveEntry>,
}

impl PackedBundle {
    /// Open `path` under `fs` and read the table of contents.
    pub fn open(fs: &dyn FilesystemOps, path: &str) -> Result<Self, BundleError> {
        let mut file = fs.open(path)?;
        let (header, entries) = read_toc(&mut file)?;

        log::info!(
            "opened archive `{}`: version {}, {} entries",
            path,
            header.version,
            header.entries_count
        );

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            header,
            entries,
        })
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn find(&self, id: ResourceId) -> Option<&ArchiveEntry> {
        self.entries
            .iter()
            .find(|e| e.name == id.name && e.ty == id.ty)
    }
}

impl Bundle for PackedBundle {
    fn open(&self, id: ResourceId) -> Result<BundleStream, BundleError> {
        let entry = self.find(id).ok_or(BundleError::NotFound(id))?;

        // Position the shared handle; the returned stream reads from it
        // in place.  Serial open/close from the loader thread keeps the
        // cursor coherent.
        self.file
            .lock()
            .unwrap()
            .seek(SeekFrom::Start(entry.offset))?;

        Ok(BundleStream::shared(Arc::clone(&self.file), entry.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveHeader as Header, ArchiveWriter, ARCHIVE_VERSION};
    use crate::fs::DiskFilesystem;
    use std::io::Read;

    fn id(name: u32, ty: u32) -> ResourceId {
        ResourceId { name, ty, index: 0 }
    }

    fn write_archive(dir: &std::path::Path, file: &str, entries: &[(u32, u32, &[u8])]) {
        let mut writer = ArchiveWriter::new();
        for (name, ty, payload) in entries {
            writer.add(*name, *ty, payload.to_vec()).unwrap();
        }
        let out = std::fs::File::create(dir.join(file)).unwrap();
        writer.finalize(out).unwrap();
    }

    #[test]
    fn payloads_roundtrip_through_streams() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(
            dir.path(),
            "archive.bin",
            &[(0x11, 0x22, b"first payload"), (0x33, 0x22, b"second")],
        );

        let fs = DiskFilesystem::new(dir.path());
        let bundle = PackedBundle::open(&fs, "archive.bin").unwrap();

        for (name, expected) in [(0x11u32, &b"first payload"[..]), (0x33, b"second")] {
            let mut stream = Bundle::open(&bundle, id(name, 0x22)).unwrap();
            assert_eq!(stream.size() as usize, expected.len());
            let mut data = Vec::new();
            stream.read_to_end(&mut data).unwrap();
            assert_eq!(data, expected);
            bundle.close(stream);
        }
    }

    #[test]
    fn stream_is_clamped_to_entry_size() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "archive.bin", &[(1, 2, b"abc"), (3, 2, b"XYZ")]);

        let fs = DiskFilesystem::new(dir.path());
        let bundle = PackedBundle::open(&fs, "archive.bin").unwrap();

        let mut stream = Bundle::open(&bundle, id(1, 2)).unwrap();
        let mut data = Vec::new();
        stream.read_to_end(&mut data).unwrap();
        // Must not bleed into the neighbouring payload.
        assert_eq!(data, b"abc");
    }

    #[test]
    fn missing_resource_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "archive.bin", &[(1, 2, b"abc")]);

        let fs = DiskFilesystem::new(dir.path());
        let bundle = PackedBundle::open(&fs, "archive.bin").unwrap();

        assert!(matches!(
            Bundle::open(&bundle, id(9, 9)),
            Err(BundleError::NotFound(_))
        ));
    }

    #[test]
    fn newer_archive_version_refused_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = Vec::new();
        Header {
            version: ARCHIVE_VERSION + 1,
            entries_count: 0,
            checksum: 0,
        }
        .write(&mut buf)
        .unwrap();
        std::fs::write(dir.path().join("archive.bin"), &buf).unwrap();

        let fs = DiskFilesystem::new(dir.path());
        assert!(matches!(
            PackedBundle::open(&fs, "archive.bin"),
            Err(BundleError::Archive(_))
        ));
    }
}
