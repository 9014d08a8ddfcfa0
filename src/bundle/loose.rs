//! Loose-file bundle: one file per resource, named by its hashes.

use std::io::{ErrorKind, Seek, SeekFrom};
use std::sync::Arc;

use crate::bundle::{Bundle, BundleError, BundleStream};
use crate::fs::FilesystemOps;
use crate::id::ResourceId;

/// File name for a resource: 16 lowercase hex digits, the big-endian bytes
/// of `name` then `ty`, so the printed form reads as the two hashes
/// concatenated.  Total and injective over `(name, ty)`.
pub fn loose_path(name: u32, ty: u32) -> String {
    let mut s = hex::encode(name.to_be_bytes());
    s.push_str(&hex::encode(ty.to_be_bytes()));
    s
}

/// Bundle over a directory of compiled resource files.
///
/// There is no per-resource header and no index — the file either exists
/// or it does not, and the whole file is the payload.
pub struct LooseBundle {
    fs: Arc<dyn FilesystemOps>,
}

impl LooseBundle {
    pub fn new(fs: Arc<dyn FilesystemOps>) -> Self {
        Self { fs }
    }
}

impl Bundle for LooseBundle {
    fn open(&self, id: ResourceId) -> Result<BundleStream, BundleError> {
        let path = loose_path(id.name, id.ty);

        let mut file = self.fs.open(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BundleError::NotFound(id)
            } else {
                BundleError::Io(e)
            }
        })?;

        // Whole file = payload; measure it so the stream can report size.
        let len = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        Ok(BundleStream::owned(file, len as u32))
    }
}
