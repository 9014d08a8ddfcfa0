//! Bundles — where resource bytes come from.
//!
//! A bundle resolves a [`ResourceId`] to a positioned byte stream.  Two
//! concrete kinds exist: [`PackedBundle`] (one archive file, shared
//! handle) and [`LooseBundle`] (one file per resource).  The manager
//! guarantees `open`/`close` are only ever called serially from the
//! loader thread; bundles rely on that for their shared-handle variants.

mod loose;
mod packed;

pub use loose::{loose_path, LooseBundle};
pub use packed::PackedBundle;

use std::io::{self, Read};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::fs::FileStream;
use crate::id::ResourceId;

#[derive(Error, Debug)]
pub enum BundleError {
    /// `(name, ty)` is not in this bundle's index.
    #[error("resource {0} not found in bundle")]
    NotFound(ResourceId),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Source of resource payloads.
pub trait Bundle: Send + Sync {
    /// Open a stream positioned at the first byte of the payload for `id`.
    ///
    /// For shared-handle bundles the stream is only valid until the next
    /// `open` on the same bundle; the manager's serial-access guarantee
    /// makes that a non-issue.
    fn open(&self, id: ResourceId) -> Result<BundleStream, BundleError>;

    /// Release a stream.  After this the caller must not touch it again.
    fn close(&self, stream: BundleStream) {
        drop(stream);
    }
}

enum StreamKind {
    /// View into the archive's shared file handle, already positioned.
    Shared(Arc<Mutex<Box<dyn FileStream>>>),
    /// A whole file of its own.
    Owned(Box<dyn FileStream>),
}

/// A read stream over exactly one resource payload.
///
/// Reads are clamped to the payload's declared size, so codecs can
/// `read_to_end` without running into the next entry.
pub struct BundleStream {
    inner: StreamKind,
    size: u32,
    left: u64,
}

impl BundleStream {
    pub(crate) fn shared(file: Arc<Mutex<Box<dyn FileStream>>>, size: u32) -> Self {
        Self { inner: StreamKind::Shared(file), size, left: size as u64 }
    }

    pub(crate) fn owned(file: Box<dyn FileStream>, size: u32) -> Self {
        Self { inner: StreamKind::Owned(file), size, left: size as u64 }
    }

    /// Total payload size in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }
}

impl Read for BundleStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.left == 0 || buf.is_empty() {
            return Ok(0);
        }
        let cap = buf.len().min(self.left as usize);
        let n = match &mut self.inner {
            StreamKind::Shared(file) => file.lock().unwrap().read(&mut buf[..cap])?,
            StreamKind::Owned(file) => file.read(&mut buf[..cap])?,
        };
        self.left -= n as u64;
        Ok(n)
    }
}
