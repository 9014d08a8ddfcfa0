//! Host filesystem dependency.
//!
//! The resource subsystem consumes a deliberately narrow surface: open a
//! relative path for reading, seek/read on the returned stream, probe for
//! existence.  Everything is trait-based so tests and tools can supply
//! their own roots; the engine wires in [`DiskFilesystem`].

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A readable, seekable stream handed out by a filesystem.  Closing is
/// dropping.
pub trait FileStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> FileStream for T {}

/// The file operations the resource subsystem needs from its host.
pub trait FilesystemOps: Send + Sync {
    /// Open `relative_path` for reading.
    fn open(&self, relative_path: &str) -> io::Result<Box<dyn FileStream>>;

    /// Whether `relative_path` exists under this root.
    fn exists(&self, relative_path: &str) -> bool;
}

/// A filesystem rooted at a directory on disk.
pub struct DiskFilesystem {
    root: PathBuf,
}

impl DiskFilesystem {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_owned() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FilesystemOps for DiskFilesystem {
    fn open(&self, relative_path: &str) -> io::Result<Box<dyn FileStream>> {
        let file = File::open(self.root.join(relative_path))?;
        Ok(Box::new(file))
    }

    fn exists(&self, relative_path: &str) -> bool {
        self.root.join(relative_path).exists()
    }
}

// ── Seed configuration ───────────────────────────────────────────────────────

/// Name of the boot-time seed file, looked up at the filesystem root.
pub const SEED_FILE: &str = "seed.ini";

#[derive(Error, Debug)]
pub enum SeedError {
    /// The file is required; a content tree without it cannot be mounted.
    #[error("seed file `{SEED_FILE}` not found at filesystem root")]
    Missing,
    #[error("seed file `{SEED_FILE}` does not contain a decimal u32: {0:?}")]
    Malformed(String),
    #[error("IO error reading `{SEED_FILE}`: {0}")]
    Io(#[from] io::Error),
}

/// Read the per-content-branch hash seed from `seed.ini`.
///
/// The file holds a single unsigned decimal integer.  Surrounding
/// whitespace is tolerated; anything else is a boot failure.
pub fn read_seed(fs: &dyn FilesystemOps) -> Result<u32, SeedError> {
    if !fs.exists(SEED_FILE) {
        return Err(SeedError::Missing);
    }

    let mut stream = fs.open(SEED_FILE)?;
    let mut text = String::new();
    stream.read_to_string(&mut text)?;

    text.trim()
        .parse::<u32>()
        .map_err(|_| SeedError::Malformed(text.trim().to_owned()))
}
