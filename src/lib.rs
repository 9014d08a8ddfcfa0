//! # kiln — content bundle format and asynchronous resource manager
//!
//! Runtime guarantees (frozen in archive version 1):
//! - All on-disk integer fields are little-endian; never negotiated
//! - Resource identity is `(name, ty)`: seeded MurmurHash2 of the basename
//!   plus unseeded MurmurHash2 of the extension — both frozen
//! - The archive header carries a version; readers refuse anything newer
//!   than they understand and accept everything older
//! - The 64-byte header padding is reserved: zero on write, ignored on read
//! - The runtime is strictly read-only; archives are authored offline by
//!   the `kiln` CLI
//! - One background loader thread per manager; completions are delivered
//!   in request order for a single producer
//! - A failed load never blocks or panics the frame loop: the entry
//!   completes empty and the failure goes to the log
//!
//! The typical embedding:
//!
//! ```no_run
//! use std::sync::Arc;
//! use kiln::{CodecRegistry, DiskFilesystem, NullRenderer, PackedBundle, ResourceManager};
//!
//! let fs = Arc::new(DiskFilesystem::new("content"));
//! let bundle = PackedBundle::open(fs.as_ref(), "archive.bin")?;
//! let mut resources = ResourceManager::new(
//!     Box::new(bundle),
//!     fs.as_ref(),
//!     Box::new(NullRenderer::new()),
//!     CodecRegistry::builtin(),
//! )?;
//!
//! let brick = resources.load("textures/brick.tga");
//! resources.flush();
//! assert!(resources.is_loaded(brick));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod arena;
pub mod bundle;
pub mod codec;
pub mod fs;
pub mod hash;
pub mod id;
mod loader;
pub mod manager;
pub mod registry;
pub mod renderer;

// Flat re-exports for the most common types.
pub use archive::{ArchiveEntry, ArchiveError, ArchiveHeader, ArchiveWriter, ARCHIVE_VERSION};
pub use arena::{Payload, Resource, ResourceArena};
pub use bundle::{loose_path, Bundle, BundleError, BundleStream, LooseBundle, PackedBundle};
pub use codec::{types, CodecRegistry, LoadError, ResourceCodec};
pub use fs::{read_seed, DiskFilesystem, FileStream, FilesystemOps, SeedError, SEED_FILE};
pub use hash::murmur2_32;
pub use id::{LoadedResource, ResourceId, ResourceState};
pub use manager::{ManagerError, ResourceManager};
pub use registry::{RegistryEntry, ResourceRegistry};
pub use renderer::{NullRenderer, PixelFormat, RenderHandle, RendererOps, INVALID_HANDLE};
