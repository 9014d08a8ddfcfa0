//! Codec registry: per-type load/online/offline/unload dispatch.
//!
//! # Identity rules
//! A resource type is the unseeded 32-bit hash of its file extension.
//! Those values appear in every archive entry and loose file name, so they
//! are as frozen as the hash function itself.  The constants in [`types`]
//! are computed at compile time from the extension strings.
//!
//! # Threading contract
//! `load` runs on the background loader thread and is the only hook that
//! may block on I/O.  `online`, `offline`, and `unload` run on the main
//! thread; they are the only hooks allowed to touch the renderer.  The
//! manager never holds one of its queue/registry locks across any hook.

pub mod font;
pub mod material;
pub mod mesh;
pub mod script;
pub mod shader;
pub mod text;
pub mod texture;

use std::collections::HashMap;
use std::io;
use thiserror::Error;

use crate::arena::{Payload, ResourceArena};
use crate::bundle::{Bundle, BundleError};
use crate::id::ResourceId;
use crate::renderer::RendererOps;

// ── Built-in type hashes ─────────────────────────────────────────────────────

/// Type hashes for the built-in resource kinds.  Frozen: derived from the
/// extension strings with seed 0.
pub mod types {
    use crate::hash::murmur2_32;

    pub const TEXTURE: u32 = murmur2_32(b"tga", 0);
    pub const TEXT: u32 = murmur2_32(b"txt", 0);
    pub const VERTEX_SHADER: u32 = murmur2_32(b"vs", 0);
    pub const PIXEL_SHADER: u32 = murmur2_32(b"ps", 0);
    pub const FONT: u32 = murmur2_32(b"fnt", 0);
    pub const MATERIAL: u32 = murmur2_32(b"mtl", 0);
    pub const MESH: u32 = murmur2_32(b"mesh", 0);
    pub const SCRIPT: u32 = murmur2_32(b"lua", 0);

    /// Human-readable name for diagnostics only — never parsed.
    pub fn name(ty: u32) -> &'static str {
        match ty {
            TEXTURE => "texture",
            TEXT => "text",
            VERTEX_SHADER => "vertex-shader",
            PIXEL_SHADER => "pixel-shader",
            FONT => "font",
            MATERIAL => "material",
            MESH => "mesh",
            SCRIPT => "script",
            _ => "unknown",
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Bundle(#[from] BundleError),
    /// The payload bytes do not match the type's compiled layout.
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Codec trait ──────────────────────────────────────────────────────────────

/// The four-hook interface a resource type plugs into the manager.
pub trait ResourceCodec: Send + Sync {
    /// Parse the payload for `id` out of `bundle`.  Worker thread; may
    /// block.  All payload memory goes through `arena`.
    fn load(
        &self,
        arena: &ResourceArena,
        bundle: &dyn Bundle,
        id: ResourceId,
    ) -> Result<Payload, LoadError>;

    /// Hand the parsed payload to non-thread-safe collaborators.  Main
    /// thread only.
    fn online(&self, _payload: &mut Payload, _renderer: &mut dyn RendererOps) {}

    /// Release renderer/OS handles.  Runs immediately before `unload`.
    /// Main thread only.
    fn offline(&self, _payload: &mut Payload, _renderer: &mut dyn RendererOps) {}

    /// Free the payload.  Dropping it settles the arena ledger; most
    /// codecs need nothing beyond the default.
    fn unload(&self, payload: Payload) {
        drop(payload);
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// Type hash → codec.  Populated once at initialization; lookups after
/// that are read-only from both threads.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<u32, Box<dyn ResourceCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in resource types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(types::TEXTURE, Box::new(texture::TextureCodec));
        registry.register(types::TEXT, Box::new(text::TextCodec));
        registry.register(types::VERTEX_SHADER, Box::new(shader::VertexShaderCodec));
        registry.register(types::PIXEL_SHADER, Box::new(shader::PixelShaderCodec));
        registry.register(types::FONT, Box::new(font::FontCodec));
        registry.register(types::MATERIAL, Box::new(material::MaterialCodec));
        registry.register(types::MESH, Box::new(mesh::MeshCodec));
        registry.register(types::SCRIPT, Box::new(script::ScriptCodec));
        registry
    }

    /// Register `codec` for `ty`, replacing any previous registration.
    pub fn register(&mut self, ty: u32, codec: Box<dyn ResourceCodec>) {
        self.codecs.insert(ty, codec);
    }

    pub fn get(&self, ty: u32) -> Option<&dyn ResourceCodec> {
        self.codecs.get(&ty).map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_type() {
        let registry = CodecRegistry::builtin();
        for ty in [
            types::TEXTURE,
            types::TEXT,
            types::VERTEX_SHADER,
            types::PIXEL_SHADER,
            types::FONT,
            types::MATERIAL,
            types::MESH,
            types::SCRIPT,
        ] {
            assert!(registry.get(ty).is_some(), "missing codec for {}", types::name(ty));
        }
    }

    #[test]
    fn type_hashes_are_distinct() {
        let mut hashes = vec![
            types::TEXTURE,
            types::TEXT,
            types::VERTEX_SHADER,
            types::PIXEL_SHADER,
            types::FONT,
            types::MATERIAL,
            types::MESH,
            types::SCRIPT,
        ];
        hashes.sort_unstable();
        hashes.dedup();
        assert_eq!(hashes.len(), 8);
    }

    #[test]
    fn unknown_type_has_no_codec() {
        assert!(CodecRegistry::builtin().get(0xFFFF_FFFF).is_none());
    }
}
