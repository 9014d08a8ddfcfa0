//! Shader resources — vertex and pixel programs.
//!
//! Compiled layout (both kinds): source length (LE u32) + that many bytes
//! of shader source.  The program is compiled by the renderer during the
//! online phase; the source stays resident so a device reset can rebuild
//! it.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

use crate::arena::{Payload, ResourceArena};
use crate::bundle::{Bundle, BundleStream};
use crate::codec::{LoadError, ResourceCodec};
use crate::id::ResourceId;
use crate::renderer::{RenderHandle, RendererOps, INVALID_HANDLE};

pub struct VertexShaderResource {
    pub source: String,
    pub handle: RenderHandle,
}

pub struct PixelShaderResource {
    pub source: String,
    pub handle: RenderHandle,
}

fn read_source(stream: &mut BundleStream) -> Result<String, LoadError> {
    let len = stream.read_u32::<LittleEndian>()? as usize;
    let mut bytes = vec![0u8; len];
    stream.read_exact(&mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|e| LoadError::Malformed(format!("shader source is not UTF-8: {e}")))
}

pub struct VertexShaderCodec;

impl ResourceCodec for VertexShaderCodec {
    fn load(
        &self,
        arena: &ResourceArena,
        bundle: &dyn Bundle,
        id: ResourceId,
    ) -> Result<Payload, LoadError> {
        let mut stream = bundle.open(id)?;
        let source = read_source(&mut stream)?;
        bundle.close(stream);

        Ok(arena.alloc(VertexShaderResource { source, handle: INVALID_HANDLE }))
    }

    fn online(&self, payload: &mut Payload, renderer: &mut dyn RendererOps) {
        if let Some(shader) = payload.downcast_mut::<VertexShaderResource>() {
            shader.handle = renderer.create_vertex_shader(&shader.source);
        }
    }

    fn offline(&self, payload: &mut Payload, renderer: &mut dyn RendererOps) {
        if let Some(shader) = payload.downcast_mut::<VertexShaderResource>() {
            if shader.handle != INVALID_HANDLE {
                renderer.destroy_shader(shader.handle);
                shader.handle = INVALID_HANDLE;
            }
        }
    }
}

pub struct PixelShaderCodec;

impl ResourceCodec for PixelShaderCodec {
    fn load(
        &self,
        arena: &ResourceArena,
        bundle: &dyn Bundle,
        id: ResourceId,
    ) -> Result<Payload, LoadError> {
        let mut stream = bundle.open(id)?;
        let source = read_source(&mut stream)?;
        bundle.close(stream);

        Ok(arena.alloc(PixelShaderResource { source, handle: INVALID_HANDLE }))
    }

    fn online(&self, payload: &mut Payload, renderer: &mut dyn RendererOps) {
        if let Some(shader) = payload.downcast_mut::<PixelShaderResource>() {
            shader.handle = renderer.create_pixel_shader(&shader.source);
        }
    }

    fn offline(&self, payload: &mut Payload, renderer: &mut dyn RendererOps) {
        if let Some(shader) = payload.downcast_mut::<PixelShaderResource>() {
            if shader.handle != INVALID_HANDLE {
                renderer.destroy_shader(shader.handle);
                shader.handle = INVALID_HANDLE;
            }
        }
    }
}

/// Serialize a shader payload in the compiled layout.
pub fn compile(source: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + source.len());
    out.write_u32::<LittleEndian>(source.len() as u32).unwrap();
    out.extend_from_slice(source.as_bytes());
    out
}
