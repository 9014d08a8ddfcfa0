//! Texture resources.
//!
//! Compiled layout: pixel format (LE u32), width (LE u16), height
//! (LE u16), then `width × height × bytes_per_pixel` raw pixels.  The
//! offline texture compiler emits exactly this; [`compile`] mirrors it
//! for tools and tests.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

use crate::arena::{Payload, ResourceArena};
use crate::bundle::Bundle;
use crate::codec::{LoadError, ResourceCodec};
use crate::id::ResourceId;
use crate::renderer::{PixelFormat, RenderHandle, RendererOps, INVALID_HANDLE};

pub struct TextureResource {
    pub format: PixelFormat,
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
    /// Renderer-side object; valid only between online and offline.
    pub handle: RenderHandle,
}

pub struct TextureCodec;

impl ResourceCodec for TextureCodec {
    fn load(
        &self,
        arena: &ResourceArena,
        bundle: &dyn Bundle,
        id: ResourceId,
    ) -> Result<Payload, LoadError> {
        let mut stream = bundle.open(id)?;

        let raw_format = stream.read_u32::<LittleEndian>()?;
        let format = PixelFormat::from_u32(raw_format)
            .ok_or_else(|| LoadError::Malformed(format!("unknown pixel format {raw_format}")))?;
        let width = stream.read_u16::<LittleEndian>()?;
        let height = stream.read_u16::<LittleEndian>()?;

        let size = width as usize * height as usize * format.bytes_per_pixel();
        let mut pixels = vec![0u8; size];
        stream.read_exact(&mut pixels)?;

        bundle.close(stream);

        Ok(arena.alloc(TextureResource {
            format,
            width,
            height,
            pixels,
            handle: INVALID_HANDLE,
        }))
    }

    fn online(&self, payload: &mut Payload, renderer: &mut dyn RendererOps) {
        if let Some(texture) = payload.downcast_mut::<TextureResource>() {
            texture.handle =
                renderer.create_texture(texture.format, texture.width, texture.height, &texture.pixels);
        }
    }

    fn offline(&self, payload: &mut Payload, renderer: &mut dyn RendererOps) {
        if let Some(texture) = payload.downcast_mut::<TextureResource>() {
            if texture.handle != INVALID_HANDLE {
                renderer.destroy_texture(texture.handle);
                texture.handle = INVALID_HANDLE;
            }
        }
    }
}

/// Serialize a texture payload in the compiled layout.
pub fn compile(format: PixelFormat, width: u16, height: u16, pixels: &[u8]) -> Vec<u8> {
    debug_assert_eq!(pixels.len(), width as usize * height as usize * format.bytes_per_pixel());

    let mut out = Vec::with_capacity(8 + pixels.len());
    out.write_u32::<LittleEndian>(format as u32).unwrap();
    out.write_u16::<LittleEndian>(width).unwrap();
    out.write_u16::<LittleEndian>(height).unwrap();
    out.extend_from_slice(pixels);
    out
}
