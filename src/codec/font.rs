//! Font resources — atlas metrics plus a glyph table.
//!
//! Compiled layout (all LE):
//!
//! ```text
//! u32 max_text_height
//! u32 max_character_height
//! u32 max_character_width
//! u32 glyph_count
//! glyph_count × {
//!   u32 codepoint
//!   u32 x, u32 y, u32 width, u32 height     atlas rectangle
//!   i32 x_offset, i32 y_offset, i32 x_advance
//! }
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::arena::{Payload, ResourceArena};
use crate::bundle::Bundle;
use crate::codec::{LoadError, ResourceCodec};
use crate::id::ResourceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub codepoint: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub x_advance: i32,
}

pub struct FontResource {
    pub max_text_height: u32,
    pub max_character_height: u32,
    pub max_character_width: u32,
    pub glyphs: Vec<Glyph>,
}

impl FontResource {
    pub fn glyph(&self, codepoint: u32) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.codepoint == codepoint)
    }
}

pub struct FontCodec;

impl ResourceCodec for FontCodec {
    fn load(
        &self,
        arena: &ResourceArena,
        bundle: &dyn Bundle,
        id: ResourceId,
    ) -> Result<Payload, LoadError> {
        let mut stream = bundle.open(id)?;

        let max_text_height = stream.read_u32::<LittleEndian>()?;
        let max_character_height = stream.read_u32::<LittleEndian>()?;
        let max_character_width = stream.read_u32::<LittleEndian>()?;
        let glyph_count = stream.read_u32::<LittleEndian>()? as usize;

        let mut glyphs = Vec::with_capacity(glyph_count);
        for _ in 0..glyph_count {
            glyphs.push(Glyph {
                codepoint: stream.read_u32::<LittleEndian>()?,
                x: stream.read_u32::<LittleEndian>()?,
                y: stream.read_u32::<LittleEndian>()?,
                width: stream.read_u32::<LittleEndian>()?,
                height: stream.read_u32::<LittleEndian>()?,
                x_offset: stream.read_i32::<LittleEndian>()?,
                y_offset: stream.read_i32::<LittleEndian>()?,
                x_advance: stream.read_i32::<LittleEndian>()?,
            });
        }

        bundle.close(stream);

        Ok(arena.alloc(FontResource {
            max_text_height,
            max_character_height,
            max_character_width,
            glyphs,
        }))
    }
}

/// Serialize a font payload in the compiled layout.
pub fn compile(
    max_text_height: u32,
    max_character_height: u32,
    max_character_width: u32,
    glyphs: &[Glyph],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + glyphs.len() * 32);
    out.write_u32::<LittleEndian>(max_text_height).unwrap();
    out.write_u32::<LittleEndian>(max_character_height).unwrap();
    out.write_u32::<LittleEndian>(max_character_width).unwrap();
    out.write_u32::<LittleEndian>(glyphs.len() as u32).unwrap();
    for g in glyphs {
        out.write_u32::<LittleEndian>(g.codepoint).unwrap();
        out.write_u32::<LittleEndian>(g.x).unwrap();
        out.write_u32::<LittleEndian>(g.y).unwrap();
        out.write_u32::<LittleEndian>(g.width).unwrap();
        out.write_u32::<LittleEndian>(g.height).unwrap();
        out.write_i32::<LittleEndian>(g.x_offset).unwrap();
        out.write_i32::<LittleEndian>(g.y_offset).unwrap();
        out.write_i32::<LittleEndian>(g.x_advance).unwrap();
    }
    out
}
