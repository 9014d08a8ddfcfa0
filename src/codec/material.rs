//! Material resources.
//!
//! Compiled layout (all LE): ambient, diffuse, specular as RGBA f32×4
//! each, shininess f32, then the seeded name hash of the texture this
//! material samples (0 = untextured).  The texture is a separate resource;
//! the material only carries the reference.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::arena::{Payload, ResourceArena};
use crate::bundle::Bundle;
use crate::codec::{LoadError, ResourceCodec};
use crate::id::ResourceId;

pub type Color4 = [f32; 4];

pub struct MaterialResource {
    pub ambient: Color4,
    pub diffuse: Color4,
    pub specular: Color4,
    pub shininess: f32,
    /// Seeded basename hash of the texture resource; 0 when untextured.
    pub texture: u32,
}

pub struct MaterialCodec;

fn read_color<R: std::io::Read>(r: &mut R) -> std::io::Result<Color4> {
    Ok([
        r.read_f32::<LittleEndian>()?,
        r.read_f32::<LittleEndian>()?,
        r.read_f32::<LittleEndian>()?,
        r.read_f32::<LittleEndian>()?,
    ])
}

impl ResourceCodec for MaterialCodec {
    fn load(
        &self,
        arena: &ResourceArena,
        bundle: &dyn Bundle,
        id: ResourceId,
    ) -> Result<Payload, LoadError> {
        let mut stream = bundle.open(id)?;

        let ambient = read_color(&mut stream)?;
        let diffuse = read_color(&mut stream)?;
        let specular = read_color(&mut stream)?;
        let shininess = stream.read_f32::<LittleEndian>()?;
        let texture = stream.read_u32::<LittleEndian>()?;

        bundle.close(stream);

        Ok(arena.alloc(MaterialResource {
            ambient,
            diffuse,
            specular,
            shininess,
            texture,
        }))
    }
}

/// Serialize a material payload in the compiled layout.
pub fn compile(
    ambient: Color4,
    diffuse: Color4,
    specular: Color4,
    shininess: f32,
    texture: u32,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(56);
    for color in [ambient, diffuse, specular] {
        for c in color {
            out.write_f32::<LittleEndian>(c).unwrap();
        }
    }
    out.write_f32::<LittleEndian>(shininess).unwrap();
    out.write_u32::<LittleEndian>(texture).unwrap();
    out
}
