//! Script resources (Lua source).
//!
//! Compiled layout: source length (LE u32) + bytes.  The script system
//! picks the source up through `with_data`; there is nothing to bring
//! online.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

use crate::arena::{Payload, ResourceArena};
use crate::bundle::Bundle;
use crate::codec::{LoadError, ResourceCodec};
use crate::id::ResourceId;

pub struct ScriptResource {
    pub source: String,
}

pub struct ScriptCodec;

impl ResourceCodec for ScriptCodec {
    fn load(
        &self,
        arena: &ResourceArena,
        bundle: &dyn Bundle,
        id: ResourceId,
    ) -> Result<Payload, LoadError> {
        let mut stream = bundle.open(id)?;

        let len = stream.read_u32::<LittleEndian>()? as usize;
        let mut bytes = vec![0u8; len];
        stream.read_exact(&mut bytes)?;

        bundle.close(stream);

        let source = String::from_utf8(bytes)
            .map_err(|e| LoadError::Malformed(format!("script source is not UTF-8: {e}")))?;

        Ok(arena.alloc(ScriptResource { source }))
    }
}

/// Serialize a script payload in the compiled layout.
pub fn compile(source: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + source.len());
    out.write_u32::<LittleEndian>(source.len() as u32).unwrap();
    out.extend_from_slice(source.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testutil::{any_id, OneShotBundle};

    #[test]
    fn load_roundtrips_source() {
        let bundle = OneShotBundle { payload: compile("print('spawn')") };
        let arena = ResourceArena::new();

        let payload = ScriptCodec.load(&arena, &bundle, any_id()).unwrap();
        assert_eq!(payload.downcast_ref::<ScriptResource>().unwrap().source, "print('spawn')");
    }
}
