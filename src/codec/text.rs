//! Plain text resources.
//!
//! Compiled layout: length (LE u32) + that many bytes of UTF-8.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

use crate::arena::{Payload, ResourceArena};
use crate::bundle::Bundle;
use crate::codec::{LoadError, ResourceCodec};
use crate::id::ResourceId;

pub struct TextResource {
    pub text: String,
}

pub struct TextCodec;

impl ResourceCodec for TextCodec {
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

        let text = String::from_utf8(bytes)
            .map_err(|e| LoadError::Malformed(format!("text is not UTF-8: {e}")))?;

        Ok(arena.alloc(TextResource { text }))
    }
}

/// Serialize a text payload in the compiled layout.
pub fn compile(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + text.len());
    out.write_u32::<LittleEndian>(text.len() as u32).unwrap();
    out.extend_from_slice(text.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testutil::{any_id, OneShotBundle};

    #[test]
    fn load_roundtrips_text() {
        let bundle = OneShotBundle { payload: compile("hello, bundle") };
        let arena = ResourceArena::new();

        let payload = TextCodec.load(&arena, &bundle, any_id()).unwrap();
        assert_eq!(payload.downcast_ref::<TextResource>().unwrap().text, "hello, bundle");
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let mut payload = compile("ab");
        payload[4] = 0xFF;
        payload[5] = 0xFE;

        let bundle = OneShotBundle { payload };
        let arena = ResourceArena::new();
        assert!(matches!(
            TextCodec.load(&arena, &bundle, any_id()),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn truncated_payload_is_io_error() {
        let mut payload = compile("truncated");
        payload.truncate(6);

        let bundle = OneShotBundle { payload };
        let arena = ResourceArena::new();
        assert!(matches!(
            TextCodec.load(&arena, &bundle, any_id()),
            Err(LoadError::Io(_))
        ));
    }
}
