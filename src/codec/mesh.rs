//! Mesh resources.
//!
//! Compiled layout (all LE): vertex count u32, index count u32, then the
//! interleaved vertex stream (position xyz, normal xyz, uv — 8 f32 per
//! vertex), then u16 indices.  Online uploads both streams to the
//! renderer; the CPU copies stay resident for collision/picking queries.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::arena::{Payload, ResourceArena};
use crate::bundle::Bundle;
use crate::codec::{LoadError, ResourceCodec};
use crate::id::ResourceId;
use crate::renderer::{RenderHandle, RendererOps, INVALID_HANDLE};

/// f32 lanes per interleaved vertex: pos3 + normal3 + uv2.
pub const VERTEX_STRIDE: usize = 8;

pub struct MeshResource {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
    pub vertex_buffer: RenderHandle,
    pub index_buffer: RenderHandle,
}

impl MeshResource {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }
}

pub struct MeshCodec;

impl ResourceCodec for MeshCodec {
    fn load(
        &self,
        arena: &ResourceArena,
        bundle: &dyn Bundle,
        id: ResourceId,
    ) -> Result<Payload, LoadError> {
        let mut stream = bundle.open(id)?;

        let vertex_count = stream.read_u32::<LittleEndian>()? as usize;
        let index_count = stream.read_u32::<LittleEndian>()? as usize;

        let mut vertices = Vec::with_capacity(vertex_count * VERTEX_STRIDE);
        for _ in 0..vertex_count * VERTEX_STRIDE {
            vertices.push(stream.read_f32::<LittleEndian>()?);
        }

        let mut indices = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            indices.push(stream.read_u16::<LittleEndian>()?);
        }

        bundle.close(stream);

        // An index referring past the vertex stream is compiler output
        // gone wrong, not a tolerable variation.
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(LoadError::Malformed(format!(
                "index {bad} out of range for {vertex_count} vertices"
            )));
        }

        Ok(arena.alloc(MeshResource {
            vertices,
            indices,
            vertex_buffer: INVALID_HANDLE,
            index_buffer: INVALID_HANDLE,
        }))
    }

    fn online(&self, payload: &mut Payload, renderer: &mut dyn RendererOps) {
        if let Some(mesh) = payload.downcast_mut::<MeshResource>() {
            mesh.vertex_buffer = renderer.create_vertex_buffer(&mesh.vertices);
            mesh.index_buffer = renderer.create_index_buffer(&mesh.indices);
        }
    }

    fn offline(&self, payload: &mut Payload, renderer: &mut dyn RendererOps) {
        if let Some(mesh) = payload.downcast_mut::<MeshResource>() {
            if mesh.vertex_buffer != INVALID_HANDLE {
                renderer.destroy_buffer(mesh.vertex_buffer);
                mesh.vertex_buffer = INVALID_HANDLE;
            }
            if mesh.index_buffer != INVALID_HANDLE {
                renderer.destroy_buffer(mesh.index_buffer);
                mesh.index_buffer = INVALID_HANDLE;
            }
        }
    }
}

/// Serialize a mesh payload in the compiled layout.
pub fn compile(vertices: &[f32], indices: &[u16]) -> Vec<u8> {
    debug_assert_eq!(vertices.len() % VERTEX_STRIDE, 0);

    let mut out = Vec::with_capacity(8 + vertices.len() * 4 + indices.len() * 2);
    out.write_u32::<LittleEndian>((vertices.len() / VERTEX_STRIDE) as u32).unwrap();
    out.write_u32::<LittleEndian>(indices.len() as u32).unwrap();
    for v in vertices {
        out.write_f32::<LittleEndian>(*v).unwrap();
    }
    for i in indices {
        out.write_u16::<LittleEndian>(*i).unwrap();
    }
    out
}
