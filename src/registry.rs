//! Resource registry — the master lookup table.
//!
//! A dense, append-only vector of entries.  Rows are never removed: a
//! resource that has been seen once keeps its index for the process
//! lifetime, so a later request for the same `(name, ty)` yields the same
//! `ResourceId`.  The manager owns the single mutex guarding this
//! structure; nothing in here locks.

use crate::arena::Payload;
use crate::id::{ResourceId, ResourceState};

pub struct RegistryEntry {
    pub id: ResourceId,
    pub state: ResourceState,
    pub references: u32,
    pub payload: Option<Payload>,
}

#[derive(Default)]
pub struct ResourceRegistry {
    entries: Vec<RegistryEntry>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the entry for `(name, ty)` or append a fresh one.
    ///
    /// New entries start `Unloaded` with one reference and no payload.
    /// Returns the entry index and whether it was just created.  The
    /// reference count of an existing entry is NOT touched — that is the
    /// caller's decision.
    pub fn find_or_insert(&mut self, name: u32, ty: u32) -> (u32, bool) {
        if let Some(index) = self.find(name, ty) {
            return (index, false);
        }

        let index = self.entries.len() as u32;
        self.entries.push(RegistryEntry {
            id: ResourceId { name, ty, index },
            state: ResourceState::Unloaded,
            references: 1,
            payload: None,
        });
        (index, true)
    }

    pub fn find(&self, name: u32, ty: u32) -> Option<u32> {
        self.entries
            .iter()
            .position(|e| e.id.name == name && e.id.ty == ty)
            .map(|i| i as u32)
    }

    /// Whether `id` names an entry this registry has assigned.
    pub fn has(&self, id: ResourceId) -> bool {
        (id.index as usize) < self.entries.len()
            && self.entries[id.index as usize].id.name == id.name
    }

    pub fn get(&self, index: u32) -> Option<&RegistryEntry> {
        self.entries.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut RegistryEntry> {
        self.entries.get_mut(index as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RegistryEntry> {
        self.entries.iter_mut()
    }
}
