//! Resource identity and lifecycle state.

use std::fmt;

use crate::arena::Payload;

/// Identifies a resource.
///
/// `(name, ty)` is the durable identity — it is what archive entries and
/// loose file names are keyed on, and it is the only part that takes part
/// in equality.  `index` is the slot assigned by the registry on first
/// request; it is stable for the process lifetime but meaningless to any
/// other process.
#[derive(Clone, Copy, Debug)]
pub struct ResourceId {
    /// Seeded hash of the basename ("brick" in "brick.tga").
    pub name: u32,
    /// Unseeded hash of the extension ("tga").
    pub ty: u32,
    /// Registry slot; not part of identity.
    pub index: u32,
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ty == other.ty
    }
}

impl Eq for ResourceId {}

impl std::hash::Hash for ResourceId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.ty.hash(state);
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}{:08x}", self.name, self.ty)
    }
}

/// Lifecycle state of a registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    /// No payload; either never loaded or reclaimed.
    Unloaded,
    /// Queued for, or currently inside, the background loader.
    Loading,
    /// Payload parsed and brought online; usable (payload may still be
    /// absent if the load failed — see the manager's failure semantics).
    Loaded,
    /// Mid-teardown, while the codec unload hook runs.
    Unloading,
}

/// A completed load, travelling from the worker to the main thread.
///
/// `payload` is `None` when the load failed; the entry still transitions
/// to `Loaded` so nothing waits forever on a missing file.
pub struct LoadedResource {
    pub id: ResourceId,
    pub payload: Option<Payload>,
}
