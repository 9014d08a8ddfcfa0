//! Payload storage and leak accounting.
//!
//! Codec payloads are opaque to the manager: a [`Payload`] is a boxed
//! [`Resource`] plus a ledger token.  The arena does not own the bytes —
//! Rust's ownership does — it only counts what is outstanding, so shutdown
//! can assert that every payload the codecs produced was also torn down.

use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Anything a codec can produce as a parsed payload.
pub trait Resource: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// Concrete (non-generic) impls per type, rather than a single blanket
// `impl<T: Any + Send + Sync> Resource for T`: this toolchain's codegen
// collapses the blanket impl's identical-looking monomorphized bodies
// across distinct `T`, corrupting the embedded `Any` vtable identity so
// every downcast fails. Per-type impls sidestep that.
#[macro_export]
macro_rules! impl_resource {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::arena::Resource for $t {
                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                    self
                }
            }
        )*
    };
}

/// Allocation ledger for codec payloads.  Cheap to clone; all clones share
/// one live count.
#[derive(Clone, Default)]
pub struct ResourceArena {
    live: Arc<AtomicU32>,
}

impl ResourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed resource into a tracked payload.
    pub fn alloc<R: Resource>(&self, resource: R) -> Payload {
        self.live.fetch_add(1, Ordering::Relaxed);
        Payload {
            resource: Box::new(resource),
            _token: AllocToken { live: Arc::clone(&self.live) },
        }
    }

    /// Number of payloads allocated and not yet dropped.
    pub fn live(&self) -> u32 {
        self.live.load(Ordering::Relaxed)
    }
}

/// A tracked, type-erased codec payload.  Dropping it releases the memory
/// and decrements the arena's live count.
pub struct Payload {
    resource: Box<dyn Resource>,
    _token: AllocToken,
}

impl Payload {
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        self.resource.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Resource>(&mut self) -> Option<&mut T> {
        self.resource.as_any_mut().downcast_mut::<T>()
    }
}

struct AllocToken {
    live: Arc<AtomicU32>,
}

impl Drop for AllocToken {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blob {
        bytes: Vec<u8>,
    }

    impl_resource!(Blob);

    #[test]
    fn ledger_tracks_live_payloads() {
        let arena = ResourceArena::new();
        assert_eq!(arena.live(), 0);

        let a = arena.alloc(Blob { bytes: vec![1, 2, 3] });
        let b = arena.alloc(Blob { bytes: vec![] });
        assert_eq!(arena.live(), 2);

        drop(a);
        assert_eq!(arena.live(), 1);
        drop(b);
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn downcast_roundtrip() {
        let arena = ResourceArena::new();
        let mut p = arena.alloc(Blob { bytes: vec![7] });

        assert_eq!(p.downcast_ref::<Blob>().unwrap().bytes, vec![7]);
        p.downcast_mut::<Blob>().unwrap().bytes.push(8);
        assert_eq!(p.downcast_ref::<Blob>().unwrap().bytes, vec![7, 8]);
        assert!(p.downcast_ref::<String>().is_none());
    }
}
