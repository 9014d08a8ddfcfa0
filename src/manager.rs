//! Resource manager — the public surface of the subsystem.
//!
//! # Threading model
//! One "frame" thread owns the manager and is the only caller of its
//! methods; one background worker (spawned at construction) drains the
//! request queue.  Mutating operations take `&mut self` so the
//! single-main-thread rule is enforced by the borrow checker rather than
//! by convention.
//!
//! # Lifecycle of a request
//! `load` hashes the path, registers (or re-references) the entry, and
//! queues new work for the worker.  The worker parses payloads off-thread
//! and queues completions.  Once per frame the host calls
//! `check_load_queue` and `bring_loaded_online`; the latter runs the
//! codec `online` hooks on the main thread and flips entries to `Loaded`.
//! `flush` is the synchronous barrier over all of that.
//!
//! # Failure semantics
//! A load that cannot read or parse its resource completes with an empty
//! payload and an error in the log.  The entry still becomes `Loaded`, so
//! `flush` terminates and callers see "loaded but no data" — the cue to
//! substitute fallback content.  Recoverable errors never surface as
//! return values of `load`.
//!
//! # Locking discipline
//! Three mutexes — pending queue, completion queue, registry — are only
//! ever taken one at a time, and never across a codec hook.

use std::io;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use thiserror::Error;

use crate::arena::{Payload, Resource, ResourceArena};
use crate::bundle::Bundle;
use crate::codec::CodecRegistry;
use crate::fs::{read_seed, FilesystemOps, SeedError};
use crate::hash::{basename_without_extension, extension, murmur2_32};
use crate::id::{LoadedResource, ResourceId, ResourceState};
use crate::loader::{self, LoaderShared};
use crate::registry::ResourceRegistry;
use crate::renderer::RendererOps;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error("failed to spawn resource loader thread: {0}")]
    Spawn(io::Error),
}

pub struct ResourceManager {
    shared: Arc<LoaderShared>,
    registry: Mutex<ResourceRegistry>,
    renderer: Box<dyn RendererOps>,
    seed: u32,
    worker: Option<JoinHandle<()>>,
}

impl ResourceManager {
    /// Build a manager over `bundle` and start its loader thread.
    ///
    /// Reads the hash seed from `seed.ini` at the filesystem root; a
    /// missing or malformed seed file is a boot failure.  The worker is
    /// spawned as the very last step, after every shared structure is in
    /// place.
    pub fn new(
        bundle: Box<dyn Bundle>,
        fs: &dyn FilesystemOps,
        renderer: Box<dyn RendererOps>,
        codecs: CodecRegistry,
    ) -> Result<Self, ManagerError> {
        let seed = read_seed(fs)?;
        log::debug!("resource name seed: {seed}");

        let shared = Arc::new(LoaderShared::new(bundle, codecs));

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("resource-loader".into())
            .spawn(move || loader::run(&worker_shared))
            .map_err(ManagerError::Spawn)?;

        Ok(Self {
            shared,
            registry: Mutex::new(ResourceRegistry::new()),
            renderer,
            seed,
            worker: Some(worker),
        })
    }

    // ── Requests ─────────────────────────────────────────────────────────────

    /// Request the resource at `path` ("textures/brick.tga").
    ///
    /// Non-blocking: the returned id is valid immediately, the data is
    /// not.  Poll `is_loaded` or call `flush` before touching it.  A
    /// repeated request for a live resource only bumps its reference
    /// count.
    pub fn load(&mut self, path: &str) -> ResourceId {
        let name = murmur2_32(basename_without_extension(path).as_bytes(), self.seed);
        let ty = murmur2_32(extension(path).as_bytes(), 0);
        self.load_hashed(name, ty)
    }

    /// As [`load`](Self::load), for callers that already hold the hashes.
    pub fn load_hashed(&mut self, name: u32, ty: u32) -> ResourceId {
        let (id, enqueue) = {
            let mut registry = self.registry.lock().unwrap();
            let (index, is_new) = registry.find_or_insert(name, ty);
            let entry = registry.get_mut(index).unwrap();
            if !is_new {
                entry.references += 1;
            }
            // Unloaded covers both "brand new" and "was reclaimed" — either
            // way this reference needs a load queued.
            let enqueue = entry.state == ResourceState::Unloaded;
            if enqueue {
                entry.state = ResourceState::Loading;
            }
            (entry.id, enqueue)
        };

        if enqueue {
            let mut pending = self.shared.pending.lock().unwrap();
            pending.queue.push_back(id);
            self.shared.loading_requests.notify_one();
        }

        id
    }

    /// Drop one reference.  When the last reference to a loaded resource
    /// goes away its payload is taken offline and freed; the registry row
    /// is kept so the id stays stable.
    pub fn unload(&mut self, id: ResourceId) {
        debug_assert!(self.has(id), "unload of unknown resource {id}");

        let payload = {
            let mut registry = self.registry.lock().unwrap();
            if !registry.has(id) {
                return;
            }
            let entry = registry.get_mut(id.index).unwrap();
            debug_assert!(entry.references > 0, "unload of {id} below zero references");
            entry.references = entry.references.saturating_sub(1);

            if entry.references == 0 && entry.state == ResourceState::Loaded {
                entry.state = ResourceState::Unloading;
                Some(entry.payload.take())
            } else {
                None
            }
        };

        // `Some` means the entry is mid-teardown; run the hooks with no
        // lock held, then finish the transition.
        if let Some(payload) = payload {
            self.teardown(id, payload);
            let mut registry = self.registry.lock().unwrap();
            let entry = registry.get_mut(id.index).unwrap();
            entry.state = ResourceState::Unloaded;
        }
    }

    /// Hot-reload: tear the payload down in place and queue a fresh load.
    /// References are preserved; ids held by the rest of the engine stay
    /// valid and simply see new data after the next `bring_loaded_online`.
    pub fn reload(&mut self, id: ResourceId) {
        debug_assert!(self.has(id), "reload of unknown resource {id}");

        let payload = {
            let mut registry = self.registry.lock().unwrap();
            if !registry.has(id) {
                return;
            }
            let entry = registry.get_mut(id.index).unwrap();
            if entry.state != ResourceState::Loaded {
                return;
            }
            entry.state = ResourceState::Unloading;
            entry.payload.take()
        };

        self.teardown(id, payload);

        {
            let mut registry = self.registry.lock().unwrap();
            let entry = registry.get_mut(id.index).unwrap();
            entry.state = ResourceState::Loading;
        }

        let mut pending = self.shared.pending.lock().unwrap();
        pending.queue.push_back(id);
        self.shared.loading_requests.notify_one();
    }

    /// Offline + unload hooks for a detached payload.  No manager lock may
    /// be held on entry.
    fn teardown(&mut self, id: ResourceId, payload: Option<Payload>) {
        if let Some(mut payload) = payload {
            if let Some(codec) = self.shared.codecs.get(id.ty) {
                codec.offline(&mut payload, self.renderer.as_mut());
                codec.unload(payload);
            }
        }
    }

    // ── Observers ────────────────────────────────────────────────────────────

    /// Whether this manager has ever assigned `id`.
    pub fn has(&self, id: ResourceId) -> bool {
        self.registry.lock().unwrap().has(id)
    }

    /// Whether the resource finished loading (its data may still be empty
    /// if the load failed — see `with_data`).
    pub fn is_loaded(&self, id: ResourceId) -> bool {
        debug_assert!(self.has(id), "is_loaded of unknown resource {id}");
        let registry = self.registry.lock().unwrap();
        registry
            .get(id.index)
            .map(|e| e.state == ResourceState::Loaded)
            .unwrap_or(false)
    }

    /// Current reference count of `id`.
    pub fn references(&self, id: ResourceId) -> u32 {
        debug_assert!(self.has(id), "references of unknown resource {id}");
        let registry = self.registry.lock().unwrap();
        registry.get(id.index).map(|e| e.references).unwrap_or(0)
    }

    /// Whether `id` currently holds a payload.
    pub fn has_data(&self, id: ResourceId) -> bool {
        let registry = self.registry.lock().unwrap();
        registry
            .get(id.index)
            .map(|e| e.payload.is_some())
            .unwrap_or(false)
    }

    /// Borrow the payload of `id` as `T` for the duration of `f`.
    ///
    /// Returns `None` when the resource is not loaded, failed to load, or
    /// is not a `T`.  The borrow cannot outlive the call, so there is no
    /// way to observe a payload across a later `unload`/`reload`.
    pub fn with_data<T: Resource, R>(&self, id: ResourceId, f: impl FnOnce(&T) -> R) -> Option<R> {
        let registry = self.registry.lock().unwrap();
        let entry = registry.get(id.index)?;
        let payload = entry.payload.as_ref()?;
        payload.downcast_ref::<T>().map(f)
    }

    /// Number of requests the worker has not yet picked up.  Zero does NOT
    /// mean idle — one request may be in flight; `flush` is the real
    /// barrier.
    pub fn remaining(&self) -> u32 {
        self.shared.pending.lock().unwrap().queue.len() as u32
    }

    /// The seed mixed into resource name hashes.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Handle to the payload ledger (diagnostics, leak checks).
    pub fn arena(&self) -> ResourceArena {
        self.shared.arena.clone()
    }

    // ── Per-frame duties ─────────────────────────────────────────────────────

    /// Poke the worker if requests are pending.  Called once per frame by
    /// the host device.
    pub fn check_load_queue(&mut self) {
        let pending = self.shared.pending.lock().unwrap();
        if !pending.queue.is_empty() {
            self.shared.loading_requests.notify_one();
        }
    }

    /// Drain the completion queue: run `online` hooks and mark entries
    /// `Loaded`.  Called once per frame by the host device.
    pub fn bring_loaded_online(&mut self) {
        // Detach the batch first; no queue lock survives into the hooks.
        let drained: Vec<LoadedResource> = {
            let mut completed = self.shared.completed.lock().unwrap();
            completed.drain(..).collect()
        };

        for loaded in drained {
            let payload = loaded.payload.map(|mut payload| {
                if let Some(codec) = self.shared.codecs.get(loaded.id.ty) {
                    codec.online(&mut payload, self.renderer.as_mut());
                }
                payload
            });

            let mut registry = self.registry.lock().unwrap();
            if let Some(entry) = registry.get_mut(loaded.id.index) {
                entry.payload = payload;
                entry.state = ResourceState::Loaded;
            }
        }
    }

    /// Block until every request issued so far is loaded AND online.
    ///
    /// No timeout; callers wanting bounded waits should poll
    /// `remaining()` instead.
    pub fn flush(&mut self) {
        self.check_load_queue();

        {
            let mut pending = self.shared.pending.lock().unwrap();
            while !pending.queue.is_empty() || pending.in_flight > 0 {
                pending = self.shared.all_loaded.wait(pending).unwrap();
            }
        }

        self.bring_loaded_online();
    }

    // ── Shutdown ─────────────────────────────────────────────────────────────

    /// Finish outstanding work, tear down every resident payload, and join
    /// the worker.  Runs automatically on drop; calling it twice is fine.
    pub fn shutdown(&mut self) {
        if self.worker.is_none() {
            return;
        }

        self.flush();

        // Reclaim payloads regardless of reference counts — the process is
        // going away and the ledger must read zero.
        let resident: Vec<(ResourceId, Payload)> = {
            let mut registry = self.registry.lock().unwrap();
            let mut resident = Vec::new();
            for entry in registry.iter_mut() {
                if let Some(payload) = entry.payload.take() {
                    resident.push((entry.id, payload));
                }
                entry.state = ResourceState::Unloaded;
                entry.references = 0;
            }
            resident
        };
        for (id, payload) in resident {
            self.teardown(id, Some(payload));
        }

        self.shared.run.store(false, std::sync::atomic::Ordering::Release);
        self.shared.loading_requests.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
