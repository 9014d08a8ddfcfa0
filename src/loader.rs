//! Background loader — the single worker thread.
//!
//! # Scheduling
//! One dedicated thread per manager.  The worker sleeps on
//! `loading_requests` while the pending queue is empty, pops exactly one
//! request at a time, runs the codec's `load` hook (the only place
//! blocking I/O happens), and pushes the completion.  Completions appear
//! in pop order, and requests are popped in FIFO order, so a single
//! producer observes completions in issue order.
//!
//! # The barrier signal
//! `all_loaded` fires when the pending queue is empty AND nothing is in
//! flight between pop and completion.  `remaining()` ignores the
//! in-flight slot (off by at most one for a single worker); `flush()`
//! must not, or it could return while the worker is mid-parse.
//!
//! # Shutdown
//! Cooperative: the manager clears the run flag and signals
//! `loading_requests`; the worker exits at the top of its loop.  An
//! in-flight load always runs to completion — there is no cancellation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

use crate::arena::{Payload, ResourceArena};
use crate::bundle::Bundle;
use crate::codec::{types, CodecRegistry};
use crate::id::{LoadedResource, ResourceId};

pub(crate) struct PendingQueue {
    pub queue: VecDeque<ResourceId>,
    /// Requests popped by the worker but not yet pushed to `completed`.
    pub in_flight: u32,
}

/// Everything the worker shares with the manager.
pub(crate) struct LoaderShared {
    pub bundle: Box<dyn Bundle>,
    pub codecs: CodecRegistry,
    pub arena: ResourceArena,

    pub pending: Mutex<PendingQueue>,
    /// Signalled when a request enters the pending queue.
    pub loading_requests: Condvar,
    /// Signalled when the worker drains the queue completely.
    pub all_loaded: Condvar,

    pub completed: Mutex<VecDeque<LoadedResource>>,

    pub run: AtomicBool,
}

impl LoaderShared {
    pub fn new(bundle: Box<dyn Bundle>, codecs: CodecRegistry) -> Self {
        Self {
            bundle,
            codecs,
            arena: ResourceArena::new(),
            pending: Mutex::new(PendingQueue { queue: VecDeque::new(), in_flight: 0 }),
            loading_requests: Condvar::new(),
            all_loaded: Condvar::new(),
            completed: Mutex::new(VecDeque::new()),
            run: AtomicBool::new(true),
        }
    }
}

/// Worker thread entry point.
pub(crate) fn run(shared: &LoaderShared) {
    loop {
        // Wait for a request (or the shutdown flag).
        let id = {
            let mut pending = shared.pending.lock().unwrap();
            loop {
                if !shared.run.load(Ordering::Acquire) {
                    return;
                }
                if let Some(id) = pending.queue.pop_front() {
                    pending.in_flight += 1;
                    break id;
                }
                pending = shared.loading_requests.wait(pending).unwrap();
            }
        };

        // No lock held while the codec does I/O.
        let payload = load_one(shared, id);

        shared
            .completed
            .lock()
            .unwrap()
            .push_back(LoadedResource { id, payload });

        let mut pending = shared.pending.lock().unwrap();
        pending.in_flight -= 1;
        if pending.queue.is_empty() && pending.in_flight == 0 {
            shared.all_loaded.notify_all();
        }
    }
}

/// Run the codec for one request.  Failures become a null payload plus an
/// error log; the completion is delivered either way so nothing upstream
/// blocks on a broken file.
fn load_one(shared: &LoaderShared, id: ResourceId) -> Option<Payload> {
    let codec = match shared.codecs.get(id.ty) {
        Some(codec) => codec,
        None => {
            log::error!("no codec registered for type {:08x}; resource {} left empty", id.ty, id);
            return None;
        }
    };

    match codec.load(&shared.arena, shared.bundle.as_ref(), id) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::error!("failed to load {} ({}): {}", id, types::name(id.ty), e);
            None
        }
    }
}
