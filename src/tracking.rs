//! An allocator wrapper that counts what passes through it.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::alloc::{Address, Alloc, DefaultAlloc, Kind};

/// Snapshot of a [`Tracking`] allocator's counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
    pub allocs: usize,
    pub frees: usize,
    pub live_bytes: usize,
}

impl AllocStats {
    /// Allocations not yet freed.
    pub fn outstanding(&self) -> usize {
        self.allocs - self.frees
    }
}

#[derive(Default)]
struct Counters {
    allocs: Cell<usize>,
    frees: Cell<usize>,
    live_bytes: Cell<usize>,
}

/// Forwards to `A` and counts every allocate and free call.
///
/// Clones share one set of counters, so a test can keep a handle while
/// owners hold others.
#[derive(Clone)]
pub struct Tracking<A: Alloc = DefaultAlloc> {
    inner: A,
    counters: Rc<Counters>,
}

impl Tracking<DefaultAlloc> {
    pub fn new() -> Self {
        Tracking::wrap(DefaultAlloc)
    }
}

impl Default for Tracking<DefaultAlloc> {
    fn default() -> Self { Tracking::new() }
}

impl<A: Alloc> Tracking<A> {
    pub fn wrap(inner: A) -> Self {
        Tracking { inner, counters: Rc::new(Counters::default()) }
    }

    pub fn stats(&self) -> AllocStats {
        AllocStats {
            allocs: self.counters.allocs.get(),
            frees: self.counters.frees.get(),
            live_bytes: self.counters.live_bytes.get(),
        }
    }
}

unsafe impl<A: Alloc> Alloc for Tracking<A> {
    fn oom(&mut self, kind: Kind) -> ! {
        self.inner.oom(kind)
    }

    unsafe fn alloc(&mut self, kind: Kind) -> Address {
        let p = self.inner.alloc(kind);
        if !p.is_null() {
            let c = &self.counters;
            c.allocs.set(c.allocs.get() + 1);
            c.live_bytes.set(c.live_bytes.get() + kind.size());
            trace!(?kind, ptr = ?p, allocs = c.allocs.get(), "tracked alloc");
        }
        p
    }

    unsafe fn dealloc(&mut self, ptr: Address, kind: Kind) {
        let c = &self.counters;
        debug_assert!(c.frees.get() < c.allocs.get(), "free without matching alloc");
        c.frees.set(c.frees.get() + 1);
        c.live_bytes.set(c.live_bytes.get().saturating_sub(kind.size()));
        trace!(?kind, ?ptr, frees = c.frees.get(), "tracked dealloc");
        self.inner.dealloc(ptr, kind)
    }
}
