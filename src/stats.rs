//! Event counters for the allocator and the process-exit report.
//!
//! The counters observe facade events; nothing in the allocator reads
//! them back, so they never influence placement decisions.

use core::fmt::{self, Display};
use core::sync::atomic::{AtomicUsize, Ordering};

/// Running counters, incremented by the facade as events happen.
#[derive(Default, Debug)]
pub struct HeapStats {
    mallocs: AtomicUsize,
    frees: AtomicUsize,
    reuses: AtomicUsize,
    grows: AtomicUsize,
    splits: AtomicUsize,
    coalesces: AtomicUsize,
    blocks: AtomicUsize,
    requested: AtomicUsize,
    max_heap: AtomicUsize,
}

impl HeapStats {
    pub const fn new() -> Self {
        HeapStats {
            mallocs: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
            reuses: AtomicUsize::new(0),
            grows: AtomicUsize::new(0),
            splits: AtomicUsize::new(0),
            coalesces: AtomicUsize::new(0),
            blocks: AtomicUsize::new(0),
            requested: AtomicUsize::new(0),
            max_heap: AtomicUsize::new(0),
        }
    }

    /// An allocation request for `size` raw (pre-alignment) bytes.
    #[inline(always)]
    pub fn record_request(&self, size: usize) {
        self.mallocs.fetch_add(1, Ordering::Relaxed);
        self.requested.fetch_add(size, Ordering::Relaxed);
    }

    /// A request satisfied from an existing free block.
    #[inline(always)]
    pub fn record_reuse(&self) {
        self.reuses.fetch_add(1, Ordering::Relaxed);
    }

    /// The heap grew by a new block of `size` payload bytes.
    #[inline(always)]
    pub fn record_grow(&self, size: usize) {
        self.grows.fetch_add(1, Ordering::Relaxed);
        self.blocks.fetch_add(1, Ordering::Relaxed);
        self.max_heap.fetch_add(size, Ordering::Relaxed);
    }

    /// A free block was split, adding one block to the chain.
    #[inline(always)]
    pub fn record_split(&self) {
        self.splits.fetch_add(1, Ordering::Relaxed);
        self.blocks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    /// Coalescing folded `merged` blocks into their predecessors.
    #[inline(always)]
    pub fn record_coalesce(&self, merged: usize) {
        self.coalesces.fetch_add(merged, Ordering::Relaxed);
        self.blocks.fetch_sub(merged, Ordering::Relaxed);
    }

    /// A point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            mallocs: self.mallocs.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            grows: self.grows.load(Ordering::Relaxed),
            splits: self.splits.load(Ordering::Relaxed),
            coalesces: self.coalesces.load(Ordering::Relaxed),
            blocks: self.blocks.load(Ordering::Relaxed),
            requested: self.requested.load(Ordering::Relaxed),
            max_heap: self.max_heap.load(Ordering::Relaxed),
        }
    }
}

/// Frozen counter values; `Display` renders the exit report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub mallocs: usize,
    pub frees: usize,
    pub reuses: usize,
    pub grows: usize,
    pub splits: usize,
    pub coalesces: usize,
    pub blocks: usize,
    pub requested: usize,
    pub max_heap: usize,
}

impl Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "heap management statistics")?;
        writeln!(f, "mallocs:\t{}", self.mallocs)?;
        writeln!(f, "frees:\t\t{}", self.frees)?;
        writeln!(f, "reuses:\t\t{}", self.reuses)?;
        writeln!(f, "grows:\t\t{}", self.grows)?;
        writeln!(f, "splits:\t\t{}", self.splits)?;
        writeln!(f, "coalesces:\t{}", self.coalesces)?;
        writeln!(f, "blocks:\t\t{}", self.blocks)?;
        writeln!(f, "requested:\t{}", self.requested)?;
        writeln!(f, "max heap:\t{}", self.max_heap)
    }
}
