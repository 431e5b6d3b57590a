use core::cmp;
use core::ptr::{self, NonNull};

use log::warn;

use super::heap_grower::HeapGrower;
use crate::blocklist::{align4, header_size, Block, BlockChain, Fit, Selector};
use crate::stats::HeapStats;

/// The allocator core: one grower, one block chain, one fit strategy.
///
/// Single-caller by design; the process-wide [`Heap`](super::Heap) facade
/// adds the one global lock the design allows for.
pub struct RawAlloc<G: HeapGrower> {
    pub grower: G,
    chain: BlockChain,
    selector: Selector,
    stats: HeapStats,
}

impl<G: HeapGrower> RawAlloc<G> {
    pub const fn new(grower: G, fit: Fit) -> Self {
        RawAlloc {
            grower,
            chain: BlockChain::new(),
            selector: Selector::new(fit),
            stats: HeapStats::new(),
        }
    }

    #[inline(always)]
    pub fn stats(&self) -> &HeapStats {
        &self.stats
    }

    #[inline(always)]
    pub fn chain(&self) -> &BlockChain {
        &self.chain
    }

    #[inline(always)]
    pub fn fit(&self) -> Fit {
        self.selector.fit()
    }

    /// Allocates `size` bytes and returns the payload address, or null on
    /// a zero-byte request or exhaustion.
    ///
    /// # Safety
    ///
    /// The caller must be the only one operating on this allocator.
    pub unsafe fn malloc(&mut self, size: usize) -> *mut u8 {
        if size == 0 {
            return ptr::null_mut();
        }
        self.stats.record_request(size);
        let aligned = align4(size);

        let scan = self.selector.select(&self.chain, aligned);
        let block = match scan.found {
            Some(found) => {
                if self.chain.split(found, aligned) {
                    self.stats.record_split();
                }
                self.stats.record_reuse();
                found
            }
            None => match self.grow(scan.last, aligned) {
                Some(grown) => grown,
                None => return ptr::null_mut(),
            },
        };
        block.set_free(false);
        block.payload().as_ptr()
    }

    /// Extends the heap by one used block of `size` payload bytes,
    /// appended after `last` (the chain tail).
    unsafe fn grow(&mut self, last: Option<Block>, size: usize) -> Option<Block> {
        match self.grower.grow_heap(header_size() + size) {
            Ok((ptr, got)) => {
                debug_assert!(got >= header_size() + size);
                let region = NonNull::new(ptr)?;
                let block = self.chain.append(region, got - header_size(), last);
                self.stats.record_grow(block.size());
                Some(block)
            }
            Err(err) => {
                warn!("heap growth of {} bytes failed: {:?}", size, err);
                None
            }
        }
    }

    /// Releases `ptr`. Null is a no-op; releasing a block that is not
    /// currently in use is a fatal assertion.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or an address previously returned by this
    /// allocator and not yet released.
    pub unsafe fn free(&mut self, ptr: *mut u8) {
        let Some(payload) = NonNull::new(ptr) else {
            return;
        };
        let block = Block::from_payload(payload);
        debug_assert!(
            self.chain.contains(block),
            "pointer does not belong to this heap"
        );
        assert!(!block.is_free(), "double free: block is already free");

        block.set_free(true);
        self.stats.record_free();

        let merged = self.chain.coalesce_from(block);
        if merged > 0 {
            self.stats.record_coalesce(merged);
            // The next-fit cursor may just have been folded away.
            self.selector.invalidate(&self.chain);
        }
    }

    /// Resizes the allocation at `ptr` to `new_size` bytes.
    ///
    /// A null `ptr` behaves like `malloc`; a zero `new_size` behaves like
    /// `free` and returns null. Otherwise a fresh block is allocated, the
    /// overlapping prefix copied, and the old block released. On
    /// exhaustion the old block is left untouched and null is returned.
    ///
    /// # Safety
    ///
    /// As for [`free`](Self::free).
    pub unsafe fn realloc(&mut self, ptr: *mut u8, new_size: usize) -> *mut u8 {
        if ptr.is_null() {
            return self.malloc(new_size);
        }
        if new_size == 0 {
            self.free(ptr);
            return ptr::null_mut();
        }

        let old = Block::from_payload(NonNull::new_unchecked(ptr));
        let old_size = old.size();
        let new_ptr = self.malloc(new_size);
        if new_ptr.is_null() {
            return ptr::null_mut();
        }
        ptr::copy_nonoverlapping(ptr, new_ptr, cmp::min(old_size, new_size));
        self.free(ptr);
        new_ptr
    }

    /// Allocates `count * size` bytes and zero-fills the whole payload.
    /// Returns null when the multiplication overflows.
    ///
    /// # Safety
    ///
    /// As for [`malloc`](Self::malloc).
    pub unsafe fn calloc(&mut self, count: usize, size: usize) -> *mut u8 {
        let Some(total) = count.checked_mul(size) else {
            return ptr::null_mut();
        };
        let payload = self.malloc(total);
        if !payload.is_null() {
            let block = Block::from_payload(NonNull::new_unchecked(payload));
            ptr::write_bytes(payload, 0, block.size());
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::ToyHeap;
    use core::slice;
    use test_log::test;

    fn allocator(fit: Fit) -> RawAlloc<ToyHeap> {
        RawAlloc::new(ToyHeap::with_capacity(4 * 1024), fit)
    }

    #[test]
    fn test_zero_size_returns_null() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            assert!(alloc.malloc(0).is_null());
        }
        assert_eq!(alloc.stats().snapshot().mallocs, 0);
    }

    #[test]
    fn test_payload_offsets_are_aligned() {
        let mut alloc = allocator(Fit::First);
        let base = alloc.grower.base() as usize;
        unsafe {
            for size in 1..40 {
                let ptr = alloc.malloc(size);
                assert!(!ptr.is_null());
                assert_eq!((ptr as usize - base) % 4, 0);
                let block = Block::from_payload(NonNull::new_unchecked(ptr));
                assert_eq!(block.size() % 4, 0);
                assert!(block.size() >= size);
            }
        }
        assert!(alloc.chain().audit().is_valid());
    }

    #[test]
    fn test_payload_survives_until_free() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            let a = alloc.malloc(32);
            let b = alloc.malloc(48);
            slice::from_raw_parts_mut(a, 32).fill(0xa5);
            slice::from_raw_parts_mut(b, 48).fill(0x5a);
            assert!(slice::from_raw_parts(a, 32).iter().all(|&v| v == 0xa5));
            assert!(slice::from_raw_parts(b, 48).iter().all(|&v| v == 0x5a));
            alloc.free(a);
            // b was not disturbed by the release next door.
            assert!(slice::from_raw_parts(b, 48).iter().all(|&v| v == 0x5a));
            alloc.free(b);
        }
    }

    #[test]
    fn test_reuse_avoids_growth() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            let a = alloc.malloc(10); // rounds to 12
            let _b = alloc.malloc(20);
            alloc.free(a);
            let c = alloc.malloc(8);
            // 12 - 8 leaves no room for a split, so the whole of a's
            // block comes back.
            assert_eq!(a, c);
        }
        let stats = alloc.stats().snapshot();
        assert_eq!(stats.mallocs, 3);
        assert_eq!(stats.reuses, 1);
        assert_eq!(stats.grows, 2);
        assert_eq!(stats.splits, 0);
        assert_eq!(stats.requested, 38);
        assert_eq!(stats.max_heap, 12 + 20);
    }

    #[test]
    fn test_coalesce_forward_run() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            let a = alloc.malloc(12);
            let b = alloc.malloc(20);
            let c = alloc.malloc(8);

            alloc.free(b); // neighbor c still used, nothing merges
            assert_eq!(alloc.stats().snapshot().coalesces, 0);
            assert_eq!(alloc.chain().len(), 3);

            alloc.free(a); // walk from a folds b in
            assert_eq!(alloc.stats().snapshot().coalesces, 1);
            assert_eq!(alloc.chain().len(), 2);
            let merged = alloc.chain().head().unwrap();
            assert!(merged.is_free());
            assert_eq!(merged.size(), 12 + 20 + header_size());

            alloc.free(c); // c is the tail; nothing ahead to fold
            assert_eq!(alloc.stats().snapshot().coalesces, 1);
            assert_eq!(alloc.chain().len(), 2);
        }
        assert!(alloc.chain().audit().is_valid());
    }

    #[test]
    fn test_release_at_head_folds_whole_run() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            let a = alloc.malloc(12);
            let b = alloc.malloc(20);
            let c = alloc.malloc(8);
            alloc.free(b);
            alloc.free(c);
            // b and c are both free but were released in an order no
            // forward walk could merge; the release of a reaches both.
            alloc.free(a);
        }
        let stats = alloc.stats().snapshot();
        assert_eq!(stats.coalesces, 2);
        assert_eq!(stats.blocks, 1);
        assert_eq!(alloc.chain().len(), 1);
        let lone = alloc.chain().head().unwrap();
        assert_eq!(lone.size(), 12 + 20 + 8 + 2 * header_size());
    }

    #[test]
    fn test_split_carves_exact_need() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            let big = alloc.malloc(100);
            alloc.free(big);

            let small = alloc.malloc(8);
            assert_eq!(small, big);
        }
        let stats = alloc.stats().snapshot();
        assert_eq!(stats.splits, 1);
        assert_eq!(stats.blocks, 2);
        let mut blocks = alloc.chain().iter();
        let used = blocks.next().unwrap();
        let remainder = blocks.next().unwrap();
        assert!(!used.is_free());
        assert_eq!(used.size(), 8);
        assert!(remainder.is_free());
        assert_eq!(remainder.size(), 100 - 8 - header_size());
        assert!(alloc.chain().audit().is_valid());
    }

    #[test]
    fn test_split_skipped_for_tiny_remainder() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            let p = alloc.malloc(3 * header_size());
            alloc.free(p);
            // Leftover capacity would be exactly one header: not worth a
            // split, the whole block comes back.
            let q = alloc.malloc(2 * header_size());
            assert_eq!(p, q);
            let block = Block::from_payload(NonNull::new_unchecked(q));
            assert_eq!(block.size(), 3 * header_size());
        }
        assert_eq!(alloc.stats().snapshot().splits, 0);
        assert_eq!(alloc.chain().len(), 1);
    }

    #[test]
    fn test_realloc_copies_and_releases() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            let p = alloc.malloc(16);
            slice::from_raw_parts_mut(p, 16).copy_from_slice(b"0123456789abcdef");

            let q = alloc.realloc(p, 64);
            assert_ne!(p, q);
            assert_eq!(slice::from_raw_parts(q, 16), b"0123456789abcdef");
            // The old block was released and is reusable.
            assert_eq!(alloc.stats().snapshot().frees, 1);
            let r = alloc.malloc(12);
            assert_eq!(r, p);
            alloc.free(r);

            // Shrinking copies only the overlapping prefix.
            let s = alloc.realloc(q, 4);
            assert_eq!(slice::from_raw_parts(s, 4), b"0123");
            alloc.free(s);
        }
    }

    #[test]
    fn test_realloc_degenerate_forms() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            // Null pointer: plain allocation.
            let p = alloc.realloc(ptr::null_mut(), 24);
            assert!(!p.is_null());
            assert_eq!(alloc.stats().snapshot().mallocs, 1);

            // Zero size: release plus null.
            let frees = alloc.stats().snapshot().frees;
            assert!(alloc.realloc(p, 0).is_null());
            assert_eq!(alloc.stats().snapshot().frees, frees + 1);
        }
    }

    #[test]
    fn test_calloc_zeroes_recycled_payload() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            let p = alloc.malloc(24);
            slice::from_raw_parts_mut(p, 24).fill(0xff);
            alloc.free(p);

            let q = alloc.calloc(6, 4);
            assert_eq!(q, p);
            assert!(slice::from_raw_parts(q, 24).iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn test_calloc_overflow_returns_null() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            assert!(alloc.calloc(usize::MAX, 2).is_null());
        }
        // Overflow is rejected before any allocation happens.
        assert_eq!(alloc.stats().snapshot().mallocs, 0);
    }

    #[test]
    fn test_exhaustion_returns_null() {
        let mut alloc = RawAlloc::new(ToyHeap::with_capacity(64), Fit::First);
        unsafe {
            assert!(alloc.malloc(4096).is_null());
        }
        let stats = alloc.stats().snapshot();
        assert_eq!(stats.mallocs, 1);
        assert_eq!(stats.grows, 0);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn test_double_free_aborts() {
        let mut alloc = allocator(Fit::First);
        unsafe {
            let p = alloc.malloc(16);
            alloc.free(p);
            alloc.free(p);
        }
    }

    #[test]
    fn test_block_count_matches_chain() {
        let mut alloc = allocator(Fit::Best);
        unsafe {
            let mut live = std::vec::Vec::new();
            for i in 1..24 {
                live.push(alloc.malloc(i * 4));
            }
            for ptr in live.drain(..).step_by(2) {
                alloc.free(ptr);
            }
            let _ = alloc.malloc(64);
        }
        let stats = alloc.stats().snapshot();
        assert_eq!(stats.blocks, alloc.chain().len());
        assert!(alloc.chain().audit().is_valid());
    }
}
