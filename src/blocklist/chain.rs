use core::fmt;
use core::ptr::NonNull;

use super::block::Block;
use super::header::header_size;
use super::validity::Validity;
use crate::relation::Relation;

/// The address-ascending chain of every block ever carved from the heap.
///
/// Blocks are only ever appended (growth), spliced in (split) or folded
/// away (coalesce); the chain is never reordered and nothing is handed
/// back to the operating system.
pub struct BlockChain {
    head: Option<Block>,
}

impl BlockChain {
    #[inline(always)]
    pub const fn new() -> Self {
        BlockChain { head: None }
    }

    #[inline(always)]
    pub fn head(&self) -> Option<Block> {
        self.head
    }

    #[inline(always)]
    pub fn iter(&self) -> BlockIter {
        BlockIter { next: self.head }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Whether `block` is currently a member of the chain.
    pub fn contains(&self, block: Block) -> bool {
        self.iter().any(|b| b == block)
    }

    /// Appends a freshly grown region as a used block after `last` (the
    /// chain tail), or establishes it as the head of an empty chain.
    ///
    /// The region must extend the heap contiguously: a gap means some
    /// external actor moved the program break, which the allocator cannot
    /// survive, so that is fatal rather than recoverable.
    ///
    /// # Safety
    ///
    /// `region` must point at `header_size() + size` writable bytes not
    /// overlapping any existing block.
    pub unsafe fn append(&mut self, region: NonNull<u8>, size: usize, last: Option<Block>) -> Block {
        let block = Block::init(region, size, false);
        match last {
            Some(tail) => {
                debug_assert!(tail.next().is_none(), "append point is not the chain tail");
                assert!(
                    tail.as_range().end == region.as_ptr() as *const u8,
                    "heap growth was not contiguous with the previous extension"
                );
                tail.set_next(Some(block));
            }
            None => {
                debug_assert!(self.head.is_none());
                self.head = Some(block);
            }
        }
        block
    }

    /// Shrinks `block` to `needed` bytes and splices the remainder in as a
    /// new free block, if the remainder is worth keeping.
    ///
    /// A remainder whose footprint would not exceed one header is left
    /// inside the block instead (internal fragmentation beats an unusably
    /// small free block). Returns whether a split happened.
    pub fn split(&mut self, block: Block, needed: usize) -> bool {
        debug_assert!(block.size() >= needed);
        if block.size() - needed <= header_size() {
            return false;
        }
        let remainder_size = block.size() - needed - header_size();
        unsafe {
            let remainder_ptr = NonNull::new_unchecked(block.payload().as_ptr().add(needed));
            let remainder = Block::init(remainder_ptr, remainder_size, true);
            remainder.set_next(block.next());
            block.set_next(Some(remainder));
        }
        block.set_size(needed);
        true
    }

    /// Folds the run of free blocks following `start` into it.
    ///
    /// Walks forward while both the block and its successor are free,
    /// absorbing the successor's header and payload; stops at the first
    /// used block or the chain end. Never looks backward: a free
    /// predecessor is only merged by a later walk starting at or before
    /// it. Returns the number of blocks folded away.
    pub fn coalesce_from(&mut self, start: Block) -> usize {
        let mut merged = 0;
        while start.is_free() {
            let Some(next) = start.next() else { break };
            if !next.is_free() {
                break;
            }
            start.set_size(start.size() + header_size() + next.size());
            start.set_next(next.next());
            merged += 1;
        }
        merged
    }

    /// Walks the chain checking the structural invariants: blocks strictly
    /// ascending, each one ending exactly where its successor starts.
    pub fn audit(&self) -> Validity {
        let validity = Validity::default();
        let mut previous: Option<Block> = None;
        for block in self.iter() {
            if let Some(prev) = previous {
                match prev.relation(block) {
                    Relation::AdjacentBefore => {}
                    Relation::Before => validity.record_gap(),
                    Relation::Overlapping => validity.record_overlap(),
                    Relation::AdjacentAfter | Relation::After => validity.record_out_of_order(),
                }
            }
            previous = Some(block);
        }
        validity
    }
}

impl Default for BlockChain {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub struct BlockIter {
    next: Option<Block>,
}

impl Iterator for BlockIter {
    type Item = Block;

    #[inline]
    fn next(&mut self) -> Option<Block> {
        let current = self.next?;
        self.next = current.next();
        Some(current)
    }
}

impl fmt::Debug for BlockChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
