use core::ops::Range;
use core::ptr::NonNull;

use super::header::{header_size, BlockHeader};
use crate::relation::Relation;

/// A copyable handle over one block header in the chain.
///
/// The handle carries no ownership; headers live inside the grown region
/// and belong to the chain for the life of the process. All field access
/// goes through raw pointers because `BlockHeader` is `packed(4)`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Block {
    header: NonNull<BlockHeader>,
}

impl Block {
    /// Writes a fresh header at `ptr` and returns a handle to it.
    ///
    /// # Safety
    ///
    /// `ptr` must point at `header_size() + size` writable bytes that are
    /// not part of any other block.
    #[inline]
    pub(crate) unsafe fn init(ptr: NonNull<u8>, size: usize, free: bool) -> Block {
        let header = ptr.cast::<BlockHeader>();
        header.as_ptr().write(BlockHeader {
            size,
            next: None,
            free,
        });
        Block { header }
    }

    /// Recovers the owning block from a payload address.
    ///
    /// This is the single audited site of the fixed-offset arithmetic: the
    /// header always immediately precedes the payload it describes.
    ///
    /// # Safety
    ///
    /// `payload` must be an address previously returned by this allocator
    /// and still backed by a live header.
    #[inline]
    pub(crate) unsafe fn from_payload(payload: NonNull<u8>) -> Block {
        let header = payload.as_ptr().sub(header_size()) as *mut BlockHeader;
        Block {
            header: NonNull::new_unchecked(header),
        }
    }

    /// Address of the caller-visible payload region.
    #[inline(always)]
    pub fn payload(self) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked((self.header.as_ptr() as *mut u8).add(header_size())) }
    }

    #[inline(always)]
    pub fn size(self) -> usize {
        unsafe { (*self.header.as_ptr()).size }
    }

    #[inline(always)]
    pub fn is_free(self) -> bool {
        unsafe { (*self.header.as_ptr()).free }
    }

    #[inline(always)]
    pub fn next(self) -> Option<Block> {
        let next = unsafe { (*self.header.as_ptr()).next };
        next.map(|header| Block { header })
    }

    #[inline(always)]
    pub(crate) fn set_size(self, size: usize) {
        unsafe { (*self.header.as_ptr()).size = size }
    }

    #[inline(always)]
    pub(crate) fn set_free(self, free: bool) {
        unsafe { (*self.header.as_ptr()).free = free }
    }

    #[inline(always)]
    pub(crate) fn set_next(self, next: Option<Block>) {
        unsafe { (*self.header.as_ptr()).next = next.map(|b| b.header) }
    }

    /// Full footprint of the block: header start to payload end.
    #[inline]
    pub fn as_range(self) -> Range<*const u8> {
        let start = self.header.as_ptr() as *const u8;
        unsafe { start..start.add(header_size() + self.size()) }
    }

    /// Address-order relation of this block's footprint to `other`'s.
    pub fn relation(self, other: Block) -> Relation {
        let this = self.as_range();
        let that = other.as_range();
        if this.end < that.start {
            Relation::Before
        } else if this.end == that.start {
            Relation::AdjacentBefore
        } else if this.start < that.end {
            Relation::Overlapping
        } else if this.start == that.end {
            Relation::AdjacentAfter
        } else {
            Relation::After
        }
    }
}

impl core::fmt::Debug for Block {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Block")
            .field("header", &self.header)
            .field("size", &self.size())
            .field("free", &self.is_free())
            .finish()
    }
}
