extern crate alloc;

use alloc::alloc::{alloc_zeroed, dealloc, Layout};
use core::ptr::NonNull;

/// An owned, 16-aligned byte buffer with a stable address.
///
/// Backs [`ToyHeap`](super::ToyHeap): blocks point into the buffer, so it
/// must not move while the grower does, which a heap allocation (unlike an
/// inline array) guarantees.
pub struct HeapArena {
    ptr: NonNull<u8>,
    len: usize,
}

impl HeapArena {
    const ALIGN: usize = 16;

    /// Allocates a zeroed arena of `len` bytes.
    pub fn new(len: usize) -> Self {
        let layout = Layout::from_size_align(len, Self::ALIGN).expect("arena layout");
        let ptr = unsafe { alloc_zeroed(layout) };
        HeapArena {
            ptr: NonNull::new(ptr).expect("arena allocation failed"),
            len,
        }
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for HeapArena {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.len, Self::ALIGN).expect("arena layout");
        unsafe { dealloc(self.ptr.as_ptr(), layout) };
    }
}
