use super::arena::HeapArena;
use super::heap_grower::HeapGrower;

/// An in-memory grower over a fixed arena, for exercising the allocator
/// without touching the program break.
///
/// Extensions are handed out bump-style and are therefore contiguous by
/// construction. Unlike a paging OS it grows by exactly the requested
/// size, which keeps block layouts predictable in tests.
pub struct ToyHeap {
    used: usize,
    arena: HeapArena,
}

impl ToyHeap {
    pub fn with_capacity(bytes: usize) -> Self {
        ToyHeap {
            used: 0,
            arena: HeapArena::new(bytes),
        }
    }

    /// Bytes handed out so far.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Start of the arena; the base address of the block chain.
    pub fn base(&self) -> *const u8 {
        self.arena.as_ptr()
    }
}

impl Default for ToyHeap {
    fn default() -> Self {
        Self::with_capacity(64 * 1024)
    }
}

/// The arena is full; maps to an exhaustion (null) result at the facade.
#[derive(Debug)]
pub struct ToyHeapExhaustedError;

impl HeapGrower for ToyHeap {
    type Err = ToyHeapExhaustedError;

    unsafe fn grow_heap(&mut self, size: usize) -> Result<(*mut u8, usize), ToyHeapExhaustedError> {
        if size > self.arena.len() - self.used {
            return Err(ToyHeapExhaustedError);
        }
        let ptr = self.arena.as_ptr().add(self.used);
        self.used += size;
        Ok((ptr, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::header_size;
    use test_log::test;

    #[test]
    fn test_grow_is_contiguous_and_exact() {
        let mut heap = ToyHeap::with_capacity(1024);
        unsafe {
            let (a, got_a) = heap.grow_heap(40).unwrap();
            let (b, got_b) = heap.grow_heap(24).unwrap();
            assert_eq!(got_a, 40);
            assert_eq!(got_b, 24);
            assert_eq!(a.add(40), b);
        }
        assert_eq!(heap.used(), 64);
    }

    #[test]
    fn test_grow_exhausts() {
        let mut heap = ToyHeap::with_capacity(64);
        unsafe {
            heap.grow_heap(48).unwrap();
            assert!(heap.grow_heap(header_size() + 32).is_err());
            // A request that still fits must succeed after the failure.
            heap.grow_heap(16).unwrap();
        }
    }
}
