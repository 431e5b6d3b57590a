mod arena;
#[cfg(unix)]
mod heap;
mod heap_grower;
mod raw_alloc;
mod toy_heap;

pub use arena::HeapArena;
#[cfg(unix)]
pub use heap::{register_exit_report, Heap};
pub use heap_grower::HeapGrower;
#[cfg(unix)]
pub use heap_grower::SbrkGrower;
pub use raw_alloc::RawAlloc;
pub use toy_heap::{ToyHeap, ToyHeapExhaustedError};
