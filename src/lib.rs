//! A user-space heap allocator with pluggable fit strategies.
//!
//! The allocator owns one contiguous region of address space, grown on
//! demand through a [`HeapGrower`] and carved into blocks tracked in an
//! intrusive singly linked chain:
//!
//! ```text
//!   ┌────────┬─────────────┬────────┬──────────┬────────┬───────┐
//!   │ header │   payload   │ header │ payload  │ header │  ...  │
//!   └────────┴─────────────┴────────┴──────────┴────────┴───────┘
//!        │        ▲             │                   ▲
//!        │ next   └── pointer   └───────────────────┘
//!        └── handed to caller        next
//! ```
//!
//! Each header records its payload size (always a multiple of 4), a free
//! flag, and the next block in address order. Allocation scans the chain
//! under one of four fit strategies ([`Fit`]), splitting oversized free
//! blocks; release coalesces forward runs of free neighbors. Memory is
//! never returned to the operating system.
//!
//! [`RawAlloc`] is the single-caller core; [`Heap`] wraps it in one global
//! lock and exposes the C-shaped `malloc`/`free`/`realloc`/`calloc`
//! entry points, plus an optional process-exit statistics report.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod allocators;
pub mod blocklist;
mod relation;
pub mod stats;

#[cfg(unix)]
pub use allocators::{register_exit_report, Heap, SbrkGrower};
pub use allocators::{HeapGrower, RawAlloc, ToyHeap};
pub use blocklist::{BlockChain, Fit};
pub use relation::Relation;
pub use stats::{HeapStats, StatsSnapshot};
