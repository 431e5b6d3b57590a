use core::fmt;

#[cfg(unix)]
use errno::{errno, Errno};
#[cfg(unix)]
use log::{debug, warn};

/// Source of additional contiguous address space.
///
/// Growth is synchronous and never retried: it either extends the region
/// immediately or fails immediately. Implementations must hand out
/// address-ascending, gap-free regions; the chain asserts this on append.
pub trait HeapGrower {
    type Err: fmt::Debug;

    /// Requests at least `size` more bytes, returning the start of the
    /// extension and the number of bytes actually obtained.
    ///
    /// # Safety
    ///
    /// The returned region must be writable and owned exclusively by the
    /// caller until process exit.
    unsafe fn grow_heap(&mut self, size: usize) -> Result<(*mut u8, usize), Self::Err>;
}

/// Grows the heap by moving the program break with `sbrk(2)`.
///
/// The break is a single shared resource: if anything else in the process
/// moves it between our extensions, the region is no longer contiguous and
/// the allocator cannot continue, so that case is a fatal assertion rather
/// than an error.
#[cfg(unix)]
#[derive(Debug)]
pub struct SbrkGrower {
    brk_end: *mut u8,
}

#[cfg(unix)]
impl SbrkGrower {
    pub const fn new() -> Self {
        SbrkGrower {
            brk_end: core::ptr::null_mut(),
        }
    }
}

#[cfg(unix)]
impl Default for SbrkGrower {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl HeapGrower for SbrkGrower {
    type Err = Errno;

    unsafe fn grow_heap(&mut self, size: usize) -> Result<(*mut u8, usize), Errno> {
        if size == 0 {
            return Ok((core::ptr::null_mut(), 0));
        }
        if size > isize::MAX as usize {
            return Err(Errno(libc::ENOMEM));
        }
        let ptr = libc::sbrk(size as libc::intptr_t);
        if ptr == usize::MAX as *mut libc::c_void {
            let err = errno();
            warn!("sbrk({}) failed: {}", size, err);
            return Err(err);
        }
        let ptr = ptr as *mut u8;
        if !self.brk_end.is_null() {
            assert!(
                ptr == self.brk_end,
                "program break moved by an external actor; heap is no longer contiguous"
            );
        }
        self.brk_end = ptr.add(size);
        debug!("heap grown by {} bytes at {:p}", size, ptr);
        Ok((ptr, size))
    }
}
