use core::fmt::{self, Write as _};
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use spin::Mutex;

use super::heap_grower::SbrkGrower;
use super::raw_alloc::RawAlloc;
use crate::blocklist::Fit;
use crate::stats::StatsSnapshot;

/// The process-wide allocator: [`RawAlloc`] over the program break behind
/// one global lock.
///
/// Const-constructible so it can live in a `static`; the underlying chain
/// is populated lazily on the first allocation and never torn down.
///
/// ```rust,ignore
/// use fitalloc::{Fit, Heap};
///
/// static HEAP: Heap = Heap::new(Fit::First);
///
/// let p = unsafe { HEAP.malloc(128) };
/// unsafe { HEAP.free(p) };
/// ```
pub struct Heap {
    inner: Mutex<RawAlloc<SbrkGrower>>,
}

impl Heap {
    pub const fn new(fit: Fit) -> Self {
        Heap {
            inner: Mutex::new(RawAlloc::new(SbrkGrower::new(), fit)),
        }
    }

    /// See [`RawAlloc::malloc`].
    ///
    /// # Safety
    ///
    /// The returned region is valid until passed to [`free`](Self::free)
    /// or [`realloc`](Self::realloc).
    #[inline]
    pub unsafe fn malloc(&self, size: usize) -> *mut u8 {
        self.inner.lock().malloc(size)
    }

    /// See [`RawAlloc::free`].
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live allocation from this heap.
    #[inline]
    pub unsafe fn free(&self, ptr: *mut u8) {
        self.inner.lock().free(ptr)
    }

    /// See [`RawAlloc::realloc`].
    ///
    /// # Safety
    ///
    /// As for [`free`](Self::free).
    #[inline]
    pub unsafe fn realloc(&self, ptr: *mut u8, size: usize) -> *mut u8 {
        self.inner.lock().realloc(ptr, size)
    }

    /// See [`RawAlloc::calloc`].
    ///
    /// # Safety
    ///
    /// As for [`malloc`](Self::malloc).
    #[inline]
    pub unsafe fn calloc(&self, count: usize, size: usize) -> *mut u8 {
        self.inner.lock().calloc(count, size)
    }

    /// Current counter values.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.lock().stats().snapshot()
    }
}

static EXIT_HEAP: AtomicPtr<Heap> = AtomicPtr::new(ptr::null_mut());
static EXIT_REGISTERED: AtomicBool = AtomicBool::new(false);

/// Arranges for `heap`'s statistics report to be written to stdout when
/// the process exits. Only the first registration takes effect.
pub fn register_exit_report(heap: &'static Heap) {
    EXIT_HEAP.store(heap as *const Heap as *mut Heap, Ordering::Release);
    if EXIT_REGISTERED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
    {
        unsafe {
            libc::atexit(report_at_exit);
        }
    }
}

extern "C" fn report_at_exit() {
    let heap = EXIT_HEAP.load(Ordering::Acquire);
    if heap.is_null() {
        return;
    }
    let snapshot = unsafe { (*heap).stats() };

    // Render into a fixed buffer and write(2) it out: the formatting must
    // not itself allocate while the process is tearing down.
    let mut buf = ReportBuf::new();
    let _ = write!(buf, "\n{}", snapshot);
    unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            buf.as_bytes().as_ptr() as *const libc::c_void,
            buf.as_bytes().len(),
        );
    }
}

struct ReportBuf {
    buf: [u8; 512],
    len: usize,
}

impl ReportBuf {
    const fn new() -> Self {
        ReportBuf {
            buf: [0; 512],
            len: 0,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Write for ReportBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let remaining = self.buf.len() - self.len;
        let n = s.len().min(remaining);
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}
