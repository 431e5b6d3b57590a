use core::mem;
use core::ptr::NonNull;

/// Payload sizes are rounded up to a multiple of this.
pub const ALIGNMENT: usize = 4;

/// Block metadata, immediately followed in memory by its payload.
///
/// Payload sizes are multiples of 4, so a header may start on any 4-byte
/// boundary; `packed(4)` caps the struct alignment accordingly. Fields are
/// only ever read and written through raw pointers (see `Block`), never by
/// reference.
#[repr(C, packed(4))]
pub struct BlockHeader {
    pub(crate) size: usize,
    pub(crate) next: Option<NonNull<BlockHeader>>,
    pub(crate) free: bool,
}

/// Footprint of one header in bytes.
#[inline(always)]
pub const fn header_size() -> usize {
    mem::size_of::<BlockHeader>()
}

/// Rounds `size` up to the next multiple of [`ALIGNMENT`].
#[inline(always)]
pub const fn align4(size: usize) -> usize {
    (size + (ALIGNMENT - 1)) & !(ALIGNMENT - 1)
}
