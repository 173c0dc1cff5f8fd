//! Heap-backed memory for running a ring inside a single process.

use std::alloc::{Layout, alloc_zeroed, dealloc, handle_alloc_error};
use std::ptr::NonNull;

/// Alignment of every span; one cache line keeps the header off shared lines.
pub const SPAN_ALIGN: usize = 64;

/// A zeroed, cache-line aligned allocation a [`crate::RingBuffer`] can bind to.
///
/// Useful for tests, benchmarks and threads in one process that want the same
/// wire layout as a shared memory segment.
#[derive(Debug)]
pub struct AlignedSpan {
    ptr: NonNull<u8>,
    layout: Layout,
    len: usize,
}

// Plain owned memory; access is coordinated by the ring bound to it
unsafe impl Send for AlignedSpan {}
unsafe impl Sync for AlignedSpan {}

impl AlignedSpan {
    /// Allocate `len` zeroed bytes.
    ///
    /// # Panics
    ///
    /// Panics if `len` rounded up to [`SPAN_ALIGN`] overflows `isize`.
    pub fn new(len: usize) -> Self {
        let layout = Layout::from_size_align(len.max(1), SPAN_ALIGN)
            .unwrap_or_else(|_| panic!("span of {len} bytes is too large"));

        // SAFETY: layout has a non-zero size
        let ptr = unsafe { alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            handle_alloc_error(layout);
        };

        Self { ptr, layout, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Base pointer to hand to [`crate::RingBuffer::bind`].
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for AlignedSpan {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with this exact layout
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_is_zeroed_and_aligned() {
        let span = AlignedSpan::new(1000);

        assert_eq!(span.len(), 1000);
        assert_eq!(span.as_mut_ptr() as usize % SPAN_ALIGN, 0);

        let bytes = unsafe { std::slice::from_raw_parts(span.as_mut_ptr(), span.len()) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_span() {
        let span = AlignedSpan::new(0);
        assert!(span.is_empty());
        assert!(!span.as_mut_ptr().is_null());
    }
}
