use std::sync::atomic::{AtomicU32, Ordering};

/// SAFETY & MEMORY ORDERING:
///
/// This header defines the first 16 bytes of every shared memory ring.
/// Every field is stored little-endian regardless of the host byte order,
/// so that peers written in other languages can read it as raw bytes.
///
/// Producer protocol:
/// 1. Write length prefix and payload bytes into the data area
/// 2. Publish the new `head` with `Ordering::Release`
///
/// Consumer protocol:
/// 1. Load `head` with `Ordering::Acquire`
/// 2. Copy out payload bytes, which are guaranteed visible
/// 3. Publish the new `tail` with `Ordering::Release`
///
/// The producer loads `tail` with `Ordering::Acquire` before reusing space,
/// so the consumer's copies happen-before the bytes are overwritten.
///
/// `head` is only ever stored by the producer and `tail` only by the
/// consumer. `capacity` is stored once by the producer when the ring is
/// bound and never changes afterwards.
///
/// Alignment:
/// `#[repr(C, align(4))]` keeps every AtomicU32 naturally aligned, which is
/// required for atomic operations on the mapped memory.
#[repr(C, align(4))]
pub struct RingHeader {
    /// Producer write cursor. Monotonically increasing, wraps modulo 2^32.
    head: AtomicU32,
    /// Consumer read cursor. Monotonically increasing, wraps modulo 2^32.
    tail: AtomicU32,
    /// Data area size in bytes, always a power of two.
    capacity: AtomicU32,
    reserved: AtomicU32,
}

impl RingHeader {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    #[inline]
    pub fn head(&self, order: Ordering) -> u32 {
        u32::from_le(self.head.load(order))
    }

    #[inline]
    pub fn set_head(&self, head: u32, order: Ordering) {
        self.head.store(head.to_le(), order);
    }

    #[inline]
    pub fn tail(&self, order: Ordering) -> u32 {
        u32::from_le(self.tail.load(order))
    }

    #[inline]
    pub fn set_tail(&self, tail: u32, order: Ordering) {
        self.tail.store(tail.to_le(), order);
    }

    #[inline]
    pub fn capacity(&self, order: Ordering) -> u32 {
        u32::from_le(self.capacity.load(order))
    }

    /// Reset both cursors and publish `capacity`.
    ///
    /// The capacity store is the release point: a consumer that observes the
    /// new capacity with `Acquire` also observes the zeroed cursors.
    pub(crate) fn initialize(&self, capacity: u32) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
        self.reserved.store(0, Ordering::Relaxed);
        self.capacity.store(capacity.to_le(), Ordering::Release);
    }
}
