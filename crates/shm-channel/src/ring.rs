//! Single-producer/single-consumer byte ring over a raw memory span.
//!
//! Layout:
//!
//! ```text
//! +---------------------------+------------------------------------------+
//! | RingHeader (16 bytes)     | Data area (capacity bytes, circular)     |
//! | head | tail | cap | rsvd  |                                          |
//! +---------------------------+------------------------------------------+
//!                               Message:
//!                               [u32 LE length][length payload bytes]
//!                               positions taken modulo capacity
//! ```
//!
//! `head` and `tail` are absolute, monotonically increasing byte cursors.
//! `head - tail` (mod 2^32) is the number of unread bytes and never exceeds
//! `capacity`. The ring is addressed only through offsets from the span
//! base, so peers may map the span at different addresses.
//!
//! Exactly one producer and one consumer may be bound to a span. This is a
//! precondition of [`RingBuffer::bind`], not something checked at runtime.

use crate::errors::RingError;
use crate::header::RingHeader;
use crate::layout::{HEADER_SIZE, LENGTH_PREFIX_SIZE, MAX_CAPACITY, MIN_CAPACITY};
use std::ptr::{self, NonNull};
use std::sync::atomic::Ordering;

const PREFIX: u32 = LENGTH_PREFIX_SIZE as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Initializes the header, writes messages, advances `head`.
    Producer,
    /// Reads the published capacity, reads messages, advances `tail`.
    Consumer,
}

#[derive(Debug)]
pub struct RingBuffer {
    header: NonNull<RingHeader>,
    data: NonNull<u8>,
    capacity: u32,
    mask: u32,
    role: Role,
}

// The binding only holds offsets into memory it does not own; moving it to
// another thread is fine as long as the SPSC precondition of `bind` holds.
unsafe impl Send for RingBuffer {}

impl RingBuffer {
    /// Bind a ring to the `len` bytes starting at `base`.
    ///
    /// The producer computes the capacity as `len - HEADER_SIZE` rounded down
    /// to a power of two, resets both cursors and publishes the header. The
    /// consumer reads the capacity the producer published and never resets.
    ///
    /// # Safety
    ///
    /// - `base` must stay mapped, readable and writable for `len` bytes for as
    ///   long as the returned ring (and anything it is moved into) is alive.
    /// - At most one producer and one consumer may be bound to the same
    ///   memory at a time, across all processes.
    /// - A consumer must only bind after the producer has bound.
    pub unsafe fn bind(base: *mut u8, len: usize, role: Role) -> Result<Self, RingError> {
        let base = NonNull::new(base).ok_or(RingError::NullSpan)?;
        if len < HEADER_SIZE {
            return Err(RingError::SpanTooSmall { len });
        }
        let align = std::mem::align_of::<RingHeader>();
        if base.as_ptr() as usize % align != 0 {
            return Err(RingError::Misaligned { align });
        }

        let header = base.cast::<RingHeader>();
        // SAFETY: len >= HEADER_SIZE, so the data area starts inside the span
        let data = unsafe { base.add(HEADER_SIZE) };
        let data_len = len - HEADER_SIZE;
        // SAFETY: aligned, in bounds, and only accessed through atomics
        let shared = unsafe { header.as_ref() };

        let capacity = match role {
            Role::Producer => {
                let capacity = round_down_pow2(u32::try_from(data_len).unwrap_or(u32::MAX));
                if capacity < MIN_CAPACITY {
                    return Err(RingError::InvalidCapacity { capacity, len });
                }
                shared.initialize(capacity);
                capacity
            }
            Role::Consumer => {
                let capacity = shared.capacity(Ordering::Acquire);
                if !capacity.is_power_of_two()
                    || !(MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity)
                    || capacity as usize > data_len
                {
                    return Err(RingError::InvalidCapacity { capacity, len });
                }
                capacity
            }
        };

        Ok(Self {
            header,
            data,
            capacity,
            mask: capacity - 1,
            role,
        })
    }

    /// Append one length-prefixed message.
    ///
    /// Returns false, leaving the ring untouched, when the message does not
    /// fit in the free space, when `payload` is empty, or when it is too long
    /// to frame with a 32-bit length.
    pub fn write(&mut self, payload: &[u8]) -> bool {
        debug_assert_eq!(self.role, Role::Producer, "write on a consumer binding");

        // A zero length prefix reads as "not yet published" forever
        if payload.is_empty() {
            return false;
        }
        let Some(total) = u32::try_from(payload.len())
            .ok()
            .and_then(|len| len.checked_add(PREFIX))
        else {
            return false;
        };

        let header = self.header();
        let head = header.head(Ordering::Relaxed);
        let tail = header.tail(Ordering::Acquire);
        if self.free(head, tail) < total {
            return false;
        }

        let len = total - PREFIX;
        self.copy_in(head, &len.to_le_bytes());
        self.copy_in(head.wrapping_add(PREFIX), payload);

        header.set_head(head.wrapping_add(total), Ordering::Release);
        true
    }

    /// Copy the next message into `out` and return its length.
    ///
    /// Returns 0 when no complete message is published yet. A message longer
    /// than `out` is consumed and discarded, and 0 is returned.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        debug_assert_eq!(self.role, Role::Consumer, "read on a producer binding");

        let header = self.header();
        let tail = header.tail(Ordering::Relaxed);
        let head = header.head(Ordering::Acquire);

        let Some(len) = self.published_len(head, tail) else {
            return 0;
        };
        let next_tail = tail.wrapping_add(len + PREFIX);
        let len = len as usize;

        if len > out.len() {
            header.set_tail(next_tail, Ordering::Release);
            return 0;
        }

        self.copy_out(tail.wrapping_add(PREFIX), &mut out[..len]);
        header.set_tail(next_tail, Ordering::Release);
        len
    }

    /// Read the next message into a freshly allocated buffer of exactly its size.
    pub fn read_message(&mut self) -> Option<Vec<u8>> {
        debug_assert_eq!(self.role, Role::Consumer, "read on a producer binding");

        let header = self.header();
        let tail = header.tail(Ordering::Relaxed);
        let head = header.head(Ordering::Acquire);

        let len = self.published_len(head, tail)?;
        let mut payload = vec![0u8; len as usize];
        self.copy_out(tail.wrapping_add(PREFIX), &mut payload);
        header.set_tail(tail.wrapping_add(len + PREFIX), Ordering::Release);
        Some(payload)
    }

    pub fn writable_bytes(&self) -> usize {
        let header = self.header();
        let head = header.head(Ordering::Acquire);
        let tail = header.tail(Ordering::Acquire);
        self.free(head, tail) as usize
    }

    pub fn readable_bytes(&self) -> usize {
        let header = self.header();
        let tail = header.tail(Ordering::Acquire);
        let head = header.head(Ordering::Acquire);
        head.wrapping_sub(tail) as usize
    }

    /// True once at least a length prefix is buffered.
    pub fn has_data(&self) -> bool {
        self.readable_bytes() >= LENGTH_PREFIX_SIZE
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn header(&self) -> &RingHeader {
        // SAFETY: `bind` checked alignment and bounds; the caller of `bind`
        // keeps the span alive for the lifetime of `self`
        unsafe { self.header.as_ref() }
    }

    fn free(&self, head: u32, tail: u32) -> u32 {
        self.capacity.saturating_sub(head.wrapping_sub(tail))
    }

    /// Length of the message at `tail`, if it is completely published.
    fn published_len(&self, head: u32, tail: u32) -> Option<u32> {
        let available = head.wrapping_sub(tail);
        if available < PREFIX {
            return None;
        }

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        self.copy_out(tail, &mut prefix);
        let len = u32::from_le_bytes(prefix);

        // A frame larger than the ring can only come from a corrupt peer;
        // treat it like an unpublished one rather than read out of bounds
        let total = u64::from(len) + u64::from(PREFIX);
        if len == 0 || total > u64::from(available) || total > u64::from(self.capacity) {
            return None;
        }
        Some(len)
    }

    /// Copy `src` into the data area at cursor `pos`, splitting at the wrap point.
    fn copy_in(&self, pos: u32, src: &[u8]) {
        let offset = (pos & self.mask) as usize;
        let first = self.capacity as usize - offset;
        let dst = self.data.as_ptr();
        debug_assert!(src.len() <= self.capacity as usize);

        // SAFETY: offset < capacity and src.len() <= capacity, so both parts
        // stay inside the data area validated by `bind`
        unsafe {
            if first >= src.len() {
                ptr::copy_nonoverlapping(src.as_ptr(), dst.add(offset), src.len());
            } else {
                ptr::copy_nonoverlapping(src.as_ptr(), dst.add(offset), first);
                ptr::copy_nonoverlapping(src.as_ptr().add(first), dst, src.len() - first);
            }
        }
    }

    /// Copy from the data area at cursor `pos` into `dst`, splitting at the wrap point.
    fn copy_out(&self, pos: u32, dst: &mut [u8]) {
        let offset = (pos & self.mask) as usize;
        let first = self.capacity as usize - offset;
        let src = self.data.as_ptr();
        debug_assert!(dst.len() <= self.capacity as usize);

        // SAFETY: same bounds argument as `copy_in`
        unsafe {
            if first >= dst.len() {
                ptr::copy_nonoverlapping(src.add(offset), dst.as_mut_ptr(), dst.len());
            } else {
                ptr::copy_nonoverlapping(src.add(offset), dst.as_mut_ptr(), first);
                ptr::copy_nonoverlapping(src, dst.as_mut_ptr().add(first), dst.len() - first);
            }
        }
    }
}

/// Round `v` down to the largest power of two not exceeding it (0 stays 0).
pub const fn round_down_pow2(mut v: u32) -> u32 {
    if v == 0 {
        return 0;
    }
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    (v >> 1) + 1
}
