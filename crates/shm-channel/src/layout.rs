//! Centralized shared memory layout configuration
//!
//! This module defines the byte layout shared by every producer and consumer
//! attached to a channel, plus the defaults used by the frame pipeline.
//!
//! Having these in one place ensures:
//! - No layout mismatches between producers and consumers
//! - Single source of truth for sizing a channel

use crate::header::RingHeader;

/// Size of the ring header at offset 0 of every segment.
pub const HEADER_SIZE: usize = RingHeader::SIZE;

/// Size of the little-endian length field that precedes every payload.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Smallest data area a ring accepts: a length prefix plus a 4-byte payload.
pub const MIN_CAPACITY: u32 = 8;

/// Largest data area a ring can address with 32-bit cursors.
pub const MAX_CAPACITY: u32 = 1 << 31;

/// Channel name used by the frame producer and consumer when none is given.
pub const DEFAULT_CHANNEL_NAME: &str = "shm_video";

/// One 1920x1080 frame with three 8-bit channels.
pub const FRAME_1080P_BGR_SIZE: usize = 1920 * 1080 * 3;

/// Number of frames a default channel can buffer before the producer drops.
pub const DEFAULT_BUFFERED_FRAMES: usize = 10;

/// Total segment size for a data area of `capacity` bytes.
pub const fn segment_size(capacity: usize) -> usize {
    capacity + HEADER_SIZE
}
