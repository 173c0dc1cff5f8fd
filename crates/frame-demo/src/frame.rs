//! Synthetic frame contents.
//!
//! Every frame is filled with the low byte of its index, and the full 32-bit
//! index is stamped little-endian into the first four bytes.

/// Bytes at the start of a frame holding its index.
pub const INDEX_SIZE: usize = 4;

/// Fill `frame` for frame number `index`.
pub fn fill(frame: &mut [u8], index: u32) {
    frame.fill(index as u8);
    stamp_index(frame, index);
}

pub fn stamp_index(frame: &mut [u8], index: u32) {
    if let Some(head) = frame.get_mut(..INDEX_SIZE) {
        head.copy_from_slice(&index.to_le_bytes());
    }
}

pub fn read_index(frame: &[u8]) -> Option<u32> {
    let head = frame.get(..INDEX_SIZE)?;
    Some(u32::from_le_bytes([head[0], head[1], head[2], head[3]]))
}

/// Cheap integrity check: the last byte carries the fill value.
pub fn is_intact(frame: &[u8], index: u32) -> bool {
    match frame.len() {
        0..=INDEX_SIZE => frame.len() == INDEX_SIZE,
        len => frame[len - 1] == index as u8,
    }
}

/// Tracks the expected next index and counts skipped frames.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    expected: Option<u32>,
    gaps: u64,
}

impl SequenceTracker {
    /// Record `index`; returns how many frames were skipped before it.
    pub fn observe(&mut self, index: u32) -> u32 {
        let skipped = match self.expected {
            Some(expected) => index.wrapping_sub(expected),
            None => 0,
        };
        self.gaps += u64::from(skipped);
        self.expected = Some(index.wrapping_add(1));
        skipped
    }

    pub fn gaps(&self) -> u64 {
        self.gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_stamps_index_and_pattern() {
        let mut frame = vec![0u8; 16];
        fill(&mut frame, 0x0102_0341);

        assert_eq!(read_index(&frame), Some(0x0102_0341));
        assert!(frame[INDEX_SIZE..].iter().all(|&b| b == 0x41));
        assert!(is_intact(&frame, 0x0102_0341));
        assert!(!is_intact(&frame, 7));
    }

    #[test]
    fn test_short_frames() {
        assert_eq!(read_index(&[1, 2, 3]), None);

        let mut frame = [0u8; 2];
        stamp_index(&mut frame, 9);
        assert_eq!(frame, [0, 0], "Too short to stamp");
    }

    #[test]
    fn test_sequence_tracker_counts_gaps() {
        let mut tracker = SequenceTracker::default();

        assert_eq!(tracker.observe(5), 0, "First frame sets the baseline");
        assert_eq!(tracker.observe(6), 0);
        assert_eq!(tracker.observe(9), 2);
        assert_eq!(tracker.observe(10), 0);
        assert_eq!(tracker.gaps(), 2);
    }

    #[test]
    fn test_sequence_tracker_handles_index_wrap() {
        let mut tracker = SequenceTracker::default();

        tracker.observe(u32::MAX);
        assert_eq!(tracker.observe(0), 0);
        assert_eq!(tracker.gaps(), 0);
    }
}
