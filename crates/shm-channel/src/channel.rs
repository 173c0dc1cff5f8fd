//! Named producer/consumer endpoints over a shared memory ring.
//!
//! A [`Producer`] creates the segment and initializes the ring; a
//! [`Consumer`] attaches to it. Both hold the mapping for as long as they are
//! alive, so the ring binding inside never outlives its memory.

use crate::errors::ShmError;
use crate::layout::HEADER_SIZE;
use crate::ring::{RingBuffer, Role};
use crate::segment::Segment;

/// A bound ring and the mapping it points into.
#[derive(Debug)]
struct Binding {
    ring: RingBuffer,
    segment: Segment,
}

impl Binding {
    fn new(mut segment: Segment, role: Role) -> Result<Self, ShmError> {
        // SAFETY: the ring is stored next to the segment that owns the
        // mapping and is dropped with it; one producer and one consumer per
        // name is the contract of this module
        let ring = unsafe { RingBuffer::bind(segment.as_mut_ptr(), segment.size(), role)? };
        Ok(Self { ring, segment })
    }
}

#[derive(Debug)]
pub struct Producer {
    name: String,
    binding: Option<Binding>,
    destroyed: bool,
}

impl Producer {
    /// Create the channel `name` with a data area of `requested_capacity`
    /// bytes, rounded down to a power of two.
    ///
    /// A stale segment with the same name is replaced.
    pub fn create(name: &str, requested_capacity: usize) -> Result<Self, ShmError> {
        let segment = Segment::create(name, requested_capacity.saturating_add(HEADER_SIZE))?;
        let name = segment.name().to_string();

        let binding = match Binding::new(segment, Role::Producer) {
            Ok(binding) => binding,
            Err(e) => {
                tracing::warn!(name = %name, requested_capacity, "Cannot host a ring: {}", e);
                Segment::remove(&name);
                return Err(e);
            }
        };

        tracing::info!(
            name = %name,
            requested_capacity,
            capacity = binding.ring.capacity(),
            "Producer channel created"
        );

        Ok(Self {
            name,
            binding: Some(binding),
            destroyed: false,
        })
    }

    /// Append one message. Returns false if it does not fit right now, if it
    /// is empty, or if the channel is closed.
    pub fn write(&mut self, payload: &[u8]) -> bool {
        self.binding
            .as_mut()
            .is_some_and(|binding| binding.ring.write(payload))
    }

    /// Rounded data area size, or 0 once closed.
    pub fn capacity(&self) -> usize {
        self.binding.as_ref().map_or(0, |b| b.ring.capacity())
    }

    pub fn writable_bytes(&self) -> usize {
        self.binding.as_ref().map_or(0, |b| b.ring.writable_bytes())
    }

    pub fn is_valid(&self) -> bool {
        self.binding.is_some()
    }

    /// The normalized OS name of the segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the channel name.
    ///
    /// Consumers already attached keep working; new `Consumer::open` calls
    /// fail with `OpenFailed`. Calling it again is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        match self.binding.as_mut() {
            Some(binding) => binding.segment.destroy(),
            None => Segment::remove(&self.name),
        }
    }

    /// Unmap the channel without removing its name.
    pub fn close(&mut self) {
        if self.binding.take().is_some() {
            tracing::debug!(name = %self.name, "Producer channel closed");
        }
    }
}

#[derive(Debug)]
pub struct Consumer {
    name: String,
    binding: Option<Binding>,
}

impl Consumer {
    /// Attach to the channel `name`.
    ///
    /// Pass 0 to discover the segment size from the OS, or the producer's
    /// exact total size (`capacity() + HEADER_SIZE`). Passing the unrounded
    /// requested capacity maps the wrong length.
    pub fn open(name: &str, expected_total_size: usize) -> Result<Self, ShmError> {
        let segment = Segment::open(name, expected_total_size)?;
        let name = segment.name().to_string();
        let binding = Binding::new(segment, Role::Consumer)?;

        tracing::info!(
            name = %name,
            capacity = binding.ring.capacity(),
            "Consumer channel opened"
        );

        Ok(Self {
            name,
            binding: Some(binding),
        })
    }

    /// Copy the next message into `out`; see [`RingBuffer::read`].
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        self.binding.as_mut().map_or(0, |b| b.ring.read(out))
    }

    /// Take the next message as an owned buffer of its exact size.
    pub fn read_message(&mut self) -> Option<Vec<u8>> {
        self.binding.as_mut()?.ring.read_message()
    }

    pub fn has_data(&self) -> bool {
        self.binding.as_ref().is_some_and(|b| b.ring.has_data())
    }

    pub fn readable_bytes(&self) -> usize {
        self.binding.as_ref().map_or(0, |b| b.ring.readable_bytes())
    }

    pub fn capacity(&self) -> usize {
        self.binding.as_ref().map_or(0, |b| b.ring.capacity())
    }

    pub fn is_valid(&self) -> bool {
        self.binding.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unmap the channel. The producer and the name are unaffected.
    pub fn close(&mut self) {
        if self.binding.take().is_some() {
            tracing::debug!(name = %self.name, "Consumer channel closed");
        }
    }
}

/// Remove the channel `name` if it exists.
///
/// Safe to call before the channel was ever created and after it was
/// destroyed. Producers call this to clear a name left behind by a crashed run.
pub fn remove(name: &str) {
    Segment::remove(name);
}
