pub mod channel;
pub mod errors;
pub mod header;
pub mod layout;
pub mod naming;
pub mod ring;
pub mod segment;
pub mod span;

pub use channel::{Consumer, Producer, remove};
pub use errors::{ErrorKind, RingError, ShmError};
pub use header::RingHeader;
pub use layout::{HEADER_SIZE, LENGTH_PREFIX_SIZE};
pub use ring::{RingBuffer, Role, round_down_pow2};
pub use segment::Segment;
pub use span::AlignedSpan;
