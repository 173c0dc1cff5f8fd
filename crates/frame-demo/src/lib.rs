pub mod config;
pub mod consumer;
pub mod frame;
pub mod pacing;
pub mod producer;

pub use config::{ConsumerArgs, ProducerArgs};
pub use consumer::ConsumerStats;
pub use pacing::FramePacer;
pub use producer::ProducerStats;
