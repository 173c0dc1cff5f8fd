use anyhow::ensure;
use clap::Parser;
use shm_channel::LENGTH_PREFIX_SIZE;
use shm_channel::layout::{DEFAULT_BUFFERED_FRAMES, DEFAULT_CHANNEL_NAME};

/// Bytes per pixel of a BGR frame.
pub const FRAME_CHANNELS: usize = 3;

#[derive(Parser, Debug, Clone)]
#[command(name = "frame-producer", about = "Publish synthetic frames at a fixed rate")]
pub struct ProducerArgs {
    /// Shared memory channel name
    #[arg(long, env = "SHM_NAME", default_value = DEFAULT_CHANNEL_NAME)]
    pub name: String,

    #[arg(long, env = "FRAME_WIDTH", default_value_t = 1920)]
    pub width: usize,

    #[arg(long, env = "FRAME_HEIGHT", default_value_t = 1080)]
    pub height: usize,

    /// Frames per second
    #[arg(long, env = "FRAME_RATE", default_value_t = 30.0)]
    pub frame_rate: f64,

    /// Frames the channel is sized for before the producer starts dropping
    #[arg(long, env = "BUFFERED_FRAMES", default_value_t = DEFAULT_BUFFERED_FRAMES)]
    pub buffered_frames: usize,

    /// Stop after this many frames instead of running until interrupted
    #[arg(long, env = "MAX_FRAMES")]
    pub max_frames: Option<u64>,
}

impl ProducerArgs {
    pub fn frame_size(&self) -> usize {
        frame_size(self.width, self.height)
    }

    /// Requested channel capacity: room for `buffered_frames` framed messages.
    pub fn requested_capacity(&self) -> usize {
        self.frame_size()
            .saturating_add(LENGTH_PREFIX_SIZE)
            .saturating_mul(self.buffered_frames)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        validate_frame(self.width, self.height)?;
        ensure!(
            self.frame_rate.is_finite() && self.frame_rate > 0.0,
            "Frame rate must be positive, got {}",
            self.frame_rate
        );
        ensure!(self.buffered_frames > 0, "At least one frame must be buffered");
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "frame-consumer", about = "Receive and check frames from a producer")]
pub struct ConsumerArgs {
    /// Shared memory channel name
    #[arg(long, env = "SHM_NAME", default_value = DEFAULT_CHANNEL_NAME)]
    pub name: String,

    #[arg(long, env = "FRAME_WIDTH", default_value_t = 1920)]
    pub width: usize,

    #[arg(long, env = "FRAME_HEIGHT", default_value_t = 1080)]
    pub height: usize,

    /// Stop after this many frames instead of running until interrupted
    #[arg(long, env = "MAX_FRAMES")]
    pub max_frames: Option<u64>,

    /// How often to retry while the channel does not exist yet
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 100)]
    pub poll_interval_ms: u64,
}

impl ConsumerArgs {
    pub fn frame_size(&self) -> usize {
        frame_size(self.width, self.height)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        validate_frame(self.width, self.height)
    }
}

fn frame_size(width: usize, height: usize) -> usize {
    width.saturating_mul(height).saturating_mul(FRAME_CHANNELS)
}

fn validate_frame(width: usize, height: usize) -> anyhow::Result<()> {
    let size = frame_size(width, height);
    ensure!(
        size >= crate::frame::INDEX_SIZE,
        "Frame {}x{} is too small to carry a frame index",
        width,
        height
    );
    ensure!(
        size <= u32::MAX as usize - LENGTH_PREFIX_SIZE,
        "Frame {}x{} is too large for one message",
        width,
        height
    );
    Ok(())
}
