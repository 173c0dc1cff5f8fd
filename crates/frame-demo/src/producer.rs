use crate::config::ProducerArgs;
use crate::frame;
use crate::pacing::FramePacer;
use anyhow::{Context, Result, bail};
use shm_channel::{LENGTH_PREFIX_SIZE, Producer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

const STATUS_INTERVAL: u64 = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProducerStats {
    pub frames_written: u64,
    /// Frames skipped because the ring was full
    pub frames_dropped: u64,
    pub overruns: u64,
}

/// Publish frames at `args.frame_rate` until `shutdown` is raised or
/// `args.max_frames` frames have been attempted.
///
/// The channel name is destroyed on return, whether or not the loop failed.
pub fn run(args: &ProducerArgs, shutdown: &AtomicBool) -> Result<ProducerStats> {
    args.validate()?;

    let frame_size = args.frame_size();
    shm_channel::remove(&args.name);

    let mut channel = Producer::create(&args.name, args.requested_capacity())
        .with_context(|| format!("Failed to create channel '{}'", args.name))?;

    let result = publish(&mut channel, args, frame_size, shutdown);
    channel.destroy();
    result
}

fn publish(
    channel: &mut Producer,
    args: &ProducerArgs,
    frame_size: usize,
    shutdown: &AtomicBool,
) -> Result<ProducerStats> {
    let message_size = frame_size + LENGTH_PREFIX_SIZE;
    if channel.capacity() < message_size {
        bail!(
            "Channel capacity {} cannot hold one {}-byte frame",
            channel.capacity(),
            frame_size
        );
    }

    tracing::info!(
        name = channel.name(),
        width = args.width,
        height = args.height,
        frame_size,
        capacity = channel.capacity(),
        buffered_frames = channel.capacity() / message_size,
        "Producer ready at {:.1} fps",
        args.frame_rate
    );

    let mut pacer = FramePacer::new(args.frame_rate);
    let mut buffer = vec![0u8; frame_size];
    let mut stats = ProducerStats::default();
    let mut index = 0u64;

    while !shutdown.load(Ordering::Relaxed) {
        if args.max_frames.is_some_and(|max| index >= max) {
            break;
        }
        let start = Instant::now();

        frame::fill(&mut buffer, index as u32);
        if channel.write(&buffer) {
            stats.frames_written += 1;
        } else {
            stats.frames_dropped += 1;
        }
        index += 1;

        if index.is_multiple_of(STATUS_INTERVAL) {
            tracing::info!(
                "Status: [Frames: {}] [Dropped: {}] [Free: {} bytes]",
                stats.frames_written,
                stats.frames_dropped,
                channel.writable_bytes()
            );
        }

        pacer.wait(start);
    }

    stats.overruns = pacer.overruns();
    tracing::info!(
        "Shutdown: {} frames written, {} dropped, {} overruns.",
        stats.frames_written,
        stats.frames_dropped,
        stats.overruns
    );
    Ok(stats)
}
