use crate::config::ConsumerArgs;
use crate::frame::{self, SequenceTracker};
use anyhow::{Result, bail};
use common::{Backoff, wait_for_resource};
use shm_channel::Consumer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const STATUS_INTERVAL: u64 = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ConsumerStats {
    pub frames_received: u64,
    /// Frame indices skipped between received frames
    pub gaps: u64,
    /// Frames whose length or contents did not match
    pub bad_frames: u64,
    pub fps: f64,
}

/// Attach to the channel once it exists and read frames until `shutdown` is
/// raised or `args.max_frames` frames have arrived.
pub fn run(args: &ConsumerArgs, shutdown: &AtomicBool) -> Result<ConsumerStats> {
    args.validate()?;

    let Some(mut channel) = wait_for_resource(
        || Consumer::open(&args.name, 0),
        Duration::from_millis(args.poll_interval_ms),
        &format!("channel '{}'", args.name),
        shutdown,
    ) else {
        return Ok(ConsumerStats::default());
    };

    let frame_size = args.frame_size();
    if channel.capacity() < frame_size {
        bail!(
            "Channel capacity {} is smaller than a {}x{} frame",
            channel.capacity(),
            args.width,
            args.height
        );
    }

    let mut buffer = vec![0u8; frame_size];
    let mut backoff = Backoff::default();
    let mut sequence = SequenceTracker::default();
    let mut stats = ConsumerStats::default();
    let mut started: Option<Instant> = None;
    let mut window_start = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        if args.max_frames.is_some_and(|max| stats.frames_received >= max) {
            break;
        }

        let len = channel.read(&mut buffer);
        if len == 0 {
            backoff.snooze();
            continue;
        }
        backoff.reset();
        started.get_or_insert_with(Instant::now);

        let frame = &buffer[..len];
        stats.frames_received += 1;

        match frame::read_index(frame) {
            Some(index) if len == frame_size && frame::is_intact(frame, index) => {
                let skipped = sequence.observe(index);
                if skipped > 0 {
                    tracing::debug!("Skipped {} frames before #{}", skipped, index);
                }
            }
            _ => {
                stats.bad_frames += 1;
                tracing::warn!("Unexpected frame of {} bytes (expected {})", len, frame_size);
            }
        }

        if stats.frames_received.is_multiple_of(STATUS_INTERVAL) {
            let window = window_start.elapsed().as_secs_f64();
            window_start = Instant::now();
            tracing::info!(
                "Status: [Frames: {}] [Gaps: {}] [FPS: {:.1}]",
                stats.frames_received,
                sequence.gaps(),
                STATUS_INTERVAL as f64 / window.max(f64::EPSILON)
            );
        }
    }

    stats.gaps = sequence.gaps();
    if let Some(started) = started {
        let elapsed = started.elapsed().as_secs_f64();
        if stats.frames_received > 1 && elapsed > 0.0 {
            stats.fps = (stats.frames_received - 1) as f64 / elapsed;
        }
    }

    tracing::info!(
        "Shutdown: {} frames received, {} gaps, {} bad, {:.1} fps.",
        stats.frames_received,
        stats.gaps,
        stats.bad_frames,
        stats.fps
    );
    Ok(stats)
}
