use anyhow::Context;
use clap::Parser;
use common::{Environment, setup_logging};
use frame_demo::{ConsumerArgs, consumer};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn main() -> anyhow::Result<()> {
    let args = ConsumerArgs::parse();
    setup_logging(Environment::from_env());
    let shutdown = Arc::new(AtomicBool::new(false));

    flag::register(SIGTERM, Arc::clone(&shutdown)).context("Failed to register SIGTERM")?;
    flag::register(SIGINT, Arc::clone(&shutdown)).context("Failed to register SIGINT")?;

    let stats = consumer::run(&args, &shutdown).context("Frame consumer failed")?;
    tracing::info!(
        "Frame consumer stopped after {} frames",
        stats.frames_received
    );
    Ok(())
}
