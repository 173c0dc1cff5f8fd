use anyhow::Context;
use clap::Parser;
use common::{Environment, setup_logging};
use frame_demo::{ProducerArgs, producer};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn main() -> anyhow::Result<()> {
    let args = ProducerArgs::parse();
    setup_logging(Environment::from_env());
    let shutdown = Arc::new(AtomicBool::new(false));

    flag::register(SIGTERM, Arc::clone(&shutdown)).context("Failed to register SIGTERM")?;
    flag::register(SIGINT, Arc::clone(&shutdown)).context("Failed to register SIGINT")?;

    tracing::info!("Signal handlers registered (SIGTERM, SIGINT)");

    match producer::run(&args, &shutdown) {
        Ok(_) => {
            tracing::info!("Frame producer stopped gracefully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Frame producer failed: {:#}", e);
            Err(e)
        }
    }
}
