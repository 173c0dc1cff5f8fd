use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Poll `connect` until it succeeds or `shutdown` is raised.
///
/// Returns `None` only when shutdown was requested before the resource
/// became available.
pub fn wait_for_resource<F, T, E>(
    mut connect: F,
    poll_interval: Duration,
    resource_name: &str,
    shutdown: &AtomicBool,
) -> Option<T>
where
    F: FnMut() -> Result<T, E>,
    E: std::fmt::Display,
{
    let mut logged = false;
    loop {
        match connect() {
            Ok(resource) => {
                tracing::info!("{} connected", resource_name);
                return Some(resource);
            }
            Err(e) => {
                if !logged {
                    tracing::info!("Waiting for {} ({})", resource_name, e);
                    logged = true;
                } else {
                    tracing::debug!("Waiting for {} ({})", resource_name, e);
                }
            }
        }

        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("Stopped waiting for {}", resource_name);
            return None;
        }
        std::thread::sleep(poll_interval);
    }
}
