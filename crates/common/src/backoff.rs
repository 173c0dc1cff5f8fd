use std::time::Duration;

/// Exponential sleep for a consumer polling an empty ring.
///
/// Default values suit a frame pipeline polled at tens of frames per second:
/// - 50µs base delay, doubling each idle poll
/// - Capped at 2ms so a new frame is seen within one cap
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Initial delay after the first empty poll
    pub base_delay: Duration,
    /// Maximum delay cap (backoff won't exceed this)
    pub max_delay: Duration,
    attempt: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_micros(50), Duration::from_millis(2))
    }
}

impl Backoff {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            attempt: 0,
        }
    }

    /// Delay for a given attempt using exponential backoff
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// The delay the next `snooze` would sleep for.
    pub fn next_delay(&self) -> Duration {
        self.delay_for_attempt(self.attempt)
    }

    /// Sleep for the current delay and grow it.
    pub fn snooze(&mut self) {
        std::thread::sleep(self.next_delay());
        self.attempt = self.attempt.saturating_add(1);
    }

    /// Go back to the base delay after useful work.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let backoff = Backoff::default();
        assert_eq!(backoff.base_delay, Duration::from_micros(50));
        assert_eq!(backoff.max_delay, Duration::from_millis(2));
        assert_eq!(backoff.next_delay(), Duration::from_micros(50));
    }

    #[test]
    fn test_exponential_backoff_calculation() {
        let backoff = Backoff::default();

        assert_eq!(backoff.delay_for_attempt(0), Duration::from_micros(50));
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_micros(100));
        assert_eq!(backoff.delay_for_attempt(4), Duration::from_micros(800));
        assert_eq!(backoff.delay_for_attempt(5), Duration::from_micros(1600));
        // 3200µs, capped
        assert_eq!(backoff.delay_for_attempt(6), Duration::from_millis(2));
        // Shifts past the integer width stay capped
        assert_eq!(backoff.delay_for_attempt(40), Duration::from_millis(2));
    }

    #[test]
    fn test_snooze_grows_and_reset_restarts() {
        let mut backoff = Backoff::new(Duration::from_micros(1), Duration::from_micros(4));

        backoff.snooze();
        backoff.snooze();
        assert_eq!(backoff.next_delay(), Duration::from_micros(4));

        backoff.snooze();
        assert_eq!(backoff.next_delay(), Duration::from_micros(4), "Delay stays capped");

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_micros(1));
    }
}
