use std::time::{Duration, Instant};

/// Fixed frame period for a producer loop.
pub struct FramePacer {
    period: Duration,
    overruns: u64,
}

impl FramePacer {
    pub fn new(frame_rate: f64) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / frame_rate),
            overruns: 0,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.period
    }

    /// Time left in the frame budget after `elapsed`, or None on overrun.
    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.period.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    /// Sleep out the rest of the frame that started at `frame_start`.
    pub fn wait(&mut self, frame_start: Instant) {
        let elapsed = frame_start.elapsed();
        match self.remaining(elapsed) {
            Some(rest) => std::thread::sleep(rest),
            None => {
                self.overruns += 1;
                tracing::trace!("Frame took longer than its budget: {:?}", elapsed);
            }
        }
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        let pacer = FramePacer::new(50.0);
        assert_eq!(pacer.frame_duration(), Duration::from_millis(20));
    }

    #[test]
    fn test_remaining_budget() {
        let pacer = FramePacer::new(10.0);

        assert_eq!(
            pacer.remaining(Duration::from_millis(30)),
            Some(Duration::from_millis(70))
        );
        assert_eq!(pacer.remaining(Duration::from_millis(100)), None);
        assert_eq!(pacer.remaining(Duration::from_millis(250)), None);
    }

    #[test]
    fn test_overrun_is_counted() {
        let mut pacer = FramePacer::new(1000.0);

        pacer.wait(Instant::now() - Duration::from_millis(5));
        assert_eq!(pacer.overruns(), 1);

        pacer.wait(Instant::now());
        assert_eq!(pacer.overruns(), 1);
    }
}
