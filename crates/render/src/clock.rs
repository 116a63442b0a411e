use std::time::Instant;

/// Seconds elapsed since the pipeline started.
pub trait TimeSource {
    fn seconds(&self) -> f32;
}

/// Monotonic wall time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn seconds(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// Manually stepped time, for headless runs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedClock {
    pub now: f32,
}

impl FixedClock {
    pub fn new(now: f32) -> Self {
        Self { now }
    }

    pub fn advance(&mut self, dt: f32) {
        self.now += dt;
    }
}

impl TimeSource for FixedClock {
    fn seconds(&self) -> f32 {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.seconds();
        let b = clock.seconds();
        assert!(b >= a);
        assert!(a >= 0.0);
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = FixedClock::default();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.seconds(), 0.75);
    }
}
