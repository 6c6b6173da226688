/// Bounds the number of fetches a single worker has in flight.
///
/// This is a counter, not a requests-per-second window: pacing between
/// dispatches comes from the crawl delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiter {
    max_in_flight: usize,
    in_flight: usize,
}

impl RateLimiter {
    /// A ceiling of zero would stall the worker forever, so it is raised to one.
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
            in_flight: 0,
        }
    }

    /// Takes a slot if one is free.
    pub fn try_acquire(&mut self) -> bool {
        if self.in_flight < self.max_in_flight {
            self.in_flight += 1;
            true
        } else {
            false
        }
    }

    pub fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_stops_at_ceiling() {
        let mut limiter = RateLimiter::new(2);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.in_flight(), 2);

        limiter.release();
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn release_never_underflows() {
        let mut limiter = RateLimiter::new(1);
        limiter.release();
        assert_eq!(limiter.in_flight(), 0);
        assert!(limiter.try_acquire());
    }

    #[test]
    fn zero_ceiling_is_raised_to_one() {
        let mut limiter = RateLimiter::new(0);
        assert_eq!(limiter.max_in_flight(), 1);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }
}
