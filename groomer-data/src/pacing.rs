//! Blocking delays used for retry backoff and inter-cell pacing.

use std::time::Duration;

/// Pauses the current worker.
///
/// Production code sleeps the thread; tests substitute a recorder so backoff
/// schedules can be asserted without waiting.
pub trait Sleeper {
    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn zero_duration_returns_immediately() {
        let start = Instant::now();
        ThreadSleeper.sleep(Duration::ZERO);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn sleeps_at_least_the_requested_time() {
        let start = Instant::now();
        ThreadSleeper.sleep(Duration::from_millis(5));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
