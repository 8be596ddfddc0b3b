//! Re-armable single-shot debounce timer
//!
//! Coalesces bursts of change events into one evaluation: every arm while
//! the timer is pending replaces the deadline, so N rapid events produce a
//! single expiry one delay after the last of them.

use std::time::Duration;
use tokio::time::Instant;

/// A cancellable, re-armable single-shot deadline
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    /// Create a disarmed timer with the given delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm the timer, replacing any pending deadline
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Cancel the timer; a pending deadline will not fire
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a deadline is currently pending
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if armed.
    ///
    /// `Instant` is `Copy`, so callers can lift the deadline out before a
    /// `select!` without borrowing the timer across the await.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Sleep until `deadline`, or forever when there is none.
///
/// The forever case keeps a disarmed timer's `select!` branch pending
/// without busy polling.
pub async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_deadline() {
        let mut timer = Debounce::new(Duration::from_millis(100));
        timer.arm();
        let first = timer.deadline().unwrap();

        tokio::time::advance(Duration::from_millis(60)).await;
        timer.arm();
        let second = timer.deadline().unwrap();

        assert!(second > first);
        assert_eq!(second - first, Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn expires_once_after_the_last_arm() {
        let mut timer = Debounce::new(Duration::from_millis(100));
        timer.arm();
        assert!(timer.pending());

        tokio::time::advance(Duration::from_millis(100)).await;
        sleep_until_opt(timer.deadline()).await;
        timer.cancel();
        assert!(!timer.pending());
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_timer_never_fires() {
        let timer = Debounce::new(Duration::from_millis(10));
        let fired = tokio::time::timeout(
            Duration::from_millis(50),
            sleep_until_opt(timer.deadline()),
        );
        assert!(fired.await.is_err());
    }
}
