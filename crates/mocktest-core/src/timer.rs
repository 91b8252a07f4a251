//! Countdown clock and the async tick source that drives it.
//!
//! [`Countdown`] is the pure, tick-driven state: it never reads the wall
//! clock, so tests can step it directly. [`spawn_ticker`] provides the
//! once-per-interval tick stream for live sessions together with a
//! [`TimerHandle`] that stops it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Default spacing between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownState {
    Idle,
    Running,
    Stopped,
    Expired,
}

/// Result of feeding one tick into a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One second elapsed; this much time remains.
    Ticked(u32),
    /// Remaining time just reached zero. Returned exactly once.
    Expired,
    /// The countdown is not running; nothing changed.
    Ignored,
}

/// Remaining-time counter with exactly-once expiry.
///
/// Remaining time is monotonically non-increasing and never goes below zero.
#[derive(Debug, Clone)]
pub struct Countdown {
    total_secs: u32,
    remaining_secs: u32,
    state: CountdownState,
}

impl Countdown {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            state: CountdownState::Idle,
        }
    }

    pub fn start(&mut self) {
        if self.state == CountdownState::Idle {
            self.state = CountdownState::Running;
        }
    }

    /// Halt ticking. Has no effect once expired.
    pub fn stop(&mut self) {
        if self.state != CountdownState::Expired {
            self.state = CountdownState::Stopped;
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state != CountdownState::Running {
            return TickOutcome::Ignored;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = CountdownState::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked(self.remaining_secs)
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.total_secs - self.remaining_secs
    }
}

/// Teardown handle for a spawned ticker.
///
/// Dropping the handle cancels the ticker as well.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task that emits one tick per `period`, first tick one period from now.
///
/// The task ends on its own when the receiver is dropped.
pub fn spawn_ticker(period: Duration) -> (TimerHandle, mpsc::Receiver<Instant>) {
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        loop {
            let at = interval.tick().await;
            if tx.send(at).await.is_err() {
                tracing::debug!("tick receiver dropped, stopping ticker");
                break;
            }
        }
    });
    (TimerHandle { task }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_countdown_ignores_ticks() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.tick(), TickOutcome::Ignored);
        assert_eq!(countdown.remaining_secs(), 3);
    }

    #[test]
    fn expires_exactly_once() {
        let mut countdown = Countdown::new(3);
        countdown.start();
        assert_eq!(countdown.tick(), TickOutcome::Ticked(2));
        assert_eq!(countdown.tick(), TickOutcome::Ticked(1));
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert_eq!(countdown.tick(), TickOutcome::Ignored);
        assert_eq!(countdown.tick(), TickOutcome::Ignored);
        assert_eq!(countdown.remaining_secs(), 0);
        assert_eq!(countdown.elapsed_secs(), 3);
        assert_eq!(countdown.state(), CountdownState::Expired);
    }

    #[test]
    fn stopped_countdown_freezes() {
        let mut countdown = Countdown::new(10);
        countdown.start();
        countdown.tick();
        countdown.stop();
        assert_eq!(countdown.tick(), TickOutcome::Ignored);
        assert_eq!(countdown.remaining_secs(), 9);
        // a stopped clock is not restarted
        countdown.start();
        assert_eq!(countdown.tick(), TickOutcome::Ignored);
    }

    #[test]
    fn stop_after_expiry_keeps_expired() {
        let mut countdown = Countdown::new(1);
        countdown.start();
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        countdown.stop();
        assert_eq!(countdown.state(), CountdownState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_emits_once_per_period() {
        let (handle, mut ticks) = spawn_ticker(Duration::from_secs(1));
        let start = Instant::now();

        let first = ticks.recv().await.unwrap();
        let second = ticks.recv().await.unwrap();
        assert_eq!(first - start, Duration::from_secs(1));
        assert_eq!(second - start, Duration::from_secs(2));

        handle.cancel();
        assert!(ticks.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_ticker() {
        let (handle, mut ticks) = spawn_ticker(Duration::from_secs(1));
        drop(handle);
        assert!(ticks.recv().await.is_none());
    }
}
