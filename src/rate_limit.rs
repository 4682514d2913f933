//! Sliding-window request throttling.
//!
//! [`RateLimiter`] admits at most `max_requests` calls in any trailing
//! [`WINDOW`]. Time comes from a [`Clock`] so tests can run the limiter
//! against virtual time with [`ManualClock`].

use crate::error::DriverError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Length of the trailing window requests are counted over.
pub const WINDOW: Duration = Duration::from_secs(10);

/// Source of time for the limiter.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time, sleeping on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual time: `sleep` returns immediately after advancing the clock.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    state: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Moves time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.elapsed += duration;
        }
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.state.lock().map(|s| s.elapsed).unwrap_or_default()
    }

    /// Every duration passed to `sleep`, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state
            .lock()
            .map(|s| s.sleeps.clone())
            .unwrap_or_default()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
    }
}

/// Sliding-window rate limiter.
pub struct RateLimiter<'c> {
    max_requests: usize,
    window: Duration,
    /// Admission times, oldest first.
    requests: VecDeque<Instant>,
    clock: &'c dyn Clock,
}

impl<'c> RateLimiter<'c> {
    /// A limiter over the standard 10 second window.
    ///
    /// A limit of zero would never admit anything and is rejected.
    pub fn new(max_requests: u32, clock: &'c dyn Clock) -> Result<Self, DriverError> {
        Self::with_window(max_requests, WINDOW, clock)
    }

    pub fn with_window(
        max_requests: u32,
        window: Duration,
        clock: &'c dyn Clock,
    ) -> Result<Self, DriverError> {
        if max_requests == 0 {
            return Err(DriverError::InvalidRateLimit(max_requests));
        }
        Ok(Self {
            max_requests: max_requests as usize,
            window,
            requests: VecDeque::new(),
            clock,
        })
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// How long `acquire` would sleep right now, or `None` if a request is
    /// admissible immediately.
    pub fn wait_time(&mut self) -> Option<Duration> {
        let now = self.clock.now();
        self.prune(now);
        self.required_wait(now)
    }

    /// Waits until one more request fits in the window, then records it.
    ///
    /// Returns the total time spent sleeping.
    pub async fn acquire(&mut self) -> Duration {
        let mut waited = Duration::ZERO;
        let mut now = self.clock.now();
        self.prune(now);

        while let Some(wait) = self.required_wait(now) {
            self.clock.sleep(wait).await;
            waited += wait;
            now = self.clock.now();
            self.prune(now);
        }

        self.requests.push_back(now);
        waited
    }

    /// Drops admissions that have left the trailing window.
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.requests.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }

    fn required_wait(&self, now: Instant) -> Option<Duration> {
        if self.requests.len() < self.max_requests {
            return None;
        }
        let oldest = *self.requests.front()?;
        let age = now.saturating_duration_since(oldest);
        // a saturated window always has oldest younger than `window` after prune
        Some(self.window.saturating_sub(age)).filter(|wait| !wait.is_zero())
    }
}
