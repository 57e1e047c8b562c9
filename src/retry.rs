//! Randomized exponential backoff retries.
//!
//! The retrier re-invokes a fallible operation while its error reports
//! [`IsRetriable::is_retriable`]. Delays start at `initial_delay`, grow by
//! `backoff` on each retry, and are scaled by a jitter factor drawn from
//! `[0.75, 1.25)` so that many clients failing together do not retry in lockstep.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::errors::IsRetriable;

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 5;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Default growth factor between consecutive delays.
pub const DEFAULT_BACKOFF: f64 = 2.0;

/// Lower bound of the jitter factor.
const JITTER_MIN: f64 = 0.75;

/// Width of the jitter band.
const JITTER_SPAN: f64 = 0.5;

/// Retry policy for one invocation.
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Retries after the first attempt. Zero disables retrying.
    pub retries: u32,
    /// Zero means `DEFAULT_INITIAL_DELAY`.
    pub initial_delay: Duration,
    /// Zero, negative or non-finite means `DEFAULT_BACKOFF`.
    pub backoff: f64,
    /// Source for jitter draws. When `None`, a clock-seeded generator is
    /// created on the first retriable failure.
    pub rng: Option<StdRng>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff: DEFAULT_BACKOFF,
            rng: None,
        }
    }
}

impl RetryOptions {
    /// Use a deterministic jitter source seeded with `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    fn normalized(mut self) -> Self {
        if self.initial_delay.is_zero() {
            self.initial_delay = DEFAULT_INITIAL_DELAY;
        }
        if !self.backoff.is_finite() || self.backoff <= 0.0 {
            self.backoff = DEFAULT_BACKOFF;
        }
        self
    }
}

/// Blocking wait between attempts.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Delay schedule for one invocation.
struct Schedule<'a> {
    options: &'a mut RetryOptions,
    remaining: u32,
    current: Option<Duration>,
    fallback: Option<StdRng>,
}

impl<'a> Schedule<'a> {
    fn new(options: &'a mut RetryOptions) -> Self {
        let remaining = options.retries;
        Self {
            options,
            remaining,
            current: None,
            fallback: None,
        }
    }

    /// Next jittered delay, or `None` once the budget is spent.
    fn next_delay(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let base = match self.current {
            None => self.options.initial_delay,
            Some(prev) => scale(prev, self.options.backoff),
        };
        self.current = Some(base);

        let rng = match self.options.rng.as_mut() {
            Some(rng) => rng,
            None => self.fallback.get_or_insert_with(clock_seeded),
        };
        Some(scale(base, jitter(rng)))
    }

    fn attempt(&self) -> u32 {
        self.options.retries - self.remaining
    }
}

/// Jitter factor in `[0.75, 1.25)`.
fn jitter<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    JITTER_MIN + rng.random::<f64>() * JITTER_SPAN
}

/// Multiply a duration, saturating instead of panicking on overflow.
fn scale(duration: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(duration.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

fn clock_seeded() -> StdRng {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    StdRng::seed_from_u64(seed)
}

/// Runs operations under a backoff policy, sleeping through `S`.
#[derive(Debug)]
pub struct BackoffRetrier<S = ThreadSleeper> {
    options: RetryOptions,
    sleeper: S,
}

impl BackoffRetrier<ThreadSleeper> {
    /// `None` options use all defaults.
    pub fn new(options: Option<RetryOptions>) -> Self {
        Self::with_sleeper(options, ThreadSleeper)
    }
}

impl<S: Sleeper> BackoffRetrier<S> {
    pub fn with_sleeper(options: Option<RetryOptions>, sleeper: S) -> Self {
        Self {
            options: options.unwrap_or_default().normalized(),
            sleeper,
        }
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Invoke `op` until it succeeds, fails with a non-retriable error, or the
    /// retry budget runs out.
    ///
    /// Non-retriable errors return at once. After the budget is spent the last
    /// error is returned unchanged.
    pub fn run<T, E, F>(&mut self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: IsRetriable,
    {
        let mut schedule = Schedule::new(&mut self.options);
        loop {
            let err = match op() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retriable() {
                return Err(err);
            }
            let Some(delay) = schedule.next_delay() else {
                warn!(retries = schedule.options.retries, "retry budget exhausted");
                return Err(err);
            };
            debug!(attempt = schedule.attempt(), ?delay, "retriable failure, backing off");
            self.sleeper.sleep(delay);
        }
    }
}

/// Run `op` with the blocking retrier.
pub fn retry<T, E, F>(op: F, options: Option<RetryOptions>) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: IsRetriable,
{
    BackoffRetrier::new(options).run(op)
}

/// Async version of [`retry`], sleeping with `tokio::time::sleep`.
pub async fn retry_async<T, E, F, Fut>(mut op: F, options: Option<RetryOptions>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetriable,
{
    let mut options = options.unwrap_or_default().normalized();
    let mut schedule = Schedule::new(&mut options);
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_retriable() {
            return Err(err);
        }
        let Some(delay) = schedule.next_delay() else {
            warn!(retries = schedule.options.retries, "retry budget exhausted");
            return Err(err);
        };
        debug!(attempt = schedule.attempt(), ?delay, "retriable failure, backing off");
        tokio::time::sleep(delay).await;
    }
}
