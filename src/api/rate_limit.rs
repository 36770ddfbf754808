//! Advisory rate limit tracking
//!
//! The limiter never blocks on its own. It records what responses say about
//! the remaining quota and answers two questions before each call:
//! [`RateLimiter::should_wait`] and [`RateLimiter::admission`]. The transport
//! decides what to do with the answer.
//!
//! Signals read from responses:
//! - `x-ratelimit-limit` / `x-ratelimit-remaining` / `x-ratelimit-reset`
//! - `x-app-usage` (JSON percentages: `call_count`, `total_time`, `total_cputime`)
//! - `Retry-After` on 429 responses, via [`RateLimiter::mark_exhausted`]

use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

/// Tuning knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterConfig {
    /// Assumed quota before any response has been seen
    pub initial_limit: u32,
    /// Fraction of the quota after which callers should slow down
    pub near_limit_threshold: f64,
    /// Longest pre-flight delay the transport will sit through before rejecting
    pub max_wait: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            initial_limit: 100,
            near_limit_threshold: 0.8,
            max_wait: Duration::from_secs(60),
        }
    }
}

/// Pre-flight recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Send now
    Proceed,
    /// Send after this delay
    Delay(Duration),
    /// Do not send; the quota frees up after this long
    Reject(Duration),
}

/// Point-in-time view for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    /// Tracked quota
    pub limit: u32,
    /// Tracked remaining calls
    pub remaining: u32,
    /// Seconds until the window resets, if known
    pub reset_in_secs: Option<u64>,
    /// Highest usage percentage reported by the platform
    pub usage_percent: f64,
    /// Whether usage crossed the near-limit threshold
    pub near_limit: bool,
    /// Whether a 429 is still in effect
    pub throttled: bool,
    /// Whether any response has updated the state
    pub observed: bool,
}

#[derive(Debug, Clone)]
struct State {
    limit: u32,
    remaining: u32,
    reset_at: Option<Instant>,
    usage_percent: f64,
    throttled_until: Option<Instant>,
    observed: bool,
}

impl State {
    fn fresh(limit: u32) -> Self {
        Self {
            limit,
            remaining: limit,
            reset_at: None,
            usage_percent: 0.0,
            throttled_until: None,
            observed: false,
        }
    }

    /// Whether the tracked window is still running at `now`
    fn window_open(&self, now: Instant) -> bool {
        self.reset_at.is_none_or(|reset| now < reset)
    }

    fn used_fraction(&self, now: Instant) -> f64 {
        if !self.window_open(now) {
            return 0.0;
        }
        let from_counts = if self.limit == 0 {
            0.0
        } else {
            f64::from(self.limit.saturating_sub(self.remaining)) / f64::from(self.limit)
        };
        from_counts.max(self.usage_percent / 100.0)
    }

    fn throttle_remaining(&self, now: Instant) -> Option<Duration> {
        self.throttled_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    fn exhausted_remaining(&self, now: Instant) -> Option<Duration> {
        if self.remaining > 0 || !self.observed {
            return None;
        }
        self.reset_at
            .filter(|reset| *reset > now)
            .map(|reset| reset - now)
    }
}

#[derive(Debug, Deserialize)]
struct AppUsage {
    #[serde(default)]
    call_count: f64,
    #[serde(default)]
    total_time: f64,
    #[serde(default)]
    total_cputime: f64,
}

/// Per-client rate limit estimator
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: RwLock<State>,
}

impl RateLimiter {
    /// Limiter with the given tuning
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            state: RwLock::new(State::fresh(config.initial_limit)),
        }
    }

    fn read(&self) -> State {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        match self.state.write() {
            Ok(mut guard) => f(&mut *guard),
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                f(&mut *guard)
            }
        }
    }

    /// Tracked quota
    pub fn limit(&self) -> u32 {
        self.read().limit
    }

    /// Tracked remaining calls
    pub fn remaining(&self) -> u32 {
        self.read().remaining
    }

    /// Whether callers should hold off
    ///
    /// False until a response has shown the quota under pressure.
    pub fn should_wait(&self) -> bool {
        let state = self.read();
        let now = Instant::now();
        if state.throttle_remaining(now).is_some() || state.exhausted_remaining(now).is_some() {
            return true;
        }
        state.observed && state.used_fraction(now) >= self.config.near_limit_threshold
    }

    /// What the transport should do before sending
    pub fn admission(&self) -> Admission {
        let state = self.read();
        let now = Instant::now();

        let blocked = state
            .throttle_remaining(now)
            .into_iter()
            .chain(state.exhausted_remaining(now))
            .max();
        if let Some(wait) = blocked {
            return if wait <= self.config.max_wait {
                Admission::Delay(wait)
            } else {
                Admission::Reject(wait)
            };
        }

        if state.observed && state.used_fraction(now) >= self.config.near_limit_threshold {
            // Spread what is left of the quota over what is left of the window
            if let Some(reset) = state.reset_at.filter(|r| *r > now) {
                let pace = (reset - now) / state.remaining.saturating_add(1);
                return Admission::Delay(pace.min(self.config.max_wait));
            }
        }

        Admission::Proceed
    }

    /// Fold rate limit headers into the state
    pub fn update_from_headers(&self, headers: &HeaderMap) {
        let limit = header_u64(headers, "x-ratelimit-limit");
        let remaining = header_u64(headers, "x-ratelimit-remaining");
        let reset = header_u64(headers, "x-ratelimit-reset").map(reset_delay);
        let usage = headers
            .get("x-app-usage")
            .and_then(|v| v.to_str().ok())
            .and_then(|raw| serde_json::from_str::<AppUsage>(raw).ok())
            .map(|u| u.call_count.max(u.total_time).max(u.total_cputime));

        if limit.is_none() && remaining.is_none() && reset.is_none() && usage.is_none() {
            return;
        }

        let now = Instant::now();
        self.write(|state| {
            if let Some(limit) = limit {
                state.limit = u32::try_from(limit).unwrap_or(u32::MAX);
            }
            if let Some(remaining) = remaining {
                state.remaining = u32::try_from(remaining).unwrap_or(u32::MAX).min(state.limit);
            }
            if let Some(delay) = reset {
                state.reset_at = Some(now + delay);
            }
            if let Some(usage) = usage {
                state.usage_percent = usage;
            }
            state.observed = true;
            debug!(
                limit = state.limit,
                remaining = state.remaining,
                usage_percent = state.usage_percent,
                "Rate limit state updated"
            );
        });
    }

    /// Record a 429: nothing should go out for `retry_after`
    pub fn mark_exhausted(&self, retry_after: Duration) {
        let now = Instant::now();
        self.write(|state| {
            state.observed = true;
            if !retry_after.is_zero() {
                state.remaining = 0;
                state.throttled_until = Some(now + retry_after);
                let until = now + retry_after;
                state.reset_at = Some(state.reset_at.map_or(until, |r| r.max(until)));
            }
        });
        debug!(retry_after_secs = retry_after.as_secs(), "Rate limit exhausted");
    }

    /// Forget everything observed so far
    pub fn reset(&self) {
        let limit = self.config.initial_limit;
        self.write(|state| *state = State::fresh(limit));
    }

    /// Snapshot for display
    pub fn status(&self) -> RateLimitStatus {
        let state = self.read();
        let now = Instant::now();
        RateLimitStatus {
            limit: state.limit,
            remaining: state.remaining,
            reset_in_secs: state
                .reset_at
                .filter(|r| *r > now)
                .map(|r| (r - now).as_secs()),
            usage_percent: state.usage_percent,
            near_limit: state.observed
                && state.used_fraction(now) >= self.config.near_limit_threshold,
            throttled: state.throttle_remaining(now).is_some(),
            observed: state.observed,
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// `x-ratelimit-reset` is either a Unix timestamp or a number of seconds
fn reset_delay(value: u64) -> Duration {
    const UNIX_THRESHOLD: u64 = 1_000_000_000;
    if value >= UNIX_THRESHOLD {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        Duration::from_secs(value.saturating_sub(now))
    } else {
        Duration::from_secs(value)
    }
}
