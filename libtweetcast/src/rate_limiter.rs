//! Local rate limiting for outgoing actions
//!
//! Enforces a minimum spacing between actions of the same category without
//! asking the server. A violation is an immediate error; nothing is queued or
//! retried. State lives in the limiter instance, so separate processes (or
//! separate clients) are not coordinated.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::error::{Result, TweetcastError};
use crate::types::ActionCategory;

/// Spacing applied to categories without an explicit override
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Per-category minimum-interval rate limiter
pub struct RateLimiter {
    default_interval: Duration,
    /// Category-specific intervals
    intervals: HashMap<ActionCategory, Duration>,
    /// Last permitted action per category
    last_seen: Mutex<HashMap<ActionCategory, Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl RateLimiter {
    /// Create a limiter applying the same interval to every category
    pub fn new(min_interval: Duration) -> Self {
        Self::with_intervals(min_interval, HashMap::new())
    }

    /// Create a limiter with per-category overrides
    pub fn with_intervals(
        default_interval: Duration,
        intervals: HashMap<ActionCategory, Duration>,
    ) -> Self {
        Self {
            default_interval,
            intervals,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Build a limiter from the `[rate_limit]` config section
    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        let default_interval = config.default_interval()?;
        let intervals = config.category_intervals()?;
        Ok(Self::with_intervals(default_interval, intervals))
    }

    /// Minimum spacing for a category. Zero disables throttling.
    pub fn interval(&self, category: ActionCategory) -> Duration {
        self.intervals
            .get(&category)
            .copied()
            .unwrap_or(self.default_interval)
    }

    /// Check if the action is allowed now and record it
    pub fn check_and_record(&self, category: ActionCategory) -> Result<()> {
        self.check_and_record_at(category, Instant::now())
    }

    /// Same as [`check_and_record`](Self::check_and_record) at an explicit instant
    pub fn check_and_record_at(&self, category: ActionCategory, now: Instant) -> Result<()> {
        self.check_all_at(&[category], now)
    }

    /// Check several categories and record all of them, or none
    pub fn check_all(&self, categories: &[ActionCategory]) -> Result<()> {
        self.check_all_at(categories, Instant::now())
    }

    /// Same as [`check_all`](Self::check_all) at an explicit instant
    ///
    /// The check and the record happen under one lock, so two concurrent
    /// callers in the same category cannot both be permitted.
    pub fn check_all_at(&self, categories: &[ActionCategory], now: Instant) -> Result<()> {
        let mut last_seen = self.lock();

        for &category in categories {
            if let Some(wait) = self.wait_time(&last_seen, category, now) {
                warn!(
                    category = %category,
                    wait_ms = wait.as_millis() as u64,
                    "Rejected action by local rate limit"
                );
                return Err(TweetcastError::RateLimit(format!(
                    "{} actions are limited to one every {}ms; retry in {}ms",
                    category,
                    self.interval(category).as_millis(),
                    wait.as_millis()
                )));
            }
        }

        for &category in categories {
            let last = last_seen.entry(category).or_insert(now);
            // Never move a timestamp backwards
            if *last < now {
                *last = now;
            }
            debug!(category = %category, "Recorded action");
        }

        Ok(())
    }

    /// Time until the category is permitted again (zero if it is now)
    pub fn remaining(&self, category: ActionCategory, now: Instant) -> Duration {
        let last_seen = self.lock();
        self.wait_time(&last_seen, category, now)
            .unwrap_or(Duration::ZERO)
    }

    fn wait_time(
        &self,
        last_seen: &HashMap<ActionCategory, Instant>,
        category: ActionCategory,
        now: Instant,
    ) -> Option<Duration> {
        let last = last_seen.get(&category)?;
        let interval = self.interval(category);
        let elapsed = now.saturating_duration_since(*last);

        if elapsed < interval {
            Some(interval - elapsed)
        } else {
            None
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ActionCategory, Instant>> {
        // The map is valid after any panic mid-update, so poisoning is ignored
        self.last_seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_secs(1))
    }

    #[test]
    fn test_allows_first_action() {
        let limiter = test_limiter();
        let now = Instant::now();

        assert!(limiter.check_and_record_at(ActionCategory::Tweet, now).is_ok());
    }

    #[test]
    fn test_blocks_action_inside_interval() {
        let limiter = test_limiter();
        let now = Instant::now();

        limiter
            .check_and_record_at(ActionCategory::Tweet, now)
            .unwrap();

        let result =
            limiter.check_and_record_at(ActionCategory::Tweet, now + Duration::from_millis(200));
        let err = result.unwrap_err();
        assert!(matches!(err, TweetcastError::RateLimit(_)));
        assert!(err.to_string().contains("Rate limit"));
        assert!(err.to_string().contains("tweet"));
        assert!(err.to_string().contains("retry in 800ms"));
    }

    #[test]
    fn test_allows_action_after_interval() {
        let limiter = test_limiter();
        let now = Instant::now();

        limiter
            .check_and_record_at(ActionCategory::Tweet, now)
            .unwrap();

        let later = now + Duration::from_secs(1);
        assert!(limiter
            .check_and_record_at(ActionCategory::Tweet, later)
            .is_ok());
    }

    #[test]
    fn test_rejected_action_is_not_recorded() {
        let limiter = test_limiter();
        let now = Instant::now();

        limiter
            .check_and_record_at(ActionCategory::Tweet, now)
            .unwrap();
        let _ = limiter.check_and_record_at(ActionCategory::Tweet, now + Duration::from_millis(900));

        // The interval still counts from the first action
        assert!(limiter
            .check_and_record_at(ActionCategory::Tweet, now + Duration::from_millis(1000))
            .is_ok());
    }

    #[test]
    fn test_independent_categories() {
        let limiter = test_limiter();
        let now = Instant::now();

        limiter
            .check_and_record_at(ActionCategory::Tweet, now)
            .unwrap();

        assert!(limiter
            .check_and_record_at(ActionCategory::Media, now)
            .is_ok());
        assert!(limiter
            .check_and_record_at(ActionCategory::Search, now)
            .is_ok());
    }

    #[test]
    fn test_check_all_records_nothing_on_rejection() {
        let limiter = test_limiter();
        let now = Instant::now();

        limiter
            .check_and_record_at(ActionCategory::Tweet, now)
            .unwrap();

        let result = limiter.check_all_at(
            &[ActionCategory::Media, ActionCategory::Tweet],
            now + Duration::from_millis(10),
        );
        assert!(result.is_err());

        // Media was not consumed by the failed combined check
        assert_eq!(
            limiter.remaining(ActionCategory::Media, now + Duration::from_millis(10)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_check_all_records_every_category() {
        let limiter = test_limiter();
        let now = Instant::now();

        limiter
            .check_all_at(&[ActionCategory::Media, ActionCategory::Tweet], now)
            .unwrap();

        let soon = now + Duration::from_millis(1);
        assert!(limiter.check_and_record_at(ActionCategory::Media, soon).is_err());
        assert!(limiter.check_and_record_at(ActionCategory::Tweet, soon).is_err());
    }

    #[test]
    fn test_remaining() {
        let limiter = test_limiter();
        let now = Instant::now();

        assert_eq!(limiter.remaining(ActionCategory::Tweet, now), Duration::ZERO);

        limiter
            .check_and_record_at(ActionCategory::Tweet, now)
            .unwrap();
        assert_eq!(
            limiter.remaining(ActionCategory::Tweet, now + Duration::from_millis(250)),
            Duration::from_millis(750)
        );
    }

    #[test]
    fn test_category_override() {
        let mut intervals = HashMap::new();
        intervals.insert(ActionCategory::Media, Duration::from_secs(10));
        let limiter = RateLimiter::with_intervals(Duration::from_secs(1), intervals);
        let now = Instant::now();

        assert_eq!(limiter.interval(ActionCategory::Media), Duration::from_secs(10));
        assert_eq!(limiter.interval(ActionCategory::Tweet), Duration::from_secs(1));

        limiter
            .check_and_record_at(ActionCategory::Media, now)
            .unwrap();
        assert!(limiter
            .check_and_record_at(ActionCategory::Media, now + Duration::from_secs(5))
            .is_err());
    }

    #[test]
    fn test_zero_interval_disables_throttling() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter
                .check_and_record_at(ActionCategory::Tweet, now)
                .is_ok());
        }
    }

    #[test]
    fn test_earlier_instant_does_not_rewind_state() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let now = Instant::now();
        let later = now + Duration::from_secs(5);

        limiter
            .check_and_record_at(ActionCategory::Tweet, later)
            .unwrap();
        limiter
            .check_and_record_at(ActionCategory::Tweet, now)
            .unwrap();

        let last_seen = limiter.lock();
        assert_eq!(last_seen.get(&ActionCategory::Tweet), Some(&later));
    }

    #[test]
    fn test_concurrent_checks_permit_exactly_one() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(60)));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.check_and_record(ActionCategory::Tweet).is_ok())
            })
            .collect();

        let permitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(permitted, 1);
    }
}
