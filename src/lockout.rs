//! Failed-login lockout.
//!
//! After too many consecutive rejected logins the form is locked until a
//! single stored deadline. Nothing ticks: callers ask for the remaining time
//! whenever they render the warning, and an elapsed deadline simply reads as
//! unlocked.

use chrono::{DateTime, Duration, Utc};

use crate::config::LockoutConfig;
use crate::AuthError;

#[derive(Debug, Clone)]
pub struct LoginLockout {
    config: LockoutConfig,
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
}

impl LoginLockout {
    pub fn new(config: LockoutConfig) -> Self {
        Self {
            config,
            failed_attempts: 0,
            locked_until: None,
        }
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Rejections left before the form locks.
    pub fn attempts_left(&self) -> u32 {
        self.config
            .max_failed_attempts
            .saturating_sub(self.failed_attempts)
    }

    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Time until the form unlocks, `None` when not locked.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(Utc::now())
    }

    /// Refuses a login attempt while locked.
    ///
    /// An elapsed deadline resets the counter so the user starts fresh.
    pub fn check_at(&mut self, now: DateTime<Utc>) -> Result<(), AuthError> {
        if let Some(remaining) = self.remaining_at(now) {
            return Err(AuthError::TooManyAttempts {
                retry_after: ceil_seconds(remaining),
            });
        }
        if self.locked_until.take().is_some() {
            self.failed_attempts = 0;
        }
        Ok(())
    }

    /// Counts a rejected login. Returns the deadline when this rejection
    /// locks the form.
    pub fn record_failure_at(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.locked_until.is_some_and(|until| until <= now) {
            self.locked_until = None;
            self.failed_attempts = 0;
        }

        self.failed_attempts = self.failed_attempts.saturating_add(1);

        if self.failed_attempts >= self.config.max_failed_attempts && self.locked_until.is_none() {
            let until = now + self.config.lockout_duration;
            self.locked_until = Some(until);
            return Some(until);
        }
        None
    }

    pub fn record_success(&mut self) {
        self.failed_attempts = 0;
        self.locked_until = None;
    }
}

fn ceil_seconds(duration: Duration) -> i64 {
    let millis = duration.num_milliseconds().max(0);
    (millis + 999) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lockout() -> LoginLockout {
        LoginLockout::new(LockoutConfig {
            max_failed_attempts: 3,
            lockout_duration: Duration::minutes(2),
        })
    }

    #[test]
    fn test_locks_after_max_failures() {
        let mut lockout = lockout();
        let now = Utc::now();

        assert_eq!(lockout.record_failure_at(now), None);
        assert_eq!(lockout.record_failure_at(now), None);
        assert_eq!(lockout.attempts_left(), 1);

        let until = lockout.record_failure_at(now).unwrap();
        assert_eq!(until, now + Duration::minutes(2));
        assert!(lockout.is_locked_at(now));
        assert_eq!(lockout.remaining_at(now), Some(Duration::minutes(2)));

        let err = lockout.check_at(now + Duration::seconds(30)).unwrap_err();
        assert_eq!(err, AuthError::TooManyAttempts { retry_after: 90 });
    }

    #[test]
    fn test_deadline_elapses_without_a_timer() {
        let mut lockout = lockout();
        let now = Utc::now();
        for _ in 0..3 {
            lockout.record_failure_at(now);
        }

        let later = now + Duration::minutes(2);
        assert!(!lockout.is_locked_at(later));
        assert_eq!(lockout.remaining_at(later), None);
        assert!(lockout.check_at(later).is_ok());
        assert_eq!(lockout.failed_attempts(), 0);
    }

    #[test]
    fn test_failure_after_elapsed_deadline_starts_over() {
        let mut lockout = lockout();
        let now = Utc::now();
        for _ in 0..3 {
            lockout.record_failure_at(now);
        }

        let later = now + Duration::minutes(5);
        assert_eq!(lockout.record_failure_at(later), None);
        assert_eq!(lockout.failed_attempts(), 1);
    }

    #[test]
    fn test_success_resets() {
        let mut lockout = lockout();
        let now = Utc::now();
        lockout.record_failure_at(now);
        lockout.record_failure_at(now);

        lockout.record_success();
        assert_eq!(lockout.failed_attempts(), 0);
        assert_eq!(lockout.attempts_left(), 3);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(ceil_seconds(Duration::milliseconds(1)), 1);
        assert_eq!(ceil_seconds(Duration::seconds(5)), 5);
        assert_eq!(ceil_seconds(Duration::milliseconds(5001)), 6);
    }
}
