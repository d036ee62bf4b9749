//! # tabtodo testing
//!
//! Testing utilities and helpers for tabtodo reducers.
//!
//! This crate provides:
//! - Deterministic [`Clock`] implementations
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use tabtodo_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(TodoReducer::new())
//!     .with_env(TodoEnvironment::new(Arc::new(test_clock())))
//!     .given_state(TodoState::default())
//!     .when_action(TodoAction::SetSearchText("milk".into()))
//!     .then_state(|state| assert_eq!(state.ui.search_text, "milk"))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use tabtodo_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tabtodo_testing::mocks::FixedClock;
    /// use tabtodo_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when a test advances it
    ///
    /// Clones share the same underlying time, so a test can keep one handle
    /// and give another to the environment under test.
    ///
    /// ```
    /// use tabtodo_testing::mocks::ManualClock;
    /// use tabtodo_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = ManualClock::new(Utc::now());
    /// let before = clock.now();
    /// clock.advance(Duration::seconds(5));
    /// assert_eq!(clock.now() - before, Duration::seconds(5));
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a new manual clock starting at `start`
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(start)),
            }
        }

        /// Move the clock forward by `delta`
        pub fn advance(&self, delta: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += delta;
        }

        /// Jump the clock to an absolute time
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// The instant every test clock starts at: 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(1_735_689_600)
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(mocks::epoch());
        let shared = clock.clone();
        clock.advance(chrono::Duration::minutes(3));
        assert_eq!(shared.now(), mocks::epoch() + chrono::Duration::minutes(3));

        shared.set(mocks::epoch());
        assert_eq!(clock.now(), mocks::epoch());
    }
}
