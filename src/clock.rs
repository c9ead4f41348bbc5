//! The per-round countdown clock
//!
//! A single-slot repeating timer with whole-second granularity. The room
//! does not run threads of its own: each tick is an [`AlarmMessage`]
//! handed to the embedder's scheduler and delivered back after one second.
//! Every run gets a fresh round generation, and delivered ticks carry the
//! generation they were scheduled under, so ticks belonging to a stopped
//! run are recognized and discarded. Expiration is reported exactly once
//! per run, on the tick that exhausts the configured duration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Interval between two ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Messages used for scheduled clock ticks
///
/// The embedder delivers these back through
/// [`Game::receive_alarm`](crate::game::Game::receive_alarm) after
/// [`TICK_INTERVAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One second elapsed for the given round generation
    Tick {
        /// Round generation the tick was scheduled under
        round: u64,
    },
}

/// Errors that can occur when operating the clock
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// `start` was called while a run is still active
    #[error("countdown is already running")]
    AlreadyRunning,
}

/// Outcome of delivering one tick to the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The tick belongs to a run that is no longer active
    Stale,
    /// The run continues with this many seconds remaining
    Running {
        /// Seconds left until expiration
        seconds_left: u64,
    },
    /// The run reached its configured duration; the clock has stopped itself
    Expired,
}

/// A single-slot countdown bound to one room
#[derive(Debug, Clone)]
pub struct Clock {
    /// Configured length of a run
    duration: Duration,
    /// Whole seconds elapsed in the active run
    elapsed_seconds: u64,
    /// Generation of the active run, `None` while stopped
    run: Option<u64>,
    /// Generation handed out by the next `start`
    next_round: u64,
}

impl Clock {
    /// Creates a stopped clock with the given run duration
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed_seconds: 0,
            run: None,
            next_round: 0,
        }
    }

    /// Begins a new run and returns its round generation
    ///
    /// The caller schedules the first tick alarm stamped with the returned
    /// generation.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyRunning` if a run is active; the active run
    /// is left untouched.
    pub fn start(&mut self) -> Result<u64, Error> {
        if self.run.is_some() {
            return Err(Error::AlreadyRunning);
        }
        let round = self.next_round;
        self.next_round += 1;
        self.run = Some(round);
        self.elapsed_seconds = 0;
        Ok(round)
    }

    /// Cancels the active run and resets elapsed seconds
    ///
    /// Idempotent; stopping a stopped clock is a no-op. Ticks already
    /// scheduled for the cancelled run will be reported as [`Tick::Stale`].
    pub fn stop(&mut self) {
        self.run = None;
        self.elapsed_seconds = 0;
    }

    /// Whether a run is currently active
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Seconds remaining in the active run, or the full duration while
    /// stopped
    pub fn seconds_left(&self) -> u64 {
        self.duration.as_secs().saturating_sub(self.elapsed_seconds)
    }

    /// Advances the clock by one second for the given round generation
    ///
    /// Ticks whose generation does not match the active run are reported
    /// as [`Tick::Stale`] and leave the clock untouched. When the elapsed
    /// time reaches the configured duration the clock stops itself and
    /// reports [`Tick::Expired`]; any tick after that is stale, so
    /// expiration is observed exactly once per run.
    pub fn tick(&mut self, round: u64) -> Tick {
        if self.run != Some(round) {
            return Tick::Stale;
        }
        self.elapsed_seconds += 1;
        if self.elapsed_seconds >= self.duration.as_secs() {
            self.stop();
            return Tick::Expired;
        }
        Tick::Running {
            seconds_left: self.seconds_left(),
        }
    }
}

/// Validates that a duration falls within specified bounds.
///
/// This is a custom validation function for use with the `garde` crate.
/// It checks if the duration in seconds is within the inclusive range
/// defined by `MIN_SECONDS` and `MAX_SECONDS`.
///
/// # Errors
///
/// Returns a `garde::Error` if the duration is outside the specified bounds.
pub fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    val: &Duration,
    _ctx: &(),
) -> garde::Result {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn clock(seconds: u64) -> Clock {
        Clock::new(Duration::from_secs(seconds))
    }

    #[test]
    fn test_new_clock_is_stopped_with_full_duration() {
        let clock = clock(60);
        assert!(!clock.is_running());
        assert_eq!(clock.seconds_left(), 60);
    }

    #[test]
    fn test_tick_counts_down() {
        let mut clock = clock(60);
        let round = clock.start().unwrap();

        assert_eq!(clock.tick(round), Tick::Running { seconds_left: 59 });
        assert_eq!(clock.tick(round), Tick::Running { seconds_left: 58 });
        assert_eq!(clock.seconds_left(), 58);
    }

    #[test]
    fn test_expiration_fires_exactly_once() {
        let mut clock = clock(3);
        let round = clock.start().unwrap();

        assert_eq!(clock.tick(round), Tick::Running { seconds_left: 2 });
        assert_eq!(clock.tick(round), Tick::Running { seconds_left: 1 });
        assert_eq!(clock.tick(round), Tick::Expired);
        assert!(!clock.is_running());

        // A straggler tick from the finished run is discarded
        assert_eq!(clock.tick(round), Tick::Stale);
    }

    #[test]
    fn test_start_while_running_is_an_error() {
        let mut clock = clock(60);
        let round = clock.start().unwrap();
        clock.tick(round);

        assert_eq!(clock.start(), Err(Error::AlreadyRunning));
        // The active run is untouched
        assert_eq!(clock.seconds_left(), 59);
        assert_eq!(clock.tick(round), Tick::Running { seconds_left: 58 });
    }

    #[test]
    fn test_stop_is_idempotent_and_resets_elapsed() {
        let mut clock = clock(60);
        let round = clock.start().unwrap();
        clock.tick(round);
        clock.tick(round);

        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.seconds_left(), 60);

        clock.stop();
        assert_eq!(clock.seconds_left(), 60);
    }

    #[test]
    fn test_stopped_run_ticks_are_stale() {
        let mut clock = clock(60);
        let round = clock.start().unwrap();
        clock.stop();

        assert_eq!(clock.tick(round), Tick::Stale);
        assert_eq!(clock.seconds_left(), 60);
    }

    #[test]
    fn test_restart_gets_a_fresh_generation() {
        let mut clock = clock(60);
        let first = clock.start().unwrap();
        clock.stop();
        let second = clock.start().unwrap();

        assert_ne!(first, second);
        assert_eq!(clock.tick(first), Tick::Stale);
        assert_eq!(clock.tick(second), Tick::Running { seconds_left: 59 });
    }

    #[test]
    fn test_validate_duration_bounds() {
        assert!(validate_duration::<5, 240>(&Duration::from_secs(5), &()).is_ok());
        assert!(validate_duration::<5, 240>(&Duration::from_secs(240), &()).is_ok());
        assert!(validate_duration::<5, 240>(&Duration::from_secs(4), &()).is_err());
        assert!(validate_duration::<5, 240>(&Duration::from_secs(241), &()).is_err());
    }

    #[test]
    fn test_alarm_message_serialization() {
        let alarm = AlarmMessage::Tick { round: 3 };
        let serialized = serde_json::to_string(&alarm).unwrap();
        let deserialized: AlarmMessage = serde_json::from_str(&serialized).unwrap();
        assert_eq!(alarm, deserialized);
    }
}
