//! # Quizroom Game Library
//!
//! This library provides the core logic for a single shared trivia-game
//! room. Players join the room, one player at a time acts as game master
//! and poses a question, other players submit guesses, correct guesses
//! award points and rotate the game-master role, and an unanswered
//! question times out after a fixed countdown.
//!
//! The crate is sans-IO: the network transport delivers inbound events to
//! [`game::Game`], receives outbound notifications through
//! [`session::Tunnel`] implementations, and runs the countdown by
//! delivering scheduled [`AlarmMessage`]s back after the requested delay.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
use serde::{Deserialize, Serialize};

pub mod clock;
pub mod constants;
pub mod game;
pub mod names;
pub mod player;
pub mod question;
pub mod session;

/// Messages scheduled for delayed delivery back into the room
///
/// The room hands these to the embedder's `schedule_message` callback
/// together with a delay; the embedder delivers each one back through
/// [`game::Game::receive_alarm`] once the delay has passed. Ticks that
/// outlive their round are recognized and discarded on delivery, so the
/// scheduler never needs to cancel anything.
#[derive(Debug, Clone, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Countdown clock ticks
    Clock(clock::AlarmMessage),
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_message_from_clock_tick() {
        let alarm: AlarmMessage = clock::AlarmMessage::Tick { round: 1 }.into();
        assert!(matches!(
            alarm,
            AlarmMessage::Clock(clock::AlarmMessage::Tick { round: 1 })
        ));
    }

    #[test]
    fn test_alarm_message_serialization_round_trip() {
        let alarm: AlarmMessage = clock::AlarmMessage::Tick { round: 5 }.into();
        let serialized = serde_json::to_string(&alarm).unwrap();
        let deserialized: AlarmMessage = serde_json::from_str(&serialized).unwrap();
        assert!(matches!(
            deserialized,
            AlarmMessage::Clock(clock::AlarmMessage::Tick { round: 5 })
        ));
    }
}
