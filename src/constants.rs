//! Configuration constants for the trivia room
//!
//! This module contains the limits and defaults used throughout the room
//! to ensure data integrity and provide consistent boundaries for the
//! different components.

/// Round timing and scoring constants
pub mod round {
    /// Default length of a round in seconds before the question expires
    pub const DEFAULT_DURATION_SECONDS: u64 = 60;
    /// Minimum configurable round length in seconds
    pub const MIN_DURATION_SECONDS: u64 = 5;
    /// Maximum configurable round length in seconds
    pub const MAX_DURATION_SECONDS: u64 = 600;
    /// Default number of points awarded for a correct guess
    pub const DEFAULT_POINTS_AWARDED: u64 = 10;
}

/// Room capacity constants
pub mod room {
    /// Maximum number of players allowed in the room at once
    pub const MAX_PLAYER_COUNT: usize = 1000;
}

/// Player name constraints
pub mod player_name {
    /// Maximum length of a player name in characters
    pub const MAX_LENGTH: usize = 30;
}

/// Question text constraints
pub mod question_text {
    /// Maximum length of a question in characters
    pub const MAX_LENGTH: usize = 200;
}

/// Answer text constraints
pub mod answer_text {
    /// Maximum length of an answer or guess in characters
    pub const MAX_LENGTH: usize = 200;
}
