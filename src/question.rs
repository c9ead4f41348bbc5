//! The question/answer pair posed during a round
//!
//! A question is immutable once created. The expected answer is trimmed at
//! creation, and guesses are matched case-insensitively with surrounding
//! whitespace ignored, so `" Paris "` matches an answer of `"paris"`.

use serde::{Deserialize, Serialize};

/// Normalizes an answer string for comparison
///
/// Trims surrounding whitespace and lowercases, so matching ignores both.
fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// A question with its expected answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question text shown to players
    text: String,
    /// The expected answer, trimmed at creation
    answer: String,
}

impl Question {
    /// Creates a new question, trimming the expected answer
    pub fn new(text: impl Into<String>, answer: &str) -> Self {
        Self {
            text: text.into(),
            answer: answer.trim().to_owned(),
        }
    }

    /// The question text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The expected answer as it will be revealed on expiration
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Checks whether a guess matches the expected answer
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace on
    /// both sides.
    pub fn accepts(&self, guess: &str) -> bool {
        normalize(&self.answer) == normalize(guess)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_answer_trimmed_at_creation() {
        let question = Question::new("2+2", "  4  ");
        assert_eq!(question.answer(), "4");
        assert_eq!(question.text(), "2+2");
    }

    #[test]
    fn test_accepts_exact_answer() {
        let question = Question::new("capital of France", "Paris");
        assert!(question.accepts("Paris"));
    }

    #[test]
    fn test_accepts_ignores_case() {
        let question = Question::new("capital of France", "paris");
        assert!(question.accepts("PARIS"));
        assert!(question.accepts("pArIs"));
    }

    #[test]
    fn test_accepts_ignores_surrounding_whitespace() {
        let question = Question::new("capital of France", "paris");
        assert!(question.accepts(" Paris "));
        assert!(question.accepts("\tparis\n"));
    }

    #[test]
    fn test_rejects_wrong_guess() {
        let question = Question::new("capital of France", "Paris");
        assert!(!question.accepts("London"));
        assert!(!question.accepts(""));
    }

    #[test]
    fn test_rejects_partial_guess() {
        let question = Question::new("capital of France", "Paris");
        assert!(!question.accepts("Par"));
        assert!(!question.accepts("Parisian"));
    }

    #[test]
    fn test_inner_whitespace_is_significant() {
        let question = Question::new("who wrote Hamlet", "William Shakespeare");
        assert!(question.accepts("william shakespeare"));
        assert!(!question.accepts("williamshakespeare"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let question = Question::new("2+2", "4");
        let serialized = serde_json::to_string(&question).unwrap();
        let deserialized: Question = serde_json::from_str(&serialized).unwrap();
        assert_eq!(question, deserialized);
    }
}
