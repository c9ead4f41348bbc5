//! Player name validation
//!
//! Display names are chosen by the players themselves, so they are cleaned
//! and checked before a player is admitted to the room: surrounding
//! whitespace is stripped, and empty, over-long, or inappropriate names are
//! rejected. Identity in the room is the connection id, so names do not
//! need to be unique.

use rustrict::CensorStr;
use serde::Serialize;
use thiserror::Error;

use super::constants::player_name::MAX_LENGTH;

/// Errors that can occur during name validation
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Inappropriate,
}

/// Validates and cleans a requested display name
///
/// # Errors
///
/// * `Error::TooLong` - the name exceeds [`MAX_LENGTH`] characters
/// * `Error::Empty` - the name is empty after trimming whitespace
/// * `Error::Inappropriate` - the name fails the content filter
pub fn clean_name(name: &str) -> Result<String, Error> {
    if name.len() > MAX_LENGTH {
        return Err(Error::TooLong);
    }
    let name = rustrict::trim_whitespace(name);
    if name.is_empty() {
        return Err(Error::Empty);
    }
    if name.is_inappropriate() {
        return Err(Error::Inappropriate);
    }
    Ok(name.to_owned())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_trims_whitespace() {
        assert_eq!(clean_name("  Alice  ").unwrap(), "Alice");
    }

    #[test]
    fn test_clean_name_empty() {
        assert_eq!(clean_name(""), Err(Error::Empty));
        assert_eq!(clean_name("   "), Err(Error::Empty));
        assert_eq!(clean_name("\t\n"), Err(Error::Empty));
    }

    #[test]
    fn test_clean_name_too_long() {
        let long_name = "a".repeat(MAX_LENGTH + 1);
        assert_eq!(clean_name(&long_name), Err(Error::TooLong));
    }

    #[test]
    fn test_clean_name_max_length_allowed() {
        let max_name = "a".repeat(MAX_LENGTH);
        assert_eq!(clean_name(&max_name).unwrap(), max_name);
    }

    #[test]
    fn test_clean_name_inappropriate() {
        for name in ["damn", "fuck", "shit"] {
            assert_eq!(
                clean_name(name),
                Err(Error::Inappropriate),
                "expected '{name}' to be rejected"
            );
        }
    }

    #[test]
    fn test_clean_name_unicode() {
        let name = "Плеер测试";
        assert_eq!(clean_name(name).unwrap(), name);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Empty.to_string(), "name cannot be empty");
        assert_eq!(Error::TooLong.to_string(), "name is too long");
        assert_eq!(Error::Inappropriate.to_string(), "name is inappropriate");
    }
}
