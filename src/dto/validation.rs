//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::config::{ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH};

/// Maximum accepted length of a player display name, after trimming.
pub const MAX_PLAYER_NAME_LEN: usize = 20;

/// Validates that a join code is six characters from the room code alphabet.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("QZWX23") // Ok
/// validate_room_code("qzwx23") // Err - lowercase
/// validate_room_code("QZWX0I") // Err - ambiguous characters
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be exactly {ROOM_CODE_LENGTH} characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code.bytes().all(|byte| ROOM_CODE_ALPHABET.contains(&byte)) {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some(
            "Room code must contain only uppercase letters and digits, excluding I, O, 0, and 1"
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates a player display name: non-blank and at most 20 characters once
/// trimmed. Comparison against existing names is case-sensitive and happens
/// in the service layer.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    if trimmed.chars().count() > MAX_PLAYER_NAME_LEN {
        let mut err = ValidationError::new("player_name_length");
        err.message =
            Some(format!("Player name must be at most {MAX_PLAYER_NAME_LEN} characters").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("ABCDEF").is_ok());
        assert!(validate_room_code("234567").is_ok());
        assert!(validate_room_code("QZWX23").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid_length() {
        assert!(validate_room_code("ABCDE").is_err()); // too short
        assert!(validate_room_code("ABCDEFG").is_err()); // too long
        assert!(validate_room_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_room_code_invalid_format() {
        assert!(validate_room_code("abcdef").is_err()); // lowercase
        assert!(validate_room_code("ABCDE0").is_err()); // ambiguous zero
        assert!(validate_room_code("ABCDE1").is_err()); // ambiguous one
        assert!(validate_room_code("ABCDEI").is_err()); // ambiguous I
        assert!(validate_room_code("ABCDEO").is_err()); // ambiguous O
        assert!(validate_room_code("ABC EF").is_err()); // space
    }

    #[test]
    fn test_validate_player_name() {
        assert!(validate_player_name("Ana").is_ok());
        assert!(validate_player_name("  Ana  ").is_ok()); // trimmed before checks
        assert!(validate_player_name("a".repeat(20).as_str()).is_ok());
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name("a".repeat(21).as_str()).is_err());
    }
}
