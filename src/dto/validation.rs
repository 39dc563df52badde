//! Validation helpers for DTOs.

use validator::ValidationError;

/// Upper bound for player identifiers accepted over HTTP.
pub const MAX_PLAYER_ID_LEN: usize = 64;
/// Upper bound for player names accepted over HTTP, counted in characters before trimming.
pub const MAX_PLAYER_NAME_LEN: usize = 64;

/// Validates that a player id is non-empty, bounded and free of control characters.
///
/// # Examples
///
/// ```ignore
/// validate_player_id("5f0c7a3e-0d5b-4c1e-9f57-1f2b6a0a9e21") // Ok
/// validate_player_id("")                                     // Err - empty
/// ```
pub fn validate_player_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        let mut err = ValidationError::new("player_id_empty");
        err.message = Some("Player ID must not be empty".into());
        return Err(err);
    }

    if id.chars().count() > MAX_PLAYER_ID_LEN {
        let mut err = ValidationError::new("player_id_length");
        err.message = Some(
            format!("Player ID must be at most {MAX_PLAYER_ID_LEN} characters").into(),
        );
        return Err(err);
    }

    if id.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_id_format");
        err.message = Some("Player ID must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates the shape of a player name.
///
/// Blank names are well-formed here: the state machine ignores them.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len > MAX_PLAYER_NAME_LEN {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_PLAYER_NAME_LEN} characters (got {len})")
                .into(),
        );
        return Err(err);
    }

    if name.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        let mut err = ValidationError::new("player_name_format");
        err.message = Some("Player name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}
