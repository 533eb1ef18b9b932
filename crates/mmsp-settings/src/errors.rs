//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading settings or editing profiles.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read or write a settings file.
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in a settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was invalid (e.g., out of range).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
    /// No profile matched the given id or name.
    #[error("server profile not found: {0}")]
    ProfileNotFound(String),
    /// A profile with the same name already exists.
    #[error("server profile already exists: {0}")]
    DuplicateProfile(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err = SettingsError::Json(json_err);
        assert!(err.to_string().contains("parse settings JSON"));
    }

    #[test]
    fn invalid_value_display() {
        let err = SettingsError::InvalidValue("port must not be 0".to_string());
        assert_eq!(err.to_string(), "invalid settings value: port must not be 0");
    }

    #[test]
    fn profile_errors_display() {
        assert_eq!(
            SettingsError::ProfileNotFound("lobby".into()).to_string(),
            "server profile not found: lobby"
        );
        assert_eq!(
            SettingsError::DuplicateProfile("lobby".into()).to_string(),
            "server profile already exists: lobby"
        );
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SettingsError = io_err.into();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
