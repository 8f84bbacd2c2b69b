//! Error types for the positioning engine
//!
//! Configuration problems (bad anchor names, edits that are not allowed)
//! are typed errors. Missing glyphs, characters or classes are not errors:
//! they are represented as `Option`s and handled with fallbacks.

use thiserror::Error;

/// Errors raised by geometric anchor resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("invalid anchor name: '{name}'")]
    InvalidAnchorName { name: String },
}

/// Errors raised by the persistence collaborator
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to write project data: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize project data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the positioning session and class engine
#[derive(Error, Debug)]
pub enum PositioningError {
    #[error(transparent)]
    InvalidAnchor(#[from] GeometryError),

    #[error("character not found: '{0}'")]
    CharacterNotFound(String),

    #[error("no positioning pair is loaded")]
    NoActivePair,

    #[error("editing is not allowed: {reason}")]
    EditNotAllowed { reason: String },

    #[error("pair {pair} is not governed by an attachment class")]
    NotLinkedToClass { pair: String },

    #[error(transparent)]
    Persistence(#[from] PersistError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_error_names_the_anchor() {
        let error = GeometryError::InvalidAnchorName {
            name: "topMiddle".to_string(),
        };
        assert_eq!(error.to_string(), "invalid anchor name: 'topMiddle'");

        let wrapped: PositioningError = error.clone().into();
        assert_eq!(wrapped.to_string(), error.to_string());
    }
}
