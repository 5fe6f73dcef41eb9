//! Error types for phaser passes and scene loading.
//!
//! Precondition violations during a pass (bad frame range, no active root) are
//! reported to the host and surface as `Outcome::Rejected`, not as errors. This
//! enum covers faults at the embedding boundary.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PhaserError {
    /// Frame range with `start >= end`.
    #[error("Invalid frame range: start {start} must be smaller than end {end}")]
    InvalidFrameRange { start: i32, end: i32 },

    /// Parameter that is NaN or infinite.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter { name: String, value: f32 },

    /// Two scene nodes share an id.
    #[error("Duplicate node id: {id}")]
    DuplicateNode { id: String },

    /// Node references a parent that is not part of the scene.
    #[error("Node '{id}' references unknown parent '{parent}'")]
    UnknownParent { id: String, parent: String },

    /// Lookup of a node that does not exist.
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Parent links form a loop.
    #[error("Cycle detected in hierarchy at node '{id}'")]
    Cycle { id: String },

    /// Rotation with non-finite components or zero length.
    #[error("Invalid rotation on node '{id}': {reason}")]
    InvalidRotation { id: String, reason: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl PhaserError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidFrameRange { .. } | Self::InvalidParameter { .. } => "validation",
            Self::DuplicateNode { .. }
            | Self::UnknownParent { .. }
            | Self::NodeNotFound { .. }
            | Self::Cycle { .. }
            | Self::InvalidRotation { .. } => "scene",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for PhaserError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(
            PhaserError::InvalidFrameRange { start: 3, end: 1 }.category(),
            "validation"
        );
        assert_eq!(
            PhaserError::Cycle { id: "a".into() }.category(),
            "scene"
        );
    }

    #[test]
    fn json_errors_convert() {
        let err: PhaserError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, PhaserError::Serialization { .. }));
    }
}
