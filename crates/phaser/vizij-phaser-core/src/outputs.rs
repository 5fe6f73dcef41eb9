//! Output contracts of the command surface.
//!
//! Keys themselves are persisted through the provider; what comes back to the
//! caller is a summary of the pass, optional debug diagnostics, or the reason a
//! pass was rejected before touching anything.

use serde::{Deserialize, Serialize};

use crate::frames::{INVALID_RANGE_MESSAGE, MAX_PASS_FRAMES};
use crate::ids::NodeHandle;

pub const NO_ACTIVE_ROOT_MESSAGE: &str = "No active node selected.";

/// Intermediate values for one node at one frame (debug mode only).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseDiagnostic {
    pub node: NodeHandle,
    pub depth: u32,
    pub frame: i32,
    /// Delayed frame the parent was read at (clamped into the interval).
    pub source_frame: f32,
    /// Angle of the parent's rotation over the delay window, radians.
    pub delta_angle: f32,
    pub influence: f32,
    /// Angle actually applied on top of the baseline, radians.
    pub applied_angle: f32,
    /// Delta treated as identity by the threshold rule.
    pub suppressed: bool,
}

/// Summary of a completed pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub nodes_collected: usize,
    pub keys_cleared: usize,
    pub keys_written: usize,
    /// Frames (across all nodes) whose delta fell under the threshold.
    pub suppressed_frames: usize,
    /// Nodes that went missing while sampling.
    pub dropped: Vec<NodeHandle>,
    /// Nodes not propagated because their parent's baseline was unavailable; they keep their baseline pose.
    pub skipped: Vec<NodeHandle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<PhaseDiagnostic>,
}

impl PassReport {
    /// Number of nodes excluded from propagation for any reason.
    pub fn excluded(&self) -> usize {
        self.dropped.len() + self.skipped.len()
    }
}

/// Why a pass did nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    InvalidFrameRange { start: i32, end: i32 },
    /// Valid range, but wider than a pass will sample.
    FrameRangeTooWide { start: i32, end: i32 },
    NoActiveRoot,
    RootNotAnimatable { root: NodeHandle },
}

impl Rejection {
    /// User-facing text reported to the host.
    pub fn message(&self) -> String {
        match self {
            Rejection::InvalidFrameRange { .. } => INVALID_RANGE_MESSAGE.to_string(),
            Rejection::FrameRangeTooWide { start, end } => format!(
                "Frame range {start}..{end} is too wide; use at most {MAX_PASS_FRAMES} frames."
            ),
            Rejection::NoActiveRoot => NO_ACTIVE_ROOT_MESSAGE.to_string(),
            Rejection::RootNotAnimatable { root } => {
                format!("Active node '{root}' cannot be animated.")
            }
        }
    }
}

/// Result of `calculate` / `reset_keyframes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Completed(PassReport),
    Rejected(Rejection),
}

impl Outcome {
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn report(&self) -> Option<&PassReport> {
        match self {
            Outcome::Completed(r) => Some(r),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Rejected(r) => Some(r),
        }
    }
}
