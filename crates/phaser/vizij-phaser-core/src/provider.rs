//! Host collaborator contract.
//!
//! Adapters (scene files, WASM hosts, DCC bridges) implement [`TransformProvider`]
//! and pass it into the command surface. The provider owns the one piece of shared
//! mutable state in a pass: the current evaluation frame.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::frames::FrameInterval;
use crate::ids::NodeHandle;
use crate::interp::Quat;

/// Severity of a user-facing notification.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Evaluated rotation of one node at the provider's current frame.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodePose {
    /// Rotation relative to the node's parent.
    pub local: Quat,
    /// Accumulated rotation from the scene root.
    pub world: Quat,
}

pub trait TransformProvider {
    /// Current selection; `None` disables the command surface.
    fn active_root(&self) -> Option<NodeHandle>;

    /// Children of `node` in the host's declared order.
    fn children(&self, node: &str) -> Vec<NodeHandle>;

    /// Whether the node may receive rotation keys.
    fn is_animatable(&self, node: &str) -> bool;

    fn current_frame(&self) -> i32;

    fn set_current_frame(&mut self, frame: i32);

    /// Settle evaluation at the current frame; reads before this may be stale.
    fn force_evaluate(&mut self);

    /// Pose at the current frame; `None` once the node has gone away.
    fn orientation(&self, node: &str) -> Option<NodePose>;

    fn write_keyframe(&mut self, node: &str, frame: i32, rotation: Quat);

    /// Remove keys this system wrote within `range`; returns how many were removed.
    fn clear_keyframes(&mut self, node: &str, range: FrameInterval) -> usize;

    fn report(&mut self, severity: Severity, text: &str);
}

/// Scoped ownership of the provider's frame cursor for one pass.
///
/// Frames must be visited in strictly increasing order through [`FrameCursor::advance`].
/// On drop the frame the host was at when the cursor was acquired is restored.
pub struct FrameCursor<'a, P: TransformProvider + ?Sized> {
    provider: &'a mut P,
    restore_to: i32,
    last: Option<i32>,
}

impl<'a, P: TransformProvider + ?Sized> FrameCursor<'a, P> {
    pub fn acquire(provider: &'a mut P) -> Self {
        let restore_to = provider.current_frame();
        Self {
            provider,
            restore_to,
            last: None,
        }
    }

    /// Move to `frame` and force evaluation.
    pub fn advance(&mut self, frame: i32) {
        debug_assert!(
            self.last.map_or(true, |last| frame > last),
            "frame cursor must advance monotonically ({:?} -> {frame})",
            self.last
        );
        self.provider.set_current_frame(frame);
        self.provider.force_evaluate();
        self.last = Some(frame);
    }
}

impl<P: TransformProvider + ?Sized> Deref for FrameCursor<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.provider
    }
}

impl<P: TransformProvider + ?Sized> DerefMut for FrameCursor<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.provider
    }
}

impl<P: TransformProvider + ?Sized> Drop for FrameCursor<'_, P> {
    fn drop(&mut self) {
        // Re-evaluate even when the frame is unchanged: keys may have been written.
        self.provider.set_current_frame(self.restore_to);
        self.provider.force_evaluate();
    }
}
