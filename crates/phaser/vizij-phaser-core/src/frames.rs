//! Closed, inclusive frame interval used by every stage of a pass.

use serde::{Deserialize, Serialize};

use crate::error::PhaserError;

/// Message reported to the user when a pass is asked to run over an empty or inverted range.
pub const INVALID_RANGE_MESSAGE: &str = "Make the start frame smaller than the end frame.";

/// Widest interval a pass will sample; every frame of it is evaluated once per node.
pub const MAX_PASS_FRAMES: usize = 1 << 20;

/// Inclusive `[start, end]` with `start < end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInterval {
    start: i32,
    end: i32,
}

impl FrameInterval {
    /// Validate and build an interval; `start` must be strictly smaller than `end`.
    pub fn new(start: i32, end: i32) -> Result<Self, PhaserError> {
        if start >= end {
            return Err(PhaserError::InvalidFrameRange { start, end });
        }
        Ok(Self { start, end })
    }

    #[inline]
    pub fn start(&self) -> i32 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of frames covered (inclusive of both ends), saturating on 32-bit targets.
    #[inline]
    pub fn len(&self) -> usize {
        (self.end.abs_diff(self.start) as usize).saturating_add(1)
    }

    /// Always false: a valid interval spans at least two frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn contains(&self, frame: i32) -> bool {
        frame >= self.start && frame <= self.end
    }

    /// Frames in ascending order.
    pub fn frames(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    /// Whether a pass can afford to sample every frame.
    #[inline]
    pub fn is_sampleable(&self) -> bool {
        self.len() <= MAX_PASS_FRAMES
    }

    /// Clamp a (possibly fractional) frame into the interval.
    #[inline]
    pub fn clamp(&self, frame: f32) -> f32 {
        frame.clamp(self.start as f32, self.end as f32)
    }
}
