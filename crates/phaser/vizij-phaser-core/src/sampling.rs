//! Baseline sampling: one orientation per node per frame over the pass interval.
//!
//! Model:
//! - The provider's cursor is advanced once per frame, strictly increasing, and
//!   evaluation is forced before any read.
//! - Every collected node is read at every frame; the result is a frame-ordered
//!   series per node, indexed by `frame - start`.
//! - A node that stops answering (or answers with a non-finite rotation) is
//!   abandoned for the rest of the pass and listed in [`BaselineSeries::dropped`].

use serde::{Deserialize, Serialize};

use crate::frames::FrameInterval;
use crate::hierarchy::Tree;
use crate::ids::NodeIndex;
use crate::interp::functions::{is_finite4, normalize4, slerp_quat};
use crate::interp::Quat;
use crate::provider::{FrameCursor, TransformProvider};

/// One node's rotational state at one frame.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub frame: i32,
    pub local: Quat,
    pub world: Quat,
}

/// Frame-ordered samples for one node, covering the whole interval.
#[derive(Clone, Debug)]
pub struct NodeSeries {
    start: i32,
    samples: Vec<OrientationSample>,
}

impl NodeSeries {
    pub fn samples(&self) -> &[OrientationSample] {
        &self.samples
    }

    /// World rotation at a possibly fractional frame, clamped to the series and
    /// interpolated along the shortest arc between neighbouring samples.
    pub fn world_at(&self, frame: f32) -> Quat {
        let last = self.samples.len().saturating_sub(1);
        let pos = (frame - self.start as f32).clamp(0.0, last as f32);
        let i0 = pos.floor() as usize;
        let t = pos - i0 as f32;
        if t <= 0.0 || i0 >= last {
            return self.samples[i0.min(last)].world;
        }
        slerp_quat(self.samples[i0].world, self.samples[i0 + 1].world, t)
    }
}

/// Per-node baseline series for one pass, indexed by [`NodeIndex`].
#[derive(Clone, Debug)]
pub struct BaselineSeries {
    interval: FrameInterval,
    series: Vec<Option<NodeSeries>>,
    dropped: Vec<NodeIndex>,
}

impl BaselineSeries {
    pub fn interval(&self) -> FrameInterval {
        self.interval
    }

    /// Series for `idx`; `None` if the node was dropped during sampling.
    pub fn get(&self, idx: NodeIndex) -> Option<&NodeSeries> {
        self.series.get(idx.index()).and_then(|s| s.as_ref())
    }

    /// Nodes abandoned mid-sampling, in the order they went missing.
    pub fn dropped(&self) -> &[NodeIndex] {
        &self.dropped
    }
}

/// Sample every node of `tree` at every frame of `interval`.
///
/// Leaves the provider's current frame at `interval.end()`. Callers check
/// [`FrameInterval::is_sampleable`] first.
pub fn sample_baseline<P: TransformProvider + ?Sized>(
    cursor: &mut FrameCursor<'_, P>,
    tree: &Tree,
    interval: FrameInterval,
) -> BaselineSeries {
    let mut building: Vec<Option<Vec<OrientationSample>>> = (0..tree.len())
        .map(|_| Some(Vec::with_capacity(interval.len())))
        .collect();
    let mut dropped = Vec::new();

    for frame in interval.frames() {
        cursor.advance(frame);
        for (idx, node) in tree.iter() {
            let slot = &mut building[idx.index()];
            if slot.is_none() {
                continue;
            }
            match cursor.orientation(&node.handle) {
                Some(pose) if is_finite4(pose.local) && is_finite4(pose.world) => {
                    if let Some(samples) = slot.as_mut() {
                        samples.push(OrientationSample {
                            frame,
                            local: normalize4(pose.local),
                            world: normalize4(pose.world),
                        });
                    }
                }
                _ => {
                    log::warn!(
                        "node '{}' became unavailable at frame {frame}; excluding it from this pass",
                        node.handle
                    );
                    *slot = None;
                    dropped.push(idx);
                }
            }
        }
    }

    let series = building
        .into_iter()
        .map(|s| {
            s.map(|samples| NodeSeries {
                start: interval.start(),
                samples,
            })
        })
        .collect();

    BaselineSeries {
        interval,
        series,
        dropped,
    }
}
