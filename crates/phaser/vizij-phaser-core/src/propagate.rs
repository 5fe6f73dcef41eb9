//! Phase propagation: delayed, damped, amplitude-scaled follow-through.
//!
//! For a node at depth `d` and frame `f`:
//! - the parent is read at `f` and at `f' = clamp(f - delay * d, start, end)`,
//! - `delta = parent(f)^-1 * parent(f')` (parent frame), stabilized by the threshold rule,
//! - the delta angle is scaled by `strength * recursion^(d - 1)`,
//! - the scaled delta is composed with the node's own baseline local rotation and
//!   written as a key at `f`.
//!
//! Only baseline samples feed the computation, never freshly written output.

use crate::config::{Composition, Parameters};
use crate::hierarchy::Tree;
use crate::ids::NodeIndex;
use crate::interp::functions::{
    angle_of, conjugate, dot4, mul_quat, negate4, normalize4, scale_angle, vector_len,
};
use crate::interp::{Quat, IDENTITY};
use crate::outputs::PhaseDiagnostic;
use crate::provider::TransformProvider;
use crate::sampling::BaselineSeries;

/// Counts and optional diagnostics from one propagation sweep.
#[derive(Clone, Debug, Default)]
pub struct PropagationSummary {
    pub keys_written: usize,
    pub suppressed_frames: usize,
    /// Non-root nodes whose own or parent series was unavailable.
    pub skipped: Vec<NodeIndex>,
    pub diagnostics: Vec<PhaseDiagnostic>,
}

/// Relative rotation from `current` to `delayed`, or `None` when it is
/// numerically indistinguishable from identity under `threshold`.
///
/// Operands on opposite hemispheres are flipped first so the shorter arc is used.
pub fn stabilized_delta(current: Quat, delayed: Quat, threshold: f32) -> Option<Quat> {
    let mut delayed = delayed;
    let mut d = dot4(current, delayed);
    if d < 0.0 {
        delayed = negate4(delayed);
        d = -d;
    }
    let delta = normalize4(mul_quat(conjugate(current), delayed));
    let misalignment = 1.0 - d.min(1.0);
    let cross = vector_len(delta);
    if misalignment < threshold && cross < threshold {
        return None;
    }
    Some(if delta[3] < 0.0 { negate4(delta) } else { delta })
}

/// Combine a node's baseline local rotation with a scaled delta.
#[inline]
pub fn compose(composition: Composition, local: Quat, delta: Quat) -> Quat {
    match composition {
        Composition::BeneathParent => normalize4(mul_quat(delta, local)),
        Composition::NodeLocal => normalize4(mul_quat(local, delta)),
    }
}

/// Compute and write phase keys for every non-root node of `tree` at every frame.
///
/// Nodes are visited in non-decreasing depth order (pre-order within a depth).
pub fn propagate<P: TransformProvider + ?Sized>(
    provider: &mut P,
    tree: &Tree,
    baseline: &BaselineSeries,
    params: &Parameters,
    debug: bool,
) -> PropagationSummary {
    let interval = baseline.interval();
    let mut summary = PropagationSummary::default();

    for idx in tree.depth_order() {
        let node = tree.node(idx);
        let Some(parent_idx) = node.parent else {
            continue;
        };
        let (Some(own), Some(parent)) = (baseline.get(idx), baseline.get(parent_idx)) else {
            if baseline.get(idx).is_some() {
                log::warn!(
                    "skipping '{}': parent '{}' has no baseline",
                    node.handle,
                    tree.node(parent_idx).handle
                );
                summary.skipped.push(idx);
            }
            continue;
        };

        let lag = params.lag(node.depth);
        let influence = params.influence(node.depth);

        for sample in own.samples() {
            let frame = sample.frame;
            // Near `start` the delayed frame pins to `start`; the parent's motion
            // since then still applies, so the node is not held flat.
            let source_frame = interval.clamp(frame as f32 - lag);
            let current = parent.world_at(frame as f32);
            let delayed = parent.world_at(source_frame);

            let delta = stabilized_delta(current, delayed, params.threshold());
            let scaled = match delta {
                Some(d) => scale_angle(d, influence),
                None => {
                    summary.suppressed_frames += 1;
                    IDENTITY
                }
            };
            let output = if scaled == IDENTITY {
                sample.local
            } else {
                compose(params.composition(), sample.local, scaled)
            };

            provider.write_keyframe(&node.handle, frame, output);
            summary.keys_written += 1;

            if debug {
                let diag = PhaseDiagnostic {
                    node: node.handle.clone(),
                    depth: node.depth,
                    frame,
                    source_frame,
                    delta_angle: delta.map(angle_of).unwrap_or(0.0),
                    influence,
                    applied_angle: angle_of(scaled),
                    suppressed: delta.is_none(),
                };
                log::debug!(
                    "phase {} d={} f={} src={:.2} delta={:.5} infl={:.3} applied={:.5}{}",
                    diag.node,
                    diag.depth,
                    diag.frame,
                    diag.source_frame,
                    diag.delta_angle,
                    diag.influence,
                    diag.applied_angle,
                    if diag.suppressed { " (suppressed)" } else { "" }
                );
                summary.diagnostics.push(diag);
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::functions::{angle_between, from_axis_angle};

    #[test]
    fn near_identity_delta_is_suppressed() {
        let a = from_axis_angle([0.0, 0.0, 1.0], 0.3);
        let b = from_axis_angle([0.0, 0.0, 1.0], 0.3 + 1e-5);
        assert!(stabilized_delta(a, b, 0.001).is_none());
        assert!(stabilized_delta(a, a, 0.001).is_none());
    }

    #[test]
    fn delta_recovers_relative_rotation() {
        let a = from_axis_angle([0.0, 0.0, 1.0], 0.1);
        let b = from_axis_angle([0.0, 0.0, 1.0], 0.4);
        let d = stabilized_delta(a, b, 0.001).unwrap();
        assert!((angle_of(d) - 0.3).abs() < 1e-5);
        assert!(angle_between(mul_quat(a, d), b) < 1e-3);
    }

    #[test]
    fn opposite_hemisphere_takes_short_path() {
        let a = from_axis_angle([1.0, 0.0, 0.0], 0.2);
        let b = negate4(from_axis_angle([1.0, 0.0, 0.0], 0.5));
        let d = stabilized_delta(a, b, 0.001).unwrap();
        assert!((angle_of(d) - 0.3).abs() < 1e-5);
        assert!(d[3] >= 0.0);
    }

    #[test]
    fn composition_orders_differ_but_keep_angle() {
        let local = from_axis_angle([1.0, 0.0, 0.0], 0.7);
        let delta = from_axis_angle([0.0, 0.0, 1.0], 0.2);
        let a = compose(Composition::BeneathParent, local, delta);
        let b = compose(Composition::NodeLocal, local, delta);
        assert!(angle_between(a, b) > 1e-3);
        assert!((angle_between(local, a) - 0.2).abs() < 1e-4);
        assert!((angle_between(local, b) - 0.2).abs() < 1e-4);
    }
}
