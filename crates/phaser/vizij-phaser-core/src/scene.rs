//! In-memory scene implementing [`TransformProvider`].
//!
//! Each node carries a keyed baseline rotation track and a separate phase layer
//! holding the keys written by the propagator. Evaluation at a frame prefers a
//! phase key at exactly that frame and otherwise samples the baseline. Evaluated
//! poses are cached per frame; `set_current_frame` leaves the cache stale until
//! `force_evaluate`, the same contract a DCC host exposes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::PhaserError;
use crate::frames::FrameInterval;
use crate::ids::NodeHandle;
use crate::interp::functions::{
    bezier_ease_t, is_finite4, mul_quat, normalize4, slerp_quat, DEFAULT_EASE,
};
use crate::interp::{Quat, IDENTITY};
use crate::provider::{NodePose, Severity, TransformProvider};

/// How a baseline segment leaves its left key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Constant,
    #[default]
    Linear,
    Bezier,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RotationKey {
    pub frame: i32,
    pub rotation: Quat,
    pub interpolation: Interpolation,
    /// Bezier control points (x1, y1, x2, y2), used with [`Interpolation::Bezier`].
    pub ease: [f32; 4],
}

impl RotationKey {
    pub fn new(frame: i32, rotation: Quat) -> Self {
        Self {
            frame,
            rotation,
            interpolation: Interpolation::Linear,
            ease: DEFAULT_EASE,
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }
}

/// Frame-sorted baseline keys.
#[derive(Clone, Debug, Default)]
pub struct RotationTrack {
    keys: Vec<RotationKey>,
}

impl RotationTrack {
    /// Sort by frame; a later duplicate frame replaces an earlier one.
    pub fn new(mut keys: Vec<RotationKey>) -> Self {
        keys.sort_by_key(|k| k.frame);
        let mut deduped: Vec<RotationKey> = Vec::with_capacity(keys.len());
        for key in keys {
            match deduped.last_mut() {
                Some(last) if last.frame == key.frame => *last = key,
                _ => deduped.push(key),
            }
        }
        Self { keys: deduped }
    }

    pub fn keys(&self) -> &[RotationKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Rotation at `frame`; held before the first and after the last key.
    pub fn sample(&self, frame: f32) -> Option<Quat> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if frame <= first.frame as f32 {
            return Some(first.rotation);
        }
        if frame >= last.frame as f32 {
            return Some(last.rotation);
        }
        // First key strictly after `frame`; at least 1 and at most len-1 here.
        let i1 = self.keys.partition_point(|k| k.frame as f32 <= frame);
        let left = &self.keys[i1 - 1];
        let right = &self.keys[i1];
        let span = (right.frame - left.frame) as f32;
        let t = (frame - left.frame as f32) / span;
        Some(match left.interpolation {
            Interpolation::Constant => left.rotation,
            Interpolation::Linear => slerp_quat(left.rotation, right.rotation, t),
            Interpolation::Bezier => {
                slerp_quat(left.rotation, right.rotation, bezier_ease_t(t, left.ease))
            }
        })
    }
}

/// Construction input for one scene node.
#[derive(Clone, Debug)]
pub struct NodeSpec {
    pub id: NodeHandle,
    pub parent: Option<NodeHandle>,
    pub animatable: bool,
    pub rest: Quat,
    pub keys: Vec<RotationKey>,
    pub phase: Vec<(i32, Quat)>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeHandle>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            animatable: true,
            rest: IDENTITY,
            keys: Vec::new(),
            phase: Vec::new(),
        }
    }

    pub fn parent(mut self, parent: impl Into<NodeHandle>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn animatable(mut self, animatable: bool) -> Self {
        self.animatable = animatable;
        self
    }

    pub fn rest(mut self, rest: Quat) -> Self {
        self.rest = rest;
        self
    }

    pub fn key(mut self, frame: i32, rotation: Quat) -> Self {
        self.keys.push(RotationKey::new(frame, rotation));
        self
    }

    pub fn with_key(mut self, key: RotationKey) -> Self {
        self.keys.push(key);
        self
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub id: NodeHandle,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub animatable: bool,
    pub rest: Quat,
    pub baseline: RotationTrack,
    phase: BTreeMap<i32, Quat>,
}

impl SceneNode {
    /// Keys written by the propagator, by frame.
    pub fn phase_keys(&self) -> &BTreeMap<i32, Quat> {
        &self.phase
    }

    /// Local rotation at `frame`: phase key, else baseline, else rest.
    pub fn local_at(&self, frame: i32) -> Quat {
        if let Some(q) = self.phase.get(&frame) {
            return *q;
        }
        self.baseline.sample(frame as f32).unwrap_or(self.rest)
    }
}

/// A report received through [`TransformProvider::report`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneMessage {
    pub severity: Severity,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct Scene {
    name: String,
    nodes: Vec<SceneNode>,
    lookup: HashMap<NodeHandle, usize>,
    /// Parents before children; scene roots in declared order.
    eval_order: Vec<usize>,
    active: Option<NodeHandle>,
    frame: i32,
    evaluated: Vec<NodePose>,
    messages: Vec<SceneMessage>,
}

fn checked_rotation(id: &str, q: Quat) -> Result<Quat, PhaserError> {
    if !is_finite4(q) {
        return Err(PhaserError::InvalidRotation {
            id: id.to_string(),
            reason: "non-finite component".into(),
        });
    }
    if q.iter().all(|c| *c == 0.0) {
        return Err(PhaserError::InvalidRotation {
            id: id.to_string(),
            reason: "zero-length quaternion".into(),
        });
    }
    Ok(normalize4(q))
}

impl Scene {
    /// Build a scene from node specs. Children keep the order in which they are declared.
    pub fn from_specs(name: impl Into<String>, specs: Vec<NodeSpec>) -> Result<Self, PhaserError> {
        let mut lookup: HashMap<NodeHandle, usize> = HashMap::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if lookup.insert(spec.id.clone(), i).is_some() {
                return Err(PhaserError::DuplicateNode {
                    id: spec.id.clone(),
                });
            }
        }

        let mut nodes: Vec<SceneNode> = Vec::with_capacity(specs.len());
        for spec in specs {
            let parent = match &spec.parent {
                Some(p) => Some(*lookup.get(p).ok_or_else(|| PhaserError::UnknownParent {
                    id: spec.id.clone(),
                    parent: p.clone(),
                })?),
                None => None,
            };
            let rest = checked_rotation(&spec.id, spec.rest)?;
            let mut keys = Vec::with_capacity(spec.keys.len());
            for key in spec.keys {
                keys.push(RotationKey {
                    rotation: checked_rotation(&spec.id, key.rotation)?,
                    ..key
                });
            }
            let mut phase = BTreeMap::new();
            for (frame, q) in spec.phase {
                phase.insert(frame, checked_rotation(&spec.id, q)?);
            }
            nodes.push(SceneNode {
                id: spec.id,
                parent,
                children: Vec::new(),
                animatable: spec.animatable,
                rest,
                baseline: RotationTrack::new(keys),
                phase,
            });
        }

        for i in 0..nodes.len() {
            if let Some(p) = nodes[i].parent {
                nodes[p].children.push(i);
            }
        }

        // Any node not reachable from a parentless node sits on a cycle.
        let mut eval_order = Vec::with_capacity(nodes.len());
        let mut stack: Vec<usize> = (0..nodes.len())
            .rev()
            .filter(|i| nodes[*i].parent.is_none())
            .collect();
        while let Some(i) = stack.pop() {
            eval_order.push(i);
            stack.extend(nodes[i].children.iter().rev().copied());
        }
        if eval_order.len() != nodes.len() {
            let mut reached = vec![false; nodes.len()];
            for i in &eval_order {
                reached[*i] = true;
            }
            let id = nodes
                .iter()
                .zip(reached)
                .find(|(_, r)| !r)
                .map(|(n, _)| n.id.clone())
                .unwrap_or_default();
            return Err(PhaserError::Cycle { id });
        }

        let mut scene = Self {
            name: name.into(),
            evaluated: vec![
                NodePose {
                    local: IDENTITY,
                    world: IDENTITY,
                };
                nodes.len()
            ],
            nodes,
            lookup,
            eval_order,
            active: None,
            frame: 0,
            messages: Vec::new(),
        };
        scene.refresh();
        Ok(scene)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> i32 {
        self.frame
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.lookup.get(id).map(|i| &self.nodes[*i])
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Select the node that `calculate` / `reset_keyframes` operate from.
    pub fn set_active(&mut self, id: &str) -> Result<(), PhaserError> {
        if !self.lookup.contains_key(id) {
            return Err(PhaserError::NodeNotFound { id: id.to_string() });
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    pub fn messages(&self) -> &[SceneMessage] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<SceneMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Uncached pose of `id` at `frame` (does not move the cursor).
    pub fn pose_at(&self, id: &str, frame: i32) -> Option<NodePose> {
        let mut idx = *self.lookup.get(id)?;
        let local = self.nodes[idx].local_at(frame);
        let mut world = local;
        while let Some(p) = self.nodes[idx].parent {
            world = mul_quat(self.nodes[p].local_at(frame), world);
            idx = p;
        }
        Some(NodePose {
            local,
            world: normalize4(world),
        })
    }

    /// Baseline-only local rotation (phase layer ignored).
    pub fn baseline_at(&self, id: &str, frame: i32) -> Option<Quat> {
        self.node(id)
            .map(|n| n.baseline.sample(frame as f32).unwrap_or(n.rest))
    }

    /// Total number of phase keys across all nodes.
    pub fn phase_key_count(&self) -> usize {
        self.nodes.iter().map(|n| n.phase.len()).sum()
    }

    fn refresh(&mut self) {
        let frame = self.frame;
        for &i in &self.eval_order {
            let local = self.nodes[i].local_at(frame);
            let world = match self.nodes[i].parent {
                Some(p) => normalize4(mul_quat(self.evaluated[p].world, local)),
                None => local,
            };
            self.evaluated[i] = NodePose { local, world };
        }
    }
}

impl TransformProvider for Scene {
    fn active_root(&self) -> Option<NodeHandle> {
        self.active.clone()
    }

    fn children(&self, node: &str) -> Vec<NodeHandle> {
        match self.lookup.get(node) {
            Some(i) => self.nodes[*i]
                .children
                .iter()
                .map(|c| self.nodes[*c].id.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    fn is_animatable(&self, node: &str) -> bool {
        self.node(node).map(|n| n.animatable).unwrap_or(false)
    }

    fn current_frame(&self) -> i32 {
        self.frame
    }

    fn set_current_frame(&mut self, frame: i32) {
        self.frame = frame;
    }

    fn force_evaluate(&mut self) {
        self.refresh();
    }

    fn orientation(&self, node: &str) -> Option<NodePose> {
        self.lookup.get(node).map(|i| self.evaluated[*i])
    }

    fn write_keyframe(&mut self, node: &str, frame: i32, rotation: Quat) {
        match self.lookup.get(node) {
            Some(i) => {
                self.nodes[*i].phase.insert(frame, normalize4(rotation));
            }
            None => log::warn!("write_keyframe: unknown node '{node}'"),
        }
    }

    fn clear_keyframes(&mut self, node: &str, range: FrameInterval) -> usize {
        let Some(i) = self.lookup.get(node) else {
            return 0;
        };
        let phase = &mut self.nodes[*i].phase;
        let before = phase.len();
        phase.retain(|frame, _| !range.contains(*frame));
        before - phase.len()
    }

    fn report(&mut self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => log::info!("{text}"),
            Severity::Warning => log::warn!("{text}"),
            Severity::Error => log::error!("{text}"),
        }
        self.messages.push(SceneMessage {
            severity,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::functions::{angle_between, from_axis_angle};

    fn z(deg: f32) -> Quat {
        from_axis_angle([0.0, 0.0, 1.0], deg.to_radians())
    }

    #[test]
    fn track_holds_outside_keys_and_slerps_between() {
        let track = RotationTrack::new(vec![
            RotationKey::new(10, z(20.0)),
            RotationKey::new(0, z(0.0)),
        ]);
        assert_eq!(track.keys()[0].frame, 0);
        assert!(angle_between(track.sample(-5.0).unwrap(), z(0.0)) < 1e-5);
        assert!(angle_between(track.sample(50.0).unwrap(), z(20.0)) < 1e-5);
        assert!(angle_between(track.sample(5.0).unwrap(), z(10.0)) < 1e-4);
    }

    #[test]
    fn constant_segments_step() {
        let track = RotationTrack::new(vec![
            RotationKey::new(0, z(0.0)).with_interpolation(Interpolation::Constant),
            RotationKey::new(4, z(40.0)),
        ]);
        assert!(angle_between(track.sample(3.0).unwrap(), z(0.0)) < 1e-5);
        assert!(angle_between(track.sample(4.0).unwrap(), z(40.0)) < 1e-5);
    }

    #[test]
    fn world_composes_down_the_chain() {
        let scene = Scene::from_specs(
            "chain",
            vec![
                NodeSpec::new("root").key(0, z(10.0)),
                NodeSpec::new("a").parent("root").rest(z(5.0)),
            ],
        )
        .unwrap();
        let pose = scene.orientation("a").unwrap();
        assert!(angle_between(pose.world, z(15.0)) < 1e-4);
        assert!(angle_between(pose.local, z(5.0)) < 1e-5);
    }

    #[test]
    fn cursor_reads_are_stale_until_forced() {
        let mut scene = Scene::from_specs(
            "s",
            vec![NodeSpec::new("root").key(0, z(0.0)).key(10, z(90.0))],
        )
        .unwrap();
        scene.set_current_frame(10);
        assert!(angle_between(scene.orientation("root").unwrap().local, z(0.0)) < 1e-5);
        scene.force_evaluate();
        assert!(angle_between(scene.orientation("root").unwrap().local, z(90.0)) < 1e-4);
    }

    #[test]
    fn rejects_cycles_and_unknown_parents() {
        let err = Scene::from_specs(
            "loop",
            vec![
                NodeSpec::new("a").parent("b"),
                NodeSpec::new("b").parent("a"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PhaserError::Cycle { .. }));

        let err = Scene::from_specs("orphan", vec![NodeSpec::new("a").parent("ghost")]).unwrap_err();
        assert!(matches!(err, PhaserError::UnknownParent { .. }));

        let err = Scene::from_specs("dup", vec![NodeSpec::new("a"), NodeSpec::new("a")]).unwrap_err();
        assert!(matches!(err, PhaserError::DuplicateNode { .. }));
    }

    #[test]
    fn phase_keys_override_and_clear_by_range() {
        let mut scene = Scene::from_specs("s", vec![NodeSpec::new("root")]).unwrap();
        scene.write_keyframe("root", 2, z(30.0));
        scene.write_keyframe("root", 8, z(30.0));
        assert!(angle_between(scene.pose_at("root", 2).unwrap().local, z(30.0)) < 1e-5);
        let range = FrameInterval::new(0, 5).unwrap();
        assert_eq!(scene.clear_keyframes("root", range), 1);
        assert_eq!(scene.clear_keyframes("root", range), 0);
        assert_eq!(scene.phase_key_count(), 1);
    }
}
