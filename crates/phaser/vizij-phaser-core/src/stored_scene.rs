use serde::{Deserialize, Serialize};

use crate::error::PhaserError;
use crate::interp::functions::{from_euler_deg, DEFAULT_EASE};
use crate::interp::{Quat, IDENTITY};
use crate::scene::{Interpolation, NodeSpec, RotationKey, Scene};

/// Public API: parse scene JSON into a [`Scene`].
///
/// Shape:
/// ```json
/// { "name": "arm", "active": "shoulder", "frame": 0,
///   "nodes": [
///     { "id": "shoulder", "keys": [{ "frame": 0, "rotation": { "euler": [0, 0, 0] } }] },
///     { "id": "elbow", "parent": "shoulder", "rest": { "x": 0, "y": 0, "z": 0, "w": 1 } }
///   ] }
/// ```
///
/// Notes:
/// - Rotations are either quaternions `{x, y, z, w}` or XYZ Euler degrees `{euler: [x, y, z]}`.
/// - Nodes may be declared in any order; children keep declaration order.
/// - `interpolation` on a key governs the segment leaving it (default linear).
/// - `phase` carries keys previously written by a pass, so exported scenes round-trip.
pub fn parse_stored_scene_json(s: &str) -> Result<Scene, PhaserError> {
    let stored: StoredScene = serde_json::from_str(s)?;
    stored.into_scene()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRotation {
    Quat { x: f32, y: f32, z: f32, w: f32 },
    Euler { euler: [f32; 3] },
}

impl StoredRotation {
    pub fn to_quat(&self) -> Quat {
        match *self {
            StoredRotation::Quat { x, y, z, w } => [x, y, z, w],
            StoredRotation::Euler { euler } => from_euler_deg(euler),
        }
    }
}

impl From<Quat> for StoredRotation {
    fn from(q: Quat) -> Self {
        StoredRotation::Quat {
            x: q[0],
            y: q[1],
            z: q[2],
            w: q[3],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredKey {
    pub frame: i32,
    pub rotation: StoredRotation,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<[f32; 4]>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredPhaseKey {
    pub frame: i32,
    pub rotation: StoredRotation,
}

fn default_animatable() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default = "default_animatable", skip_serializing_if = "is_true")]
    pub animatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<StoredRotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<StoredKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phase: Vec<StoredPhaseKey>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredScene {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(default)]
    pub frame: i32,
    pub nodes: Vec<StoredNode>,
}

impl StoredScene {
    pub fn into_scene(self) -> Result<Scene, PhaserError> {
        // Parents may follow their children in the file; emit specs parents-first.
        let order = declaration_order_parents_first(&self.nodes)?;
        let mut slots: Vec<Option<StoredNode>> = self.nodes.into_iter().map(Some).collect();
        let mut specs = Vec::with_capacity(slots.len());
        for i in order {
            let Some(node) = slots[i].take() else {
                continue;
            };
            specs.push(to_spec(node));
        }

        let mut scene = Scene::from_specs(self.name, specs)?;
        if let Some(active) = self.active {
            scene.set_active(&active)?;
        }
        if self.frame != 0 {
            use crate::provider::TransformProvider;
            scene.set_current_frame(self.frame);
            scene.force_evaluate();
        }
        Ok(scene)
    }

    /// Snapshot a scene, phase layer included.
    pub fn from_scene(scene: &Scene) -> Self {
        let nodes = scene
            .nodes()
            .iter()
            .map(|node| StoredNode {
                id: node.id.clone(),
                parent: node.parent.map(|p| scene.nodes()[p].id.clone()),
                animatable: node.animatable,
                rest: (node.rest != IDENTITY).then(|| node.rest.into()),
                keys: node
                    .baseline
                    .keys()
                    .iter()
                    .map(|k| StoredKey {
                        frame: k.frame,
                        rotation: k.rotation.into(),
                        interpolation: k.interpolation,
                        ease: (k.interpolation == Interpolation::Bezier && k.ease != DEFAULT_EASE)
                            .then_some(k.ease),
                    })
                    .collect(),
                phase: node
                    .phase_keys()
                    .iter()
                    .map(|(frame, q)| StoredPhaseKey {
                        frame: *frame,
                        rotation: (*q).into(),
                    })
                    .collect(),
            })
            .collect();
        StoredScene {
            name: scene.name().to_string(),
            active: scene.active().map(str::to_string),
            frame: scene.frame(),
            nodes,
        }
    }
}

fn to_spec(node: StoredNode) -> NodeSpec {
    let mut spec = NodeSpec::new(node.id).animatable(node.animatable);
    if let Some(parent) = node.parent {
        spec = spec.parent(parent);
    }
    if let Some(rest) = node.rest {
        spec = spec.rest(rest.to_quat());
    }
    for key in node.keys {
        spec = spec.with_key(RotationKey {
            frame: key.frame,
            rotation: key.rotation.to_quat(),
            interpolation: key.interpolation,
            ease: key.ease.unwrap_or(DEFAULT_EASE),
        });
    }
    spec.phase = node
        .phase
        .into_iter()
        .map(|k| (k.frame, k.rotation.to_quat()))
        .collect();
    spec
}

/// Indices of `nodes` such that every parent precedes its children, otherwise
/// keeping file order. Unknown parents and cycles are left for `Scene` to reject,
/// except for cycles that would stall the ordering.
fn declaration_order_parents_first(nodes: &[StoredNode]) -> Result<Vec<usize>, PhaserError> {
    use std::collections::HashMap;

    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut placed = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    while order.len() < nodes.len() {
        let before = order.len();
        for (i, node) in nodes.iter().enumerate() {
            if placed[i] {
                continue;
            }
            let ready = match node.parent.as_deref().and_then(|p| index.get(p)) {
                Some(&p) => placed[p],
                None => true,
            };
            if ready {
                placed[i] = true;
                order.push(i);
            }
        }
        if order.len() == before {
            let stuck = nodes
                .iter()
                .zip(&placed)
                .find(|(_, p)| !**p)
                .map(|(n, _)| n.id.clone())
                .unwrap_or_default();
            return Err(PhaserError::Cycle { id: stuck });
        }
    }
    Ok(order)
}

/// Serialize a scene back to pretty JSON.
pub fn export_scene_json(scene: &Scene) -> Result<String, PhaserError> {
    Ok(serde_json::to_string_pretty(&StoredScene::from_scene(scene))?)
}
