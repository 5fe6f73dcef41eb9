//! Baked export: per-node local rotations sampled at every integer frame of an interval.

use serde::{Deserialize, Serialize};

use crate::frames::FrameInterval;
use crate::interp::Quat;
use crate::scene::Scene;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakedTrack {
    /// Node id.
    pub node: String,
    /// Local rotation (x, y, z, w) at each frame, `start..=end`.
    pub rotations: Vec<Quat>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakedScene {
    pub scene: String,
    pub start_frame: i32,
    pub end_frame: i32,
    pub tracks: Vec<BakedTrack>,
}

/// Sample every node of `scene` over `interval`, phase layer included.
pub fn bake_scene(scene: &Scene, interval: FrameInterval) -> BakedScene {
    let tracks = scene
        .nodes()
        .iter()
        .map(|node| BakedTrack {
            node: node.id.clone(),
            rotations: interval.frames().map(|f| node.local_at(f)).collect(),
        })
        .collect();
    BakedScene {
        scene: scene.name().to_string(),
        start_frame: interval.start(),
        end_frame: interval.end(),
        tracks,
    }
}

/// Serialize a baked scene to a JSON value.
pub fn export_baked_json(baked: &BakedScene) -> serde_json::Value {
    serde_json::to_value(baked).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeSpec;

    #[test]
    fn bake_covers_inclusive_range_per_node() {
        let scene = Scene::from_specs(
            "pair",
            vec![NodeSpec::new("root"), NodeSpec::new("tip").parent("root")],
        )
        .unwrap();
        let baked = bake_scene(&scene, FrameInterval::new(2, 6).unwrap());
        assert_eq!(baked.tracks.len(), 2);
        assert!(baked.tracks.iter().all(|t| t.rotations.len() == 5));
        let json = export_baked_json(&baked);
        assert_eq!(json["start_frame"], 2);
        assert_eq!(json["tracks"][1]["node"], "tip");
    }
}
