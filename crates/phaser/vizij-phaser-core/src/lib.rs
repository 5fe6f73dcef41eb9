//! Vizij Phaser Core (host-agnostic)
//!
//! Bakes phase-delayed secondary motion ("follow-through") into rotation keys of a
//! node hierarchy. A pass collects the active root's subtree, clears prior output,
//! samples baseline orientations over a frame range, then writes one key per
//! descendant per frame whose rotation trails the parent by a depth-proportional
//! delay. Hosts plug in through [`TransformProvider`]; [`Scene`] is the in-memory
//! provider used by the CLI and wasm adapters.

pub mod baking;
pub mod config;
pub mod engine;
pub mod erase;
pub mod error;
pub mod frames;
pub mod hierarchy;
pub mod ids;
pub mod interp;
pub mod outputs;
pub mod propagate;
pub mod provider;
pub mod sampling;
pub mod scene;
pub mod stored_scene;

// Re-exports for consumers (adapters)
pub use baking::{bake_scene, export_baked_json, BakedScene, BakedTrack};
pub use config::{Composition, Config, PanelSettings, Parameters};
pub use engine::{calculate, reset_keyframes};
pub use erase::erase_keyframes;
pub use error::PhaserError;
pub use frames::FrameInterval;
pub use hierarchy::{collect_tree, Tree, TreeNode};
pub use ids::{NodeHandle, NodeIndex};
pub use interp::{Quat, IDENTITY};
pub use outputs::{Outcome, PassReport, PhaseDiagnostic, Rejection};
pub use propagate::{propagate, stabilized_delta};
pub use provider::{FrameCursor, NodePose, Severity, TransformProvider};
pub use sampling::{sample_baseline, BaselineSeries, NodeSeries, OrientationSample};
pub use scene::{Interpolation, NodeSpec, RotationKey, Scene, SceneMessage};
pub use stored_scene::{export_scene_json, parse_stored_scene_json, StoredScene};
