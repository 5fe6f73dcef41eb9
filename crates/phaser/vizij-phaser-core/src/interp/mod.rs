//! Quaternion and timing helpers shared by sampling, propagation and the scene provider.
//!
//! Rotations are `[f32; 4]` in (x, y, z, w) order, matching the Vizij value layout.

pub mod functions;

pub use functions::{Quat, IDENTITY};
