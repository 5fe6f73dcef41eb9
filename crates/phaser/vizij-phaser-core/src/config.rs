//! Pass configuration: the serializable [`Config`] consumed by the command surface,
//! the clamped [`Parameters`] the core runs with, and the slider-scale
//! [`PanelSettings`] used by UI front-ends.

use serde::{Deserialize, Serialize};

use crate::error::PhaserError;

pub const MIN_DELAY: f32 = 1.0;
pub const MIN_RECURSION: f32 = 0.0;
pub const MAX_RECURSION: f32 = 1.0;
pub const MIN_STRENGTH: f32 = 1.0;
pub const MAX_STRENGTH: f32 = 2.0;
pub const MIN_THRESHOLD: f32 = 0.00001;
pub const MAX_THRESHOLD: f32 = 0.1;

pub const DEFAULT_DELAY: f32 = 3.0;
pub const DEFAULT_RECURSION: f32 = 0.5;
pub const DEFAULT_STRENGTH: f32 = 1.0;
pub const DEFAULT_THRESHOLD: f32 = 0.001;

/// How the scaled delta is combined with a node's own baseline rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Composition {
    /// `delta * local`: the delta acts in the parent's frame, beneath the existing parent chain.
    #[default]
    BeneathParent,
    /// `local * delta`: the delta acts about the node's own axes.
    NodeLocal,
}

/// Validated, clamped parameters for one pass. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Parameters {
    delay: f32,
    recursion: f32,
    strength: f32,
    threshold: f32,
    composition: Composition,
}

fn finite(name: &str, value: f32) -> Result<f32, PhaserError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PhaserError::InvalidParameter {
            name: name.to_string(),
            value,
        })
    }
}

impl Parameters {
    /// Build parameters, clamping each into its documented range.
    /// Non-finite inputs are rejected.
    pub fn new(
        delay: f32,
        recursion: f32,
        strength: f32,
        threshold: f32,
    ) -> Result<Self, PhaserError> {
        Ok(Self {
            delay: finite("delay", delay)?.max(MIN_DELAY),
            recursion: finite("recursion", recursion)?.clamp(MIN_RECURSION, MAX_RECURSION),
            strength: finite("strength", strength)?.clamp(MIN_STRENGTH, MAX_STRENGTH),
            threshold: finite("threshold", threshold)?.clamp(MIN_THRESHOLD, MAX_THRESHOLD),
            composition: Composition::default(),
        })
    }

    pub fn with_composition(mut self, composition: Composition) -> Self {
        self.composition = composition;
        self
    }

    #[inline]
    pub fn delay(&self) -> f32 {
        self.delay
    }

    #[inline]
    pub fn recursion(&self) -> f32 {
        self.recursion
    }

    #[inline]
    pub fn strength(&self) -> f32 {
        self.strength
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn composition(&self) -> Composition {
        self.composition
    }

    /// Lag in frames for a node at `depth`; accumulates additively down the chain.
    #[inline]
    pub fn lag(&self, depth: u32) -> f32 {
        self.delay * depth as f32
    }

    /// Influence `strength * recursion^(depth - 1)`; zero for the root.
    #[inline]
    pub fn influence(&self, depth: u32) -> f32 {
        if depth == 0 {
            return 0.0;
        }
        self.strength * self.recursion.powi(depth as i32 - 1)
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            recursion: DEFAULT_RECURSION,
            strength: DEFAULT_STRENGTH,
            threshold: DEFAULT_THRESHOLD,
            composition: Composition::default(),
        }
    }
}

/// Serializable request for `calculate`. Missing fields take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub start_frame: i32,
    pub end_frame: i32,
    pub delay: f32,
    pub recursion: f32,
    pub strength: f32,
    pub threshold: f32,
    pub composition: Composition,
    /// Collect per-node/per-frame diagnostics (no effect on written keys).
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_frame: 0,
            end_frame: 100,
            delay: DEFAULT_DELAY,
            recursion: DEFAULT_RECURSION,
            strength: DEFAULT_STRENGTH,
            threshold: DEFAULT_THRESHOLD,
            composition: Composition::default(),
            debug: false,
        }
    }
}

impl Config {
    /// Clamp the numeric fields into [`Parameters`].
    pub fn parameters(&self) -> Result<Parameters, PhaserError> {
        Ok(
            Parameters::new(self.delay, self.recursion, self.strength, self.threshold)?
                .with_composition(self.composition),
        )
    }
}

/// Slider values as exposed by the authoring panel. Recursion and strength use
/// a 0..10 / 1..10 scale there and are remapped by [`PanelSettings::to_config`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub start_frame: i32,
    pub end_frame: i32,
    /// 1..10
    pub delay: f32,
    /// 0..10, divided by 10
    pub recursion: f32,
    /// 1..10, mapped to 1 + (s - 1) / 10
    pub strength: f32,
    pub threshold: f32,
    pub debug: bool,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            start_frame: 0,
            end_frame: 100,
            delay: 3.0,
            recursion: 5.0,
            strength: 1.0,
            threshold: DEFAULT_THRESHOLD,
            debug: false,
        }
    }
}

impl PanelSettings {
    pub fn to_config(&self) -> Config {
        Config {
            start_frame: self.start_frame.max(0),
            end_frame: self.end_frame,
            delay: self.delay.clamp(1.0, 10.0),
            recursion: self.recursion.clamp(0.0, 10.0) / 10.0,
            strength: 1.0 + (self.strength.clamp(1.0, 10.0) - 1.0) / 10.0,
            threshold: self.threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD),
            composition: Composition::default(),
            debug: self.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_are_clamped() {
        let p = Parameters::new(0.2, 3.0, 5.0, 1.0).unwrap();
        assert_eq!(p.delay(), MIN_DELAY);
        assert_eq!(p.recursion(), MAX_RECURSION);
        assert_eq!(p.strength(), MAX_STRENGTH);
        assert_eq!(p.threshold(), MAX_THRESHOLD);
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let err = Parameters::new(f32::NAN, 0.5, 1.0, 0.001).unwrap_err();
        assert!(matches!(err, PhaserError::InvalidParameter { ref name, .. } if name == "delay"));
    }

    #[test]
    fn influence_decays_geometrically() {
        let p = Parameters::new(2.0, 0.5, 1.5, 0.001).unwrap();
        assert_eq!(p.influence(0), 0.0);
        assert_eq!(p.influence(1), 1.5);
        assert_eq!(p.influence(2), 0.75);
        assert_eq!(p.influence(3), 0.375);
        assert_eq!(p.lag(2), 4.0);
    }

    #[test]
    fn zero_recursion_only_reaches_direct_children() {
        let p = Parameters::new(1.0, 0.0, 1.2, 0.001).unwrap();
        assert_eq!(p.influence(1), 1.2);
        assert_eq!(p.influence(2), 0.0);
    }

    #[test]
    fn panel_scale_maps_to_core_ranges() {
        let panel = PanelSettings {
            recursion: 5.0,
            strength: 6.0,
            ..PanelSettings::default()
        };
        let cfg = panel.to_config();
        assert_eq!(cfg.recursion, 0.5);
        assert_eq!(cfg.strength, 1.5);
        assert_eq!(cfg.delay, 3.0);
    }

    #[test]
    fn config_json_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "end_frame": 24, "composition": "node_local" }"#).unwrap();
        assert_eq!(cfg.start_frame, 0);
        assert_eq!(cfg.end_frame, 24);
        assert_eq!(cfg.composition, Composition::NodeLocal);
        assert_eq!(cfg.parameters().unwrap().composition(), Composition::NodeLocal);
    }
}
