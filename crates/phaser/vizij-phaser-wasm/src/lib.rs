use js_sys::{Array, Function, Reflect, JSON};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use vizij_phaser_core::{
    bake_scene, calculate, export_scene_json, parse_stored_scene_json, reset_keyframes, Config,
    FrameInterval, NodeHandle, NodePose, Quat, Scene, Severity, StoredScene, TransformProvider,
};

#[wasm_bindgen]
pub struct VizijPhaser {
    scene: Scene,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn parse_config(config: JsValue) -> Result<Config, JsError> {
    if jsvalue_is_undefined_or_null(&config) {
        Ok(Config::default())
    } else {
        swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))
    }
}

fn stringify(value: &JsValue, what: &str) -> Result<String, JsError> {
    JSON::stringify(value)
        .map_err(|e| JsError::new(&format!("{what} stringify error: {:?}", e)))?
        .as_string()
        .ok_or_else(|| JsError::new(&format!("{what}: stringify produced non-string")))
}

#[wasm_bindgen]
impl VizijPhaser {
    /// Build from a scene object (or its JSON string).
    /// Example:
    ///   new VizijPhaser({ name: "arm", active: "shoulder", nodes: [...] })
    #[wasm_bindgen(constructor)]
    pub fn new(scene_json: JsValue) -> Result<VizijPhaser, JsError> {
        console_error_panic_hook::set_once();

        if jsvalue_is_undefined_or_null(&scene_json) {
            return Err(JsError::new("VizijPhaser: scene_json is null/undefined"));
        }
        let s = match scene_json.as_string() {
            Some(s) => s,
            None => stringify(&scene_json, "scene")?,
        };
        let scene = parse_stored_scene_json(&s)
            .map_err(|e| JsError::new(&format!("scene parse error: {e}")))?;
        Ok(VizijPhaser { scene })
    }

    /// Run a phase pass from the active node. `config` is optional JSON matching Config.
    /// Returns the Outcome JSON (`{ status: "completed" | "rejected", detail }`).
    #[wasm_bindgen]
    pub fn calculate(&mut self, config: JsValue) -> Result<JsValue, JsError> {
        let cfg = parse_config(config)?;
        let outcome =
            calculate(&mut self.scene, &cfg).map_err(|e| JsError::new(&e.to_string()))?;
        swb::to_value(&outcome).map_err(|e| JsError::new(&format!("outcome error: {e}")))
    }

    /// Remove phase keys in `[start, end]` below the active node. Returns the Outcome JSON.
    #[wasm_bindgen(js_name = reset_keyframes)]
    pub fn reset_keyframes(&mut self, start: i32, end: i32) -> Result<JsValue, JsError> {
        let outcome = reset_keyframes(&mut self.scene, start, end);
        swb::to_value(&outcome).map_err(|e| JsError::new(&format!("outcome error: {e}")))
    }

    #[wasm_bindgen(js_name = set_active)]
    pub fn set_active(&mut self, id: String) -> Result<(), JsError> {
        self.scene
            .set_active(&id)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Local rotation `[x, y, z, w]` of `id` at `frame`, phase layer included.
    #[wasm_bindgen(js_name = rotation_at)]
    pub fn rotation_at(&self, id: String, frame: i32) -> Result<Vec<f32>, JsError> {
        self.scene
            .pose_at(&id, frame)
            .map(|pose| pose.local.to_vec())
            .ok_or_else(|| JsError::new(&format!("unknown node '{id}'")))
    }

    /// Current scene as a StoredScene object.
    #[wasm_bindgen(js_name = export_scene)]
    pub fn export_scene(&self) -> Result<JsValue, JsError> {
        swb::to_value(&StoredScene::from_scene(&self.scene))
            .map_err(|e| JsError::new(&format!("export error: {e}")))
    }

    /// Current scene as pretty-printed JSON text.
    #[wasm_bindgen(js_name = export_scene_json)]
    pub fn export_scene_json(&self) -> Result<String, JsError> {
        export_scene_json(&self.scene).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Baked per-node local rotations over `[start, end]`.
    #[wasm_bindgen]
    pub fn bake(&self, start: i32, end: i32) -> Result<JsValue, JsError> {
        let interval = FrameInterval::new(start, end).map_err(|e| JsError::new(&e.to_string()))?;
        swb::to_value(&bake_scene(&self.scene, interval))
            .map_err(|e| JsError::new(&format!("bake error: {e}")))
    }

    /// Drain host notifications (`[{ severity, text }]`) collected since the last call.
    #[wasm_bindgen(js_name = take_messages)]
    pub fn take_messages(&mut self) -> Result<JsValue, JsError> {
        swb::to_value(&self.scene.take_messages())
            .map_err(|e| JsError::new(&format!("messages error: {e}")))
    }
}

/// Provider backed by a JS host object exposing callbacks:
/// `activeRoot()`, `children(id)`, `isAnimatable(id)`, `currentFrame()`,
/// `setCurrentFrame(f)`, `forceEvaluate()`, `orientation(id) -> { local, world } | null`,
/// `writeKeyframe(id, f, q)`, `clearKeyframes(id, start, end) -> number`, `report(severity, text)`.
///
/// A missing or throwing callback behaves as "no answer".
struct JsHost {
    host: JsValue,
}

impl JsHost {
    fn func(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.host, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok())
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let f = self.func(name)?;
        let args: Array = args.iter().collect();
        f.apply(&self.host, &args).ok()
    }
}

fn as_quat(v: JsValue) -> Option<Quat> {
    let q: Vec<f32> = swb::from_value(v).ok()?;
    <[f32; 4]>::try_from(q.as_slice()).ok()
}

impl TransformProvider for JsHost {
    fn active_root(&self) -> Option<NodeHandle> {
        self.call("activeRoot", &[])?.as_string()
    }

    fn children(&self, node: &str) -> Vec<NodeHandle> {
        self.call("children", &[JsValue::from_str(node)])
            .and_then(|v| swb::from_value::<Vec<String>>(v).ok())
            .unwrap_or_default()
    }

    fn is_animatable(&self, node: &str) -> bool {
        // Hosts without the callback treat every node as animatable.
        match self.func("isAnimatable") {
            Some(_) => self
                .call("isAnimatable", &[JsValue::from_str(node)])
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            None => true,
        }
    }

    fn current_frame(&self) -> i32 {
        self.call("currentFrame", &[])
            .and_then(|v| v.as_f64())
            .map(|f| f as i32)
            .unwrap_or(0)
    }

    fn set_current_frame(&mut self, frame: i32) {
        self.call("setCurrentFrame", &[JsValue::from(frame)]);
    }

    fn force_evaluate(&mut self) {
        self.call("forceEvaluate", &[]);
    }

    fn orientation(&self, node: &str) -> Option<NodePose> {
        let v = self.call("orientation", &[JsValue::from_str(node)])?;
        if jsvalue_is_undefined_or_null(&v) {
            return None;
        }
        let local = as_quat(Reflect::get(&v, &JsValue::from_str("local")).ok()?)?;
        let world = as_quat(Reflect::get(&v, &JsValue::from_str("world")).ok()?)?;
        Some(NodePose { local, world })
    }

    fn write_keyframe(&mut self, node: &str, frame: i32, rotation: Quat) {
        let q: Array = rotation.iter().map(|c| JsValue::from(*c)).collect();
        self.call(
            "writeKeyframe",
            &[JsValue::from_str(node), JsValue::from(frame), q.into()],
        );
    }

    fn clear_keyframes(&mut self, node: &str, range: FrameInterval) -> usize {
        self.call(
            "clearKeyframes",
            &[
                JsValue::from_str(node),
                JsValue::from(range.start()),
                JsValue::from(range.end()),
            ],
        )
        .and_then(|v| v.as_f64())
        .map(|n| n.max(0.0) as usize)
        .unwrap_or(0)
    }

    fn report(&mut self, severity: Severity, text: &str) {
        let sev = match severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        self.call("report", &[JsValue::from_str(sev), JsValue::from_str(text)]);
    }
}

/// Run a phase pass against a JS host object (see `JsHost` callbacks). Returns the Outcome JSON.
#[wasm_bindgen(js_name = calculate_with_host)]
pub fn calculate_with_host(host: JsValue, config: JsValue) -> Result<JsValue, JsError> {
    console_error_panic_hook::set_once();
    let cfg = parse_config(config)?;
    let mut provider = JsHost { host };
    let outcome = calculate(&mut provider, &cfg).map_err(|e| JsError::new(&e.to_string()))?;
    swb::to_value(&outcome).map_err(|e| JsError::new(&format!("outcome error: {e}")))
}

/// Clear phase keys through a JS host object. Returns the Outcome JSON.
#[wasm_bindgen(js_name = reset_with_host)]
pub fn reset_with_host(host: JsValue, start: i32, end: i32) -> Result<JsValue, JsError> {
    let mut provider = JsHost { host };
    let outcome = reset_keyframes(&mut provider, start, end);
    swb::to_value(&outcome).map_err(|e| JsError::new(&format!("outcome error: {e}")))
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
