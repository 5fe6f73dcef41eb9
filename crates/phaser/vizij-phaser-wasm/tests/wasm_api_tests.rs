#![cfg(target_arch = "wasm32")]
use serde::Serialize;
use serde_json::json;
use serde_wasm_bindgen as swb;
use vizij_phaser_wasm::{abi_version, VizijPhaser};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn chain_scene() -> JsValue {
    let scene = json!({
        "name": "chain",
        "active": "root",
        "nodes": [
            { "id": "root", "keys": [
                { "frame": 0, "rotation": { "euler": [0, 0, 0] } },
                { "frame": 10, "rotation": { "euler": [0, 0, 60] } }
            ]},
            { "id": "a", "parent": "root" },
            { "id": "b", "parent": "a" }
        ]
    });
    to_js(&scene)
}

fn config(start: i32, end: i32) -> JsValue {
    to_js(&json!({ "start_frame": start, "end_frame": end, "delay": 2.0 }))
}

// Plain JS objects rather than `Map`s, as a host would pass them.
fn to_js(value: &serde_json::Value) -> JsValue {
    value
        .serialize(&swb::Serializer::json_compatible())
        .unwrap()
}

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn construct_from_object_and_from_string() {
    assert!(VizijPhaser::new(chain_scene()).is_ok());
    let text = r#"{ "name": "s", "nodes": [{ "id": "root" }] }"#;
    assert!(VizijPhaser::new(JsValue::from_str(text)).is_ok());
    assert!(VizijPhaser::new(JsValue::NULL).is_err());
}

#[wasm_bindgen_test]
fn calculate_then_reset() {
    let mut phaser = VizijPhaser::new(chain_scene()).unwrap();
    let outcome: serde_json::Value =
        swb::from_value(phaser.calculate(config(0, 10)).unwrap()).unwrap();
    assert_eq!(outcome["status"], "completed");
    assert_eq!(outcome["detail"]["keys_written"], 22);

    let q = phaser.rotation_at("a".into(), 10).unwrap();
    assert_eq!(q.len(), 4);
    assert!(q[3] < 1.0);

    let outcome: serde_json::Value =
        swb::from_value(phaser.reset_keyframes(0, 10).unwrap()).unwrap();
    assert_eq!(outcome["detail"]["keys_cleared"], 22);
    let q = phaser.rotation_at("a".into(), 10).unwrap();
    assert_eq!(q, vec![0.0, 0.0, 0.0, 1.0]);
}

#[wasm_bindgen_test]
fn rejected_range_is_reported_through_messages() {
    let mut phaser = VizijPhaser::new(chain_scene()).unwrap();
    let outcome: serde_json::Value =
        swb::from_value(phaser.calculate(config(5, 5)).unwrap()).unwrap();
    assert_eq!(outcome["status"], "rejected");
    assert_eq!(outcome["detail"]["reason"], "invalid_frame_range");

    let messages: serde_json::Value = swb::from_value(phaser.take_messages().unwrap()).unwrap();
    assert_eq!(messages.as_array().map(|m| m.len()), Some(1));
    assert_eq!(messages[0]["severity"], "info");
}

#[wasm_bindgen_test]
fn export_includes_phase_layer() {
    let mut phaser = VizijPhaser::new(chain_scene()).unwrap();
    phaser.calculate(config(0, 10)).unwrap();
    let exported: serde_json::Value = swb::from_value(phaser.export_scene().unwrap()).unwrap();
    let b = exported["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == "b")
        .unwrap();
    assert_eq!(b["phase"].as_array().map(|p| p.len()), Some(11));
    assert!(phaser.set_active("ghost".into()).is_err());
}
