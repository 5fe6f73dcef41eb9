use vizij_phaser_core::{
    calculate,
    frames::{INVALID_RANGE_MESSAGE, MAX_PASS_FRAMES},
    interp::functions::angle_between,
    outputs::NO_ACTIVE_ROOT_MESSAGE,
    parse_stored_scene_json, reset_keyframes, Config, FrameInterval, NodeHandle, NodePose,
    Outcome, Quat, Rejection, Scene, Severity, TransformProvider,
};

fn load(name: &str) -> Scene {
    let json = vizij_test_fixtures::scenes::json(name).expect("load scene fixture");
    parse_stored_scene_json(&json).expect("parse scene fixture")
}

fn whip_config() -> Config {
    vizij_test_fixtures::configs::load("whip").expect("whip config")
}

#[test]
fn calculate_writes_one_key_per_descendant_per_frame() {
    let mut scene = load("whip");
    let outcome = calculate(&mut scene, &whip_config()).unwrap();
    let report = outcome.report().expect("completed");

    // hips + spine, neck, head, tail, tail_tip; prop is pruned with its child
    assert_eq!(report.nodes_collected, 6);
    assert_eq!(report.keys_written, 5 * 25);
    assert_eq!(scene.phase_key_count(), 5 * 25);
    assert!(scene.node("hips").unwrap().phase_keys().is_empty());
    assert!(scene.node("prop").unwrap().phase_keys().is_empty());
    assert!(scene.node("prop_child").unwrap().phase_keys().is_empty());
    assert!(scene.messages().is_empty());
}

#[test]
fn reset_restores_the_baseline() {
    let mut scene = load("whip");
    let before: Vec<Quat> = (0..=24)
        .map(|f| scene.pose_at("head", f).unwrap().local)
        .collect();

    calculate(&mut scene, &whip_config()).unwrap();
    let moved = (0..=24).any(|f| {
        angle_between(scene.pose_at("head", f).unwrap().local, before[f as usize]) > 1e-3
    });
    assert!(moved);

    let outcome = reset_keyframes(&mut scene, 0, 24);
    assert_eq!(outcome.report().unwrap().keys_cleared, 5 * 25);
    assert_eq!(scene.phase_key_count(), 0);
    for f in 0..=24 {
        assert_eq!(scene.pose_at("head", f).unwrap().local, before[f as usize]);
    }

    // A second reset finds nothing to clear.
    let outcome = reset_keyframes(&mut scene, 0, 24);
    assert_eq!(outcome.report().unwrap().keys_cleared, 0);
    assert!(scene.messages().is_empty());
}

#[test]
fn reset_only_touches_the_requested_range() {
    let mut scene = load("whip");
    calculate(&mut scene, &whip_config()).unwrap();
    let outcome = reset_keyframes(&mut scene, 0, 10);
    assert_eq!(outcome.report().unwrap().keys_cleared, 5 * 11);
    assert_eq!(scene.phase_key_count(), 5 * 14);
    let tail = scene.node("tail").unwrap().phase_keys();
    assert_eq!(tail.keys().next(), Some(&11));
}

#[test]
fn invalid_range_is_reported_once_and_changes_nothing() {
    let mut scene = load("chain3");
    calculate(
        &mut scene,
        &Config {
            end_frame: 20,
            ..Config::default()
        },
    )
    .unwrap();
    let keys_before = scene.phase_key_count();

    for (start, end) in [(20, 10), (10, 10), (12, 3)] {
        let outcome = calculate(
            &mut scene,
            &Config {
                start_frame: start,
                end_frame: end,
                ..Config::default()
            },
        )
        .unwrap();
        assert_eq!(
            outcome.rejection(),
            Some(&Rejection::InvalidFrameRange { start, end })
        );
        let messages = scene.take_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, INVALID_RANGE_MESSAGE);
        assert_eq!(scene.phase_key_count(), keys_before);
    }

    let outcome = reset_keyframes(&mut scene, 5, 5);
    assert!(!outcome.is_completed());
    assert_eq!(scene.take_messages().len(), 1);
    assert_eq!(scene.phase_key_count(), keys_before);
}

#[test]
fn range_too_wide_to_sample_is_rejected() {
    let mut scene = load("chain3");
    calculate(
        &mut scene,
        &Config {
            end_frame: 20,
            ..Config::default()
        },
    )
    .unwrap();
    let keys_before = scene.phase_key_count();
    scene.take_messages();

    for (start, end) in [
        (-2_000_000_000, 2_000_000_000),
        (i32::MIN, i32::MAX),
        (0, MAX_PASS_FRAMES as i32),
    ] {
        let outcome = calculate(
            &mut scene,
            &Config {
                start_frame: start,
                end_frame: end,
                ..Config::default()
            },
        )
        .unwrap();
        assert_eq!(
            outcome.rejection(),
            Some(&Rejection::FrameRangeTooWide { start, end })
        );
        let messages = scene.take_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.contains("too wide"));
        assert_eq!(scene.phase_key_count(), keys_before);
    }

    // Clearing needs no sampling, so a wide reset still goes through.
    let outcome = reset_keyframes(&mut scene, i32::MIN, i32::MAX);
    assert_eq!(outcome.report().unwrap().keys_cleared, keys_before);
    assert_eq!(scene.phase_key_count(), 0);
}

#[test]
fn missing_selection_is_a_no_op() {
    let mut scene = load("chain3");
    scene.clear_active();

    let outcome = calculate(&mut scene, &Config::default()).unwrap();
    assert_eq!(outcome, Outcome::Rejected(Rejection::NoActiveRoot));
    let outcome = reset_keyframes(&mut scene, 0, 100);
    assert_eq!(outcome, Outcome::Rejected(Rejection::NoActiveRoot));

    let messages = scene.take_messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.text == NO_ACTIVE_ROOT_MESSAGE));
    assert_eq!(scene.phase_key_count(), 0);
}

#[test]
fn non_animatable_selection_is_rejected() {
    let mut scene = load("whip");
    scene.set_active("prop").unwrap();
    let outcome = calculate(&mut scene, &whip_config()).unwrap();
    assert!(matches!(
        outcome.rejection(),
        Some(Rejection::RootNotAnimatable { root }) if root == "prop"
    ));
    assert_eq!(scene.phase_key_count(), 0);
}

#[test]
fn single_node_selection_completes_without_keys() {
    let mut scene = load("whip");
    scene.set_active("head").unwrap();
    let report = calculate(&mut scene, &whip_config()).unwrap();
    let report = report.report().unwrap();
    assert_eq!(report.nodes_collected, 1);
    assert_eq!(report.keys_written, 0);
}

#[test]
fn non_finite_parameters_fail_before_touching_the_scene() {
    let mut scene = load("chain3");
    let err = calculate(
        &mut scene,
        &Config {
            threshold: f32::INFINITY,
            ..Config::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.category(), "validation");
    assert!(scene.messages().is_empty());
}

#[test]
fn host_frame_is_restored_after_a_pass() {
    let mut scene = load("chain3");
    scene.set_current_frame(7);
    scene.force_evaluate();

    calculate(
        &mut scene,
        &Config {
            end_frame: 20,
            delay: 2.0,
            ..Config::default()
        },
    )
    .unwrap();

    assert_eq!(scene.current_frame(), 7);
    // The cached pose reflects the freshly written keys.
    let cached = scene.orientation("a").unwrap();
    let fresh = scene.pose_at("a", 7).unwrap();
    assert!(angle_between(cached.local, fresh.local) < 1e-5);
    assert!(angle_between(cached.world, fresh.world) < 1e-5);
}

/// Provider whose `vanish` node stops answering from frame `after` on.
struct Flaky {
    inner: Scene,
    vanish: &'static str,
    after: i32,
}

impl TransformProvider for Flaky {
    fn active_root(&self) -> Option<NodeHandle> {
        self.inner.active_root()
    }
    fn children(&self, node: &str) -> Vec<NodeHandle> {
        self.inner.children(node)
    }
    fn is_animatable(&self, node: &str) -> bool {
        self.inner.is_animatable(node)
    }
    fn current_frame(&self) -> i32 {
        self.inner.current_frame()
    }
    fn set_current_frame(&mut self, frame: i32) {
        self.inner.set_current_frame(frame)
    }
    fn force_evaluate(&mut self) {
        self.inner.force_evaluate()
    }
    fn orientation(&self, node: &str) -> Option<NodePose> {
        if node == self.vanish && self.inner.current_frame() >= self.after {
            return None;
        }
        self.inner.orientation(node)
    }
    fn write_keyframe(&mut self, node: &str, frame: i32, rotation: Quat) {
        self.inner.write_keyframe(node, frame, rotation)
    }
    fn clear_keyframes(&mut self, node: &str, range: FrameInterval) -> usize {
        self.inner.clear_keyframes(node, range)
    }
    fn report(&mut self, severity: Severity, text: &str) {
        self.inner.report(severity, text)
    }
}

#[test]
fn vanished_node_is_excluded_and_its_children_skipped() {
    let mut host = Flaky {
        inner: load("chain3"),
        vanish: "a",
        after: 5,
    };
    let outcome = calculate(
        &mut host,
        &Config {
            end_frame: 20,
            ..Config::default()
        },
    )
    .unwrap();
    let report = outcome.report().expect("pass still completes");

    assert_eq!(report.dropped, vec!["a".to_string()]);
    assert_eq!(report.skipped, vec!["b".to_string()]);
    assert_eq!(report.excluded(), 2);
    assert_eq!(report.keys_written, 0);
    assert_eq!(host.inner.phase_key_count(), 0);

    let messages = host.inner.take_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].severity, Severity::Warning);
    assert!(messages[0].text.starts_with("2 node(s)"));
    assert!(messages[0].text.contains("left at their baseline pose"));
}
