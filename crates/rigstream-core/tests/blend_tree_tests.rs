use rigstream_core::{
    blend_tree::{
        BlendTree, BlendTree1d, BlendTree2d, BlendTreeInstance, ConfigState, Motion1d, Motion2d,
        MotionSource,
    },
    config::Config,
    error::{ConfigError, EvalError},
    rig::{JointDef, RigDescriptor},
    stream::{AnimationStream, AnimationStreamMut},
};
use std::sync::Arc;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn clip1d(slot: usize, threshold: f32, speed: f32, duration: f32) -> Motion1d {
    Motion1d {
        source: MotionSource::Clip(slot),
        threshold,
        speed,
        duration,
    }
}

fn clip2d(slot: usize, position: [f32; 2]) -> Motion2d {
    Motion2d {
        source: MotionSource::Clip(slot),
        position,
        speed: 1.0,
        duration: 1.0,
    }
}

#[test]
fn tree_1d_clamps_outside_threshold_range() {
    let mut tree = BlendTree1d::new(
        "Speed",
        vec![
            clip1d(0, 0.0, 1.0, 1.0),
            clip1d(1, 1.0, 1.0, 1.0),
            clip1d(2, 2.0, 1.0, 1.0),
        ],
    )
    .unwrap();

    tree.set_parameter("Speed", -5.0);
    tree.evaluate();
    assert_eq!(tree.weights(), &[1.0, 0.0, 0.0]);

    tree.set_parameter("Speed", 9.0);
    tree.evaluate();
    assert_eq!(tree.weights(), &[0.0, 0.0, 1.0]);
}

#[test]
fn tree_1d_exact_threshold_selects_single_motion() {
    let mut tree = BlendTree1d::new(
        "Speed",
        vec![
            clip1d(0, 0.0, 1.0, 1.0),
            clip1d(1, 1.0, 1.0, 1.0),
            clip1d(2, 2.0, 1.0, 1.0),
        ],
    )
    .unwrap();
    tree.set_parameter("Speed", 1.0);
    tree.evaluate();
    assert_eq!(tree.weights(), &[0.0, 1.0, 0.0]);
}

#[test]
fn tree_1d_cross_fades_bracket() {
    let mut tree = BlendTree1d::new(
        "Speed",
        vec![clip1d(0, 0.0, 1.0, 1.0), clip1d(1, 2.0, 1.0, 1.0)],
    )
    .unwrap();
    tree.set_parameter("Speed", 0.5);
    tree.evaluate();
    approx(tree.weights()[0], 0.75, 1e-6);
    approx(tree.weights()[1], 0.25, 1e-6);
}

#[test]
fn tree_1d_duration_is_harmonic() {
    // Walk: 1s at speed 1. Run: 2s at speed 1. Midpoint weights 0.5/0.5:
    // 1/D = 0.5*1/1 + 0.5*1/2 = 0.75 -> D = 4/3.
    let mut tree = BlendTree1d::new(
        "Speed",
        vec![clip1d(0, 0.0, 1.0, 1.0), clip1d(1, 1.0, 1.0, 2.0)],
    )
    .unwrap();
    tree.set_parameter("Speed", 0.5);
    tree.evaluate();
    approx(tree.duration(), 4.0 / 3.0, 1e-5);

    // At an endpoint the duration is that single motion's.
    tree.set_parameter("Speed", 1.0);
    tree.evaluate();
    approx(tree.duration(), 2.0, 1e-6);
}

#[test]
fn tree_2d_exact_hit_selects_single_motion() {
    let mut tree = BlendTree2d::new(
        "VelX",
        "VelY",
        vec![
            clip2d(0, [0.0, 0.0]),
            clip2d(1, [1.0, 0.0]),
            clip2d(2, [0.0, 1.0]),
        ],
    )
    .unwrap();
    tree.set_parameter("VelX", 1.0);
    tree.set_parameter("VelY", 0.0);
    tree.evaluate();
    assert_eq!(tree.weights(), &[0.0, 1.0, 0.0]);
}

#[test]
fn tree_2d_weights_are_normalized_and_recomputed() {
    let mut tree = BlendTree2d::new(
        "VelX",
        "VelY",
        vec![
            clip2d(0, [0.0, 0.0]),
            clip2d(1, [1.0, 0.0]),
            clip2d(2, [0.0, 1.0]),
        ],
    )
    .unwrap();
    tree.set_parameter("VelX", 0.25);
    tree.set_parameter("VelY", 0.25);
    tree.evaluate();
    let sum: f32 = tree.weights().iter().sum();
    approx(sum, 1.0, 1e-5);
    assert!(tree.weights().iter().all(|w| *w >= 0.0));
    assert!(tree.weights()[0] > tree.weights()[1]);

    let before = tree.weights().to_vec();
    tree.set_parameter("VelX", 0.9);
    tree.evaluate();
    assert_ne!(before, tree.weights());
}

#[test]
fn nested_trees_propagate_parameters() {
    let inner = BlendTree1d::new(
        "Lean",
        vec![clip1d(1, 0.0, 1.0, 1.0), clip1d(2, 1.0, 1.0, 1.0)],
    )
    .unwrap();
    let mut outer = BlendTree1d::new(
        "Speed",
        vec![
            clip1d(0, 0.0, 1.0, 1.0),
            Motion1d {
                source: MotionSource::SubTree1d(Box::new(inner)),
                threshold: 1.0,
                speed: 1.0,
                duration: 1.0,
            },
        ],
    )
    .unwrap();

    outer.set_parameter("Speed", 1.0);
    outer.set_parameter("Lean", 0.5);
    outer.evaluate();

    let mut leaves = Vec::new();
    outer.collect_leaf_weights(1.0, &mut leaves);
    leaves.sort_by_key(|(slot, _)| *slot);
    assert_eq!(leaves.len(), 2);
    assert_eq!(leaves[0].0, 1);
    approx(leaves[0].1, 0.5, 1e-6);
    assert_eq!(leaves[1].0, 2);
    approx(leaves[1].1, 0.5, 1e-6);
}

#[test]
fn instance_rejects_out_of_order_configuration() {
    let cfg = Config::default();
    let tree = BlendTree::Dim1(
        BlendTree1d::new("Speed", vec![clip1d(0, 0.0, 1.0, 1.0)]).unwrap(),
    );

    let mut instance = BlendTreeInstance::new(&cfg);
    assert_eq!(instance.state(), ConfigState::Unconfigured);
    assert_eq!(
        instance.bind_tree(tree.clone()).unwrap_err(),
        ConfigError::RigNotBound
    );

    let rig = RigDescriptor::build_default(&[JointDef::new("Root", None)], &[], &[]).unwrap();
    instance.bind_rig(Arc::clone(&rig)).unwrap();
    assert_eq!(instance.state(), ConfigState::RigBound);
    assert_eq!(
        instance.bind_rig(Arc::clone(&rig)).unwrap_err(),
        ConfigError::AlreadyConfigured
    );

    instance.bind_tree(tree).unwrap();
    assert_eq!(instance.state(), ConfigState::Ready);
}

#[test]
fn instance_refuses_evaluation_before_ready() {
    let cfg = Config::default();
    let rig = RigDescriptor::build_default(&[JointDef::new("Root", None)], &[], &[]).unwrap();
    let mut instance = BlendTreeInstance::new(&cfg);
    instance.bind_rig(Arc::clone(&rig)).unwrap();

    let mut out_buf = vec![0.0f32; rig.slot_count()];
    let mut out = AnimationStreamMut::bind(&rig, &mut out_buf).unwrap();
    assert_eq!(
        instance.evaluate_into(&[], &mut out).unwrap_err(),
        EvalError::Config(ConfigError::NotReady)
    );
}

#[test]
fn instance_composes_weighted_pose() {
    let cfg = Config::default();
    let rig = RigDescriptor::build_default(&[JointDef::new("Root", None)], &[], &[]).unwrap();

    let mut buf0 = vec![0.0f32; rig.slot_count()];
    let mut buf1 = vec![0.0f32; rig.slot_count()];
    {
        let mut s0 = AnimationStreamMut::bind(&rig, &mut buf0).unwrap();
        s0.reset_to_defaults();
        let mut s1 = AnimationStreamMut::bind(&rig, &mut buf1).unwrap();
        s1.reset_to_defaults();
        s1.set_local_to_parent_translation(0, [2.0, 0.0, 0.0])
            .unwrap();
    }
    let clips = [
        AnimationStream::bind(&rig, &buf0).unwrap(),
        AnimationStream::bind(&rig, &buf1).unwrap(),
    ];

    let mut instance = BlendTreeInstance::new(&cfg);
    instance.bind_rig(Arc::clone(&rig)).unwrap();
    instance
        .bind_tree(BlendTree::Dim1(
            BlendTree1d::new(
                "Speed",
                vec![clip1d(0, 0.0, 1.0, 1.0), clip1d(1, 1.0, 1.0, 1.0)],
            )
            .unwrap(),
        ))
        .unwrap();
    instance.set_parameter("Speed", 0.5).unwrap();

    let mut out_buf = vec![0.0f32; rig.slot_count()];
    let mut out = AnimationStreamMut::bind(&rig, &mut out_buf).unwrap();
    instance.evaluate_into(&clips, &mut out).unwrap();
    let t = out.local_to_parent_translation(0).unwrap();
    approx(t[0], 1.0, 1e-5);
}

#[test]
fn instance_reports_missing_clip_slots() {
    let cfg = Config::default();
    let rig = RigDescriptor::build_default(&[JointDef::new("Root", None)], &[], &[]).unwrap();
    let mut instance = BlendTreeInstance::new(&cfg);
    instance.bind_rig(Arc::clone(&rig)).unwrap();
    instance
        .bind_tree(BlendTree::Dim1(
            BlendTree1d::new("Speed", vec![clip1d(3, 0.0, 1.0, 1.0)]).unwrap(),
        ))
        .unwrap();

    let mut out_buf = vec![0.0f32; rig.slot_count()];
    let mut out = AnimationStreamMut::bind(&rig, &mut out_buf).unwrap();
    assert!(matches!(
        instance.evaluate_into(&[], &mut out).unwrap_err(),
        EvalError::ClipOutOfRange { .. }
    ));
}
