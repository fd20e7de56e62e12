use rigstream_core::{
    ops,
    rig::{CustomFloatDef, CustomIntDef, JointDef, RigDescriptor},
    stream::{AnimationStream, AnimationStreamMut},
};
use std::sync::Arc;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn approx3(a: [f32; 3], b: [f32; 3], eps: f32) {
    for i in 0..3 {
        assert!((a[i] - b[i]).abs() <= eps, "left={a:?} right={b:?}");
    }
}

fn quat_z(rad: f32) -> [f32; 4] {
    [0.0, 0.0, (rad * 0.5).sin(), (rad * 0.5).cos()]
}

fn quat_close(a: [f32; 4], b: [f32; 4]) {
    let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3];
    assert!(dot.abs() > 0.9999, "left={a:?} right={b:?}");
}

fn test_rig() -> Arc<RigDescriptor> {
    let joints = [
        JointDef::new("Root", None).with_translation([0.0, 2.0, 0.0]),
        JointDef::new("Root/Hips", Some(0)),
    ];
    let floats = [CustomFloatDef {
        name: "Blink".into(),
        default: 0.5,
    }];
    let ints = [CustomIntDef {
        name: "State".into(),
        default: 2,
    }];
    RigDescriptor::build_default(&joints, &floats, &ints).unwrap()
}

fn filled_stream(rig: &RigDescriptor, t: [f32; 3], r: [f32; 4], f: f32, i: i32) -> Vec<f32> {
    let mut buf = vec![0.0f32; rig.slot_count()];
    let mut s = AnimationStreamMut::bind(rig, &mut buf).unwrap();
    s.reset_to_defaults();
    for j in 0..rig.joint_count() {
        s.set_local_to_parent_translation(j, t).unwrap();
        s.set_local_to_parent_rotation(j, r).unwrap();
    }
    s.set_float(0, f).unwrap();
    s.set_int(0, i).unwrap();
    buf
}

#[test]
fn blend_endpoints_are_exact() {
    let rig = test_rig();
    let buf_a = filled_stream(&rig, [1.0, 2.0, 3.0], quat_z(0.4), 0.25, -4);
    let buf_b = filled_stream(&rig, [-2.0, 5.0, 0.0], quat_z(1.3), 0.75, 9);
    let a = AnimationStream::bind(&rig, &buf_a).unwrap();
    let b = AnimationStream::bind(&rig, &buf_b).unwrap();

    let mut out_buf = vec![0.0f32; rig.slot_count()];
    let mut out = AnimationStreamMut::bind(&rig, &mut out_buf).unwrap();

    ops::blend(&a, &b, 0.0, &mut out).unwrap();
    assert_eq!(
        out.local_to_parent_translation(0).unwrap(),
        [1.0, 2.0, 3.0]
    );
    quat_close(out.local_to_parent_rotation(0).unwrap(), quat_z(0.4));
    assert_eq!(out.float(0).unwrap(), 0.25);
    assert_eq!(out.int(0).unwrap(), -4);

    ops::blend(&a, &b, 1.0, &mut out).unwrap();
    assert_eq!(
        out.local_to_parent_translation(0).unwrap(),
        [-2.0, 5.0, 0.0]
    );
    quat_close(out.local_to_parent_rotation(0).unwrap(), quat_z(1.3));
    assert_eq!(out.float(0).unwrap(), 0.75);
    assert_eq!(out.int(0).unwrap(), 9);
}

#[test]
fn blend_midpoint_interpolates() {
    let rig = test_rig();
    let buf_a = filled_stream(&rig, [0.0, 0.0, 0.0], quat_z(0.0), 0.0, 0);
    let buf_b = filled_stream(&rig, [4.0, 0.0, 0.0], quat_z(1.0), 1.0, 10);
    let a = AnimationStream::bind(&rig, &buf_a).unwrap();
    let b = AnimationStream::bind(&rig, &buf_b).unwrap();

    let mut out_buf = vec![0.0f32; rig.slot_count()];
    let mut out = AnimationStreamMut::bind(&rig, &mut out_buf).unwrap();
    ops::blend(&a, &b, 0.5, &mut out).unwrap();

    approx3(
        out.local_to_parent_translation(0).unwrap(),
        [2.0, 0.0, 0.0],
        1e-6,
    );
    // Shortest-arc spherical midpoint of 0 and 1 radian about Z.
    quat_close(out.local_to_parent_rotation(0).unwrap(), quat_z(0.5));
    approx(out.float(0).unwrap(), 0.5, 1e-6);
    assert_eq!(out.int(0).unwrap(), 5);
}

#[test]
fn add_zero_weight_is_identity() {
    let rig = test_rig();
    let buf_term = filled_stream(&rig, [5.0, 5.0, 5.0], quat_z(2.0), 1.0, 4);
    let term = AnimationStream::bind(&rig, &buf_term).unwrap();

    let mut accum_buf = vec![0.0f32; rig.slot_count()];
    let mut accum = AnimationStreamMut::bind(&rig, &mut accum_buf).unwrap();
    accum.reset_to_defaults();
    let before = accum_buf.clone();

    let mut accum = AnimationStreamMut::bind(&rig, &mut accum_buf).unwrap();
    ops::add_scaled(&mut accum, &term, 0.0).unwrap();
    assert_eq!(accum_buf, before);
}

#[test]
fn add_composes_weighted_rotation() {
    let rig = test_rig();
    let buf_term = filled_stream(&rig, [2.0, 0.0, 0.0], quat_z(1.0), 0.0, 0);
    let term = AnimationStream::bind(&rig, &buf_term).unwrap();

    let mut accum_buf = vec![0.0f32; rig.slot_count()];
    let mut accum = AnimationStreamMut::bind(&rig, &mut accum_buf).unwrap();
    accum.reset_to_defaults();
    ops::add_scaled(&mut accum, &term, 0.5).unwrap();

    // Default root translation (0,2,0) plus half the term translation.
    approx3(
        accum.local_to_parent_translation(0).unwrap(),
        [1.0, 2.0, 0.0],
        1e-5,
    );
    // Identity rotation composed with the half-angle-scaled term.
    quat_close(accum.local_to_parent_rotation(0).unwrap(), quat_z(0.5));
}

#[test]
fn weighted_blend_with_zero_total_is_default_pose() {
    let rig = test_rig();
    let buf_a = filled_stream(&rig, [9.0, 9.0, 9.0], quat_z(2.5), 1.0, 9);
    let a = AnimationStream::bind(&rig, &buf_a).unwrap();

    let mut out_buf = vec![7.0f32; rig.slot_count()];
    let mut out = AnimationStreamMut::bind(&rig, &mut out_buf).unwrap();
    ops::blend_weighted(&[(a, 0.0)], &mut out).unwrap();

    assert_eq!(out_buf, rig.default_pose().to_vec());
    for v in &out_buf {
        assert!(v.is_finite());
    }
}

#[test]
fn weighted_blend_averages_inputs() {
    let rig = test_rig();
    let buf_a = filled_stream(&rig, [0.0, 0.0, 0.0], quat_z(0.0), 0.0, 0);
    let buf_b = filled_stream(&rig, [2.0, 0.0, 0.0], quat_z(0.8), 1.0, 10);
    let a = AnimationStream::bind(&rig, &buf_a).unwrap();
    let b = AnimationStream::bind(&rig, &buf_b).unwrap();

    let mut out_buf = vec![0.0f32; rig.slot_count()];
    let mut out = AnimationStreamMut::bind(&rig, &mut out_buf).unwrap();
    ops::blend_weighted(&[(a, 1.0), (b, 3.0)], &mut out).unwrap();

    approx3(
        out.local_to_parent_translation(0).unwrap(),
        [1.5, 0.0, 0.0],
        1e-5,
    );
    approx(out.float(0).unwrap(), 0.75, 1e-5);
    assert_eq!(out.int(0).unwrap(), 8); // round(7.5) away from zero
    // Normalized rotation, biased toward b.
    let r = out.local_to_parent_rotation(0).unwrap();
    let len = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2] + r[3] * r[3]).sqrt();
    approx(len, 1.0, 1e-5);
}

#[test]
fn normalize_restores_unit_rotations() {
    let rig = test_rig();
    let mut buf = vec![0.0f32; rig.slot_count()];
    {
        let mut s = AnimationStreamMut::bind(&rig, &mut buf).unwrap();
        s.reset_to_defaults();
        s.set_local_to_parent_rotation(0, [0.0, 0.0, 2.0, 2.0])
            .unwrap();
        // Joint 1 left all-zero to exercise the degenerate fallback.
        s.set_local_to_parent_rotation(1, [0.0, 0.0, 0.0, 0.0])
            .unwrap();
        ops::normalize_rotations(&mut s);
    }
    let s = AnimationStream::bind(&rig, &buf).unwrap();
    let r0 = s.local_to_parent_rotation(0).unwrap();
    approx(
        (r0[0] * r0[0] + r0[1] * r0[1] + r0[2] * r0[2] + r0[3] * r0[3]).sqrt(),
        1.0,
        1e-6,
    );
    assert_eq!(s.local_to_parent_rotation(1).unwrap(), [0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn ops_reject_descriptor_mismatch() {
    let rig_a = test_rig();
    let rig_b = test_rig();
    let buf_a = vec![0.0f32; rig_a.slot_count()];
    let a = AnimationStream::bind(&rig_a, &buf_a).unwrap();
    let mut out_buf = vec![0.0f32; rig_b.slot_count()];
    let mut out = AnimationStreamMut::bind(&rig_b, &mut out_buf).unwrap();
    assert!(ops::blend(&a, &a, 0.5, &mut out).is_err());
    assert!(ops::add_scaled(&mut out, &a, 1.0).is_err());
    assert!(ops::blend_weighted(&[(a, 1.0)], &mut out).is_err());
}
