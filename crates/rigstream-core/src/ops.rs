//! Pose algebra: pure operations combining read-only input streams into an
//! output stream of the same descriptor.
//!
//! Rotations touched by `add_scaled` / `blend_weighted` are normalized at
//! those accumulation points; `blend` produces unit rotations by way of
//! slerp. Total weight of exactly 0 always resolves to the default pose,
//! never NaN or a degenerate rotation.

use crate::error::AccessError;
use crate::mask::ChannelMask;
use crate::math::{lerp_f32, normalize4, quat_mul, quat_scaled, slerp, QUAT_IDENTITY};
use crate::rig::RigDescriptor;
use crate::stream::{AnimationStream, AnimationStreamMut};

fn check_same_rig(rig: &RigDescriptor, other: &RigDescriptor) -> Result<(), AccessError> {
    if !RigDescriptor::same_rig(rig, other) {
        return Err(AccessError::DescriptorMismatch);
    }
    Ok(())
}

#[inline]
fn quat_at(buf: &[f32], off: usize) -> [f32; 4] {
    [buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]
}

#[inline]
fn write_quat(buf: &mut [f32], off: usize, q: [f32; 4]) {
    buf[off..off + 4].copy_from_slice(&q);
}

/// Per-channel interpolation of two poses: linear for translations, scales
/// and floats, rounded-linear for ints, shortest-arc slerp for rotations.
pub fn blend(
    a: &AnimationStream<'_>,
    b: &AnimationStream<'_>,
    t: f32,
    out: &mut AnimationStreamMut<'_>,
) -> Result<(), AccessError> {
    let rig = out.rig();
    check_same_rig(rig, a.rig())?;
    check_same_rig(rig, b.rig())?;

    let (ab, bb) = (a.buf(), b.buf());
    let ob = out.buf_mut();

    let joints = rig.joint_count();
    // Translations and scales are contiguous vec3 runs; floats are scalar.
    for i in 0..3 * joints {
        ob[i] = lerp_f32(ab[i], bb[i], t);
    }
    for j in 0..joints {
        let off = rig.rotation_offset(j);
        write_quat(ob, off, slerp(quat_at(ab, off), quat_at(bb, off), t));
    }
    let scales = rig.scale_offset(0);
    for i in scales..scales + 3 * joints {
        ob[i] = lerp_f32(ab[i], bb[i], t);
    }
    for c in 0..rig.float_count() {
        let off = rig.float_offset(c);
        ob[off] = lerp_f32(ab[off], bb[off], t);
    }
    for c in 0..rig.int_count() {
        let off = rig.int_offset(c);
        ob[off] = lerp_f32(ab[off], bb[off], t).round();
    }
    Ok(())
}

/// In-place masked cross-fade: `out = lerp(out, input, t)` on masked-in
/// channels. This is what an override layer does against the running pose.
pub fn blend_into_masked(
    out: &mut AnimationStreamMut<'_>,
    input: &AnimationStream<'_>,
    t: f32,
    mask: Option<&ChannelMask>,
) -> Result<(), AccessError> {
    let rig = out.rig();
    check_same_rig(rig, input.rig())?;

    let ib = input.buf();
    let ob = out.buf_mut();

    for j in 0..rig.joint_count() {
        if mask.map_or(true, |m| m.translation(j)) {
            let off = rig.translation_offset(j);
            for k in 0..3 {
                ob[off + k] = lerp_f32(ob[off + k], ib[off + k], t);
            }
        }
        if mask.map_or(true, |m| m.rotation(j)) {
            let off = rig.rotation_offset(j);
            write_quat(ob, off, slerp(quat_at(ob, off), quat_at(ib, off), t));
        }
        if mask.map_or(true, |m| m.scale(j)) {
            let off = rig.scale_offset(j);
            for k in 0..3 {
                ob[off + k] = lerp_f32(ob[off + k], ib[off + k], t);
            }
        }
    }
    for c in 0..rig.float_count() {
        if mask.map_or(true, |m| m.float(c)) {
            let off = rig.float_offset(c);
            ob[off] = lerp_f32(ob[off], ib[off], t);
        }
    }
    for c in 0..rig.int_count() {
        if mask.map_or(true, |m| m.int(c)) {
            let off = rig.int_offset(c);
            ob[off] = lerp_f32(ob[off], ib[off], t).round();
        }
    }
    Ok(())
}

/// Weighted additive composition onto an accumulator pose:
/// translations/scales/floats/ints accumulate `term * weight`; rotations
/// compose the fractional rotation `term^weight` and re-normalize, so
/// stacked additive layers stay smooth at small weights. Accumulation order
/// is significant; callers apply layers in fixed ascending index order.
pub fn add_scaled(
    accum: &mut AnimationStreamMut<'_>,
    term: &AnimationStream<'_>,
    weight: f32,
) -> Result<(), AccessError> {
    add_scaled_masked(accum, term, weight, None)
}

/// `add_scaled` restricted to masked-in channels.
pub fn add_scaled_masked(
    accum: &mut AnimationStreamMut<'_>,
    term: &AnimationStream<'_>,
    weight: f32,
    mask: Option<&ChannelMask>,
) -> Result<(), AccessError> {
    let rig = accum.rig();
    check_same_rig(rig, term.rig())?;
    if weight == 0.0 {
        return Ok(());
    }

    let tb = term.buf();
    let ab = accum.buf_mut();

    for j in 0..rig.joint_count() {
        if mask.map_or(true, |m| m.translation(j)) {
            let off = rig.translation_offset(j);
            for k in 0..3 {
                ab[off + k] += tb[off + k] * weight;
            }
        }
        if mask.map_or(true, |m| m.rotation(j)) {
            let off = rig.rotation_offset(j);
            let scaled = quat_scaled(quat_at(tb, off), weight);
            write_quat(ab, off, normalize4(quat_mul(quat_at(ab, off), scaled)));
        }
        if mask.map_or(true, |m| m.scale(j)) {
            let off = rig.scale_offset(j);
            for k in 0..3 {
                ab[off + k] += tb[off + k] * weight;
            }
        }
    }
    for c in 0..rig.float_count() {
        if mask.map_or(true, |m| m.float(c)) {
            let off = rig.float_offset(c);
            ab[off] += tb[off] * weight;
        }
    }
    for c in 0..rig.int_count() {
        if mask.map_or(true, |m| m.int(c)) {
            let off = rig.int_offset(c);
            // Running weighted sum, finalized by the rounding read.
            ab[off] += tb[off] * weight;
        }
    }
    Ok(())
}

/// N-way weighted blend with finalize. Inputs with non-positive weight are
/// skipped; a total weight of 0 resolves to the descriptor defaults.
/// Rotation sums are hemisphere-aligned against the first contribution
/// before normalizing.
pub fn blend_weighted(
    inputs: &[(AnimationStream<'_>, f32)],
    out: &mut AnimationStreamMut<'_>,
) -> Result<(), AccessError> {
    let rig = out.rig();
    for (stream, _) in inputs {
        check_same_rig(rig, stream.rig())?;
    }

    let mut total = 0.0f32;
    for (_, w) in inputs {
        if *w > 0.0 {
            total += *w;
        }
    }
    if total <= 0.0 {
        out.reset_to_defaults();
        return Ok(());
    }

    let slots = rig.slot_count();
    let ob = out.buf_mut();
    ob[..slots].fill(0.0);

    let mut first_rotation = true;
    for (stream, w) in inputs {
        if *w <= 0.0 {
            continue;
        }
        let sb = stream.buf();
        let rot_start = rig.rotation_offset(0);
        let rot_end = rig.scale_offset(0);
        for i in 0..rot_start {
            ob[i] += sb[i] * w;
        }
        for j in 0..rig.joint_count() {
            let off = rig.rotation_offset(j);
            let mut q = quat_at(sb, off);
            if !first_rotation {
                // Align against the running sum to keep the shortest arc.
                let acc = quat_at(ob, off);
                if acc[0] * q[0] + acc[1] * q[1] + acc[2] * q[2] + acc[3] * q[3] < 0.0 {
                    q = [-q[0], -q[1], -q[2], -q[3]];
                }
            }
            for k in 0..4 {
                ob[off + k] += q[k] * w;
            }
        }
        for i in rot_end..slots {
            ob[i] += sb[i] * w;
        }
        first_rotation = false;
    }

    let inv = total.recip();
    let rot_start = rig.rotation_offset(0);
    let rot_end = rig.scale_offset(0);
    for i in 0..rot_start {
        ob[i] *= inv;
    }
    for i in rot_end..slots {
        ob[i] *= inv;
    }
    for j in 0..rig.joint_count() {
        let off = rig.rotation_offset(j);
        let q = normalize4(quat_at(ob, off));
        // A cancelled-out sum falls back to the joint default, not identity.
        let q = if q == QUAT_IDENTITY && quat_at(ob, off) == [0.0; 4] {
            rig.joint(j).default_rotation
        } else {
            q
        };
        write_quat(ob, off, q);
    }
    for c in 0..rig.int_count() {
        let off = rig.int_offset(c);
        ob[off] = ob[off].round();
    }
    Ok(())
}

/// Re-normalize every rotation channel. Required after additive
/// accumulation, before any consumer expecting unit quaternions. Zero-length
/// rotations resolve to the joint's default.
pub fn normalize_rotations(stream: &mut AnimationStreamMut<'_>) {
    let rig = stream.rig();
    let buf = stream.buf_mut();
    for j in 0..rig.joint_count() {
        let off = rig.rotation_offset(j);
        let q = quat_at(buf, off);
        let n = if q == [0.0; 4] {
            rig.joint(j).default_rotation
        } else {
            normalize4(q)
        };
        write_quat(buf, off, n);
    }
}
