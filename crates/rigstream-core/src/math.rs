//! Pose-algebra primitives:
//! - component lerps
//! - quaternion slerp (shortest-arc), multiply, conjugate, rotate
//! - fractional quaternion weight (half-angle scaling) for additive blends
//! - TRS composition and inversion for local<->rig space conversion

pub const QUAT_IDENTITY: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

#[inline]
pub fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

/// Normalize a quaternion; zero-length input falls back to identity so a
/// degenerate accumulation can never produce NaN downstream.
#[inline]
pub fn normalize4(q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv = len2.sqrt().recip();
        [q[0] * inv, q[1] * inv, q[2] * inv, q[3] * inv]
    } else {
        QUAT_IDENTITY
    }
}

/// Shortest-arc spherical interpolation between unit quaternions (x,y,z,w).
/// Falls back to normalized lerp when the inputs are nearly parallel.
pub fn slerp(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    let mut dot = dot4(a, b);
    if dot < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
        dot = -dot;
    }
    const DOT_THRESHOLD: f32 = 0.9995;
    if dot > DOT_THRESHOLD {
        return normalize4([
            lerp_f32(a[0], b[0], t),
            lerp_f32(a[1], b[1], t),
            lerp_f32(a[2], b[2], t),
            lerp_f32(a[3], b[3], t),
        ]);
    }
    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();
    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;
    [
        s0 * a[0] + s1 * b[0],
        s0 * a[1] + s1 * b[1],
        s0 * a[2] + s1 * b[2],
        s0 * a[3] + s1 * b[3],
    ]
}

/// Hamilton product a * b (apply b, then a).
#[inline]
pub fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [
        a[3] * b[0] + a[0] * b[3] + a[1] * b[2] - a[2] * b[1],
        a[3] * b[1] + a[1] * b[3] + a[2] * b[0] - a[0] * b[2],
        a[3] * b[2] + a[2] * b[3] + a[0] * b[1] - a[1] * b[0],
        a[3] * b[3] - a[0] * b[0] - a[1] * b[1] - a[2] * b[2],
    ]
}

#[inline]
pub fn quat_conjugate(q: [f32; 4]) -> [f32; 4] {
    [-q[0], -q[1], -q[2], q[3]]
}

/// Rotate a vector by a unit quaternion: v + 2w(u x v) + 2(u x (u x v)).
#[inline]
pub fn quat_rotate_vec3(q: [f32; 4], v: [f32; 3]) -> [f32; 3] {
    let u = [q[0], q[1], q[2]];
    let uv = cross(u, v);
    let uuv = cross(u, uv);
    [
        v[0] + 2.0 * (q[3] * uv[0] + uuv[0]),
        v[1] + 2.0 * (q[3] * uv[1] + uuv[1]),
        v[2] + 2.0 * (q[3] * uv[2] + uuv[2]),
    ]
}

#[inline]
fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Fractional power of a unit quaternion via half-angle scaling:
/// q = (sin h * axis, cos h) -> q^w = (sin(w h) * axis, cos(w h)).
/// Small rotations degrade to a normalized lerp toward identity, which keeps
/// stacked additive contributions smooth at small weights.
pub fn quat_scaled(mut q: [f32; 4], w: f32) -> [f32; 4] {
    // Shortest arc relative to identity.
    if q[3] < 0.0 {
        q = [-q[0], -q[1], -q[2], -q[3]];
    }
    let half = q[3].clamp(-1.0, 1.0).acos();
    let sin_half = half.sin();
    if sin_half.abs() < 1e-6 {
        return normalize4([q[0] * w, q[1] * w, q[2] * w, lerp_f32(1.0, q[3], w)]);
    }
    let scaled = half * w;
    let k = scaled.sin() / sin_half;
    [q[0] * k, q[1] * k, q[2] * k, scaled.cos()]
}

/// Translation/rotation/scale transform used when composing ancestor chains.
/// Scale is per-axis; shear introduced by rotated non-uniform scale is
/// dropped, which matches the per-channel stream representation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Trs {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Trs {
    pub const IDENTITY: Trs = Trs {
        translation: [0.0, 0.0, 0.0],
        rotation: QUAT_IDENTITY,
        scale: [1.0, 1.0, 1.0],
    };

    /// parent * child: the child expressed one space up.
    pub fn compose(&self, child: &Trs) -> Trs {
        let scaled = [
            child.translation[0] * self.scale[0],
            child.translation[1] * self.scale[1],
            child.translation[2] * self.scale[2],
        ];
        let rotated = quat_rotate_vec3(self.rotation, scaled);
        Trs {
            translation: [
                self.translation[0] + rotated[0],
                self.translation[1] + rotated[1],
                self.translation[2] + rotated[2],
            ],
            rotation: quat_mul(self.rotation, child.rotation),
            scale: [
                self.scale[0] * child.scale[0],
                self.scale[1] * child.scale[1],
                self.scale[2] * child.scale[2],
            ],
        }
    }

    /// Take a point from this transform's space into its parent space.
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let scaled = [
            p[0] * self.scale[0],
            p[1] * self.scale[1],
            p[2] * self.scale[2],
        ];
        let rotated = quat_rotate_vec3(self.rotation, scaled);
        [
            self.translation[0] + rotated[0],
            self.translation[1] + rotated[1],
            self.translation[2] + rotated[2],
        ]
    }

    /// Inverse of `transform_point`. A zero scale component has no inverse;
    /// the corresponding output component is forced to 0.
    pub fn inverse_transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let local = [
            p[0] - self.translation[0],
            p[1] - self.translation[1],
            p[2] - self.translation[2],
        ];
        let unrotated = quat_rotate_vec3(quat_conjugate(self.rotation), local);
        let inv = |s: f32, v: f32| if s.abs() > 1e-9 { v / s } else { 0.0 };
        [
            inv(self.scale[0], unrotated[0]),
            inv(self.scale[1], unrotated[1]),
            inv(self.scale[2], unrotated[2]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx3(a: [f32; 3], b: [f32; 3], eps: f32) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() <= eps, "left={a:?} right={b:?}");
        }
    }

    fn quat_z(rad: f32) -> [f32; 4] {
        [0.0, 0.0, (rad * 0.5).sin(), (rad * 0.5).cos()]
    }

    #[test]
    fn slerp_endpoints() {
        let a = quat_z(0.3);
        let b = quat_z(1.4);
        let q0 = slerp(a, b, 0.0);
        let q1 = slerp(a, b, 1.0);
        assert!(dot4(q0, a).abs() > 0.9999);
        assert!(dot4(q1, b).abs() > 0.9999);
    }

    #[test]
    fn quat_scaled_halves_angle() {
        let q = quat_z(1.0);
        let h = quat_scaled(q, 0.5);
        let expected = quat_z(0.5);
        assert!(dot4(h, expected).abs() > 0.9999);
    }

    #[test]
    fn quat_scaled_zero_weight_is_identity() {
        let q = quat_z(2.0);
        let id = quat_scaled(q, 0.0);
        assert!(dot4(id, QUAT_IDENTITY).abs() > 0.9999);
    }

    #[test]
    fn compose_then_invert_round_trips() {
        let parent = Trs {
            translation: [1.0, 2.0, 3.0],
            rotation: quat_z(0.7),
            scale: [2.0, 2.0, 2.0],
        };
        let p = [0.5, -1.0, 4.0];
        let world = parent.transform_point(p);
        approx3(parent.inverse_transform_point(world), p, 1e-5);
    }

    #[test]
    fn rotate_matches_mul() {
        // Rotating the x axis 90 degrees about z lands on the y axis.
        let q = quat_z(std::f32::consts::FRAC_PI_2);
        approx3(quat_rotate_vec3(q, [1.0, 0.0, 0.0]), [0.0, 1.0, 0.0], 1e-6);
    }
}
