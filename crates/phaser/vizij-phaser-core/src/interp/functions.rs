//! Rotation helpers on `[f32; 4]` quaternions stored as (x, y, z, w):
//! - dot/normalize/negate and Hamilton product
//! - NLERP and SLERP with shortest-arc correction
//! - angle/axis decomposition and angle scaling (shortest arc)
//! - cubic-bezier timing for keyed baselines

/// Quaternion (x, y, z, w).
pub type Quat = [f32; 4];

/// Identity rotation.
pub const IDENTITY: Quat = [0.0, 0.0, 0.0, 1.0];

/// Above this |dot|, SLERP degenerates and NLERP is used instead.
const SLERP_NLERP_DOT: f32 = 0.9995;

/// Default bezier control points (ease-in-out) for keyed baselines.
pub const DEFAULT_EASE: [f32; 4] = [0.42, 0.0, 0.58, 1.0];

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn dot4(a: Quat, b: Quat) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
pub fn negate4(q: Quat) -> Quat {
    [-q[0], -q[1], -q[2], -q[3]]
}

#[inline]
pub fn normalize4(mut q: Quat) -> Quat {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        q[0] *= inv_len;
        q[1] *= inv_len;
        q[2] *= inv_len;
        q[3] *= inv_len;
        q
    } else {
        IDENTITY
    }
}

#[inline]
pub fn is_finite4(q: Quat) -> bool {
    q.iter().all(|c| c.is_finite())
}

/// Inverse of a unit quaternion.
#[inline]
pub fn conjugate(q: Quat) -> Quat {
    [-q[0], -q[1], -q[2], q[3]]
}

/// Hamilton product `a * b` (apply `b` first, then `a`).
#[inline]
pub fn mul_quat(a: Quat, b: Quat) -> Quat {
    [
        a[3] * b[0] + a[0] * b[3] + a[1] * b[2] - a[2] * b[1],
        a[3] * b[1] - a[0] * b[2] + a[1] * b[3] + a[2] * b[0],
        a[3] * b[2] + a[0] * b[1] - a[1] * b[0] + a[2] * b[3],
        a[3] * b[3] - a[0] * b[0] - a[1] * b[1] - a[2] * b[2],
    ]
}

/// Length of the vector part, i.e. `sin(angle / 2)` for a unit quaternion.
#[inline]
pub fn vector_len(q: Quat) -> f32 {
    (q[0] * q[0] + q[1] * q[1] + q[2] * q[2]).sqrt()
}

/// Rotation angle in radians, in [0, PI] (shortest arc).
#[inline]
pub fn angle_of(q: Quat) -> f32 {
    2.0 * vector_len(q).atan2(q[3].abs())
}

/// Angle of the relative rotation taking `a` to `b`, in [0, PI].
#[inline]
pub fn angle_between(a: Quat, b: Quat) -> f32 {
    angle_of(mul_quat(conjugate(a), b))
}

/// Build a rotation of `angle` radians about `axis` (normalized internally).
pub fn from_axis_angle(axis: [f32; 3], angle: f32) -> Quat {
    let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    if len <= f32::EPSILON {
        return IDENTITY;
    }
    let (s, c) = (angle * 0.5).sin_cos();
    let k = s / len;
    [axis[0] * k, axis[1] * k, axis[2] * k, c]
}

/// Rotation from XYZ Euler angles in degrees (X applied first, then Y, then Z).
pub fn from_euler_deg(euler: [f32; 3]) -> Quat {
    let qx = from_axis_angle([1.0, 0.0, 0.0], euler[0].to_radians());
    let qy = from_axis_angle([0.0, 1.0, 0.0], euler[1].to_radians());
    let qz = from_axis_angle([0.0, 0.0, 1.0], euler[2].to_radians());
    normalize4(mul_quat(qz, mul_quat(qy, qx)))
}

/// Multiply the rotation angle of `q` by `factor`, keeping its axis.
/// Operates on the shortest arc; `factor` may exceed 1 (amplification).
pub fn scale_angle(q: Quat, factor: f32) -> Quat {
    if factor == 0.0 {
        return IDENTITY;
    }
    let q = if q[3] < 0.0 { negate4(q) } else { q };
    let v = vector_len(q);
    if v <= f32::EPSILON {
        return IDENTITY;
    }
    let half = v.atan2(q[3]) * factor;
    let (s, c) = half.sin_cos();
    let k = s / v;
    [q[0] * k, q[1] * k, q[2] * k, c]
}

/// Quaternion NLERP with shortest-arc correction.
/// If dot < 0, negate the second quaternion to ensure the shortest path.
/// Returns a normalized quaternion (x,y,z,w).
#[inline]
pub fn nlerp_quat(a: Quat, mut b: Quat, t: f32) -> Quat {
    if dot4(a, b) < 0.0 {
        b = negate4(b);
    }
    normalize4([
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ])
}

/// Spherical linear interpolation with shortest-arc flip and NLERP fallback
/// for nearly parallel inputs.
pub fn slerp_quat(a: Quat, mut b: Quat, t: f32) -> Quat {
    if t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    let mut d = dot4(a, b);
    if d < 0.0 {
        b = negate4(b);
        d = -d;
    }
    if d > SLERP_NLERP_DOT {
        return nlerp_quat(a, b, t);
    }
    let theta = d.clamp(-1.0, 1.0).acos();
    let sin_theta = theta.sin();
    let s0 = ((1.0 - t) * theta).sin() / sin_theta;
    let s1 = (t * theta).sin() / sin_theta;
    normalize4([
        s0 * a[0] + s1 * b[0],
        s0 * a[1] + s1 * b[1],
        s0 * a[2] + s1 * b[2],
        s0 * a[3] + s1 * b[3],
    ])
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
pub fn bezier_ease_t(t: f32, ctrl: [f32; 4]) -> f32 {
    let [x1, y1, x2, y2] = ctrl;
    let t = t.clamp(0.0, 1.0);
    // Bezier(0,0,1,1) is exactly linear
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}
