//! Vector helpers over keypoint positions and rotation conversions.
//!
//! All functions are pure.

use {
    crate::keypoint::{JointName, PoseFrame, VISIBILITY_THRESHOLD},
    nalgebra as na,
    serde::{Deserialize, Serialize},
};

/// Same as `f32::clamp` but never panics.
/// Returns `min` when `min > max`.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value <= min {
        min
    } else if value >= max {
        max
    } else {
        value
    }
}

fn maybe_normalize(
    v: na::Vector3<f32>,
    normalize: bool,
) -> na::Vector3<f32> {
    if normalize {
        v.try_normalize(f32::EPSILON).unwrap_or(v)
    } else {
        v
    }
}

/// Midpoint of `a` and `b`, optionally normalized as a direction.
pub fn midpoint(
    a: &na::Point3<f32>,
    b: &na::Point3<f32>,
    normalize: bool,
) -> na::Vector3<f32> {
    maybe_normalize((a.coords + b.coords) * 0.5, normalize)
}

/// Vector pointing from `b` to `a`.
pub fn vector_between(
    a: &na::Point3<f32>,
    b: &na::Point3<f32>,
    normalize: bool,
) -> na::Vector3<f32> {
    maybe_normalize(a - b, normalize)
}

pub fn cross_product(
    a: &na::Vector3<f32>,
    b: &na::Vector3<f32>,
) -> na::Vector3<f32> {
    a.cross(b)
}

pub fn distance(a: &na::Point3<f32>, b: &na::Point3<f32>) -> f32 {
    na::distance(a, b)
}

/// Distance in the XY plane, ignoring depth.
pub fn projected_distance(a: &na::Point3<f32>, b: &na::Point3<f32>) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Basis with columns `a`, `normalize(a × b)` and `b`.
pub fn rotation_basis_from_vectors(
    a: &na::Vector3<f32>,
    b: &na::Vector3<f32>,
) -> na::Matrix3<f32> {
    let c = maybe_normalize(a.cross(b), true);
    na::Matrix3::from_columns(&[*a, c, *b])
}

/// Euler angles of the basis built from normalized `a` and `b`.
pub fn rotation_euler(a: &na::Vector3<f32>, b: &na::Vector3<f32>) -> EulerXyz {
    let a = maybe_normalize(*a, true);
    let b = maybe_normalize(*b, true);
    let m = rotation_basis_from_vectors(&a, &b);

    EulerXyz {
        x: m[(2, 1)].atan2(m[(2, 2)]),
        y: (-m[(2, 0)])
            .atan2((m[(2, 1)].powi(2) + m[(2, 2)].powi(2)).sqrt()),
        z: m[(1, 0)].atan2(m[(0, 0)]),
    }
}

/// Basis with columns `normalize(a - b)`, `normalize(c - b)`
/// and the normalized cross product of the two.
pub fn matrix_from_points(
    a: &na::Point3<f32>,
    b: &na::Point3<f32>,
    c: &na::Point3<f32>,
) -> na::Matrix3<f32> {
    let first = vector_between(a, b, true);
    let second = vector_between(c, b, true);
    let third = maybe_normalize(first.cross(&second), true);
    na::Matrix3::from_columns(&[first, second, third])
}

/// Rotation taking triangle `a1 b1 c1` onto triangle `a2 b2 c2`.
/// Returns `None` for degenerate triangles.
pub fn quaternion_from_positions(
    from: [&na::Point3<f32>; 3],
    to: [&na::Point3<f32>; 3],
) -> Option<na::UnitQuaternion<f32>> {
    let from = matrix_from_points(from[0], from[1], from[2]);
    let to = matrix_from_points(to[0], to[1], to[2]);
    let m = to * from.try_inverse()?;
    let rotation = na::Rotation3::from_matrix(&m);
    Some(na::UnitQuaternion::from_rotation_matrix(&rotation))
}

/// Minimal rotation taking direction `from` to direction `to`.
///
/// Both vectors must be unit length.
/// Opposite vectors yield half-turn around an axis orthogonal to `from`.
pub fn quaternion_from_unit_vectors(
    from: &na::Vector3<f32>,
    to: &na::Vector3<f32>,
) -> na::UnitQuaternion<f32> {
    let r = from.dot(to) + 1.0;

    let q = if r < f32::EPSILON {
        if from.x.abs() > from.z.abs() {
            na::Quaternion::new(0.0, -from.y, from.x, 0.0)
        } else {
            na::Quaternion::new(0.0, 0.0, -from.z, from.y)
        }
    } else {
        let axis = from.cross(to);
        na::Quaternion::new(r, axis.x, axis.y, axis.z)
    };

    na::UnitQuaternion::new_normalize(q)
}

/// Euler angles in radians applied intrinsically in X, Y, Z order,
/// i.e. `R = Rx * Ry * Rz`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerXyz {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl EulerXyz {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        EulerXyz { x, y, z }
    }

    pub fn to_quaternion(&self) -> na::UnitQuaternion<f32> {
        let x = na::UnitQuaternion::from_axis_angle(
            &na::Vector3::x_axis(),
            self.x,
        );
        let y = na::UnitQuaternion::from_axis_angle(
            &na::Vector3::y_axis(),
            self.y,
        );
        let z = na::UnitQuaternion::from_axis_angle(
            &na::Vector3::z_axis(),
            self.z,
        );
        x * y * z
    }

    /// Decomposes rotation into angles.
    ///
    /// Angles wrap around at ±π and the decomposition is discontinuous
    /// near gimbal lock (`|y| = π/2`).
    pub fn from_quaternion(q: &na::UnitQuaternion<f32>) -> Self {
        let rotation = q.to_rotation_matrix();
        let m = rotation.matrix();
        let m13 = clamp(m[(0, 2)], -1.0, 1.0);
        let y = m13.asin();

        if m13.abs() < 0.999_999_9 {
            EulerXyz {
                x: (-m[(1, 2)]).atan2(m[(2, 2)]),
                y,
                z: (-m[(0, 1)]).atan2(m[(0, 0)]),
            }
        } else {
            EulerXyz {
                x: m[(2, 1)].atan2(m[(1, 1)]),
                y,
                z: 0.0,
            }
        }
    }
}

/// Torso basis from shoulders and hips.
///
/// Returns identity when any of the four joints is below
/// visibility threshold or missing from the frame.
pub fn pose_basis(frame: &PoseFrame) -> na::Matrix3<f32> {
    let visible = |joint| {
        frame
            .get(joint)
            .filter(|keypoint| keypoint.visibility >= VISIBILITY_THRESHOLD)
            .map(|keypoint| keypoint.position())
    };

    let (left_shoulder, right_shoulder, left_hip, right_hip) = match (
        visible(JointName::LeftShoulder),
        visible(JointName::RightShoulder),
        visible(JointName::LeftHip),
        visible(JointName::RightHip),
    ) {
        (Some(ls), Some(rs), Some(lh), Some(rh)) => (ls, rs, lh, rh),
        _ => return na::Matrix3::identity(),
    };

    let shoulders: na::Point3<f32> =
        midpoint(&left_shoulder, &right_shoulder, false).into();
    let hips: na::Point3<f32> = midpoint(&left_hip, &right_hip, false).into();

    // Estimator mirrors the subject, so the left shoulder marks +X.
    let y = vector_between(&hips, &shoulders, true);
    let x = vector_between(&left_shoulder, &shoulders, true);
    let z = maybe_normalize(x.cross(&y), true);

    let origin = na::Matrix3::from_diagonal(&na::Vector3::new(1.0, -1.0, 1.0));

    match na::Matrix3::from_columns(&[x, y, z]).try_inverse() {
        Some(inverse) => origin * inverse,
        None => na::Matrix3::identity(),
    }
}
