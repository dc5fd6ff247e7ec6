//! Linear algebra type system for the gait model
//!
//! Clean aliases over nalgebra so every module speaks the same
//! point/vector/transform vocabulary.

use nalgebra::{Isometry3, Point3, Rotation3, Vector3};

/// A 3D coordinate at one time sample [m].
pub type Point = Point3<f64>;

/// A 3D displacement, always derived as a difference of two points [m].
pub type Vec3 = Vector3<f64>;

/// Orthonormal 3×3 rotation, determinant +1 by construction.
pub type Rotation = Rotation3<f64>;

/// Rigid-body pose (rotation + translation), a segment's local frame
/// expressed in the lab frame.
pub type Transform = Isometry3<f64>;

// ===== Time series =====
//
// All series within one acquisition are equal-length and time-aligned.
// `None` is the explicit missing-sample marker; output series always keep
// the input length, so a dropped sample propagates instead of vanishing.

pub type PointSeries = Vec<Option<Point>>;
pub type VectorSeries = Vec<Option<Vec3>>;
pub type TransformSeries = Vec<Option<Transform>>;

/// Flexion/abduction/rotation per sample [degrees].
pub type AngleSeries = Vec<Option<Vec3>>;
