//! Array export for the visualization/plotting collaborator.
//!
//! The external side expects name → `[N×3]` point/angle arrays or
//! `[N×4×4]` homogeneous transform arrays plus the shared time vector.
//! Invalid samples come out as NaN rows so series keep their length.

use ndarray::{Array2, Array3};

use crate::types::{AngleSeries, PointSeries, TransformSeries};

/// `[N×3]` array of a point series, NaN rows for invalid samples.
pub fn points_to_array(series: &PointSeries) -> Array2<f64> {
    let mut out = Array2::from_elem((series.len(), 3), f64::NAN);
    for (i, p) in series.iter().enumerate() {
        if let Some(p) = p {
            out[[i, 0]] = p.x;
            out[[i, 1]] = p.y;
            out[[i, 2]] = p.z;
        }
    }
    out
}

/// `[N×3]` array of an angle series [degrees], NaN rows for invalid
/// samples.
pub fn angles_to_array(series: &AngleSeries) -> Array2<f64> {
    let mut out = Array2::from_elem((series.len(), 3), f64::NAN);
    for (i, a) in series.iter().enumerate() {
        if let Some(a) = a {
            out[[i, 0]] = a.x;
            out[[i, 1]] = a.y;
            out[[i, 2]] = a.z;
        }
    }
    out
}

/// `[N×4×4]` array of homogeneous poses, NaN slices for invalid samples.
pub fn transforms_to_array(series: &TransformSeries) -> Array3<f64> {
    let mut out = Array3::from_elem((series.len(), 4, 4), f64::NAN);
    for (i, t) in series.iter().enumerate() {
        if let Some(t) = t {
            let h = t.to_homogeneous();
            for r in 0..4 {
                for c in 0..4 {
                    out[[i, r, c]] = h[(r, c)];
                }
            }
        }
    }
    out
}
