//! Rigid marker-cluster tracking.
//!
//! A cluster captures a segment's marker configuration at calibration
//! time, including virtual points (joint centers) that are never measured
//! during gait. Tracking refits the reference configuration to whichever
//! cluster markers are visible at each dynamic sample with the SVD-based
//! orthogonal-Procrustes (Kabsch) solution, then reconstructs every
//! cluster point from the fitted pose.
//!
//! Reference: Söderkvist & Wedin, "Determining the movements of the
//! skeleton using well-configured markers", J. Biomech., 1993.

use std::collections::BTreeMap;

use nalgebra::{Matrix3, Translation3, UnitQuaternion};

use crate::anatomy::StaticSnapshot;
use crate::error::{GaitError, Result};
use crate::markers::MarkerSet;
use crate::types::{Point, PointSeries, Rotation, Transform, TransformSeries, Vec3};

/// A rigid fit needs at least this many matched markers.
pub const MIN_CLUSTER_MARKERS: usize = 3;

/// Normalized cross-product floor below which a marker triple counts as
/// collinear.
const COLLINEAR_TOL: f64 = 1e-9;

/// Immutable reference configuration of one segment's markers, captured
/// from the static snapshot.
#[derive(Clone, Debug)]
pub struct Cluster {
    name: String,
    markers: Vec<(String, Point)>,
}

impl Cluster {
    /// Capture `marker_names` from the snapshot. Requires at least three
    /// markers that are not all collinear.
    pub fn from_snapshot<S: AsRef<str>>(
        name: &str,
        snapshot: &StaticSnapshot,
        marker_names: &[S],
    ) -> Result<Cluster> {
        let mut markers = Vec::with_capacity(marker_names.len());
        for m in marker_names {
            markers.push((m.as_ref().to_string(), snapshot.get(m.as_ref())?));
        }
        if markers.len() < MIN_CLUSTER_MARKERS {
            return Err(GaitError::DegenerateCluster {
                name: name.to_string(),
                reason: format!(
                    "{} markers, need at least {}",
                    markers.len(),
                    MIN_CLUSTER_MARKERS
                ),
            });
        }
        if Self::is_collinear(&markers) {
            return Err(GaitError::DegenerateCluster {
                name: name.to_string(),
                reason: "all markers are collinear".to_string(),
            });
        }
        Ok(Cluster {
            name: name.to_string(),
            markers,
        })
    }

    fn is_collinear(markers: &[(String, Point)]) -> bool {
        let base = markers[0].1;
        for (i, (_, a)) in markers.iter().enumerate().skip(1) {
            for (_, b) in markers.iter().skip(i + 1) {
                let u = a - base;
                let v = b - base;
                let scale = u.norm() * v.norm();
                if scale > 0.0 && u.cross(&v).norm() / scale > COLLINEAR_TOL {
                    return false;
                }
            }
        }
        true
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn markers(&self) -> &[(String, Point)] {
        &self.markers
    }

    pub fn marker_names(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(|(n, _)| n.as_str())
    }
}

/// Result of tracking one cluster through a dynamic trial.
#[derive(Clone, Debug)]
pub struct TrackedCluster {
    /// Fitted reference→lab pose per sample; `None` where fewer than
    /// three cluster markers were visible.
    pub transforms: TransformSeries,
    /// Reconstructed position series for every cluster marker, measured
    /// and virtual alike. All series keep the trial's length.
    pub points: BTreeMap<String, PointSeries>,
}

/// Track a cluster through a dynamic trial.
///
/// Per sample, markers missing from the trial (or invalid at that sample)
/// are excluded from the fit; if fewer than three remain the sample is
/// marked invalid and propagated as `None`, never dropped.
pub fn track_cluster(dynamic: &MarkerSet, cluster: &Cluster) -> Result<TrackedCluster> {
    let n = dynamic.len();
    let observed: Vec<Option<&PointSeries>> = cluster
        .markers
        .iter()
        .map(|(name, _)| dynamic.get(name))
        .collect();

    let mut transforms: TransformSeries = Vec::with_capacity(n);
    let mut invalid = 0usize;
    let mut pairs: Vec<(Point, Point)> = Vec::with_capacity(cluster.markers.len());
    for i in 0..n {
        pairs.clear();
        for ((_, reference), series) in cluster.markers.iter().zip(&observed) {
            if let Some(series) = series {
                if let Some(p) = series[i] {
                    pairs.push((*reference, p));
                }
            }
        }
        let fitted = if pairs.len() >= MIN_CLUSTER_MARKERS {
            fit_rigid(&pairs)
        } else {
            None
        };
        if fitted.is_none() {
            invalid += 1;
        }
        transforms.push(fitted);
    }
    if invalid > 0 {
        log::warn!(
            "cluster '{}': {} of {} samples marked invalid",
            cluster.name,
            invalid,
            n
        );
    }

    let points = cluster
        .markers
        .iter()
        .map(|(name, reference)| {
            let series = transforms
                .iter()
                .map(|t| t.map(|t| t.transform_point(reference)))
                .collect();
            (name.clone(), series)
        })
        .collect();

    Ok(TrackedCluster { transforms, points })
}

/// Least-squares rigid alignment of matched (reference, observed) pairs,
/// minimizing the summed squared residual. SVD of the cross-covariance
/// with a reflection guard on the smallest singular direction, which
/// stays stable near-degenerate configurations.
fn fit_rigid(pairs: &[(Point, Point)]) -> Option<Transform> {
    let n = pairs.len() as f64;
    let ref_centroid = pairs
        .iter()
        .fold(Vec3::zeros(), |acc, (a, _)| acc + a.coords)
        / n;
    let obs_centroid = pairs
        .iter()
        .fold(Vec3::zeros(), |acc, (_, b)| acc + b.coords)
        / n;

    let mut cross_cov = Matrix3::zeros();
    for (a, b) in pairs {
        cross_cov += (a.coords - ref_centroid) * (b.coords - obs_centroid).transpose();
    }

    let svd = cross_cov.svd(true, true);
    let u = svd.u?;
    let v = svd.v_t?.transpose();
    let mut d = Matrix3::identity();
    if (v * u.transpose()).determinant() < 0.0 {
        d[(2, 2)] = -1.0;
    }
    let r = v * d * u.transpose();
    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation::from_matrix_unchecked(r));
    let translation = obs_centroid - r * ref_centroid;
    Some(Transform::from_parts(
        Translation3::from(translation),
        rotation,
    ))
}
