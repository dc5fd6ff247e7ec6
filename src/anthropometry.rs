//! Subject anthropometric scalars.
//!
//! Computed once from the static trial (or supplied by the caller) and
//! immutable input to all dynamic-trial processing. Widths are measured
//! between the lateral and medial marker centers, minus one marker radius
//! per side, so they describe the bone, not the marker shells.

use serde::{Deserialize, Serialize};

use crate::error::{GaitError, Result};
use crate::markers::MarkerSet;
use crate::types::{PointSeries, Side};

/// Per-subject scalar measurements [m].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Anthropometry {
    pub marker_radius: f64,
    pub leg_length: f64,
    pub knee_width: f64,
    pub ankle_width: f64,
}

impl Anthropometry {
    /// All scalars must be usable before any joint-center inference runs.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("leg length", self.leg_length),
            ("knee width", self.knee_width),
            ("ankle width", self.ankle_width),
        ];
        for (name, value) in checks {
            if !(value > 0.0) {
                return Err(GaitError::InsufficientAnthropometry(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.marker_radius >= 0.0) {
            return Err(GaitError::InsufficientAnthropometry(format!(
                "marker radius must be non-negative, got {}",
                self.marker_radius
            )));
        }
        Ok(())
    }
}

fn paired_distances(a: &PointSeries, b: &PointSeries) -> Vec<f64> {
    a.iter()
        .zip(b)
        .filter_map(|(pa, pb)| match (pa, pb) {
            (Some(pa), Some(pb)) => Some((pb - pa).norm()),
            _ => None,
        })
        .collect()
}

fn mean_marker_distance(ms: &MarkerSet, lateral: &str, medial: &str) -> Result<f64> {
    let d = paired_distances(ms.require(lateral)?, ms.require(medial)?);
    if d.is_empty() {
        return Err(GaitError::InsufficientAnthropometry(format!(
            "no sample where both '{}' and '{}' are valid",
            lateral, medial
        )));
    }
    Ok(d.iter().sum::<f64>() / d.len() as f64)
}

/// Knee width [m]: mean lateral-to-medial epicondyle marker distance over
/// the static trial, minus twice the marker radius.
pub fn measure_knee_width(static_trial: &MarkerSet, side: Side, marker_radius: f64) -> Result<f64> {
    let d = mean_marker_distance(
        static_trial,
        &side.marker("KNE"),
        &side.marker("KneeMedial"),
    )?;
    Ok(d - 2.0 * marker_radius)
}

/// Ankle width [m]: mean lateral-to-medial malleolus marker distance over
/// the static trial, minus twice the marker radius.
pub fn measure_ankle_width(static_trial: &MarkerSet, side: Side, marker_radius: f64) -> Result<f64> {
    let d = mean_marker_distance(
        static_trial,
        &side.marker("ANK"),
        &side.marker("MalleolusMedial"),
    )?;
    Ok(d - 2.0 * marker_radius)
}

/// Leg length [m]: maximum ASIS-to-lateral-malleolus distance over the
/// static trial (maximum so a slightly flexed standing pose does not
/// shorten the estimate).
pub fn measure_leg_length(static_trial: &MarkerSet, side: Side) -> Result<f64> {
    let d = paired_distances(
        static_trial.require(&side.marker("ASI"))?,
        static_trial.require(&side.marker("ANK"))?,
    );
    d.into_iter().fold(None, |acc: Option<f64>, x| {
        Some(acc.map_or(x, |m| m.max(x)))
    })
    .ok_or_else(|| {
        GaitError::InsufficientAnthropometry(format!(
            "no sample where both '{}ASI' and '{}ANK' are valid",
            side.prefix(),
            side.prefix()
        ))
    })
}
