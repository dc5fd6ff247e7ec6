//! Caller-supplied configuration: anthropometric scalars and the marker
//! rename table mapping acquisition labels onto CGM names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_marker_radius() -> f64 {
    0.01
}

/// Options for one CGM run. Scalar measurements left at `None` are
/// measured from the static trial, which then must carry the medial
/// knee/ankle markers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CgmOptions {
    /// Physical marker radius [m], used to compensate marker-shell
    /// thickness in width measurements and joint-center offsets.
    #[serde(default = "default_marker_radius")]
    pub marker_radius: f64,

    /// Acquisition label → CGM marker name (e.g. "RFEP" → "RHJC",
    /// "*114" → "LKneeMedial"). Applied to both trials; entries whose
    /// source label is absent are skipped.
    #[serde(default)]
    pub marker_rename: BTreeMap<String, String>,

    /// Leg length override [m].
    #[serde(default)]
    pub leg_length: Option<f64>,

    /// Knee width override [m].
    #[serde(default)]
    pub knee_width: Option<f64>,

    /// Ankle width override [m].
    #[serde(default)]
    pub ankle_width: Option<f64>,
}

impl Default for CgmOptions {
    fn default() -> Self {
        CgmOptions {
            marker_radius: default_marker_radius(),
            marker_rename: BTreeMap::new(),
            leg_length: None,
            knee_width: None,
            ankle_width: None,
        }
    }
}

impl CgmOptions {
    pub fn from_json(json: &str) -> serde_json::Result<CgmOptions> {
        serde_json::from_str(json)
    }
}
