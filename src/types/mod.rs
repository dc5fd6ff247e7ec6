pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};

/// Body side.
///
/// All per-side logic is parameterized by this enum. The only numbers
/// that differ between sides are the lateral-direction flip applied when
/// building segment frames and the clinical sign table in
/// [`crate::angles::sign_table`]; there are no duplicated R/L branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Right,
    Left,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Right, Side::Left];

    /// Marker-name prefix used by the CGM marker set ("RKNE", "LKNE", ...).
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Right => "R",
            Side::Left => "L",
        }
    }

    /// +1 for right, -1 for left. Multiplies lateral in-plane directions
    /// so segment x axes point toward the subject's right on both sides.
    pub fn lateral_sign(self) -> f64 {
        match self {
            Side::Right => 1.0,
            Side::Left => -1.0,
        }
    }

    /// Full marker name for this side, e.g. `Side::Left.marker("KNE")`.
    pub fn marker(self, base: &str) -> String {
        format!("{}{}", self.prefix(), base)
    }
}
