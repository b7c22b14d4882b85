//! Lens assignment: match each localisation to the nearest micro-lens.
//!
//! A pure, stateless, per-point operation. A localisation with no lens
//! centre within the radius is an expected filtering outcome, not an
//! error; it is dropped and counted by the caller.

use crate::error::{ensure_positive, ConfigError};
use crate::mla::MicroLensArray;
use crate::types::{AssignedLocalisation, Localisation2D};
use serde::{Deserialize, Serialize};

/// Parameters of the assignment stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignParams {
    /// Maximum distance from a lens centre for a localisation to be
    /// assigned to it (sensor pixels).
    pub radius_px: f64,
}

impl Default for AssignParams {
    fn default() -> Self {
        Self { radius_px: 74.0 }
    }
}

impl AssignParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("assign.radius_px", self.radius_px)
    }
}

/// Assign one localisation, or `None` when no lens is within the radius.
pub fn assign_localisation(
    mla: &MicroLensArray,
    loc: &Localisation2D,
    radius_px: f64,
) -> Option<AssignedLocalisation> {
    let p = loc.position();
    mla.nearest_lens(p, radius_px).map(|lens| AssignedLocalisation {
        loc: loc.clone(),
        lens: lens.index,
        offset: p - lens.centre,
    })
}

/// Assign a whole frame; returns the assignments plus the count of
/// localisations that matched no lens.
pub fn assign_frame(
    mla: &MicroLensArray,
    locs: &[Localisation2D],
    radius_px: f64,
) -> (Vec<AssignedLocalisation>, usize) {
    let mut assigned = Vec::with_capacity(locs.len());
    let mut unassigned = 0usize;
    for loc in locs {
        match assign_localisation(mla, loc, radius_px) {
            Some(a) => assigned.push(a),
            None => unassigned += 1,
        }
    }
    (assigned, unassigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mla::{LatticeType, MlaParams};

    fn mla() -> MicroLensArray {
        MicroLensArray::new(&MlaParams {
            lattice: LatticeType::Square,
            pitch_px: 40.0,
            span_px: 160.0,
            centre_px: [0.0, 0.0],
            rotation_deg: 0.0,
            offset_px: [0.0, 0.0],
        })
        .unwrap()
    }

    #[test]
    fn on_centre_localisation_has_zero_offset() {
        let a = assign_localisation(&mla(), &Localisation2D::new(0, 40.0, 0.0), 20.0)
            .expect("lens centre is trivially within radius");
        assert_eq!(a.offset, nalgebra::Vector2::new(0.0, 0.0));
    }

    #[test]
    fn offset_never_exceeds_radius() {
        let mla = mla();
        let (assigned, _) = assign_frame(
            &mla,
            &[
                Localisation2D::new(0, 7.0, -6.0),
                Localisation2D::new(0, 43.0, 38.5),
                Localisation2D::new(0, 20.0, 20.0),
            ],
            20.0,
        );
        for a in &assigned {
            assert!(a.offset.norm() <= 20.0);
        }
    }

    #[test]
    fn out_of_radius_point_is_counted_not_assigned() {
        let (assigned, unassigned) =
            assign_frame(&mla(), &[Localisation2D::new(0, 20.0, 20.0)], 20.0);
        assert!(assigned.is_empty());
        assert_eq!(unassigned, 1);
    }
}
