//! Ray-space transform: assigned localisations become `(x, y, u, v)` rays.
//!
//! The mapping is closed-form and deterministic. The lens centre, converted
//! to sample-space microns, is the ray's base point; the sensor offset from
//! the lens centre, scaled by the optics' slope factor, is the ray angle.
//! Two lenses therefore produce different rays for the same sensor offset.

use crate::mla::MicroLensArray;
use crate::optics::Optics;
use crate::types::{AssignedLocalisation, RayPoint};

/// Transform one assigned localisation.
pub fn to_ray_point(
    optics: &Optics,
    mla: &MicroLensArray,
    assigned: &AssignedLocalisation,
) -> RayPoint {
    let centre = mla.lenses()[assigned.lens].centre;
    RayPoint {
        lens: assigned.lens,
        x: centre.x * optics.pixel_size_sample_um,
        y: centre.y * optics.pixel_size_sample_um,
        u: assigned.offset.x * optics.ray_slope_per_px,
        v: assigned.offset.y * optics.ray_slope_per_px,
    }
}

/// Transform a whole frame, preserving input order.
pub fn transform_frame(
    optics: &Optics,
    mla: &MicroLensArray,
    assigned: &[AssignedLocalisation],
) -> Vec<RayPoint> {
    assigned
        .iter()
        .map(|a| to_ray_point(optics, mla, a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mla::{LatticeType, MlaParams};
    use crate::optics::OpticsParams;
    use crate::types::Localisation2D;
    use nalgebra::Vector2;

    fn setup() -> (Optics, MicroLensArray) {
        let optics = Optics::new(&OpticsParams::default()).unwrap();
        let mla = MicroLensArray::new(&MlaParams {
            lattice: LatticeType::Square,
            pitch_px: 40.0,
            span_px: 160.0,
            centre_px: [0.0, 0.0],
            rotation_deg: 0.0,
            offset_px: [0.0, 0.0],
        })
        .unwrap();
        (optics, mla)
    }

    #[test]
    fn zero_offset_maps_to_zero_angle() {
        let (optics, mla) = setup();
        let lens = mla.nearest_lens(Vector2::new(40.0, 40.0), 1.0).unwrap();
        let assigned = AssignedLocalisation {
            loc: Localisation2D::new(0, 40.0, 40.0),
            lens: lens.index,
            offset: Vector2::zeros(),
        };
        let ray = to_ray_point(&optics, &mla, &assigned);
        assert_eq!(ray.u, 0.0);
        assert_eq!(ray.v, 0.0);
        assert!((ray.x - 40.0 * optics.pixel_size_sample_um).abs() < 1e-12);
    }

    #[test]
    fn same_offset_through_different_lenses_differs() {
        let (optics, mla) = setup();
        let offset = Vector2::new(3.0, -2.0);
        let a = |x: f64| AssignedLocalisation {
            loc: Localisation2D::new(0, x + 3.0, -2.0),
            lens: mla.nearest_lens(Vector2::new(x, 0.0), 1.0).unwrap().index,
            offset,
        };
        let r0 = to_ray_point(&optics, &mla, &a(0.0));
        let r1 = to_ray_point(&optics, &mla, &a(40.0));
        assert_eq!(r0.u, r1.u);
        assert_eq!(r0.v, r1.v);
        assert_ne!(r0.x, r1.x);
    }
}
