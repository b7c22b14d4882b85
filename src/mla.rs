//! Micro-lens array model.
//!
//! Builds the set of lens centres from a configured lattice (square or
//! hexagonal), pitch and sensor placement, and answers nearest-lens queries
//! for the assignment stage.
//!
//! The hexagonal lattice uses two basis vectors at 60°, so nearest-lens
//! lookup cannot round to a square grid; the query searches the actual
//! generated centres, which is exact for both lattice types. Arrays are a
//! few hundred lenses at most, so a linear scan is cheap compared to the
//! per-frame work downstream.

use crate::error::{ensure_positive, ConfigError};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Lens arrangement of the array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatticeType {
    Square,
    Hexagonal,
}

/// Layout of the micro-lens array on the image sensor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MlaParams {
    /// Lens arrangement.
    pub lattice: LatticeType,
    /// Lens pitch in sensor pixels.
    pub pitch_px: f64,
    /// Extent of the optic on the sensor in pixels; controls how many
    /// lenses are generated around the centre.
    pub span_px: f64,
    /// Array centre in sensor pixels.
    pub centre_px: [f64; 2],
    /// Rotation applied to match the orientation of the data (degrees).
    pub rotation_deg: f64,
    /// Translation applied after rotation, in sensor pixels.
    pub offset_px: [f64; 2],
}

impl Default for MlaParams {
    fn default() -> Self {
        Self {
            lattice: LatticeType::Hexagonal,
            pitch_px: 149.375,
            span_px: 625.0,
            centre_px: [0.0, 0.0],
            rotation_deg: 30.8,
            offset_px: [0.0, 0.0],
        }
    }
}

impl MlaParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("mla.pitch_px", self.pitch_px)?;
        ensure_positive("mla.span_px", self.span_px)?;
        Ok(())
    }
}

/// One micro-lens: identity index plus centre in sensor pixels.
///
/// Immutable once the array is constructed.
#[derive(Clone, Debug)]
pub struct MicroLens {
    pub index: usize,
    pub centre: Vector2<f64>,
}

/// The full lens lattice with its nearest-lens query.
#[derive(Clone, Debug)]
pub struct MicroLensArray {
    lenses: Vec<MicroLens>,
    centre: Vector2<f64>,
}

impl MicroLensArray {
    /// Generate the lattice from configuration, applying the configured
    /// rotation and offset.
    pub fn new(params: &MlaParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let centre = Vector2::new(params.centre_px[0], params.centre_px[1]);
        let unit = match params.lattice {
            LatticeType::Square => square_lattice(params.span_px / params.pitch_px),
            LatticeType::Hexagonal => hexagonal_lattice(params.span_px / params.pitch_px),
        };
        let lenses = unit
            .into_iter()
            .enumerate()
            .map(|(index, p)| MicroLens {
                index,
                centre: centre + p * params.pitch_px,
            })
            .collect();

        let mut mla = Self { lenses, centre };
        mla.rotate(params.rotation_deg.to_radians());
        mla.offset(Vector2::new(params.offset_px[0], params.offset_px[1]));
        Ok(mla)
    }

    /// Lens centres, ordered by index.
    pub fn lenses(&self) -> &[MicroLens] {
        &self.lenses
    }

    /// Array centre in sensor pixels.
    pub fn centre(&self) -> Vector2<f64> {
        self.centre
    }

    /// Rotate all lens centres around the array centre by `theta` radians.
    pub fn rotate(&mut self, theta: f64) {
        let (sin, cos) = theta.sin_cos();
        for lens in &mut self.lenses {
            let p = lens.centre - self.centre;
            lens.centre = self.centre + Vector2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);
        }
    }

    /// Shift all lens centres by `dxy` sensor pixels.
    pub fn offset(&mut self, dxy: Vector2<f64>) {
        for lens in &mut self.lenses {
            lens.centre += dxy;
        }
    }

    /// Nearest lens to `p` under Euclidean distance, or `None` when the
    /// closest centre is further than `radius` pixels away.
    pub fn nearest_lens(&self, p: Vector2<f64>, radius: f64) -> Option<&MicroLens> {
        let mut best: Option<(&MicroLens, f64)> = None;
        for lens in &self.lenses {
            let d2 = (p - lens.centre).norm_squared();
            match best {
                Some((_, best_d2)) if best_d2 <= d2 => {}
                _ => best = Some((lens, d2)),
            }
        }
        best.and_then(|(lens, d2)| (d2 <= radius * radius).then_some(lens))
    }
}

/// Square grid with unit pitch. Generates a little more than `width` lenses
/// across so the lattice survives rotation cropping.
fn square_lattice(width: f64) -> Vec<Vector2<f64>> {
    let marks = lattice_marks(width);
    let mut out = Vec::with_capacity(marks.len() * marks.len());
    for &my in &marks {
        for &mx in &marks {
            out.push(Vector2::new(mx, my));
        }
    }
    out
}

/// Hexagonal grid with unit pitch between nearest neighbours: columns are
/// spaced by sqrt(3)/2 and alternate columns are staggered by half a pitch.
fn hexagonal_lattice(width: f64) -> Vec<Vector2<f64>> {
    let marks = lattice_marks(width);
    let mut out = Vec::with_capacity(marks.len() * marks.len());
    for (col, &mx) in marks.iter().enumerate() {
        let stagger = if col % 2 == 1 { 0.5 } else { 0.0 };
        for &my in &marks {
            out.push(Vector2::new(mx * 3.0f64.sqrt() / 2.0, my + stagger));
        }
    }
    out
}

fn lattice_marks(width: f64) -> Vec<f64> {
    let lo = -(width / 2.0).floor() as i64;
    let hi = (width / 2.0).ceil() as i64;
    (lo..=hi).map(|m| m as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_params(pitch: f64) -> MlaParams {
        MlaParams {
            lattice: LatticeType::Square,
            pitch_px: pitch,
            span_px: pitch * 4.0,
            centre_px: [0.0, 0.0],
            rotation_deg: 0.0,
            offset_px: [0.0, 0.0],
        }
    }

    #[test]
    fn rejects_non_positive_pitch() {
        let params = MlaParams {
            pitch_px: 0.0,
            ..square_params(10.0)
        };
        assert!(matches!(
            MicroLensArray::new(&params),
            Err(ConfigError::NonPositive { name, .. }) if name == "mla.pitch_px"
        ));
    }

    #[test]
    fn nearest_lens_on_square_grid() {
        let mla = MicroLensArray::new(&square_params(40.0)).unwrap();
        let lens = mla
            .nearest_lens(Vector2::new(38.0, 3.0), 20.0)
            .expect("point is close to the lens at (40, 0)");
        assert_eq!(lens.centre, Vector2::new(40.0, 0.0));
    }

    #[test]
    fn nearest_lens_outside_radius_is_none() {
        let mla = MicroLensArray::new(&square_params(40.0)).unwrap();
        // (20, 20) sits in the middle of four lenses, ~28.3 px from each.
        assert!(mla.nearest_lens(Vector2::new(20.0, 20.0), 20.0).is_none());
    }

    #[test]
    fn hexagonal_query_honours_staggered_columns() {
        let params = MlaParams {
            lattice: LatticeType::Hexagonal,
            pitch_px: 100.0,
            span_px: 400.0,
            centre_px: [0.0, 0.0],
            rotation_deg: 0.0,
            offset_px: [0.0, 0.0],
        };
        let mla = MicroLensArray::new(&params).unwrap();
        // A staggered-column lens sits at (sqrt(3)/2, 0.5) * pitch. Square
        // grid rounding of a probe near it would land on the unstaggered
        // neighbour instead.
        let staggered = Vector2::new(100.0 * 3.0f64.sqrt() / 2.0, 50.0);
        let lens = mla
            .nearest_lens(staggered + Vector2::new(4.0, -3.0), 60.0)
            .expect("probe is well inside the radius");
        assert!((lens.centre - staggered).norm() < 1e-9);
    }

    #[test]
    fn hexagonal_assignment_is_unique() {
        let params = MlaParams {
            lattice: LatticeType::Hexagonal,
            pitch_px: 100.0,
            span_px: 300.0,
            centre_px: [0.0, 0.0],
            rotation_deg: 0.0,
            offset_px: [0.0, 0.0],
        };
        let mla = MicroLensArray::new(&params).unwrap();
        // Every probe on a coarse grid maps to exactly one lens, and that
        // lens is the true argmin over all centres.
        for ix in -10..=10 {
            for iy in -10..=10 {
                let p = Vector2::new(ix as f64 * 13.0, iy as f64 * 13.0);
                if let Some(lens) = mla.nearest_lens(p, 55.0) {
                    let d = (p - lens.centre).norm();
                    assert!(d <= 55.0);
                    for other in mla.lenses() {
                        assert!((p - other.centre).norm() >= d - 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn rotation_preserves_distance_to_centre() {
        let mut mla = MicroLensArray::new(&square_params(40.0)).unwrap();
        let before: Vec<f64> = mla.lenses().iter().map(|l| l.centre.norm()).collect();
        mla.rotate(0.5);
        for (lens, r) in mla.lenses().iter().zip(before) {
            assert!((lens.centre.norm() - r).abs() < 1e-9);
        }
    }
}
