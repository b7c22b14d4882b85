//! Parallax least-squares fitting of correspondence groups.
//!
//! Each ray asserts that the emitter sits on the line `(x + z*u, y + z*v)`.
//! Minimising the summed squared lateral distance over all rays in a group
//! is linear in `(x0, y0, z)`, so the fit is a 3x3 normal-equation solve.
//! One round of outlier rejection follows: residual distances are compared
//! against a robust scale estimate, flagged rays are dropped, and the
//! survivors are re-fitted once.

use crate::diagnostics::RejectReason;
use crate::error::{ensure_positive, ConfigError};
use crate::types::{CorrespondenceGroup, Localisation3D, RayPoint};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Below this total angular spread the rays are treated as parallel and
/// the depth is unobservable.
const SPREAD_EPS: f64 = 1e-12;

/// Converts the median of Rayleigh-distributed distances to a sigma
/// estimate (1 / sqrt(2 ln 2)).
const MEDIAN_TO_SIGMA: f64 = 0.849_321_8;

/// Floor on the robust scale so noise-free groups keep all their rays.
const SCALE_FLOOR: f64 = 1e-9;

/// Parameters of the fitting stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FitParams {
    /// Residuals beyond this many robust sigmas are outliers.
    pub outlier_sigma: f64,
    /// Minimum surviving rays for a re-fit after outlier removal.
    pub min_rays_after: usize,
    /// Fitted depths below this bound are rejected (microns).
    pub z_accept_min_um: f64,
    /// Fitted depths above this bound are rejected (microns).
    pub z_accept_max_um: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            outlier_sigma: 3.0,
            min_rays_after: 3,
            z_accept_min_um: -8.0,
            z_accept_max_um: 8.0,
        }
    }
}

impl FitParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("fit.outlier_sigma", self.outlier_sigma)?;
        if self.min_rays_after < 2 {
            return Err(ConfigError::BelowMinimum {
                name: "fit.min_rays_after",
                min: 2,
                value: self.min_rays_after,
            });
        }
        if self.z_accept_min_um >= self.z_accept_max_um {
            return Err(ConfigError::EmptyRange {
                name: "fit.z_accept",
                min: self.z_accept_min_um,
                max: self.z_accept_max_um,
            });
        }
        Ok(())
    }
}

struct Solution {
    /// `(x0, y0, z)` in sample-space microns.
    beta: Vector3<f64>,
    /// Per-ray lateral distance from the fitted point (microns).
    residuals: Vec<f64>,
    rms: f64,
}

/// Solve the normal equations for one set of rays.
///
/// Returns `None` when the angular spread is too small to constrain depth
/// or the normal matrix is not invertible.
fn solve(rays: &[RayPoint]) -> Option<Solution> {
    let n = rays.len() as f64;
    let (mut su, mut sv, mut suu, mut svv) = (0.0, 0.0, 0.0, 0.0);
    let (mut sx, mut sy, mut suxvy) = (0.0, 0.0, 0.0);
    for r in rays {
        su += r.u;
        sv += r.v;
        suu += r.u * r.u;
        svv += r.v * r.v;
        sx += r.x;
        sy += r.y;
        suxvy += r.u * r.x + r.v * r.y;
    }

    let spread = (suu - su * su / n) + (svv - sv * sv / n);
    if spread < SPREAD_EPS {
        return None;
    }

    let m = Matrix3::new(n, 0.0, -su, 0.0, n, -sv, -su, -sv, suu + svv);
    let b = Vector3::new(sx, sy, -suxvy);
    let beta = m.try_inverse()? * b;

    let residuals: Vec<f64> = rays
        .iter()
        .map(|r| (r.project(beta.z) - beta.xy()).norm())
        .collect();
    let rms = (residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt();

    Some(Solution {
        beta,
        residuals,
        rms,
    })
}

fn robust_scale(residuals: &[f64]) -> f64 {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    };
    (median * MEDIAN_TO_SIGMA).max(SCALE_FLOOR)
}

/// Fit one correspondence group to a 3D localisation.
pub fn fit_group(
    frame: u32,
    group: &CorrespondenceGroup,
    params: &FitParams,
) -> Result<Localisation3D, RejectReason> {
    if group.rays.len() < params.min_rays_after {
        return Err(RejectReason::BelowMinRays);
    }
    let first = solve(&group.rays).ok_or(RejectReason::SingularFit)?;

    let threshold = params.outlier_sigma * robust_scale(&first.residuals);
    let survivors: Vec<RayPoint> = group
        .rays
        .iter()
        .zip(&first.residuals)
        .filter(|(_, &r)| r <= threshold)
        .map(|(ray, _)| ray.clone())
        .collect();

    let (beta, rms, used) = if survivors.len() < group.rays.len() {
        if survivors.len() < params.min_rays_after {
            return Err(RejectReason::BelowMinRays);
        }
        let refit = solve(&survivors).ok_or(RejectReason::SingularFit)?;
        (refit.beta, refit.rms, survivors.len())
    } else {
        (first.beta, first.rms, group.rays.len())
    };

    if beta.z < params.z_accept_min_um || beta.z > params.z_accept_max_um {
        return Err(RejectReason::DepthOutOfRange);
    }

    Ok(Localisation3D {
        frame,
        x: beta.x,
        y: beta.y,
        z: beta.z,
        residual: rms,
        rays: used,
    })
}
