//! Data model shared across the pipeline stages.

use crate::diagnostics::{FrameStats, GroupRejection, RunSummary};
use crate::params::ReconParams;
use nalgebra::Vector2;
use serde::Serialize;

/// Single 2D localisation produced by an upstream peak fitter.
///
/// Positions are in sensor pixels. Intensity and precision are carried
/// through untouched when the peak fitter provides them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Localisation2D {
    pub frame: u32,
    pub x: f64,
    pub y: f64,
    /// Photon count, if reported.
    pub intensity: Option<f64>,
    /// Localisation precision in sensor pixels, if reported.
    pub precision: Option<f64>,
}

impl Localisation2D {
    pub fn new(frame: u32, x: f64, y: f64) -> Self {
        Self {
            frame,
            x,
            y,
            intensity: None,
            precision: None,
        }
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// A localisation bound to the micro-lens it was imaged through.
///
/// The offset is signed, from the lens centre, in sensor pixels; its
/// magnitude never exceeds the assignment radius.
#[derive(Clone, Debug)]
pub struct AssignedLocalisation {
    pub loc: Localisation2D,
    pub lens: usize,
    pub offset: Vector2<f64>,
}

/// Ray-space sample `(x, y, u, v)`.
///
/// `(x, y)` is the ray's base point: the lens centre mapped to sample-space
/// microns. `(u, v)` is the dimensionless ray slope derived from the sensor
/// offset within the lens. The ray passes through `(x + z*u, y + z*v)` at
/// depth `z`; that parallax relation drives both grouping and fitting.
#[derive(Clone, Debug, PartialEq)]
pub struct RayPoint {
    pub lens: usize,
    pub x: f64,
    pub y: f64,
    pub u: f64,
    pub v: f64,
}

impl RayPoint {
    /// Lateral position of the ray at trial depth `z` (microns).
    pub fn project(&self, z: f64) -> Vector2<f64> {
        Vector2::new(self.x + z * self.u, self.y + z * self.v)
    }
}

/// Rays hypothesised to image one emitter in one frame.
///
/// At most one ray per micro-lens, ordered by lens index. Lives only for
/// one frame's processing and is consumed by the fitting stage.
#[derive(Clone, Debug)]
pub struct CorrespondenceGroup {
    /// Trial depth at which the members clustered.
    pub trial_z: f64,
    pub rays: Vec<RayPoint>,
}

/// Terminal output entity: one fitted emitter in one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Localisation3D {
    pub frame: u32,
    /// Fitted position in sample-space microns.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// RMS reprojection residual over surviving rays (microns).
    pub residual: f64,
    /// Rays contributing after outlier rejection.
    pub rays: usize,
}

/// Everything one invocation produced: the ordered 3D localisations,
/// per-frame statistics, rejection diagnostics and the configuration
/// snapshot the run used.
#[derive(Clone, Debug, Serialize)]
pub struct ReconstructionRun {
    pub params: ReconParams,
    /// Fitted points ordered by frame index.
    pub points: Vec<Localisation3D>,
    pub frame_stats: Vec<FrameStats>,
    pub rejections: Vec<GroupRejection>,
    pub summary: RunSummary,
}
