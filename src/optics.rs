//! Optical model of the Fourier light-field microscope.
//!
//! Derives the quantities the ray-space transform needs (overall
//! magnification, back-focal-plane radius, sample-space pixel size, ray
//! slope per sensor pixel) from the raw instrument parameters. All lengths
//! and indices are validated up front; nothing here can fail per point.

use crate::error::{ensure_positive, ConfigError};
use serde::{Deserialize, Serialize};

/// Raw optical parameters of the instrument.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticsParams {
    /// Numerical aperture of the objective.
    pub num_aperture: f64,
    /// Micro-lens pitch (microns).
    pub lens_pitch_um: f64,
    /// Focal length of the micro-lens array (mm).
    pub focal_mla_mm: f64,
    /// Focal length of the objective lens (mm).
    pub focal_obj_mm: f64,
    /// Focal length of the tube lens (mm).
    pub focal_tube_mm: f64,
    /// Focal length of the Fourier lens (mm).
    pub focal_fourier_mm: f64,
    /// Camera pixel size (microns).
    pub pixel_size_um: f64,
    /// Immersion refractive index.
    pub ref_idx_immersion: f64,
    /// Specimen/medium refractive index.
    pub ref_idx_medium: f64,
}

impl Default for OpticsParams {
    fn default() -> Self {
        Self {
            num_aperture: 1.27,
            lens_pitch_um: 2390.0,
            focal_mla_mm: 175.0,
            focal_obj_mm: 200.0 / 60.0,
            focal_tube_mm: 200.0,
            focal_fourier_mm: 175.0,
            pixel_size_um: 16.0,
            ref_idx_immersion: 1.33,
            ref_idx_medium: 1.33,
        }
    }
}

impl OpticsParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("optics.num_aperture", self.num_aperture)?;
        ensure_positive("optics.lens_pitch_um", self.lens_pitch_um)?;
        ensure_positive("optics.focal_mla_mm", self.focal_mla_mm)?;
        ensure_positive("optics.focal_obj_mm", self.focal_obj_mm)?;
        ensure_positive("optics.focal_tube_mm", self.focal_tube_mm)?;
        ensure_positive("optics.focal_fourier_mm", self.focal_fourier_mm)?;
        ensure_positive("optics.pixel_size_um", self.pixel_size_um)?;
        ensure_positive("optics.ref_idx_immersion", self.ref_idx_immersion)?;
        ensure_positive("optics.ref_idx_medium", self.ref_idx_medium)?;
        Ok(())
    }
}

/// Validated optics with the derived quantities used by the pipeline.
#[derive(Clone, Debug)]
pub struct Optics {
    params: OpticsParams,
    /// Overall magnification from sample to camera plane.
    pub magnification: f64,
    /// Radius of the conjugate back focal plane (microns).
    pub bfp_radius_um: f64,
    /// Number of micro-lenses across the conjugate back focal plane.
    pub bfp_lens_count: f64,
    /// Camera pixels per micro-lens pitch.
    pub pixels_per_lens: f64,
    /// Pixel size in sample space (microns).
    pub pixel_size_sample_um: f64,
    /// Object-space ray slope per sensor pixel of lens-centre offset.
    pub ray_slope_per_px: f64,
}

impl Optics {
    pub fn new(params: &OpticsParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let magnification = (params.focal_tube_mm / params.focal_obj_mm)
            * (params.focal_mla_mm / params.focal_fourier_mm);
        let bfp_radius_um = 1000.0
            * params.num_aperture
            * params.focal_obj_mm
            * (params.focal_fourier_mm / params.focal_tube_mm);
        Ok(Self {
            params: params.clone(),
            magnification,
            bfp_radius_um,
            bfp_lens_count: 2.0 * bfp_radius_um / params.lens_pitch_um,
            pixels_per_lens: params.lens_pitch_um / params.pixel_size_um,
            pixel_size_sample_um: params.pixel_size_um / magnification,
            ray_slope_per_px: params.pixel_size_um * magnification
                / (params.focal_mla_mm * 1000.0),
        })
    }

    pub fn params(&self) -> &OpticsParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_quantities_from_defaults() {
        let optics = Optics::new(&OpticsParams::default()).unwrap();
        assert!((optics.magnification - 60.0).abs() < 1e-9);
        assert!((optics.pixel_size_sample_um - 16.0 / 60.0).abs() < 1e-12);
        // bfp = 1000 * 1.27 * (200/60) * (175/200)
        assert!((optics.bfp_radius_um - 1000.0 * 1.27 * (200.0 / 60.0) * 0.875).abs() < 1e-6);
        assert!((optics.pixels_per_lens - 2390.0 / 16.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_focal_length() {
        let params = OpticsParams {
            focal_mla_mm: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            Optics::new(&params),
            Err(ConfigError::NonPositive { name, .. }) if name == "optics.focal_mla_mm"
        ));
    }
}
