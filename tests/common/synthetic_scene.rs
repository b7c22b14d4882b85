use lightfield_recon::prelude::*;

/// Lens centres of the test grid that participate in the scenes (sensor
/// pixels). The configured grid is 5x5; emitters here are placed so only
/// these four lenses see them within the assignment radius.
pub const SCENE_LENSES: [(f64, f64); 4] = [(0.0, 0.0), (40.0, 0.0), (0.0, 40.0), (40.0, 40.0)];

/// Unit-optics configuration: magnification 1, so one sensor pixel is one
/// sample-space micron and one pixel of lens offset is one unit of ray
/// slope. Keeps expected values in the scenes exact.
pub fn unit_params() -> ReconParams {
    ReconParams {
        mla: MlaParams {
            lattice: LatticeType::Square,
            pitch_px: 40.0,
            span_px: 160.0,
            centre_px: [0.0, 0.0],
            rotation_deg: 0.0,
            offset_px: [0.0, 0.0],
        },
        optics: OpticsParams {
            focal_obj_mm: 200.0,
            focal_tube_mm: 200.0,
            focal_mla_mm: 0.001,
            focal_fourier_mm: 0.001,
            pixel_size_um: 1.0,
            ..OpticsParams::default()
        },
        assign: AssignParams { radius_px: 25.0 },
        progress_interval: 1,
        ..ReconParams::default()
    }
}

/// Perfect sensor localisations of one emitter `(x, y, z)` in sample-space
/// microns, one per scene lens. Requires `z != 0`.
pub fn emitter_locs(frame: u32, emitter: (f64, f64, f64)) -> Vec<Localisation2D> {
    let (ex, ey, ez) = emitter;
    assert!(ez != 0.0, "emitter in the focal plane has no parallax");
    SCENE_LENSES
        .iter()
        .map(|&(lx, ly)| Localisation2D::new(frame, lx + (ex - lx) / ez, ly + (ey - ly) / ez))
        .collect()
}
