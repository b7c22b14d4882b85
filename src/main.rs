use lightfield_recon::prelude::*;

fn main() {
    env_logger::init();

    // Demo stub: synthesises localisations for two emitters seen through a
    // small square lens grid with unit optics, then reconstructs them.
    let params = ReconParams {
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
        ..ReconParams::default()
    };

    let emitters = [(10.0, 5.0, 2.0), (-6.0, 8.0, -3.0)];
    let lenses = [(0.0, 0.0), (40.0, 0.0), (0.0, 40.0), (40.0, 40.0)];
    let mut locs = Vec::new();
    for &(ex, ey, ez) in &emitters {
        for &(lx, ly) in &lenses {
            locs.push(Localisation2D::new(
                0,
                lx + (ex - lx) / ez,
                ly + (ey - ly) / ez,
            ));
        }
    }

    let recon = match Reconstructor::new(params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("bad configuration: {e}");
            std::process::exit(1);
        }
    };
    let run = recon.reconstruct(&locs, None);
    println!(
        "frames={} points={} rejected={} elapsed_ms={:.3}",
        run.summary.frames, run.summary.points, run.summary.groups_rejected, run.summary.elapsed_ms
    );
    for p in &run.points {
        println!(
            "frame {} -> ({:.3}, {:.3}, {:.3}) um, {} rays, rms {:.2e}",
            p.frame, p.x, p.y, p.z, p.rays, p.residual
        );
    }
}
