//! Run and per-frame diagnostics.
//!
//! Every struct here is `Serialize` so callers can dump reports next to the
//! reconstruction output. Rejections are expected outcomes, not failures:
//! they are counted, attributed to a reason, and never abort the run.

use serde::Serialize;

/// Why a correspondence group was rejected instead of fitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Outlier removal (or the group itself) left fewer rays than allowed.
    BelowMinRays,
    /// Normal equations were singular or the rays were nearly parallel.
    SingularFit,
    /// The fitted depth fell outside the plausible range.
    DepthOutOfRange,
}

/// Diagnostic record for one rejected group.
#[derive(Clone, Debug, Serialize)]
pub struct GroupRejection {
    pub frame: u32,
    /// Trial depth the group clustered at.
    pub trial_z: f64,
    /// Rays in the group before any removal.
    pub ray_count: usize,
    pub reason: RejectReason,
}

/// Counters for one frame's pass through the pipeline.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FrameStats {
    pub frame: u32,
    /// Localisations entering the frame.
    pub locs_in: usize,
    /// Localisations assigned to a lens within the radius.
    pub assigned: usize,
    /// Localisations with no lens within the radius (dropped).
    pub unassigned: usize,
    /// Correspondence groups formed by the depth sweep.
    pub groups_formed: usize,
    /// Groups that survived fitting.
    pub groups_accepted: usize,
    /// Groups rejected by fitting (see [`GroupRejection`]).
    pub groups_rejected: usize,
}

/// Whole-run totals.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub frames: usize,
    pub locs_in: usize,
    pub assigned: usize,
    pub unassigned: usize,
    pub groups_formed: usize,
    pub groups_accepted: usize,
    pub groups_rejected: usize,
    /// 3D localisations produced.
    pub points: usize,
    pub elapsed_ms: f64,
}

impl RunSummary {
    pub(crate) fn add_frame(&mut self, stats: &FrameStats) {
        self.frames += 1;
        self.locs_in += stats.locs_in;
        self.assigned += stats.assigned;
        self.unassigned += stats.unassigned;
        self.groups_formed += stats.groups_formed;
        self.groups_accepted += stats.groups_accepted;
        self.groups_rejected += stats.groups_rejected;
    }
}

/// One assigned localisation in the alignment preview.
#[derive(Clone, Debug, Serialize)]
pub struct PreviewPoint {
    pub x: f64,
    pub y: f64,
    pub lens: usize,
}

/// Artifact for the caller's alignment check: lens centres plus the
/// would-be assignments, all in sensor pixels. The core emits this and
/// waits for no one; whether to proceed is the caller's decision.
#[derive(Clone, Debug, Serialize)]
pub struct AlignmentPreview {
    pub lens_centres: Vec<[f64; 2]>,
    pub assigned: Vec<PreviewPoint>,
    pub unassigned: Vec<[f64; 2]>,
}
