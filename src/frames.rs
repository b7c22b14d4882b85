//! Frame orchestration: partition localisations, run the per-frame
//! pipeline in parallel, assemble the run output.
//!
//! Frames are independent, so they are dispatched to a rayon pool; results
//! are collected positionally, which keeps the output ordered by frame
//! index no matter how the pool schedules the work. The optional progress
//! callback is invoked from worker threads and must be `Sync`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use crate::assign::{assign_frame, assign_localisation};
use crate::diagnostics::{AlignmentPreview, FrameStats, GroupRejection, PreviewPoint, RunSummary};
use crate::error::ConfigError;
use crate::fitting::fit_group;
use crate::grouping::group_frame;
use crate::mla::MicroLensArray;
use crate::optics::Optics;
use crate::params::ReconParams;
use crate::rayspace::transform_frame;
use crate::types::{Localisation2D, Localisation3D, ReconstructionRun};

/// Progress callback: `(frames done, frames total)`.
pub type ProgressFn<'a> = dyn Fn(usize, usize) + Sync + 'a;

/// The pipeline, configured once and reusable across acquisitions.
pub struct Reconstructor {
    params: ReconParams,
    mla: MicroLensArray,
    optics: Optics,
}

struct FrameOutput {
    stats: FrameStats,
    points: Vec<Localisation3D>,
    rejections: Vec<GroupRejection>,
}

impl Reconstructor {
    /// Validate the configuration and derive the lens grid and optics.
    pub fn new(params: ReconParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let mla = MicroLensArray::new(&params.mla)?;
        let optics = Optics::new(&params.optics)?;
        debug!(
            "reconstructor ready: {} lenses, magnification {:.3}",
            mla.lenses().len(),
            optics.magnification
        );
        Ok(Self {
            params,
            mla,
            optics,
        })
    }

    pub fn params(&self) -> &ReconParams {
        &self.params
    }

    pub fn mla(&self) -> &MicroLensArray {
        &self.mla
    }

    pub fn optics(&self) -> &Optics {
        &self.optics
    }

    /// Dry-run assignment over a sample of localisations, for checking the
    /// lens grid against the data before a full run.
    pub fn alignment_preview(&self, locs: &[Localisation2D]) -> AlignmentPreview {
        let lens_centres = self
            .mla
            .lenses()
            .iter()
            .map(|l| [l.centre.x, l.centre.y])
            .collect();
        let mut assigned = Vec::new();
        let mut unassigned = Vec::new();
        for loc in locs {
            match assign_localisation(&self.mla, loc, self.params.assign.radius_px) {
                Some(a) => assigned.push(PreviewPoint {
                    x: loc.x,
                    y: loc.y,
                    lens: a.lens,
                }),
                None => unassigned.push([loc.x, loc.y]),
            }
        }
        AlignmentPreview {
            lens_centres,
            assigned,
            unassigned,
        }
    }

    /// Run the full pipeline over a set of 2D localisations.
    ///
    /// Localisations are partitioned by frame index; frames run in
    /// parallel. Output points are ordered by frame, and within a frame by
    /// the deterministic order the depth sweep produced them in.
    pub fn reconstruct(
        &self,
        locs: &[Localisation2D],
        progress: Option<&ProgressFn<'_>>,
    ) -> ReconstructionRun {
        let started = Instant::now();

        let mut by_frame: BTreeMap<u32, Vec<Localisation2D>> = BTreeMap::new();
        for loc in locs {
            by_frame.entry(loc.frame).or_default().push(loc.clone());
        }
        let frames: Vec<(u32, Vec<Localisation2D>)> = by_frame.into_iter().collect();
        let total = frames.len();
        let done = AtomicUsize::new(0);

        let outputs: Vec<FrameOutput> = frames
            .par_iter()
            .map(|(frame, frame_locs)| {
                let out = self.process_frame(*frame, frame_locs);
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(cb) = progress {
                    if n % self.params.progress_interval == 0 || n == total {
                        cb(n, total);
                    }
                }
                out
            })
            .collect();

        let mut points = Vec::new();
        let mut frame_stats = Vec::with_capacity(outputs.len());
        let mut rejections = Vec::new();
        let mut summary = RunSummary::default();
        for out in outputs {
            summary.add_frame(&out.stats);
            points.extend(out.points);
            rejections.extend(out.rejections);
            frame_stats.push(out.stats);
        }
        summary.points = points.len();
        summary.elapsed_ms = started.elapsed().as_secs_f64() * 1e3;
        debug!(
            "run done: {} frames, {} points, {} rejections in {:.1} ms",
            summary.frames,
            summary.points,
            summary.groups_rejected,
            summary.elapsed_ms
        );

        ReconstructionRun {
            params: self.params.clone(),
            points,
            frame_stats,
            rejections,
            summary,
        }
    }

    fn process_frame(&self, frame: u32, locs: &[Localisation2D]) -> FrameOutput {
        let (assigned, unassigned) = assign_frame(&self.mla, locs, self.params.assign.radius_px);
        let rays = transform_frame(&self.optics, &self.mla, &assigned);
        let groups = group_frame(&rays, &self.params.grouping);

        let mut stats = FrameStats {
            frame,
            locs_in: locs.len(),
            assigned: assigned.len(),
            unassigned,
            groups_formed: groups.len(),
            ..FrameStats::default()
        };
        let mut points = Vec::new();
        let mut rejections = Vec::new();
        for group in &groups {
            match fit_group(frame, group, &self.params.fit) {
                Ok(point) => {
                    stats.groups_accepted += 1;
                    points.push(point);
                }
                Err(reason) => {
                    stats.groups_rejected += 1;
                    rejections.push(GroupRejection {
                        frame,
                        trial_z: group.trial_z,
                        ray_count: group.rays.len(),
                        reason,
                    });
                }
            }
        }
        debug!(
            "frame {frame}: {} locs, {} assigned, {} groups, {} points",
            locs.len(),
            assigned.len(),
            groups.len(),
            points.len()
        );

        FrameOutput {
            stats,
            points,
            rejections,
        }
    }
}
