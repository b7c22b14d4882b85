//! Correspondence grouping by depth sweep.
//!
//! For each trial depth in the configured range, every unclaimed ray is
//! reprojected to object space through the parallax relation and clustered
//! against running centroids. Clusters that gather at least `min_rays`
//! members (at most one per micro-lens) are accepted as correspondence
//! groups at that depth and their rays are claimed; smaller clusters
//! dissolve and their rays retry at later trial depths.
//!
//! Determinism: rays are visited in (lens index, input order) and trial
//! depths in ascending order, so identical input and configuration yield
//! bit-identical group membership. Ties between candidate clusters go to
//! the closer centroid, then to the cluster whose lowest lens index is
//! smaller.

use crate::error::{ensure_positive, ConfigError};
use crate::types::{CorrespondenceGroup, RayPoint};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Parameters of the depth-sweep grouping stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingParams {
    /// Lower bound of the depth search (microns).
    pub z_min_um: f64,
    /// Upper bound of the depth search (microns).
    pub z_max_um: f64,
    /// Trial depth step (microns).
    pub z_step_um: f64,
    /// Maximum distance from a cluster centroid for a reprojected ray to
    /// join it (microns).
    pub tolerance_um: f64,
    /// Minimum rays from distinct lenses for a cluster to become a group.
    pub min_rays: usize,
}

impl Default for GroupingParams {
    fn default() -> Self {
        Self {
            z_min_um: -8.0,
            z_max_um: 8.0,
            z_step_um: 0.1,
            tolerance_um: 0.5,
            min_rays: 3,
        }
    }
}

impl GroupingParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("grouping.z_step_um", self.z_step_um)?;
        ensure_positive("grouping.tolerance_um", self.tolerance_um)?;
        if self.z_min_um >= self.z_max_um {
            return Err(ConfigError::EmptyRange {
                name: "grouping.z",
                min: self.z_min_um,
                max: self.z_max_um,
            });
        }
        if self.min_rays < 2 {
            return Err(ConfigError::BelowMinimum {
                name: "grouping.min_rays",
                min: 2,
                value: self.min_rays,
            });
        }
        Ok(())
    }
}

struct Cluster {
    sum: Vector2<f64>,
    /// Ray indices, ascending by lens (visit order guarantees it).
    members: Vec<usize>,
}

impl Cluster {
    fn centroid(&self) -> Vector2<f64> {
        self.sum / self.members.len() as f64
    }

    fn min_lens(&self, rays: &[RayPoint]) -> usize {
        rays[self.members[0]].lens
    }

    fn contains_lens(&self, rays: &[RayPoint], lens: usize) -> bool {
        self.members.iter().any(|&m| rays[m].lens == lens)
    }
}

/// Group one frame's rays into correspondence candidates.
pub fn group_frame(rays: &[RayPoint], params: &GroupingParams) -> Vec<CorrespondenceGroup> {
    let mut order: Vec<usize> = (0..rays.len()).collect();
    order.sort_by_key(|&i| (rays[i].lens, i));

    let mut claimed = vec![false; rays.len()];
    let mut groups = Vec::new();

    let span = params.z_max_um - params.z_min_um;
    let steps = (span / params.z_step_um + 1e-9).floor() as usize;
    for step in 0..=steps {
        let z = params.z_min_um + step as f64 * params.z_step_um;
        let mut clusters: Vec<Cluster> = Vec::new();

        for &i in &order {
            if claimed[i] {
                continue;
            }
            let p = rays[i].project(z);
            // (cluster index, centroid distance, cluster's lowest lens)
            let mut best: Option<(usize, f64, usize)> = None;
            for (ci, cluster) in clusters.iter().enumerate() {
                if cluster.contains_lens(rays, rays[i].lens) {
                    continue;
                }
                let d = (p - cluster.centroid()).norm();
                if d > params.tolerance_um {
                    continue;
                }
                let lens0 = cluster.min_lens(rays);
                let better = match best {
                    None => true,
                    Some((_, bd, bl)) => d < bd || (d == bd && lens0 < bl),
                };
                if better {
                    best = Some((ci, d, lens0));
                }
            }
            match best {
                Some((ci, _, _)) => {
                    clusters[ci].sum += p;
                    clusters[ci].members.push(i);
                }
                None => clusters.push(Cluster {
                    sum: p,
                    members: vec![i],
                }),
            }
        }

        for cluster in &clusters {
            if cluster.members.len() < params.min_rays {
                continue;
            }
            for &m in &cluster.members {
                claimed[m] = true;
            }
            groups.push(CorrespondenceGroup {
                trial_z: z,
                rays: cluster.members.iter().map(|&m| rays[m].clone()).collect(),
            });
        }
    }

    groups
}
