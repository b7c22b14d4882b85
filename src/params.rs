//! Top-level configuration for a reconstruction run.

use crate::assign::AssignParams;
use crate::error::ConfigError;
use crate::fitting::FitParams;
use crate::grouping::GroupingParams;
use crate::mla::MlaParams;
use crate::optics::OpticsParams;
use serde::{Deserialize, Serialize};

/// All knobs of the pipeline, grouped per stage.
///
/// `Default` reproduces the reference instrument; deserialize from JSON to
/// override any subset of fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconParams {
    pub mla: MlaParams,
    pub optics: OpticsParams,
    pub assign: AssignParams,
    pub grouping: GroupingParams,
    pub fit: FitParams,
    /// Progress callback cadence, in processed frames.
    pub progress_interval: usize,
}

impl Default for ReconParams {
    fn default() -> Self {
        Self {
            mla: MlaParams::default(),
            optics: OpticsParams::default(),
            assign: AssignParams::default(),
            grouping: GroupingParams::default(),
            fit: FitParams::default(),
            progress_interval: 1000,
        }
    }
}

impl ReconParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mla.validate()?;
        self.optics.validate()?;
        self.assign.validate()?;
        self.grouping.validate()?;
        self.fit.validate()?;
        if self.progress_interval < 1 {
            return Err(ConfigError::BelowMinimum {
                name: "progress_interval",
                min: 1,
                value: self.progress_interval,
            });
        }
        Ok(())
    }
}
