#![doc = include_str!("../README.md")]

pub mod assign;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fitting;
pub mod frames;
pub mod grouping;
pub mod mla;
pub mod optics;
pub mod params;
pub mod rayspace;
pub mod types;

pub use config::load_params;
pub use error::ConfigError;
pub use frames::{ProgressFn, Reconstructor};
pub use params::ReconParams;
pub use types::{Localisation2D, Localisation3D, ReconstructionRun};

/// One-stop imports for typical callers.
pub mod prelude {
    pub use crate::assign::AssignParams;
    pub use crate::diagnostics::{AlignmentPreview, FrameStats, RejectReason, RunSummary};
    pub use crate::error::ConfigError;
    pub use crate::fitting::FitParams;
    pub use crate::frames::Reconstructor;
    pub use crate::grouping::GroupingParams;
    pub use crate::mla::{LatticeType, MlaParams};
    pub use crate::optics::OpticsParams;
    pub use crate::params::ReconParams;
    pub use crate::types::{Localisation2D, Localisation3D, ReconstructionRun};
}
