//! Analysis of paired Sanger electropherograms: how much did a gene-editing
//! event change each base at a target site, and where else in the reference
//! could the editing reagent plausibly bind?
//!
//! The pipeline normalizes both traces against local signal, dynamically
//! re-aligns them, computes an accentuated per-channel difference sequence,
//! then scores per-base mutation frequencies at the located target site and
//! at PAM-adjacent off-target candidates.

pub mod align;
pub mod analysis;
pub mod diff;
pub mod error;
pub mod file_io;
pub mod mutation;
pub mod normalize;
pub mod offtarget;
pub mod target;
pub mod trace;

pub use analysis::{run_analysis, Analysis, AnalysisReport, RegionScores};
pub use error::TraceError;
pub use target::TargetSpec;
pub use trace::{Channel, TraceData};
