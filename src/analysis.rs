//! One full analysis run: normalize, align, difference, then score the
//! primary target site and every retained off-target candidate.

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    align,
    diff::{self, TraceDiffs},
    error::TraceError,
    mutation::MutationScorer,
    normalize, offtarget,
    target::TargetSpec,
    trace::TraceData,
};

/// Scores for one region: the primary target, or one off-target candidate.
#[derive(Clone, Debug, Serialize)]
pub struct RegionScores {
    pub label: String,
    /// Off-target anchor under the signed strand convention; `None` for the
    /// primary site, which is located by sequence alignment instead.
    pub position: Option<isize>,
    /// Normalized mismatch binding energy; `None` for the primary site.
    pub binding_score: Option<f64>,
    /// One mutation frequency per configured target base offset.
    pub frequencies: Vec<f64>,
}

/// The tabular half of a run's output: one row per scored region, the
/// primary target first, then candidates in rank order.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisReport {
    /// Common aligned length of the two traces, in samples.
    pub align_length: usize,
    pub regions: Vec<RegionScores>,
}

/// Everything a caller (tabular export, plotting) needs from one run.
#[derive(Clone, Debug, Serialize)]
pub struct Analysis {
    pub diffs: TraceDiffs,
    pub report: AnalysisReport,
}

/// Run the whole pipeline on one reference/edited trace pair.
pub fn run_analysis(
    mut reference: TraceData,
    mut test: TraceData,
    target: &TargetSpec,
) -> Result<Analysis, TraceError> {
    info!(
        "normalizing traces ({} / {} samples)",
        reference.seq_length, test.seq_length
    );
    normalize::normalize(&mut reference)?;
    normalize::normalize(&mut test)?;

    info!("aligning traces");
    align::align(&mut reference, &mut test);

    let diffs = diff::differences(&reference, &test);
    debug!("difference sequence over {} samples", diffs.len);

    let candidates = offtarget::find_candidates(&reference, target);
    let scorer = MutationScorer::new(&reference, &diffs, target);

    let mut regions = vec![RegionScores {
        label: "target".to_owned(),
        position: None,
        binding_score: None,
        frequencies: scorer.score(None)?,
    }];

    for (rank, candidate) in candidates.iter().enumerate() {
        let frequencies = match scorer.score(Some(candidate.position)) {
            Ok(freqs) => freqs,
            // An anchor the coordinate conventions can't address; skip the
            // row rather than aborting the run.
            Err(TraceError::AnchorOutOfRange(pos)) => {
                warn!("skipping off-target candidate at {pos}: anchor not addressable");
                continue;
            }
            Err(e) => return Err(e),
        };

        regions.push(RegionScores {
            label: format!("off-target {}", rank + 1),
            position: Some(candidate.position),
            binding_score: Some(candidate.score),
            frequencies,
        });
    }

    Ok(Analysis {
        report: AnalysisReport {
            align_length: diffs.len,
            regions,
        },
        diffs,
    })
}
