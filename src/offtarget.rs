//! Scanning the reference sequence for candidate off-target binding sites:
//! `NGG` PAM motifs on either strand, ranked by a position-weighted mismatch
//! energy model after the Salis lab's binding calculations (weights
//! calibrated by the 2017 UBC iGEM team).

use bio::alphabets::dna::revcomp;
use log::debug;
use serde::Serialize;

use crate::{target::TargetSpec, trace::TraceData};

/// Per-position mismatch penalties. The index is the distance from the PAM
/// (0 = adjacent); seed-region mismatches cost the most.
pub const POSITION_WEIGHTS: [f64; 21] = [
    0.554_111_551_727_719,
    0.999_999_999_999_958,
    0.999_859_588_152_223,
    0.999_997_460_325_925,
    0.414_113_900_546_951,
    0.999_495_056_671_895,
    0.022_020_895_941_012_1,
    0.589_953_049_071_977,
    0.324_385_855_364_402,
    2.262_019_598_205_39e-6,
    0.082_569_966_514_869_8,
    0.089_056_614_973_456_5,
    0.234_751_499_655_325,
    3.778_202_986_306_00e-14,
    0.214_631_126_793_305,
    7.045_741_420_034_94e-6,
    0.156_869_096_216_009,
    0.129_156_230_982_504,
    0.042_814_513_061_562_5,
    1.581_357_443_955_07e-5,
    0.100_000_000_000_000,
];

/// Retention bound: candidates above this normalized mismatch energy bind
/// too poorly to matter. A score of exactly 0 is the on-target site matching
/// itself and is dropped too.
const MAX_BINDING_SCORE: f64 = 0.6;

/// A candidate off-target site. Positive positions index the sense strand;
/// negative ones encode the same index into the reverse complement.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Candidate {
    pub score: f64,
    pub position: isize,
}

/// Scan both strands for PAM sites and rank how well the target matches
/// immediately upstream of each. Returns the retained candidates ascending
/// by score; equal scores are all kept, in scan order.
pub fn find_candidates(reference: &TraceData, target: &TargetSpec) -> Vec<Candidate> {
    let sense = reference.sequence.as_bytes();
    let antisense = revcomp(sense);
    let target_letters = target.letter_bytes();

    let mut candidates = Vec::new();
    for (strand, sign) in [(sense, 1isize), (antisense.as_slice(), -1isize)] {
        for start in pam_sites(strand) {
            let Some(score) = binding_score(strand, start, &target_letters) else {
                continue;
            };
            if retain(score) {
                candidates.push(Candidate {
                    score,
                    position: sign * start as isize,
                });
            }
        }
    }

    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
    debug!("{} off-target candidates retained", candidates.len());

    candidates
}

/// Start indices of `NGG` motifs. Matches don't overlap; the scan resumes
/// after each motif.
fn pam_sites(seq: &[u8]) -> Vec<usize> {
    let mut sites = Vec::new();

    let mut i = 0;
    while i + 3 <= seq.len() {
        if seq[i + 1] == b'G' && seq[i + 2] == b'G' {
            sites.push(i);
            i += 3;
        } else {
            i += 1;
        }
    }

    sites
}

/// Normalized mismatch energy for the target aligned to end at `start`, the
/// PAM immediately downstream. `None` when the site can't fit the target
/// upstream (which also covers antisense index 0, inexpressible under the
/// sign convention).
fn binding_score(strand: &[u8], start: usize, target: &[u8]) -> Option<f64> {
    // The weight table covers guides up to 20 nt.
    if start < target.len() || target.len() >= POSITION_WEIGHTS.len() {
        return None;
    }

    let norm: f64 = POSITION_WEIGHTS.iter().sum();
    let mut score = 0.;
    for (i, &base) in target.iter().enumerate() {
        let position = target.len() - i;
        if strand[start - position] != base {
            score += POSITION_WEIGHTS[position];
        }
    }

    Some(score / norm)
}

/// Exact matches are the on-target site itself; high-energy sites don't
/// bind.
fn retain(score: f64) -> bool {
    score > 0. && score <= MAX_BINDING_SCORE
}
