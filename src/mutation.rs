//! Per-base mutation-frequency scoring at a target site, using the
//! Sequalizer formula: an edited G shows as a drop in the G channel with a
//! compensating rise in A (and an edited C likewise against T) within a
//! narrow window around the called base's trace position.

use bio::alignment::pairwise::Aligner;
use log::warn;

use crate::{
    diff::TraceDiffs,
    error::TraceError,
    target::TargetSpec,
    trace::{Channel, TraceData},
};

/// Scores for locating the target inside the reference base calls: the
/// classic local-alignment parameters 2/-1/-1/-0.1, scaled x10 since the
/// aligner scores in integers.
const LOCATE_MATCH: i32 = 20;
const LOCATE_MISMATCH: i32 = -10;
const LOCATE_GAP_OPEN: i32 = -10;
const LOCATE_GAP_EXTEND: i32 = -1;

/// Trace samples on either side of a called base contributing to its score.
const SCORE_WINDOW_HALF: usize = 2;
/// Substituted when the reference channel shows no signal in the window;
/// the same fixed denominator normalization uses for blank windows.
const ZERO_REF_DENOM: f64 = 1000.;

/// Where scoring is anchored in the reference base calls.
struct Anchor {
    start: usize,
    end: usize,
}

/// Scores mutation frequency at configured target base offsets from the
/// aligned difference sequence.
pub struct MutationScorer<'a> {
    reference: &'a TraceData,
    diffs: &'a TraceDiffs,
    target: &'a TargetSpec,
    target_letters: Vec<u8>,
}

impl<'a> MutationScorer<'a> {
    pub fn new(reference: &'a TraceData, diffs: &'a TraceDiffs, target: &'a TargetSpec) -> Self {
        let target_letters = target.letter_bytes();

        Self {
            reference,
            diffs,
            target,
            target_letters,
        }
    }

    /// Mutation frequency for each configured base offset, in order. With no
    /// override the target is located in the reference base calls by local
    /// alignment; an override anchors scoring at an off-target site instead
    /// (positive: sense strand, negative: antisense).
    pub fn score(&self, override_pos: Option<isize>) -> Result<Vec<f64>, TraceError> {
        let anchor = self.locate(override_pos)?;

        let mut freqs = Vec::with_capacity(self.target.offsets.len());
        let mut unreadable = 0;
        for &offset in &self.target.offsets {
            match self.score_base(&anchor, offset, override_pos) {
                Some(freq) => freqs.push(freq),
                None => {
                    unreadable += 1;
                    freqs.push(0.);
                }
            }
        }
        if unreadable > 0 {
            warn!(
                "{unreadable} of {} target bases fell outside the readable trace; scored 0",
                self.target.offsets.len()
            );
        }

        Ok(freqs)
    }

    fn locate(&self, override_pos: Option<isize>) -> Result<Anchor, TraceError> {
        let Some(pos) = override_pos else {
            let ref_bytes = self.reference.sequence.as_bytes();
            let score = |a: u8, b: u8| {
                if a == b {
                    LOCATE_MATCH
                } else {
                    LOCATE_MISMATCH
                }
            };
            let mut aligner = Aligner::with_capacity(
                ref_bytes.len(),
                self.target_letters.len(),
                LOCATE_GAP_OPEN,
                LOCATE_GAP_EXTEND,
                &score,
            );
            let alignment = aligner.local(ref_bytes, &self.target_letters);

            return Ok(Anchor {
                start: alignment.xstart,
                end: alignment.xend,
            });
        };

        let target_len = self.target.sequence.len() as isize;
        let diff_len = self.diffs.len as isize;
        let ref_len = self.reference.seq_length as isize;

        if pos > 0 && pos < diff_len {
            // Sense-strand anchor: the candidate ends (PAM-adjacent) at
            // `pos`.
            let start = pos - target_len;
            if start < 0 {
                return Err(TraceError::AnchorOutOfRange(pos));
            }
            Ok(Anchor {
                start: start as usize,
                end: pos as usize,
            })
        } else if pos < -(ref_len - diff_len) {
            // Antisense anchor, mapped back onto the sense strand.
            let start = ref_len + pos + 3;
            if start < 0 {
                return Err(TraceError::AnchorOutOfRange(pos));
            }
            Ok(Anchor {
                start: start as usize,
                end: (start + target_len) as usize,
            })
        } else {
            // The gap between the two coordinate conventions.
            Err(TraceError::AnchorOutOfRange(pos))
        }
    }

    /// `None` when the base or its trace window cannot be read.
    fn score_base(&self, anchor: &Anchor, offset: usize, override_pos: Option<isize>) -> Option<f64> {
        let seq = self.reference.sequence.as_bytes();

        // Which base is expected at this offset, and where it sits in the
        // reference base calls. With an override the expected base comes
        // from the reference itself rather than the target.
        let (position, expected) = match override_pos {
            None => (anchor.start + offset, self.target_letters[offset]),
            Some(p) if p > 0 => {
                let position = anchor.start + offset;
                (position, *seq.get(position)?)
            }
            Some(_) => {
                let position = anchor.end.checked_sub(offset)?;
                (position, *seq.get(position)?)
            }
        };

        match expected {
            b'G' => self.channel_score(position, Channel::G, Channel::A),
            b'C' => self.channel_score(position, Channel::C, Channel::T),
            // Only G and C edits produce a quantifiable swing under this
            // model; other bases report 0.
            _ => Some(0.),
        }
    }

    /// The Sequalizer formula at one called base: the edited channel's rise
    /// against its substitution partner's fall in the difference sequence,
    /// normalized by the reference peak, over a +/-2 sample window.
    fn channel_score(&self, position: usize, edited: Channel, partner: Channel) -> Option<f64> {
        let center = *self.reference.base_pos.get(position)?;
        let lo = center.saturating_sub(SCORE_WINDOW_HALF);

        let diff_hi = (center + SCORE_WINDOW_HALF).min(self.diffs.len);
        let edited_max = slice_max(self.diffs.channel(edited).get(lo..diff_hi)?)?;
        let partner_min = slice_min(self.diffs.channel(partner).get(lo..diff_hi)?)?;

        let ref_channel = self.reference.channel(edited);
        let ref_hi = (center + SCORE_WINDOW_HALF).min(ref_channel.len());
        let ref_max = ref_channel.get(lo..ref_hi)?.iter().copied().max()?;

        let denom = if ref_max <= 0 {
            ZERO_REF_DENOM
        } else {
            ref_max as f64
        };

        let freq = ((edited_max - partner_min).abs() / (8. * denom)).sqrt();
        Some((freq * 1000.).round() / 1000.)
    }
}

fn slice_max(vals: &[f64]) -> Option<f64> {
    vals.iter().copied().reduce(f64::max)
}

fn slice_min(vals: &[f64]) -> Option<f64> {
    vals.iter().copied().reduce(f64::min)
}
