//! Dynamic re-alignment of a test trace against a reference. Sanger runs
//! rarely share an exact start offset or samples-per-base spacing, so a
//! single global shift is not enough: after the best starting offset is
//! found, the test trace is resampled in single-sample steps wherever a
//! shifted window fits better, tracking cumulative drift without a full
//! dynamic-programming alignment.

use log::debug;
use strum::IntoEnumIterator;

use crate::trace::{Channel, TraceData};

/// Candidate global offsets, in trace samples.
const OFFSET_MIN: i32 = -200;
const OFFSET_MAX: i32 = 200;
const OFFSET_STEP: usize = 20;
/// Span of the trial alignments used to pick the global offset.
const SEARCH_SPAN: usize = 1000;
/// Trial alignments are scored over `[SCORE_START, SEARCH_SPAN)`; start-of-
/// run signal is unreliable and would swamp the comparison.
const SCORE_START: usize = 200;
/// Samples scored when deciding a local correction.
const CORRECTION_WINDOW: usize = 30;
/// Local corrections are only re-evaluated at every third sample, bounding
/// the cost of the walk.
const CORRECTION_INTERVAL: usize = 3;

/// Align `test` against `reference`. Both traces should be normalized
/// first. Records the chosen offset in `initial_offset` on each trace and
/// updates the test trace's `seq_length` for any inserted or deleted
/// samples.
pub fn align(reference: &mut TraceData, test: &mut TraceData) {
    let mut best: Option<(i32, i64)> = None;

    for offset in (OFFSET_MIN..OFFSET_MAX).step_by(OFFSET_STEP) {
        // Trial alignments mutate the traces, so they run on private copies.
        let mut trial_ref = reference.clone();
        let mut trial_test = test.clone();
        align_at_offset(&mut trial_ref, &mut trial_test, offset, SEARCH_SPAN);

        let Some(score) = window_score(&trial_ref, &trial_test, SCORE_START, SEARCH_SPAN, 0)
        else {
            continue;
        };
        // Strictly-less, so the lowest offset wins among equal scores.
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((offset, score));
        }
    }

    let offset = best.map_or(0, |(o, _)| o);
    debug!("global alignment offset: {offset}");

    let span = (test.channel(Channel::A).len() as i64 + offset as i64).max(0) as usize;
    align_at_offset(reference, test, offset, span);
}

/// Apply a global offset to the test trace, then walk the traces making
/// single-sample corrections wherever a shifted window scores better.
fn align_at_offset(reference: &mut TraceData, test: &mut TraceData, offset: i32, span: usize) {
    if offset < 0 {
        // Test starts late; pad it with copies of its first sample.
        for ch in Channel::iter() {
            let data = test.channel_mut(ch);
            let first = data[0];
            for _ in 0..offset.unsigned_abs() {
                data.insert(0, first);
            }
        }
    } else if offset > 0 {
        // Test starts early; drop its leading samples.
        for ch in Channel::iter() {
            test.channel_mut(ch).drain(..offset as usize);
        }
    }
    test.initial_offset = offset;
    reference.initial_offset = 0;

    let mut i = 0;
    while i + 1 < span {
        if i % CORRECTION_INTERVAL == 0 {
            let end = i + CORRECTION_WINDOW;
            let scores = (
                window_score(reference, test, i, end, 0),
                window_score(reference, test, i, end, -1),
                window_score(reference, test, i, end, 1),
            );
            // Once a window runs past either trace the walk stops; the
            // remainder is left unaligned.
            let (Some(score), Some(pre), Some(post)) = scores else {
                break;
            };

            // A strict minimum is required; any tie means no change.
            if post < pre && post < score {
                // The reference is behind; drop a test sample to catch up.
                for ch in Channel::iter() {
                    test.channel_mut(ch).remove(i);
                }
            } else if pre < score && pre < post {
                // The reference is ahead; duplicate a test sample.
                for ch in Channel::iter() {
                    let val = test.channel(ch)[i];
                    test.channel_mut(ch).insert(i, val);
                }
            }
        }
        i += 1;
    }

    test.sync_len();
}

/// Total absolute difference across all four channels over `[start, end)`,
/// with the test trace probed `shift` samples ahead of the reference.
/// Returns `None` once the window runs past either trace. A negative probe
/// index addresses the trace tail instead, so the very first window's
/// pre-shift trial is still scoreable.
fn window_score(
    reference: &TraceData,
    test: &TraceData,
    start: usize,
    end: usize,
    shift: i32,
) -> Option<i64> {
    let mut score = 0;

    for i in start..end {
        for ch in Channel::iter() {
            let r = reference.channel(ch);
            let t = test.channel(ch);

            let mut j = i as i64 + shift as i64;
            if j < 0 {
                j += t.len() as i64;
            }
            if i >= r.len() || j as usize >= t.len() {
                return None;
            }

            score += (r[i] as i64 - t[j as usize] as i64).abs();
        }
    }

    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic varied-signal trace; a constant trace would let every
    /// offset score equally.
    fn synth_trace(len: usize, seed: u64) -> TraceData {
        let mut state = seed;
        let mut channels: [Vec<i32>; 4] = Default::default();

        for _ in 0..len {
            for ch in &mut channels {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ch.push(((state >> 33) % 3000) as i32);
            }
        }

        TraceData::new(channels, String::new(), Vec::new())
    }

    #[test]
    fn identical_traces_align_at_zero() {
        let mut reference = synth_trace(1200, 1);
        let mut test = reference.clone();
        let before = test.clone();

        align(&mut reference, &mut test);

        assert_eq!(test.initial_offset, 0);
        assert_eq!(reference.initial_offset, 0);
        assert_eq!(test.seq_length, before.seq_length);
        for ch in Channel::iter() {
            assert_eq!(test.channel(ch), before.channel(ch));
        }
    }

    #[test]
    fn shifted_trace_offset_is_discovered() {
        let mut reference = synth_trace(1400, 7);

        // The test trace starts 40 samples early: its first 40 samples are
        // duplicates of the reference's first sample, then the reference
        // follows.
        let mut channels: [Vec<i32>; 4] = Default::default();
        for ch in Channel::iter() {
            let r = reference.channel(ch);
            let mut data = vec![r[0]; 40];
            data.extend_from_slice(r);
            channels[ch.index()] = data;
        }
        let mut test = TraceData::new(channels, String::new(), Vec::new());

        align(&mut reference, &mut test);

        assert_eq!(test.initial_offset, 40);
        // After trimming the offset, the traces match exactly, so the
        // correction walk changes nothing.
        for ch in Channel::iter() {
            assert_eq!(test.channel(ch), reference.channel(ch));
        }
    }

    #[test]
    fn window_past_end_is_unscoreable() {
        let reference = synth_trace(100, 3);
        let test = synth_trace(50, 4);

        assert!(window_score(&reference, &test, 40, 70, 0).is_none());
        assert!(window_score(&reference, &test, 0, 30, 0).is_some());
    }
}
