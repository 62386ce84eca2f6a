//! Sliding-window trace normalization, after the SeqDoc method
//! (Crowe, M. L. (2005), BMC Bioinformatics 6:133). Each sample is rescaled
//! against the total four-channel signal in a window around it, so two runs
//! with different overall intensity and slow baseline drift become
//! comparable.

use log::debug;
use strum::IntoEnumIterator;

use crate::{
    error::TraceError,
    trace::{Channel, TraceData},
};

/// Samples on either side of a datapoint contributing to its window.
pub const WINDOW_HALF: usize = 500;
/// Normalization needs at least a full window plus margin of signal.
pub const MIN_TRACE_LEN: usize = 1100;
/// Substituted for an all-zero window sum. Blank stretches of trace would
/// otherwise divide by zero; the substitution trades a little accuracy in
/// dead regions for never failing there.
const ZERO_SUM_DENOM: i64 = 1000;
/// Brings rescaled samples onto a common intensity scale.
const SCALE: f64 = 400.;

/// Rescale every channel in place so that total windowed signal is constant
/// along the trace. Window sums are always taken over the original values,
/// never over already-rescaled ones.
pub fn normalize(trace: &mut TraceData) -> Result<(), TraceError> {
    let len = trace.seq_length;
    if len < MIN_TRACE_LEN {
        return Err(TraceError::InputTooShort(len));
    }

    let orig = trace.channel_snapshot();

    // Interior datapoints: a full window on both sides, slid one sample at a
    // time.
    let mut sum = window_total(&orig, 0, WINDOW_HALF * 2);
    for i in WINDOW_HALF..len - (WINDOW_HALF + 1) {
        if i > WINDOW_HALF {
            for ch in &orig {
                sum += ch[i + WINDOW_HALF - 1] as i64 - ch[i - WINDOW_HALF - 1] as i64;
            }
        }
        rescale(trace, &orig, i, sum, (WINDOW_HALF * 2) as f64);
    }

    // Leading edge: no full half-window before, so the window is everything
    // up to `i + WINDOW_HALF`. Start quality is poor anyway; mismatches here
    // are unreliable regardless.
    let mut sum = window_total(&orig, 0, WINDOW_HALF);
    for i in 0..WINDOW_HALF {
        rescale(trace, &orig, i, sum, (i + WINDOW_HALF) as f64);
        for ch in &orig {
            sum += ch[i + WINDOW_HALF] as i64;
        }
    }

    // Trailing edge: the mirror case, dropping the earliest sample as the
    // window slides toward the end.
    let mut sum = window_total(&orig, len - WINDOW_HALF * 2, WINDOW_HALF * 2);
    for i in len - WINDOW_HALF..len {
        rescale(trace, &orig, i, sum, (len - i + WINDOW_HALF) as f64);
        for ch in &orig {
            sum -= ch[i - WINDOW_HALF] as i64;
        }
    }

    debug!("normalized trace of {len} samples");

    Ok(())
}

/// Rescale every channel's sample `i` against the four-channel `sum` over
/// `width` samples.
fn rescale(trace: &mut TraceData, orig: &[Vec<i32>; 4], i: usize, sum: i64, width: f64) {
    let denom = if sum == 0 { ZERO_SUM_DENOM } else { sum };

    for ch in Channel::iter() {
        let val = orig[ch.index()][i] as f64 / denom as f64 * width * SCALE;
        trace.channel_mut(ch)[i] = val.round() as i32;
    }
}

fn window_total(orig: &[Vec<i32>; 4], start: usize, count: usize) -> i64 {
    orig.iter()
        .map(|ch| ch[start..start + count].iter().map(|&v| v as i64).sum::<i64>())
        .sum()
}
