//! Signed, amplitude-accentuated differences between two aligned traces.

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::trace::{Channel, TraceData};

/// Saturation bound for raw and accentuated differences.
const DIFF_CLAMP: f64 = 5000.;

/// Per-channel signed difference sequences between a reference and a test
/// trace, over their common aligned length.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TraceDiffs {
    pub channels: [Vec<f64>; 4],
    pub len: usize,
}

impl TraceDiffs {
    pub fn channel(&self, channel: Channel) -> &[f64] {
        &self.channels[channel.index()]
    }
}

/// Subtract the test trace from the reference, clamping saturated values,
/// then accentuate each channel by how strongly the other channels moved
/// the opposite way at the same sample. A real mutation pulls one channel
/// down and its substitution partner up at the same point; noise tends to
/// move all channels the same way and is suppressed.
pub fn differences(reference: &TraceData, test: &TraceData) -> TraceDiffs {
    let len = reference.seq_length.min(test.seq_length);

    let mut raw: [Vec<f64>; 4] = Default::default();
    for ch in Channel::iter() {
        let r = reference.channel(ch);
        let t = test.channel(ch);
        raw[ch.index()] = (0..len)
            .map(|i| ((r[i] - t[i]) as f64).clamp(-DIFF_CLAMP, DIFF_CLAMP))
            .collect();
    }

    let mut channels: [Vec<f64>; 4] = Default::default();
    for ch in Channel::iter() {
        let mut vals = Vec::with_capacity(len);

        for i in 0..len {
            let diff = raw[ch.index()][i];
            let sign = sign_of(diff);

            // Sum the opposite-signed movement in the other channels; the
            // sum starts from 1 so a quiet sample doesn't zero out the
            // difference entirely.
            let mut others = 1.;
            for other in Channel::iter() {
                if other == ch {
                    continue;
                }
                let val = raw[other.index()][i];
                if val * sign > 0. {
                    continue;
                }
                others += val;
            }

            let mut accentuated = sign * diff * diff * others.abs().sqrt() / DIFF_CLAMP;
            if accentuated.abs() > DIFF_CLAMP {
                accentuated = sign * DIFF_CLAMP;
            }
            vals.push(accentuated);
        }

        channels[ch.index()] = vals;
    }

    TraceDiffs { channels, len }
}

/// -1, 0 or 1. Unlike `f64::signum`, zero maps to zero.
fn sign_of(val: f64) -> f64 {
    if val > 0. {
        1.
    } else if val < 0. {
        -1.
    } else {
        0.
    }
}
