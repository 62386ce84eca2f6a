//! End-to-end pipeline runs on synthesized trace pairs.

use editrace::{analysis::run_analysis, Channel, TargetSpec, TraceData};
use strum::IntoEnumIterator;

const TARGET: &str = "GACTGACTGACTGACTGACT";

/// Build a plausible trace: 100 called bases spaced 12 samples apart, each
/// with a peak in its own channel over quiet baseline.
fn synthetic_trace(sequence: &str) -> TraceData {
    let samples = 1300;
    let base_pos: Vec<usize> = (0..sequence.len()).map(|i| 12 * i + 6).collect();

    let mut channels: [Vec<i32>; 4] = [
        vec![10; samples],
        vec![10; samples],
        vec![10; samples],
        vec![10; samples],
    ];
    for (i, call) in sequence.chars().enumerate() {
        let channel = match call {
            'A' => Channel::A,
            'G' => Channel::G,
            'C' => Channel::C,
            'T' => Channel::T,
            _ => continue,
        };
        let center = base_pos[i];
        for sample in center.saturating_sub(2)..(center + 3).min(samples) {
            channels[channel.index()][sample] = 800;
        }
    }

    TraceData::new(channels, sequence.to_owned(), base_pos)
}

/// 100 bases: the target embedded at base 40, GG-free filler elsewhere so no
/// stray PAM sites complicate the run.
fn reference_sequence() -> String {
    let filler = "ACGT".repeat(10);
    format!("{filler}{TARGET}{filler}")
}

#[test]
fn identical_pair_scores_zero_everywhere() {
    let target = TargetSpec::new(TARGET, (0, 7)).unwrap();

    let reference = synthetic_trace(&reference_sequence());
    let sample = reference.clone();

    let analysis = run_analysis(reference, sample, &target).unwrap();

    // Identical traces: full-length alignment, no differences anywhere.
    assert_eq!(analysis.report.align_length, 1300);
    assert_eq!(analysis.diffs.len, 1300);
    for ch in Channel::iter() {
        assert!(analysis.diffs.channel(ch).iter().all(|&v| v == 0.));
    }

    // The primary region scores 0 at every configured base.
    let primary = &analysis.report.regions[0];
    assert_eq!(primary.label, "target");
    assert_eq!(primary.position, None);
    assert_eq!(primary.frequencies.len(), 8);
    assert!(primary.frequencies.iter().all(|&f| f == 0.));

    // The filler is GG-free, so no off-target rows appear.
    assert_eq!(analysis.report.regions.len(), 1);
}

#[test]
fn short_traces_are_rejected() {
    let target = TargetSpec::new(TARGET, (0, 3)).unwrap();

    let mut reference = synthetic_trace(&reference_sequence());
    // Truncate below the normalization minimum.
    for ch in Channel::iter() {
        reference.channel_mut(ch).truncate(1000);
    }
    reference.seq_length = 1000;
    let sample = reference.clone();

    assert!(run_analysis(reference, sample, &target).is_err());
}
