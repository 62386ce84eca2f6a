//! Target-sequence input validation. Reusable by any caller; the CLI runs it
//! before touching either trace file.

use na_seq::{Nucleotide, Seq};

use crate::error::TraceError;

/// A validated editing target: the guide-matching sequence and the base
/// offsets within it to score.
#[derive(Clone, Debug)]
pub struct TargetSpec {
    pub sequence: Seq,
    /// Zero-based offsets into `sequence`, in scoring order.
    pub offsets: Vec<usize>,
}

impl TargetSpec {
    /// Validate a letter sequence and an inclusive offset range, expanding
    /// the range into the explicit offset list.
    pub fn new(sequence: &str, range: (usize, usize)) -> Result<Self, TraceError> {
        let sequence = validate_sequence(sequence)?;

        let (start, end) = range;
        let len = sequence.len();
        if start > end || end >= len {
            return Err(TraceError::InvalidTargetRange { start, end, len });
        }

        Ok(Self {
            sequence,
            offsets: (start..=end).collect(),
        })
    }

    /// The target as upper-case letter bytes, for comparison against raw
    /// base-call text.
    pub fn letter_bytes(&self) -> Vec<u8> {
        let mut bytes = na_seq::seq_to_u8_upper(&self.sequence);
        bytes.make_ascii_uppercase();
        bytes
    }
}

/// A target sequence must consist only of A/C/G/T, in either case.
pub fn validate_sequence(input: &str) -> Result<Seq, TraceError> {
    let mut seq = Vec::with_capacity(input.len());

    for c in input.chars() {
        match c.to_ascii_uppercase() {
            'A' => seq.push(Nucleotide::A),
            'C' => seq.push(Nucleotide::C),
            'G' => seq.push(Nucleotide::G),
            'T' => seq.push(Nucleotide::T),
            _ => return Err(TraceError::InvalidTargetSequence(input.to_owned())),
        }
    }

    if seq.is_empty() {
        return Err(TraceError::InvalidTargetSequence(input.to_owned()));
    }

    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mixed_case() {
        let spec = TargetSpec::new("acgtACGT", (0, 7)).unwrap();
        assert_eq!(spec.sequence.len(), 8);
        assert_eq!(spec.offsets, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(spec.letter_bytes(), b"ACGTACGT".to_vec());
    }

    #[test]
    fn rejects_bad_letters() {
        let result = TargetSpec::new("ACGUACGT", (0, 3));
        assert!(matches!(result, Err(TraceError::InvalidTargetSequence(_))));
    }

    #[test]
    fn rejects_bad_ranges() {
        // End past the sequence.
        assert!(matches!(
            TargetSpec::new("ACGT", (0, 4)),
            Err(TraceError::InvalidTargetRange { .. })
        ));
        // Start after end.
        assert!(matches!(
            TargetSpec::new("ACGT", (2, 1)),
            Err(TraceError::InvalidTargetRange { .. })
        ));
    }

    #[test]
    fn expands_inclusive_range() {
        let spec = TargetSpec::new("ACGTACGTACGT", (3, 6)).unwrap();
        assert_eq!(spec.offsets, vec![3, 4, 5, 6]);
    }
}
