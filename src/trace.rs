//! The four-channel trace record extracted from a sequencer file, and the
//! channel enum used to address it.

use strum_macros::EnumIter;

/// One fluorescence channel of a capillary trace.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter)]
pub enum Channel {
    A,
    G,
    C,
    T,
}

impl Channel {
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::G => 1,
            Self::C => 2,
            Self::T => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::G => "G",
            Self::C => "C",
            Self::T => "T",
        }
    }
}

/// The data structure representing one sequenced trace.
///
/// The four channel sequences always have the same length as each other and
/// as `seq_length`; the normalization and alignment passes maintain this.
#[derive(Clone, Debug, Default)]
pub struct TraceData {
    channels: [Vec<i32>; 4],
    /// Base calls exactly as reported by the sequencer, upper case. Kept as
    /// text rather than typed nucleotides: ambiguous calls such as `N` must
    /// survive so `base_pos` stays in register with the call string.
    pub sequence: String,
    /// Trace sample index of each called base. Indexes validly into the
    /// channel sequences only while the two stay in step.
    pub base_pos: Vec<usize>,
    /// Length of each channel sequence.
    pub seq_length: usize,
    /// Global offset chosen by alignment; 0 for a reference trace.
    pub initial_offset: i32,
}

impl TraceData {
    pub fn new(channels: [Vec<i32>; 4], sequence: String, base_pos: Vec<usize>) -> Self {
        let seq_length = channels[0].len();

        Self {
            channels,
            sequence,
            base_pos,
            seq_length,
            initial_offset: 0,
        }
    }

    pub fn channel(&self, channel: Channel) -> &[i32] {
        &self.channels[channel.index()]
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut Vec<i32> {
        &mut self.channels[channel.index()]
    }

    /// A copy of all channel data. Normalization overwrites the channels it
    /// reads from, so window sums must come from a snapshot like this one.
    pub(crate) fn channel_snapshot(&self) -> [Vec<i32>; 4] {
        self.channels.clone()
    }

    /// Re-derive `seq_length` after structural edits to the channel data.
    pub(crate) fn sync_len(&mut self) {
        self.seq_length = self.channels[0].len();
    }
}
