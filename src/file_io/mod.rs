//! Reading trace files produced by sequencers. Currently AB1 only.

pub mod ab1;
