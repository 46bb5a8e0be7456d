//! Pair-end statistics over BAM alignments.
//!
//! Each statistic computes one intermediate per mate and merges the two once
//! the window has seen both. `first` is always the mate the window observed
//! first.

use std::fmt;

use rust_htslib::bam;
use rust_htslib::bam::record::Aux;

use pairwin_core::PairEndStat;

use crate::bam::Alignment;
use crate::read_stats::has_softclip;

/// Integer value of an aux tag, whatever its integer width.
pub(crate) fn integer_tag(record: &bam::Record, tag: &[u8]) -> Option<i64> {
    match record.aux(tag).ok()? {
        Aux::I8(v) => Some(i64::from(v)),
        Aux::U8(v) => Some(i64::from(v)),
        Aux::I16(v) => Some(i64::from(v)),
        Aux::U16(v) => Some(i64::from(v)),
        Aux::I32(v) => Some(i64::from(v)),
        Aux::U32(v) => Some(i64::from(v)),
        _ => None,
    }
}

/// Whether one or both mates must pass the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMode {
    #[default]
    Any,
    All,
}

impl fmt::Display for TagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagMode::Any => write!(f, "any"),
            TagMode::All => write!(f, "all"),
        }
    }
}

/// Number of fragments where any (or all) mates carry `tag` with a value of
/// at least `threshold`. A mate without the tag never passes.
pub struct PairTagThreshold {
    name: String,
    tag: [u8; 2],
    threshold: i64,
    mode: TagMode,
}

impl PairTagThreshold {
    pub fn new(tag: [u8; 2], threshold: i64, mode: TagMode) -> Self {
        let mut name = format!("PairTagThreshold:{}:{}", String::from_utf8_lossy(&tag), threshold);
        if mode == TagMode::All {
            name.push_str(":all");
        }
        Self { name, tag, threshold, mode }
    }

    fn passes(&self, value: Option<i64>) -> bool {
        value.map(|v| v >= self.threshold).unwrap_or(false)
    }
}

impl PairEndStat<Alignment> for PairTagThreshold {
    type Intermediate = Option<i64>;
    type Value = u64;

    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self) -> u64 {
        0
    }

    fn compute_first(&self, record: &Alignment) -> Option<i64> {
        integer_tag(record.record(), &self.tag)
    }

    fn compute_second(&self, record: &Alignment) -> Option<i64> {
        integer_tag(record.record(), &self.tag)
    }

    fn merge(&self, first: Option<i64>, second: Option<i64>) -> u64 {
        let hit = match self.mode {
            TagMode::Any => self.passes(first) || self.passes(second),
            TagMode::All => self.passes(first) && self.passes(second),
        };
        u64::from(hit)
    }

    fn reduce(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}

/// Number of fragments with a soft clip on either mate.
pub struct PairContainSoftclip;

impl PairEndStat<Alignment> for PairContainSoftclip {
    type Intermediate = bool;
    type Value = u64;

    fn name(&self) -> &str {
        "PairContainSoftclip"
    }

    fn init(&self) -> u64 {
        0
    }

    fn compute_first(&self, record: &Alignment) -> bool {
        has_softclip(record.record())
    }

    fn compute_second(&self, record: &Alignment) -> bool {
        has_softclip(record.record())
    }

    fn merge(&self, first: bool, second: bool) -> u64 {
        u64::from(first || second)
    }

    fn reduce(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}

/// Number of fragments where only the first-observed mate is soft-clipped.
pub struct PairFirstSeenSoftclip;

impl PairEndStat<Alignment> for PairFirstSeenSoftclip {
    type Intermediate = bool;
    type Value = u64;

    fn name(&self) -> &str {
        "PairFirstSeenSoftclip"
    }

    fn init(&self) -> u64 {
        0
    }

    fn compute_first(&self, record: &Alignment) -> bool {
        has_softclip(record.record())
    }

    fn compute_second(&self, record: &Alignment) -> bool {
        has_softclip(record.record())
    }

    fn merge(&self, first: bool, second: bool) -> u64 {
        u64::from(first && !second)
    }

    fn reduce(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}
