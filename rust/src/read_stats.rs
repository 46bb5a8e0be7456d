//! Single-read statistics over BAM alignments.

use rust_htslib::bam;
use rust_htslib::bam::record::Cigar;

use pairwin_core::SingleReadStat;

use crate::bam::Alignment;

pub(crate) fn softclipped_bases(record: &bam::Record) -> u64 {
    record
        .cigar()
        .iter()
        .map(|op| match op {
            Cigar::SoftClip(len) => u64::from(*len),
            _ => 0,
        })
        .sum()
}

pub(crate) fn has_softclip(record: &bam::Record) -> bool {
    record.cigar().iter().any(|op| matches!(op, Cigar::SoftClip(_)))
}

fn has_indel(record: &bam::Record) -> bool {
    record.cigar().iter().any(|op| matches!(op, Cigar::Ins(_) | Cigar::Del(_)))
}

/// Number of reads with at least one soft-clipped segment.
pub struct ContainSoftclip;

impl SingleReadStat<Alignment> for ContainSoftclip {
    type Value = u64;

    fn name(&self) -> &str {
        "ContainSoftclip"
    }

    fn init(&self) -> u64 {
        0
    }

    fn compute(&self, record: &Alignment) -> u64 {
        u64::from(has_softclip(record.record()))
    }

    fn reduce(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}

/// Number of reads with an insertion or deletion.
pub struct ContainIndel;

impl SingleReadStat<Alignment> for ContainIndel {
    type Value = u64;

    fn name(&self) -> &str {
        "ContainIndel"
    }

    fn init(&self) -> u64 {
        0
    }

    fn compute(&self, record: &Alignment) -> u64 {
        u64::from(has_indel(record.record()))
    }

    fn reduce(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}

pub struct SoftclippedBases;

impl SingleReadStat<Alignment> for SoftclippedBases {
    type Value = u64;

    fn name(&self) -> &str {
        "SoftclippedBases"
    }

    fn init(&self) -> u64 {
        0
    }

    fn compute(&self, record: &Alignment) -> u64 {
        softclipped_bases(record.record())
    }

    fn reduce(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}

/// Mean mapping quality, two decimals; `NA` for a window with no proper reads.
pub struct MeanMapq;

impl SingleReadStat<Alignment> for MeanMapq {
    /// (sum of MAPQ, read count)
    type Value = (u64, u64);

    fn name(&self) -> &str {
        "MeanMapq"
    }

    fn init(&self) -> (u64, u64) {
        (0, 0)
    }

    fn compute(&self, record: &Alignment) -> (u64, u64) {
        (u64::from(record.record().mapq()), 1)
    }

    fn reduce(&self, a: (u64, u64), b: (u64, u64)) -> (u64, u64) {
        (a.0 + b.0, a.1 + b.1)
    }

    fn format(&self, value: &(u64, u64)) -> String {
        match value {
            (_, 0) => "NA".to_string(),
            (sum, n) => format!("{:.2}", *sum as f64 / *n as f64),
        }
    }
}
