//! Records and statistics shared by the unit tests.

use crate::record::{AlignmentRecord, ContigId};
use crate::stat::{PairEndStat, SingleReadStat};

#[derive(Debug, Clone)]
pub struct TestRead {
    pub name: String,
    pub contig: Option<ContigId>,
    pub start: u64,
    pub mate_contig: Option<ContigId>,
    pub mate_start: u64,
    pub mapped: bool,
    pub mate_mapped: bool,
    pub paired: bool,
}

impl TestRead {
    /// Proper read with its mate on the same contig.
    pub fn pair(name: &str, contig: ContigId, start: u64, mate_start: u64) -> Self {
        Self {
            name: name.to_string(),
            contig: Some(contig),
            start,
            mate_contig: Some(contig),
            mate_start,
            mapped: true,
            mate_mapped: true,
            paired: true,
        }
    }

    pub fn unmapped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            contig: None,
            start: 0,
            mate_contig: None,
            mate_start: 0,
            mapped: false,
            mate_mapped: false,
            paired: true,
        }
    }
}

impl AlignmentRecord for TestRead {
    fn name(&self) -> &[u8] {
        self.name.as_bytes()
    }

    fn contig(&self) -> Option<ContigId> {
        self.contig
    }

    fn start(&self) -> u64 {
        self.start
    }

    fn mate_contig(&self) -> Option<ContigId> {
        self.mate_contig
    }

    fn mate_start(&self) -> u64 {
        self.mate_start
    }

    fn is_mapped(&self) -> bool {
        self.mapped
    }

    fn is_mate_mapped(&self) -> bool {
        self.mate_mapped
    }

    fn is_paired(&self) -> bool {
        self.paired
    }
}

/// Counts reads.
pub struct InWindowCount(String);

impl InWindowCount {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl SingleReadStat<TestRead> for InWindowCount {
    type Value = u64;

    fn name(&self) -> &str {
        &self.0
    }

    fn init(&self) -> u64 {
        0
    }

    fn compute(&self, _record: &TestRead) -> u64 {
        1
    }

    fn reduce(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}

/// Keeps the smallest and largest start seen, `NA` when empty.
pub struct StartRange(String);

impl StartRange {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl SingleReadStat<TestRead> for StartRange {
    type Value = Option<(u64, u64)>;

    fn name(&self) -> &str {
        &self.0
    }

    fn init(&self) -> Self::Value {
        None
    }

    fn compute(&self, record: &TestRead) -> Self::Value {
        Some((record.start, record.start))
    }

    fn reduce(&self, a: Self::Value, b: Self::Value) -> Self::Value {
        match (a, b) {
            (Some((a_min, a_max)), Some((b_min, b_max))) => Some((a_min.min(b_min), a_max.max(b_max))),
            (x, None) | (None, x) => x,
        }
    }

    fn format(&self, value: &Self::Value) -> String {
        match value {
            Some((min, max)) => format!("{}-{}", min, max),
            None => "NA".to_string(),
        }
    }
}

/// Sum of the distance between the two mates of every merged pair.
pub struct MateDistance(String);

impl MateDistance {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl PairEndStat<TestRead> for MateDistance {
    type Intermediate = u64;
    type Value = u64;

    fn name(&self) -> &str {
        &self.0
    }

    fn init(&self) -> u64 {
        0
    }

    fn compute_first(&self, record: &TestRead) -> u64 {
        record.start
    }

    fn compute_second(&self, record: &TestRead) -> u64 {
        record.start
    }

    fn merge(&self, first: u64, second: u64) -> u64 {
        first.abs_diff(second)
    }

    fn reduce(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}

/// Counts pairs whose first-observed mate lies left of the second one.
pub struct FirstBeforeSecond(String);

impl FirstBeforeSecond {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl PairEndStat<TestRead> for FirstBeforeSecond {
    type Intermediate = u64;
    type Value = u64;

    fn name(&self) -> &str {
        &self.0
    }

    fn init(&self) -> u64 {
        0
    }

    fn compute_first(&self, record: &TestRead) -> u64 {
        record.start
    }

    fn compute_second(&self, record: &TestRead) -> u64 {
        record.start
    }

    fn merge(&self, first: u64, second: u64) -> u64 {
        u64::from(first < second)
    }

    fn reduce(&self, a: u64, b: u64) -> u64 {
        a + b
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}
