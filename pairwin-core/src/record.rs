//! Read-only view of an alignment record.
//!
//! The engine never retains a record past the call it was passed to; only the
//! template name is copied into a window's pair cache.

/// Index of a contig in the reference sequence dictionary.
pub type ContigId = usize;

pub trait AlignmentRecord {
    /// Template name shared by both mates.
    fn name(&self) -> &[u8];
    fn contig(&self) -> Option<ContigId>;
    /// 1-based leftmost mapped position.
    fn start(&self) -> u64;
    fn mate_contig(&self) -> Option<ContigId>;
    /// 1-based leftmost mapped position of the mate.
    fn mate_start(&self) -> u64;
    fn is_mapped(&self) -> bool;
    fn is_mate_mapped(&self) -> bool;
    fn is_paired(&self) -> bool;
}

/// Proper pair, independent of the aligner's proper-pair flag: both mates
/// mapped to the same contig.
pub fn is_proper<R: AlignmentRecord + ?Sized>(record: &R) -> bool {
    record.is_mapped()
        && record.is_paired()
        && record.is_mate_mapped()
        && record.contig().is_some()
        && record.contig() == record.mate_contig()
}
