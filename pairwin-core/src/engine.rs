//! Sweeping orchestrator over the open windows.
//!
//! The engine owns one [`WindowCalculator`] per window, grouped by contig in
//! dictionary order. As the coordinate-sorted stream moves to a later contig,
//! every window of the earlier contigs is finalized and written, so rows come
//! out in `(contig, start)` order and only the current suffix of contigs is
//! held in memory.
//!
//! Each open contig keeps an interval tree over its windows; a record is fed
//! to the window holding its own start and, for proper records, the window
//! holding its mate's start. Every other window of the contig would ignore it.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use coitrees::{COITree, IntervalNode, IntervalTree};
use log::debug;

use crate::calculator::WindowCalculator;
use crate::error::{Result, WindowError};
use crate::record::{is_proper, AlignmentRecord, ContigId};
use crate::stat::{SharedPairEndStat, SharedSingleReadStat};
use crate::table::TableWriter;
use crate::window::{validate_windows, GenomicWindow, SequenceDictionary};

/// Count columns reported before the statistic columns.
pub const COUNT_COLUMNS: [&str; 3] = ["total", "proper", "missing"];

/// Identity fields that lead every row, ahead of the column list.
const IDENTITY_COLUMNS: [&str; 3] = ["contig", "start", "end"];

const RESERVED_COLUMNS: [&str; 6] = ["contig", "start", "end", "total", "proper", "missing"];

fn is_valid_column(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| matches!(c, '\t' | '\n' | '\r'))
}

/// Column list for the given statistics: the count columns, then single-read
/// names, then pair-end names, each in configured order.
pub fn column_names<R>(single: &[SharedSingleReadStat<R>], pair: &[SharedPairEndStat<R>]) -> Result<Vec<String>> {
    let mut columns: Vec<String> = COUNT_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    let names = single.iter().map(|s| s.name()).chain(pair.iter().map(|p| p.name()));
    for name in names {
        if !is_valid_column(name) {
            return Err(WindowError::InvalidColumnName(name.to_string()));
        }
        if RESERVED_COLUMNS.contains(&name) || !seen.insert(name) {
            return Err(WindowError::DuplicateColumn(name.to_string()));
        }
        columns.push(name.to_string());
    }
    Ok(columns)
}

/// Window that was finalized with unmatched fragments in its pair cache.
///
/// Expected only when the input is not fully paired or not correctly sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteWindow {
    pub window: GenomicWindow,
    pub missing: usize,
}

/// What happened during a run, returned by [`WindowEngine::close`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineReport {
    pub records_seen: u64,
    pub unmapped_skipped: u64,
    pub windows_written: u64,
    pub windows_omitted: u64,
    pub incomplete: Vec<IncompleteWindow>,
}

struct ContigWindows<R> {
    tree: COITree<usize, u32>,
    calculators: Vec<WindowCalculator<R>>,
}

impl<R: AlignmentRecord> ContigWindows<R> {
    fn new(calculators: Vec<WindowCalculator<R>>) -> Self {
        let nodes: Vec<IntervalNode<usize, u32>> = calculators
            .iter()
            .enumerate()
            .map(|(i, calc)| IntervalNode::new(calc.window().start as i32, calc.window().end as i32, i))
            .collect();
        Self { tree: COITree::new(&nodes), calculators }
    }

    /// Index of the window containing `pos`; windows of a contig never overlap.
    fn locate(&self, pos: u64) -> Option<usize> {
        let pos = i32::try_from(pos).ok()?;
        let mut hit = None;
        self.tree.query(pos, pos, |node| hit = Some(node.metadata.to_owned()));
        hit
    }

    fn feed(&mut self, record: &R) {
        let own = self.locate(record.start());
        let mate = if is_proper(record) { self.locate(record.mate_start()) } else { None };

        for idx in own.into_iter().chain(mate.filter(|&m| Some(m) != own)) {
            let calc = &mut self.calculators[idx];
            debug_assert!(calc.fragment_overlaps(record));
            calc.add_read(record);
        }
    }
}

pub struct WindowEngine<R, W: Write> {
    open: BTreeMap<ContigId, ContigWindows<R>>,
    sink: TableWriter<W>,
    columns: Arc<[String]>,
    print_all: bool,
    report: EngineReport,
}

impl<R: AlignmentRecord, W: Write> WindowEngine<R, W> {
    /// Build one calculator per window and write the header.
    ///
    /// `windows` must be sorted by dictionary order then start and must not
    /// overlap. Windows with no records are omitted from the output unless
    /// `print_all` is set.
    pub fn new(
        dictionary: &SequenceDictionary,
        windows: &[GenomicWindow],
        single: &[SharedSingleReadStat<R>],
        pair: &[SharedPairEndStat<R>],
        sink: TableWriter<W>,
        print_all: bool,
    ) -> Result<Self> {
        let columns = column_names(single, pair)?;
        Self::with_columns(dictionary, windows, single, pair, columns, sink, print_all)
    }

    /// Same as [`WindowEngine::new`] with an explicit column list, which must
    /// hold the three count columns plus one name per statistic.
    pub fn with_columns(
        dictionary: &SequenceDictionary,
        windows: &[GenomicWindow],
        single: &[SharedSingleReadStat<R>],
        pair: &[SharedPairEndStat<R>],
        columns: Vec<String>,
        mut sink: TableWriter<W>,
        print_all: bool,
    ) -> Result<Self> {
        let expected = COUNT_COLUMNS.len() + single.len() + pair.len();
        if columns.len() != expected {
            return Err(WindowError::ColumnCountMismatch { expected, found: columns.len() });
        }
        let mut seen = HashSet::new();
        for column in &columns {
            if !is_valid_column(column) {
                return Err(WindowError::InvalidColumnName(column.clone()));
            }
            if IDENTITY_COLUMNS.contains(&column.as_str()) || !seen.insert(column.as_str()) {
                return Err(WindowError::DuplicateColumn(column.clone()));
            }
        }

        let ids = validate_windows(dictionary, windows)?;
        let columns: Arc<[String]> = columns.into();

        let mut grouped: BTreeMap<ContigId, Vec<WindowCalculator<R>>> = BTreeMap::new();
        for (window, id) in windows.iter().zip(ids) {
            let calc = WindowCalculator::new(window.clone(), id, Arc::clone(&columns), single, pair);
            grouped.entry(id).or_default().push(calc);
        }
        let open = grouped.into_iter().map(|(id, calcs)| (id, ContigWindows::new(calcs))).collect();

        sink.write_header(&columns)?;

        Ok(Self { open, sink, columns, print_all, report: EngineReport::default() })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Windows not yet finalized.
    pub fn open_windows(&self) -> usize {
        self.open.values().map(|c| c.calculators.len()).sum()
    }

    /// True once every window has been finalized; later records are ignored.
    pub fn is_exhausted(&self) -> bool {
        self.open.is_empty()
    }

    /// Feed the next record of the coordinate-sorted stream.
    ///
    /// Unmapped records are skipped without flushing anything.
    pub fn add_read(&mut self, record: &R) -> Result<()> {
        self.report.records_seen += 1;
        if !record.is_mapped() {
            self.report.unmapped_skipped += 1;
            return Ok(());
        }
        let Some(contig) = record.contig() else {
            debug_assert!(false, "mapped record without a contig");
            return Ok(());
        };

        while let Some((&first, _)) = self.open.first_key_value() {
            if first >= contig {
                break;
            }
            if let Some((_, windows)) = self.open.pop_first() {
                self.flush_contig(windows)?;
            }
        }

        if let Some(windows) = self.open.get_mut(&contig) {
            windows.feed(record);
        }
        Ok(())
    }

    fn flush_contig(&mut self, windows: ContigWindows<R>) -> Result<()> {
        if let Some(first) = windows.calculators.first() {
            debug!("Finalizing {} windows on {}", windows.calculators.len(), first.window().contig);
        }
        for calc in windows.calculators {
            self.finalize(calc)?;
        }
        Ok(())
    }

    fn finalize(&mut self, calc: WindowCalculator<R>) -> Result<()> {
        let missing = calc.missing_count();
        if missing != 0 {
            self.report.incomplete.push(IncompleteWindow { window: calc.window().clone(), missing });
        }

        if self.print_all || calc.total() > 0 {
            self.sink.write_row(&calc.to_row())?;
            self.report.windows_written += 1;
        } else {
            self.report.windows_omitted += 1;
        }
        Ok(())
    }

    /// Finalize every remaining window in contig then start order, flush the
    /// sink and return the run report together with the sink's writer.
    pub fn close(mut self) -> Result<(EngineReport, W)> {
        while let Some((_, windows)) = self.open.pop_first() {
            self.flush_contig(windows)?;
        }
        let writer = self.sink.finish()?;
        Ok((self.report, writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InWindowCount, MateDistance, TestRead};
    use crate::window::tile_windows;

    type Engine = WindowEngine<TestRead, Vec<u8>>;

    fn dictionary() -> SequenceDictionary {
        SequenceDictionary::from_contigs([("chr1", 500), ("chr2", 300)]).unwrap()
    }

    fn stats() -> (Vec<SharedSingleReadStat<TestRead>>, Vec<SharedPairEndStat<TestRead>>) {
        let single: Vec<SharedSingleReadStat<TestRead>> = vec![Arc::new(InWindowCount::new("reads"))];
        let pair: Vec<SharedPairEndStat<TestRead>> = vec![Arc::new(MateDistance::new("distance"))];
        (single, pair)
    }

    fn engine(windows: &[GenomicWindow], print_all: bool) -> Engine {
        let (single, pair) = stats();
        let sink = TableWriter::new(Vec::new(), "memory");
        WindowEngine::new(&dictionary(), windows, &single, &pair, sink, print_all).unwrap()
    }

    fn lines(engine: Engine) -> (EngineReport, Vec<String>) {
        let (report, out) = engine.close().unwrap();
        let text = String::from_utf8(out).unwrap();
        (report, text.lines().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_end_to_end_single_contig() {
        let windows = tile_windows(&SequenceDictionary::from_contigs([("chr1", 500)]).unwrap(), 200).unwrap();
        let mut engine = engine(&windows, false);

        for read in [
            TestRead::pair("A", 0, 50, 450),
            TestRead::pair("B", 0, 120, 130),
            TestRead::pair("B", 0, 130, 120),
            TestRead::pair("A", 0, 450, 50),
        ] {
            engine.add_read(&read).unwrap();
        }

        let (report, lines) = lines(engine);
        assert_eq!(
            lines,
            vec![
                "contig\tstart\tend\ttotal\tproper\tmissing\treads\tdistance",
                "chr1\t1\t200\t3\t3\t0\t3\t410",
                "chr1\t401\t500\t1\t1\t0\t1\t400",
            ]
        );
        assert_eq!(report.windows_written, 2);
        assert_eq!(report.windows_omitted, 1, "empty middle window is omitted");
        assert!(report.incomplete.is_empty());
    }

    #[test]
    fn test_unpaired_mate_reported_as_missing() {
        let windows = tile_windows(&SequenceDictionary::from_contigs([("chr1", 500)]).unwrap(), 200).unwrap();
        let mut engine = engine(&windows, false);

        // B's mate at 130 never arrives
        for read in [TestRead::pair("A", 0, 50, 450), TestRead::pair("B", 0, 120, 130), TestRead::pair("A", 0, 450, 50)] {
            engine.add_read(&read).unwrap();
        }

        let (report, lines) = lines(engine);
        assert_eq!(lines[1], "chr1\t1\t200\t2\t2\t1\t2\t400");
        assert_eq!(lines[2], "chr1\t401\t500\t1\t1\t0\t1\t400");
        assert_eq!(report.incomplete, vec![IncompleteWindow { window: windows[0].clone(), missing: 1 }]);
    }

    #[test]
    fn test_print_all_keeps_empty_windows() {
        let windows = tile_windows(&dictionary(), 200).unwrap();
        let mut engine = engine(&windows, true);
        engine.add_read(&TestRead::pair("A", 0, 10, 20)).unwrap();
        engine.add_read(&TestRead::pair("A", 0, 20, 10)).unwrap();

        let (report, lines) = lines(engine);
        assert_eq!(lines.len(), 1 + windows.len());
        assert_eq!(lines[2], "chr1\t201\t400\t0\t0\t0\t0\t0");
        assert_eq!(lines[5], "chr2\t201\t300\t0\t0\t0\t0\t0");
        assert_eq!(report.windows_omitted, 0);
    }

    #[test]
    fn test_contig_switch_flushes_earlier_contigs() {
        let windows = tile_windows(&dictionary(), 200).unwrap();
        let mut engine = engine(&windows, false);

        engine.add_read(&TestRead::pair("A", 0, 10, 20)).unwrap();
        assert_eq!(engine.open_windows(), 5);

        engine.add_read(&TestRead::pair("C", 1, 10, 20)).unwrap();
        assert_eq!(engine.open_windows(), 2, "chr1 windows are finalized on the first chr2 record");

        // late chr1 record is not fed anywhere
        engine.add_read(&TestRead::pair("A", 0, 20, 10)).unwrap();

        let (report, lines) = lines(engine);
        assert_eq!(lines[1], "chr1\t1\t200\t1\t1\t1\t1\t0");
        assert_eq!(lines[2], "chr2\t1\t200\t1\t1\t1\t1\t0");
        assert_eq!(report.incomplete.len(), 2);
    }

    #[test]
    fn test_unmapped_records_do_not_flush() {
        let windows = tile_windows(&dictionary(), 200).unwrap();
        let mut engine = engine(&windows, false);

        engine.add_read(&TestRead::pair("A", 0, 10, 20)).unwrap();
        engine.add_read(&TestRead::unmapped("U")).unwrap();
        assert_eq!(engine.open_windows(), 5);
        engine.add_read(&TestRead::pair("A", 0, 20, 10)).unwrap();

        let (report, lines) = lines(engine);
        assert_eq!(lines[1], "chr1\t1\t200\t2\t2\t0\t2\t10");
        assert_eq!(report.unmapped_skipped, 1);
        assert_eq!(report.records_seen, 3);
    }

    #[test]
    fn test_engine_exhausted_after_last_contig() {
        let windows = vec![GenomicWindow::new("chr1", 1, 100)];
        let mut engine = engine(&windows, false);
        engine.add_read(&TestRead::pair("A", 0, 10, 20)).unwrap();
        assert!(!engine.is_exhausted());

        engine.add_read(&TestRead::pair("C", 1, 10, 20)).unwrap();
        assert!(engine.is_exhausted());
        engine.add_read(&TestRead::pair("D", 1, 50, 60)).unwrap();

        let (_, lines) = lines(engine);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_records_between_windows_are_ignored() {
        let windows = vec![GenomicWindow::new("chr1", 1, 100), GenomicWindow::new("chr1", 301, 400)];
        let mut engine = engine(&windows, true);
        engine.add_read(&TestRead::pair("A", 0, 150, 250)).unwrap();

        let (report, lines) = lines(engine);
        assert_eq!(lines[1], "chr1\t1\t100\t0\t0\t0\t0\t0");
        assert_eq!(lines[2], "chr1\t301\t400\t0\t0\t0\t0\t0");
        assert!(report.incomplete.is_empty());
    }

    #[test]
    fn test_header_column_count() {
        let windows = tile_windows(&dictionary(), 200).unwrap();
        let engine = engine(&windows, false);
        let (single, pair) = stats();
        assert_eq!(engine.columns().len(), 3 + single.len() + pair.len());

        let (_, lines) = lines(engine);
        assert_eq!(lines[0].split('\t').count(), 6 + single.len() + pair.len());
    }

    #[test]
    fn test_column_count_mismatch() {
        let windows = tile_windows(&dictionary(), 200).unwrap();
        let (single, pair) = stats();
        let columns = vec!["total".to_string(), "proper".to_string(), "missing".to_string()];
        let result = WindowEngine::with_columns(
            &dictionary(),
            &windows,
            &single,
            &pair,
            columns,
            TableWriter::new(Vec::new(), "memory"),
            false,
        );
        assert!(matches!(result, Err(WindowError::ColumnCountMismatch { expected: 5, found: 3 })));
    }

    #[test]
    fn test_explicit_columns_cannot_repeat_identity_fields() {
        let windows = tile_windows(&dictionary(), 200).unwrap();
        let (single, pair) = stats();
        for identity in ["contig", "start", "end"] {
            let columns: Vec<String> =
                ["total", "proper", "missing", identity, "distance"].iter().map(|c| c.to_string()).collect();
            let result = WindowEngine::with_columns(
                &dictionary(),
                &windows,
                &single,
                &pair,
                columns,
                TableWriter::new(Vec::new(), "memory"),
                false,
            );
            assert!(
                matches!(&result, Err(WindowError::DuplicateColumn(name)) if name == identity),
                "'{}' accepted as a statistic column",
                identity
            );
        }
    }

    #[test]
    fn test_duplicate_stat_names() {
        let single: Vec<SharedSingleReadStat<TestRead>> =
            vec![Arc::new(InWindowCount::new("dup")), Arc::new(InWindowCount::new("dup"))];
        assert!(matches!(column_names(&single, &[]), Err(WindowError::DuplicateColumn(name)) if name == "dup"));

        let reserved: Vec<SharedSingleReadStat<TestRead>> = vec![Arc::new(InWindowCount::new("total"))];
        assert!(matches!(column_names(&reserved, &[]), Err(WindowError::DuplicateColumn(_))));

        let tabbed: Vec<SharedSingleReadStat<TestRead>> = vec![Arc::new(InWindowCount::new("a\tb"))];
        assert!(matches!(column_names(&tabbed, &[]), Err(WindowError::InvalidColumnName(_))));
    }

    #[test]
    fn test_invalid_windows_rejected_before_header() {
        let (single, pair) = stats();
        let result: Result<Engine> = WindowEngine::new(
            &dictionary(),
            &[],
            &single,
            &pair,
            TableWriter::new(Vec::new(), "memory"),
            false,
        );
        match result {
            Err(err) => {
                assert!(matches!(err, WindowError::EmptyWindows));
                assert!(err.is_configuration());
            }
            Ok(_) => panic!("empty window list accepted"),
        }
    }
}
