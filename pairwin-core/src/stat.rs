//! Statistic contracts consumed by the window calculator.
//!
//! Two closed families:
//! - **SingleReadStat**: one value per proper, in-window read, folded with `reduce`.
//! - **PairEndStat**: one intermediate per mate, merged when the window has
//!   seen both mates, then folded with `reduce`.
//!
//! Both are written against typed values. The calculator holds them through
//! the object-safe [`DynSingleReadStat`] / [`DynPairEndStat`] handles, which
//! hand out one accumulator per window.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// Statistic computed from each read on its own.
///
/// `reduce` must be associative and commutative: reads are folded in
/// whatever order the stream delivers them.
pub trait SingleReadStat<R> {
    type Value;

    /// Stable name, used as the output column header.
    fn name(&self) -> &str;
    /// Identity value of `reduce`.
    fn init(&self) -> Self::Value;
    fn compute(&self, record: &R) -> Self::Value;
    fn reduce(&self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn format(&self, value: &Self::Value) -> String;
}

/// Statistic computed over both mates of a fragment.
///
/// `merge` is order-sensitive: `first` is the mate the window observed first,
/// which is not necessarily the first mate of the template.
pub trait PairEndStat<R> {
    type Intermediate;
    type Value;

    fn name(&self) -> &str;
    fn init(&self) -> Self::Value;
    fn compute_first(&self, record: &R) -> Self::Intermediate;
    fn compute_second(&self, record: &R) -> Self::Intermediate;
    fn merge(&self, first: Self::Intermediate, second: Self::Intermediate) -> Self::Value;
    fn reduce(&self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn format(&self, value: &Self::Value) -> String;
}

// ============================================================================
// Type-erased handles
// ============================================================================

/// Intermediate value of one pair-end statistic for a mate waiting in a cache.
pub type PendingValue = Box<dyn Any>;

/// Running aggregate of one single-read statistic inside one window.
pub trait SingleReadAccumulator<R> {
    fn add(&mut self, record: &R);
    fn format(&self) -> String;
}

/// Running aggregate of one pair-end statistic inside one window.
pub trait PairEndAccumulator<R> {
    fn first(&self, record: &R) -> PendingValue;
    /// Merge the cached first-mate value with `record` and fold the result.
    fn complete(&mut self, first: PendingValue, record: &R);
    fn format(&self) -> String;
}

pub trait DynSingleReadStat<R> {
    fn name(&self) -> &str;
    fn accumulator(self: Arc<Self>) -> Box<dyn SingleReadAccumulator<R>>;
}

pub trait DynPairEndStat<R> {
    fn name(&self) -> &str;
    fn accumulator(self: Arc<Self>) -> Box<dyn PairEndAccumulator<R>>;
}

/// Single-read statistic shared by every window of an engine.
pub type SharedSingleReadStat<R> = Arc<dyn DynSingleReadStat<R>>;
/// Pair-end statistic shared by every window of an engine.
pub type SharedPairEndStat<R> = Arc<dyn DynPairEndStat<R>>;

struct SingleSlot<S: SingleReadStat<R>, R> {
    stat: Arc<S>,
    value: Option<S::Value>,
    _record: PhantomData<fn(&R)>,
}

impl<S, R> SingleReadAccumulator<R> for SingleSlot<S, R>
where
    S: SingleReadStat<R>,
{
    fn add(&mut self, record: &R) {
        let computed = self.stat.compute(record);
        let acc = self.value.take().unwrap_or_else(|| self.stat.init());
        self.value = Some(self.stat.reduce(computed, acc));
    }

    fn format(&self) -> String {
        match &self.value {
            Some(value) => self.stat.format(value),
            None => self.stat.format(&self.stat.init()),
        }
    }
}

impl<S, R> DynSingleReadStat<R> for S
where
    S: SingleReadStat<R> + 'static,
    R: 'static,
{
    fn name(&self) -> &str {
        SingleReadStat::name(self)
    }

    fn accumulator(self: Arc<Self>) -> Box<dyn SingleReadAccumulator<R>> {
        let value = Some(self.init());
        Box::new(SingleSlot { stat: self, value, _record: PhantomData })
    }
}

struct PairSlot<S: PairEndStat<R>, R> {
    stat: Arc<S>,
    value: Option<S::Value>,
    _record: PhantomData<fn(&R)>,
}

impl<S, R> PairEndAccumulator<R> for PairSlot<S, R>
where
    S: PairEndStat<R>,
    S::Intermediate: 'static,
{
    fn first(&self, record: &R) -> PendingValue {
        Box::new(self.stat.compute_first(record))
    }

    fn complete(&mut self, first: PendingValue, record: &R) {
        // pending values are index-aligned with the accumulators that produced them
        let first = match first.downcast::<S::Intermediate>() {
            Ok(first) => *first,
            Err(_) => unreachable!(
                "pending value for '{}' produced by another statistic",
                PairEndStat::name(&*self.stat)
            ),
        };
        let merged = self.stat.merge(first, self.stat.compute_second(record));
        let acc = self.value.take().unwrap_or_else(|| self.stat.init());
        self.value = Some(self.stat.reduce(merged, acc));
    }

    fn format(&self) -> String {
        match &self.value {
            Some(value) => self.stat.format(value),
            None => self.stat.format(&self.stat.init()),
        }
    }
}

impl<S, R> DynPairEndStat<R> for S
where
    S: PairEndStat<R> + 'static,
    S::Intermediate: 'static,
    R: 'static,
{
    fn name(&self) -> &str {
        PairEndStat::name(self)
    }

    fn accumulator(self: Arc<Self>) -> Box<dyn PairEndAccumulator<R>> {
        let value = Some(self.init());
        Box::new(PairSlot { stat: self, value, _record: PhantomData })
    }
}
