//! Step-sequenced index generators.
//!
//! An indexer walks a position forward by a cycle of deltas, so irregular
//! walks ("three corners, then the next face", "A B, B C, C A") become data
//! instead of nested loops. The delta cycle wraps independently of the
//! bounds check.

/// Index generator driven by `get()`, `next()` and `available()`
pub trait Indexer {
    type Item;

    /// Whether [`Indexer::get`] may be called
    fn available(&self) -> bool;

    /// Current index.
    ///
    /// # Panics
    /// Panics when the indexer is not [`available`](Indexer::available).
    fn get(&self) -> Self::Item;

    /// Advance by the next delta of the cycle. Returns [`Indexer::available`].
    fn next(&mut self) -> bool;

    /// Advance by `step`, leaving the delta cycle where it is.
    /// Returns [`Indexer::available`].
    fn advance(&mut self, step: isize) -> bool;
}

/// Repeating list of position increments
#[derive(Debug, Clone)]
struct DeltaCycle {
    deltas: Vec<isize>,
    cursor: usize,
}

impl DeltaCycle {
    fn new(deltas: Vec<isize>) -> Self {
        assert!(!deltas.is_empty(), "an indexer needs at least one delta");
        Self { deltas, cursor: 0 }
    }

    fn take(&mut self) -> isize {
        let delta = self.deltas[self.cursor];
        self.cursor += 1;
        if self.cursor >= self.deltas.len() {
            self.cursor = 0;
        }
        delta
    }
}

/// Produces indices in `[begin, pastend)` moving in the configured steps.
///
/// If the steps add up to 0 it keeps circling and never runs out.
#[derive(Debug, Clone)]
pub struct IndexerRanged {
    begin: isize,
    pastend: isize,
    index: isize,
    cycle: DeltaCycle,
}

impl IndexerRanged {
    pub fn new(begin: usize, pastend: usize) -> Self {
        Self::with_deltas(begin, pastend, vec![1])
    }

    /// # Panics
    /// Panics if `deltas` is empty.
    pub fn with_deltas(begin: usize, pastend: usize, deltas: Vec<isize>) -> Self {
        let begin = to_position(begin);
        Self {
            begin,
            pastend: to_position(pastend),
            index: begin,
            cycle: DeltaCycle::new(deltas),
        }
    }
}

impl Indexer for IndexerRanged {
    type Item = usize;

    fn available(&self) -> bool {
        self.begin <= self.index && self.index < self.pastend
    }

    fn get(&self) -> usize {
        assert!(
            self.available(),
            "ranged indexer at {} is outside [{}, {})",
            self.index,
            self.begin,
            self.pastend
        );
        self.index as usize
    }

    fn next(&mut self) -> bool {
        self.index += self.cycle.take();
        self.available()
    }

    fn advance(&mut self, step: isize) -> bool {
        self.index += step;
        self.available()
    }
}

/// Looks indices up in a backing slice instead of producing them directly
#[derive(Debug, Clone)]
pub struct IndexerIndirect<'a, T> {
    backing: &'a [T],
    position: isize,
    cycle: DeltaCycle,
}

impl<'a, T: Copy> IndexerIndirect<'a, T> {
    pub fn new(backing: &'a [T]) -> Self {
        Self::with_deltas(backing, vec![1])
    }

    /// # Panics
    /// Panics if `deltas` is empty.
    pub fn with_deltas(backing: &'a [T], deltas: Vec<isize>) -> Self {
        Self {
            backing,
            position: 0,
            cycle: DeltaCycle::new(deltas),
        }
    }
}

impl<T: Copy> Indexer for IndexerIndirect<'_, T> {
    type Item = T;

    fn available(&self) -> bool {
        0 <= self.position && (self.position as usize) < self.backing.len()
    }

    fn get(&self) -> T {
        assert!(
            self.available(),
            "indirect indexer at {} is outside a lookup of {}",
            self.position,
            self.backing.len()
        );
        self.backing[self.position as usize]
    }

    fn next(&mut self) -> bool {
        self.position += self.cycle.take();
        self.available()
    }

    fn advance(&mut self, step: isize) -> bool {
        self.position += step;
        self.available()
    }
}

fn to_position(index: usize) -> isize {
    isize::try_from(index).expect("index does not fit in isize")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<I: Indexer>(mut indexer: I) -> Vec<I::Item> {
        let mut results = Vec::new();
        while indexer.available() {
            results.push(indexer.get());
            indexer.next();
        }
        results
    }

    #[test]
    fn test_ranged_default() {
        assert_eq!(drain(IndexerRanged::new(0, 10)), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_ranged_deltas() {
        let results = drain(IndexerRanged::with_deltas(0, 10, vec![0, 1]));
        let expected: Vec<usize> = (0..10).flat_map(|i| [i, i]).collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn test_ranged_empty_range() {
        let indexer = IndexerRanged::new(4, 4);
        assert!(!indexer.available());
    }

    #[test]
    fn test_ranged_zero_sum_cycle_keeps_circling() {
        let mut indexer = IndexerRanged::with_deltas(0, 3, vec![1, 1, -2]);
        let mut results = Vec::new();
        for _ in 0..7 {
            results.push(indexer.get());
            assert!(indexer.next());
        }
        assert_eq!(results, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_ranged_lines_cycle() {
        let mut indexer = IndexerRanged::with_deltas(0, 3, vec![1, 0, 1, 0, -2, 0]);
        let mut results = Vec::new();
        for _ in 0..12 {
            results.push(indexer.get());
            indexer.next();
        }
        assert_eq!(results, vec![0, 1, 1, 2, 2, 0, 0, 1, 1, 2, 2, 0]);
    }

    #[test]
    fn test_advance_ignores_cycle() {
        let mut indexer = IndexerRanged::with_deltas(0, 10, vec![0, 1]);
        indexer.next(); // +0
        assert!(indexer.advance(5));
        assert_eq!(indexer.get(), 5);
        indexer.next(); // cycle resumes at +1
        assert_eq!(indexer.get(), 6);
        assert!(!indexer.advance(4));
        assert!(indexer.advance(-1));
        assert_eq!(indexer.get(), 9);
    }

    #[test]
    fn test_ranged_below_begin_is_unavailable() {
        let mut indexer = IndexerRanged::new(2, 5);
        assert!(!indexer.advance(-1));
    }

    #[test]
    fn test_indirect_default() {
        let lookup = [1, 2, 3, 4, 5];
        assert_eq!(drain(IndexerIndirect::new(&lookup)), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_indirect_deltas() {
        let lookup = [1, 2, 3, 4, 5];
        assert_eq!(
            drain(IndexerIndirect::with_deltas(&lookup, vec![0, 1])),
            vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5]
        );
    }

    #[test]
    fn test_indirect_empty_lookup() {
        let lookup: [usize; 0] = [];
        assert!(!IndexerIndirect::new(&lookup).available());
    }

    #[test]
    #[should_panic(expected = "at least one delta")]
    fn test_empty_deltas_panic() {
        let _ = IndexerRanged::with_deltas(0, 10, Vec::new());
    }

    #[test]
    #[should_panic]
    fn test_get_when_unavailable_panics() {
        let lookup = [7u32];
        let mut indexer = IndexerIndirect::new(&lookup);
        indexer.next();
        indexer.get();
    }
}
