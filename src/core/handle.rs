use crate::core::solution::GeneratorTag;

/// Rank history entries. `1` means the handle held rank 1 (first front) after that update; `-1`
/// means the handle was evicted from the population at that update.
pub const EVICTED_RANK: i32 = -1;

/// Wraps an evaluated [`crate::core::solution::Solution`] with the engine-owned mutable state the
/// population needs: its permanent index, the generator that produced it, transient sort bookkeeping,
/// and the append-only rank history.
///
/// Unlike the Java original, which stashes `crowding_distance`, `domination_counter` and friends in
/// a single `String -> f64` attribute bag, these are named fields here: the bag only existed in the
/// original to survive single inheritance, and Rust has no such constraint.
#[derive(Debug)]
pub struct SolutionHandle<S> {
    /// Assigned once, on first offer, and never changed.
    index: usize,
    generator_tag: GeneratorTag,
    solution: S,

    /// Overall crowding distance accumulated during the last [`crate::population::Front::reduced`]
    /// pass. Reset at the start of every pass.
    pub(crate) crowding_distance: f64,
    /// Number of solutions that dominate this one. Valid only during a
    /// [`crate::population::fast_non_dominated_sort`] pass.
    pub(crate) domination_count: usize,
    /// Indices (into the working vector of the current sort pass) of solutions this one dominates.
    pub(crate) children: Vec<usize>,

    rank_history: Vec<i32>,
}

impl<S> SolutionHandle<S> {
    pub fn new(index: usize, generator_tag: GeneratorTag, solution: S) -> Self {
        Self {
            index,
            generator_tag,
            solution,
            crowding_distance: 0.0,
            domination_count: 0,
            children: Vec::new(),
            rank_history: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generator_tag(&self) -> &GeneratorTag {
        &self.generator_tag
    }

    pub fn solution(&self) -> &S {
        &self.solution
    }

    pub fn crowding_distance(&self) -> f64 {
        self.crowding_distance
    }

    pub fn rank_history(&self) -> &[i32] {
        &self.rank_history
    }

    /// The most recent rank, if any update has ranked this handle yet.
    pub fn current_rank(&self) -> Option<i32> {
        self.rank_history.last().copied()
    }

    /// Append a new rank history entry for this update cycle.
    pub fn push_rank(&mut self, rank: i32) {
        self.rank_history.push(rank);
    }

    /// Render the rank history as a run-length-encoded string, e.g. `1x3, 2, -1x5`.
    pub fn rank_history_rle(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut iter = self.rank_history.iter().peekable();
        while let Some(&rank) = iter.next() {
            let mut count = 1usize;
            while iter.peek() == Some(&&rank) {
                iter.next();
                count += 1;
            }
            if count == 1 {
                parts.push(rank.to_string());
            } else {
                parts.push(format!("{rank}x{count}"));
            }
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rle_encoding() {
        let mut h: SolutionHandle<()> = SolutionHandle::new(0, GeneratorTag::Random, ());
        for r in [1, 1, 1, 2, -1, -1, -1, -1, -1] {
            h.push_rank(r);
        }
        assert_eq!(h.rank_history_rle(), "1x3, 2, -1x5");
    }

    #[test]
    fn current_rank_is_last_entry() {
        let mut h: SolutionHandle<()> = SolutionHandle::new(0, GeneratorTag::Random, ());
        assert_eq!(h.current_rank(), None);
        h.push_rank(1);
        h.push_rank(2);
        assert_eq!(h.current_rank(), Some(2));
    }
}
