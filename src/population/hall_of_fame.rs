use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::{GeneratorTag, Solution, SolutionHandle};

/// A historical snapshot of a solution that reached rank 1 at some point, captured as plain owned
/// data so it survives the handle's eventual eviction from the population's fronts.
#[derive(Debug, Clone)]
pub struct HallOfFameEntry {
    pub index: usize,
    pub id: String,
    pub generator_tag: GeneratorTag,
    pub disc_values: Vec<i64>,
    pub cont_values: Vec<f64>,
    pub report: Vec<String>,
    pub rank_history: Vec<i32>,
}

/// Map from solution index to the handles that ever reached rank 1, kept for historical reporting
/// even after the live handle is crowded out of the population.
///
/// Inserts are idempotent on index: a solution enters the hall of fame exactly once, the moment it
/// first attains rank 1. Every later merge that still concerns an already-recorded index refreshes
/// its rank history so the final report reflects what ultimately happened to it (including eviction).
#[derive(Debug, Default)]
pub struct HallOfFame {
    entries: Mutex<HashMap<usize, HallOfFameEntry>>,
}

impl HallOfFame {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile this handle's rank history with the hall of fame. Returns `true` if this is the
    /// moment the handle is newly admitted (the only time a persistent log line should be written).
    pub fn touch<S: Solution>(&self, handle: &SolutionHandle<S>) -> bool {
        let rank1_now = handle.current_rank() == Some(1);
        let mut entries = self.entries.lock().unwrap();
        let already_present = entries.contains_key(&handle.index());
        if !already_present && !rank1_now {
            return false;
        }

        let entry = entries.entry(handle.index()).or_insert_with(|| HallOfFameEntry {
            index: handle.index(),
            id: handle.solution().id(),
            generator_tag: handle.generator_tag().clone(),
            disc_values: handle.solution().disc_values().to_vec(),
            cont_values: handle.solution().cont_values().to_vec(),
            report: handle.solution().report(),
            rank_history: Vec::new(),
        });
        entry.rank_history = handle.rank_history().to_vec();

        !already_present && rank1_now
    }

    /// All entries, sorted by index for deterministic reporting.
    pub fn snapshot(&self) -> Vec<HallOfFameEntry> {
        let entries = self.entries.lock().unwrap();
        let mut out: Vec<HallOfFameEntry> = entries.values().cloned().collect();
        out.sort_by_key(|e| e.index);
        out
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dummy;
    impl Solution for Dummy {
        fn create_new(_i: usize, _d: &[i64], _c: &[f64], _e: Option<&str>) -> Self {
            Dummy
        }
        fn id(&self) -> String {
            "dummy".to_string()
        }
        fn disc_values(&self) -> &[i64] {
            &[]
        }
        fn cont_values(&self) -> &[f64] {
            &[]
        }
        fn fitness(&self, _obj_index: usize) -> f64 {
            0.0
        }
    }

    #[test]
    fn insert_is_idempotent_and_gated_on_rank_one() {
        let hof = HallOfFame::new();
        let mut h = SolutionHandle::new(0, GeneratorTag::Random, Dummy);
        h.push_rank(2);
        assert!(!hof.touch(&h), "rank 2 must not admit to the hall of fame");
        assert!(hof.is_empty());

        h.push_rank(1);
        assert!(hof.touch(&h), "first rank-1 attainment must admit once");
        assert_eq!(hof.len(), 1);

        h.push_rank(1);
        assert!(!hof.touch(&h), "repeated rank 1 must not re-admit");
        assert_eq!(hof.len(), 1);

        h.push_rank(-1);
        assert!(!hof.touch(&h));
        let snapshot = hof.snapshot();
        assert_eq!(snapshot[0].rank_history, vec![2, 1, 1, -1]);
    }

    #[test]
    fn never_reached_rank_one_is_never_recorded() {
        let hof = HallOfFame::new();
        let mut h = SolutionHandle::new(3, GeneratorTag::Random, Dummy);
        h.push_rank(4);
        h.push_rank(-1);
        assert!(!hof.touch(&h));
        assert!(hof.is_empty());
    }
}
