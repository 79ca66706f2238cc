use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

use log::debug;
use ordered_float::OrderedFloat;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::core::{GeneratorTag, Objective, Solution, SolutionHandle};
use crate::error::{MaestroError, Result};
use crate::population::front::Front;
use crate::population::hall_of_fame::HallOfFame;
use crate::population::fast_non_dominated_sort::fast_non_dominated_sort;

type ValueFingerprint = (Vec<i64>, Vec<OrderedFloat<f64>>);
type PerformanceFingerprint = Vec<OrderedFloat<f64>>;

/// Tunables for [`Population`], as described in the population component of the design.
#[derive(Clone, Debug)]
pub struct PopulationConfig {
    /// Target maximum size after every completed update.
    pub capacity: usize,
    /// If false, reject offers whose fitness vector matches one already registered.
    pub allow_equal_performers: bool,
    /// Merge when `buffer.len() >= update_trigger * capacity`.
    pub update_trigger: f64,
    /// If true, merge on a detached worker thread; else on the offering thread.
    pub concurrent_update: bool,
    /// Lower bound of the selection normal-kernel stddev factor `q`.
    pub q_min: f64,
    /// Upper bound of the selection normal-kernel stddev factor `q`.
    pub q_max: f64,
    /// Curvature of the greed-to-q mapping.
    pub greed_to_q_power: f64,
    /// Restore the original random-symmetric crowding tie-break instead of the stable default.
    pub coin_flip_tie_break: bool,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            allow_equal_performers: true,
            update_trigger: 1.0,
            concurrent_update: false,
            q_min: 0.1,
            q_max: 10.0,
            greed_to_q_power: 5.0,
            coin_flip_tie_break: false,
        }
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(MaestroError::InvalidConfiguration(
                "capacity".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        if !(self.q_min > 0.0 && self.q_max >= self.q_min) {
            return Err(MaestroError::InvalidConfiguration(
                "q_min/q_max".to_string(),
                "must satisfy 0 < q_min <= q_max".to_string(),
            ));
        }
        Ok(())
    }
}

fn fingerprint_values<S: Solution>(solution: &S) -> ValueFingerprint {
    (
        solution.disc_values().to_vec(),
        solution.cont_values().iter().copied().map(OrderedFloat).collect(),
    )
}

fn fingerprint_performance<S: Solution>(solution: &S, num_objectives: usize) -> PerformanceFingerprint {
    (0..num_objectives)
        .map(|i| OrderedFloat(solution.fitness(i)))
        .collect()
}

/// Outcome of a single [`Population::offer`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    Accepted(usize),
    RejectedDuplicateValue,
    RejectedDuplicatePerformance,
}

struct Inner<S> {
    fronts: Vec<Front<S>>,
    buffer: Vec<SolutionHandle<S>>,
    value_registry: HashSet<ValueFingerprint>,
    performance_registry: HashSet<PerformanceFingerprint>,
    next_index: usize,
}

impl<S> Inner<S> {
    fn total_size(&self) -> usize {
        self.buffer.len() + self.fronts.iter().map(|f| f.size()).sum::<usize>()
    }
}

/// Group-merging elitist archive: holds the current Pareto fronts, a buffer of freshly offered but
/// not-yet-merged handles, and the two deduplication registries. Cheaply cloneable (an `Arc` handle
/// to shared interior state), so workers and a detached merge thread can all hold one.
pub struct Population<S> {
    inner: Arc<Mutex<Inner<S>>>,
    objectives: Arc<Vec<Objective>>,
    config: PopulationConfig,
    hall_of_fame: Arc<HallOfFame>,
    hof_logger: Option<Arc<dyn Fn(&crate::population::hall_of_fame::HallOfFameEntry) + Send + Sync>>,
}

impl<S> Clone for Population<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            objectives: Arc::clone(&self.objectives),
            config: self.config.clone(),
            hall_of_fame: Arc::clone(&self.hall_of_fame),
            hof_logger: self.hof_logger.clone(),
        }
    }
}

impl<S: Solution + 'static> Population<S> {
    pub fn new(objectives: Vec<Objective>, config: PopulationConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                fronts: Vec::new(),
                buffer: Vec::new(),
                value_registry: HashSet::new(),
                performance_registry: HashSet::new(),
                next_index: 0,
            })),
            objectives: Arc::new(objectives),
            config,
            hall_of_fame: Arc::new(HallOfFame::new()),
            hof_logger: None,
        }
    }

    pub fn with_hall_of_fame_logger(
        mut self,
        logger: Arc<dyn Fn(&crate::population::hall_of_fame::HallOfFameEntry) + Send + Sync>,
    ) -> Self {
        self.hof_logger = Some(logger);
        self
    }

    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn size(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.fronts.iter().map(|f| f.size()).sum()
    }

    /// Number of fronts currently materialised (i.e. since the last merge).
    pub fn num_fronts(&self) -> usize {
        self.inner.lock().unwrap().fronts.len()
    }

    pub fn first_front_size(&self) -> usize {
        self.inner.lock().unwrap().fronts.first().map(Front::size).unwrap_or(0)
    }

    /// Offer a freshly evaluated solution. Assigns its permanent index at the moment the
    /// population mutex is acquired, so indices increase in lock-acquisition order.
    pub fn offer(&self, solution: S, generator_tag: GeneratorTag) -> OfferOutcome {
        let should_merge;
        let outcome;
        {
            let mut inner = self.inner.lock().unwrap();
            let index = inner.next_index;
            inner.next_index += 1;

            let value_fp = fingerprint_values(&solution);
            if inner.value_registry.contains(&value_fp) {
                debug!("rejected offer {index}: duplicate decision vector");
                return OfferOutcome::RejectedDuplicateValue;
            }
            if !self.config.allow_equal_performers {
                let perf_fp = fingerprint_performance(&solution, self.objectives.len());
                if inner.performance_registry.contains(&perf_fp) {
                    debug!("rejected offer {index}: duplicate fitness vector");
                    return OfferOutcome::RejectedDuplicatePerformance;
                }
                inner.performance_registry.insert(perf_fp);
            }
            inner.value_registry.insert(value_fp);

            let handle = SolutionHandle::new(index, generator_tag, solution);
            inner.buffer.push(handle);
            outcome = OfferOutcome::Accepted(index);

            should_merge = inner.buffer.len() as f64 >= self.config.update_trigger * self.config.capacity as f64
                || inner.buffer.len() >= self.config.capacity;
        }

        if should_merge {
            if self.config.concurrent_update {
                let population = self.clone();
                thread::spawn(move || population.merge());
            } else {
                self.merge();
            }
        }

        outcome
    }

    /// Merge the buffer and current fronts into a fresh set of fronts, sorted and pruned to
    /// capacity. A no-op if the buffer is empty and the population is already within capacity.
    pub fn merge(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.buffer.is_empty() && inner.total_size() <= self.config.capacity {
            return;
        }

        let before = inner.total_size();
        let mut working: Vec<SolutionHandle<S>> = Vec::new();
        working.append(&mut inner.buffer);
        for front in inner.fronts.drain(..) {
            working.extend(front.into_handles());
        }

        let front_groups = fast_non_dominated_sort(&mut working, &self.objectives, Some(self.config.capacity));
        let mut slots: Vec<Option<SolutionHandle<S>>> = working.into_iter().map(Some).collect();

        let mut rng = rand::thread_rng();
        let mut new_fronts: Vec<Front<S>> = Vec::new();
        let mut cumulative = 0usize;
        let mut discard_rest = false;

        for (rank0, idxs) in front_groups.iter().enumerate() {
            let rank = (rank0 + 1) as i32;
            let mut group: Vec<SolutionHandle<S>> = idxs.iter().map(|&i| slots[i].take().unwrap()).collect();

            if discard_rest {
                for h in &mut group {
                    h.push_rank(-1);
                    self.touch_hall_of_fame(h);
                }
                continue;
            }

            let remaining = self.config.capacity.saturating_sub(cumulative);
            if remaining == 0 {
                for h in &mut group {
                    h.push_rank(-1);
                    self.touch_hall_of_fame(h);
                }
                discard_rest = true;
                continue;
            }

            if group.len() > remaining {
                let (mut kept, discarded) = Front::from_handles(group).reduced_split(
                    remaining,
                    &self.objectives,
                    self.config.coin_flip_tie_break,
                    &mut rng,
                );
                for h in kept.solutions_mut() {
                    h.push_rank(rank);
                    self.touch_hall_of_fame(h);
                }
                cumulative += kept.size();
                new_fronts.push(kept);
                for mut h in discarded {
                    h.push_rank(-1);
                    self.touch_hall_of_fame(&h);
                }
                discard_rest = true;
            } else {
                for h in group.iter_mut() {
                    h.push_rank(rank);
                    self.touch_hall_of_fame(h);
                }
                cumulative += group.len();
                new_fronts.push(Front::from_handles(group));
            }
        }

        // Anything the capped sort never classified into a front group at all.
        for slot in slots.iter_mut() {
            if let Some(mut h) = slot.take() {
                h.push_rank(-1);
                self.touch_hall_of_fame(&h);
            }
        }

        let after: usize = new_fronts.iter().map(Front::size).sum();
        debug!(
            "population merge: {before} candidates -> {after} kept across {} fronts",
            new_fronts.len()
        );

        inner.fronts = new_fronts;
        self.rebuild_registries(&mut inner);
    }

    fn touch_hall_of_fame(&self, handle: &SolutionHandle<S>) {
        if self.hall_of_fame.touch(handle) {
            if let Some(logger) = &self.hof_logger {
                if let Some(entry) = self
                    .hall_of_fame
                    .snapshot()
                    .into_iter()
                    .find(|e| e.index == handle.index())
                {
                    logger(&entry);
                }
            }
        }
    }

    fn rebuild_registries(&self, inner: &mut Inner<S>) {
        inner.value_registry.clear();
        inner.performance_registry.clear();
        for front in &inner.fronts {
            for h in front.solutions() {
                inner.value_registry.insert(fingerprint_values(h.solution()));
                if !self.config.allow_equal_performers {
                    inner
                        .performance_registry
                        .insert(fingerprint_performance(h.solution(), self.objectives.len()));
                }
            }
        }
    }

    /// A snapshot of the current fronts' sizes, in domination order.
    pub fn front_sizes(&self) -> Vec<usize> {
        self.inner.lock().unwrap().fronts.iter().map(Front::size).collect()
    }

    /// Run `f` against a read snapshot of the current fronts, under the population mutex.
    pub fn with_fronts<R>(&self, f: impl FnOnce(&[Front<S>]) -> R) -> R {
        let inner = self.inner.lock().unwrap();
        f(&inner.fronts)
    }

    fn q_for_greed(&self, greed: f64) -> f64 {
        let greed = greed.clamp(-1.0, 1.0);
        self.config.q_min + (self.config.q_max - self.config.q_min) * (1.0 - greed.abs()).powf(self.config.greed_to_q_power)
    }

    /// Sample `count` handles uniformly with replacement across the whole population.
    pub fn select(&self, count: usize, rng: &mut impl Rng) -> Vec<SelectedParent> {
        self.select_greedy(count, 0.0, rng)
    }

    /// Sample `count` handles with a front-weighted kernel controlled by `greed`.
    ///
    /// Front weights derive from a normal density centred at rank 1 with stddev `q *
    /// population_size`, where `q` shrinks toward `q_min` as `|greed|` approaches 1; positive
    /// greed accumulates weight from the front closest to rank 1 outward, negative greed from the
    /// worst front inward.
    pub fn select_greedy(&self, count: usize, greed: f64, rng: &mut impl Rng) -> Vec<SelectedParent> {
        if count == 0 {
            return Vec::new();
        }
        let inner = self.inner.lock().unwrap();
        if inner.fronts.is_empty() {
            return Vec::new();
        }

        let population_size: usize = inner.fronts.iter().map(Front::size).sum();
        let q = self.q_for_greed(greed);
        let sigma = (q * population_size as f64).max(1e-9);

        let walk_order: Vec<usize> = if greed >= 0.0 {
            (0..inner.fronts.len()).collect()
        } else {
            (0..inner.fronts.len()).rev().collect()
        };

        let mut weights: Vec<f64> = vec![0.0; inner.fronts.len()];
        let mut rank_cursor = 0usize;
        for &fi in &walk_order {
            let size = inner.fronts[fi].size();
            if size == 0 {
                continue;
            }
            let mut weight = 0.0_f64;
            for offset in 1..=size {
                weight += gaussian_density((rank_cursor + offset) as f64, 1.0, sigma);
            }
            weights[fi] = weight;
            rank_cursor += size;
        }

        let dist = WeightedIndex::new(&weights).expect("at least one non-empty front");
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let fi = dist.sample(rng);
            let front = &inner.fronts[fi];
            let pick = rng.gen_range(0..front.size());
            let handle = &front.solutions()[pick];
            let fitness = (0..self.objectives.len()).map(|i| handle.solution().fitness(i)).collect();
            out.push(SelectedParent {
                generator_tag: handle.generator_tag().clone(),
                index: handle.index(),
                front_index: fi,
                disc_values: handle.solution().disc_values().to_vec(),
                cont_values: handle.solution().cont_values().to_vec(),
                fitness,
            });
        }
        out
    }
}

/// A parent drawn by [`Population::select`]/[`Population::select_greedy`]: a cheap, owned copy of
/// the decision vector (generators never need to hold a live reference into the population).
#[derive(Clone, Debug)]
pub struct SelectedParent {
    pub generator_tag: GeneratorTag,
    pub index: usize,
    pub front_index: usize,
    pub disc_values: Vec<i64>,
    pub cont_values: Vec<f64>,
    /// The parent's fitness for every objective, in objective-index order.
    pub fitness: Vec<f64>,
}

/// Gaussian density (unnormalized is fine here, only relative weight matters).
fn gaussian_density(x: f64, mean: f64, sigma: f64) -> f64 {
    let z = (x - mean) / sigma;
    (-0.5 * z * z).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObjectiveKind;

    #[derive(Debug, Clone)]
    struct Pt(f64, f64);
    impl Solution for Pt {
        fn create_new(_i: usize, _d: &[i64], c: &[f64], _e: Option<&str>) -> Self {
            Pt(c[0], c[1])
        }
        fn id(&self) -> String {
            format!("{},{}", self.0, self.1)
        }
        fn disc_values(&self) -> &[i64] {
            &[]
        }
        fn cont_values(&self) -> &[f64] {
            &[]
        }
        fn fitness(&self, obj_index: usize) -> f64 {
            if obj_index == 0 {
                self.0
            } else {
                self.1
            }
        }
    }

    fn objectives() -> Vec<Objective> {
        vec![
            Objective::new(0, "f1", ObjectiveKind::Minimize),
            Objective::new(1, "f2", ObjectiveKind::Minimize),
        ]
    }

    #[test]
    fn capacity_is_enforced_after_merge() {
        let pop = Population::new(
            objectives(),
            PopulationConfig {
                capacity: 5,
                ..Default::default()
            },
        );
        for i in 0..20 {
            pop.offer(Pt(i as f64, (20 - i) as f64), GeneratorTag::Random);
        }
        pop.merge();
        assert_eq!(pop.size(), 5);
    }

    #[test]
    fn duplicate_value_is_rejected() {
        let pop = Population::new(objectives(), PopulationConfig::default());
        assert!(matches!(pop.offer(Pt(1.0, 2.0), GeneratorTag::Random), OfferOutcome::Accepted(_)));
        assert_eq!(pop.offer(Pt(1.0, 2.0), GeneratorTag::Random), OfferOutcome::RejectedDuplicateValue);
    }

    #[test]
    fn equal_performer_rejection_can_be_disabled_or_enabled() {
        let strict = Population::new(
            objectives(),
            PopulationConfig {
                allow_equal_performers: false,
                ..Default::default()
            },
        );
        assert!(matches!(strict.offer(Pt(0.0, 0.0), GeneratorTag::Random), OfferOutcome::Accepted(_)));
        assert_eq!(
            strict.offer(Pt(0.0, 0.0), GeneratorTag::Random),
            OfferOutcome::RejectedDuplicateValue
        );
        assert_eq!(
            strict.offer(Pt(1e-20, 1e-20), GeneratorTag::Random),
            OfferOutcome::RejectedDuplicatePerformance
        );

        let lenient = Population::new(objectives(), PopulationConfig::default());
        assert!(matches!(lenient.offer(Pt(0.0, 0.0), GeneratorTag::Random), OfferOutcome::Accepted(_)));
        assert!(matches!(
            lenient.offer(Pt(1e-20, 1e-20), GeneratorTag::Random),
            OfferOutcome::Accepted(_)
        ));
    }

    #[test]
    fn select_with_zero_count_is_empty() {
        let pop = Population::new(objectives(), PopulationConfig::default());
        pop.offer(Pt(0.0, 0.0), GeneratorTag::Random);
        pop.merge();
        let mut rng = rand::thread_rng();
        assert!(pop.select(0, &mut rng).is_empty());
    }

    #[test]
    fn greedy_selection_favors_front_one() {
        let pop = Population::new(
            objectives(),
            PopulationConfig {
                capacity: 10,
                ..Default::default()
            },
        );
        // Five points on the Pareto front, five clearly dominated.
        for i in 0..5 {
            pop.offer(Pt(i as f64, (4 - i) as f64), GeneratorTag::Random);
        }
        for i in 0..5 {
            pop.offer(Pt(10.0 + i as f64, 10.0 + (4 - i) as f64), GeneratorTag::Random);
        }
        pop.merge();
        assert_eq!(pop.front_sizes()[0], 5);

        let mut rng = rand::thread_rng();
        let picks = pop.select_greedy(2000, 1.0, &mut rng);
        let front1_fraction = picks.iter().filter(|p| p.front_index == 0).count() as f64 / picks.len() as f64;
        assert!(front1_fraction >= 0.95, "front1_fraction = {front1_fraction}");

        let uniform_picks = pop.select_greedy(4000, 0.0, &mut rng);
        let uniform_fraction =
            uniform_picks.iter().filter(|p| p.front_index == 0).count() as f64 / uniform_picks.len() as f64;
        assert!(
            (0.4..=0.6).contains(&uniform_fraction),
            "uniform_fraction = {uniform_fraction}"
        );
    }

    #[test]
    fn hall_of_fame_records_rank_one_handles() {
        let pop = Population::new(
            objectives(),
            PopulationConfig {
                capacity: 3,
                ..Default::default()
            },
        );
        for i in 0..3 {
            pop.offer(Pt(i as f64, (2 - i) as f64), GeneratorTag::Random);
        }
        pop.merge();
        assert!(pop.hall_of_fame().len() >= 1);
    }
}
