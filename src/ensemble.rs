use std::time::{Duration, Instant};

use log::debug;

use crate::core::{GeneratorTag, Solution, SolutionRoot};
use crate::generators::Generator;
use crate::population::Population;

/// Tunables for [`Ensemble`].
#[derive(Clone, Debug)]
pub struct EnsembleConfig {
    /// Target fraction of population capacity generated per cycle.
    pub gen_ratio: f64,
    /// Floor on the cycle budget, as a fraction of capacity.
    pub gen_min: f64,
    /// Absolute floor on the cycle budget, regardless of capacity.
    pub abs_gen_min: usize,
    /// How strongly a generator's total population membership weighs its share.
    pub weight_pop: f64,
    /// How strongly a generator's first-front membership weighs its share.
    pub weight_front1: f64,
    /// Baseline share every generator keeps regardless of performance, guaranteeing exploration.
    pub bias: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            gen_ratio: 0.5,
            gen_min: 0.05,
            abs_gen_min: 1,
            weight_pop: 1.0,
            weight_front1: 2.0,
            bias: 1.0,
        }
    }
}

/// One row of the ensemble's per-cycle generation history, surfaced in the report's
/// `[Generator method use]` section.
#[derive(Clone, Debug)]
pub struct GenerationHistoryRow {
    pub generator_id: String,
    pub solutions_generated: usize,
    pub total_wall_time: Duration,
}

impl GenerationHistoryRow {
    pub fn wall_time_per_solution_ms(&self) -> f64 {
        if self.solutions_generated == 0 {
            0.0
        } else {
            self.total_wall_time.as_secs_f64() * 1000.0 / self.solutions_generated as f64
        }
    }
}

/// Allocates each cycle's generation budget across member generators, weighted by their recent
/// contribution to the population and to the first front, with a bias floor so no generator ever
/// starves entirely.
pub struct Ensemble<S: Solution + 'static> {
    generators: Vec<Box<dyn Generator<S>>>,
    config: EnsembleConfig,
    capacity: usize,
}

impl<S: Solution + 'static> Ensemble<S> {
    pub fn new(generators: Vec<Box<dyn Generator<S>>>, config: EnsembleConfig, capacity: usize) -> Self {
        Self {
            generators,
            config,
            capacity,
        }
    }

    fn cycle_budget(&self) -> usize {
        let target = (self.config.gen_ratio * self.capacity as f64).ceil() as usize;
        target.max(self.config.abs_gen_min)
    }

    fn per_generator_floor(&self) -> usize {
        (self.config.gen_min * self.capacity as f64).ceil() as usize
    }

    /// Tally each generator's membership in the population and in the first front by matching
    /// [`GeneratorTag::Named`] against its id.
    fn shares(&self, population: &Population<S>) -> Vec<f64> {
        population.with_fronts(|fronts| {
            self.generators
                .iter()
                .map(|g| {
                    let tag = GeneratorTag::Named(g.id().to_string());
                    let pop_count = fronts.iter().flat_map(|f| f.solutions()).filter(|h| *h.generator_tag() == tag).count();
                    let f1_count = fronts
                        .first()
                        .map(|f| f.solutions().iter().filter(|h| *h.generator_tag() == tag).count())
                        .unwrap_or(0);
                    self.config.weight_pop * pop_count as f64 + self.config.weight_front1 * f1_count as f64 + self.config.bias
                })
                .collect()
        })
    }

    /// Query every generator for its allocated share of this cycle's budget, returning the
    /// produced roots and a generation-history row per generator.
    pub fn generate(&self, population: &Population<S>) -> (Vec<SolutionRoot>, Vec<GenerationHistoryRow>) {
        if self.generators.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let shares = self.shares(population);
        let total: f64 = shares.iter().sum();
        let budget = self.cycle_budget();
        let floor = self.per_generator_floor();

        let allocations: Vec<usize> = shares
            .iter()
            .map(|share| {
                let raw = if total > 0.0 {
                    (share / total) * budget as f64
                } else {
                    budget as f64 / self.generators.len() as f64
                };
                (raw.round() as usize).max(floor)
            })
            .collect();

        let mut roots = Vec::new();
        let mut history = Vec::with_capacity(self.generators.len());
        for (generator, allocation) in self.generators.iter().zip(allocations) {
            let start = Instant::now();
            let produced = generator.generate(population, allocation);
            let elapsed = start.elapsed();
            debug!(
                "ensemble: generator '{}' produced {} of {} requested in {:?}",
                generator.id(),
                produced.len(),
                allocation,
                elapsed
            );
            history.push(GenerationHistoryRow {
                generator_id: generator.id().to_string(),
                solutions_generated: produced.len(),
                total_wall_time: elapsed,
            });
            roots.extend(produced);
        }

        (roots, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Objective, ObjectiveKind};
    use crate::population::PopulationConfig;

    #[derive(Debug, Clone)]
    struct Pt(f64, f64);
    impl Solution for Pt {
        fn create_new(_i: usize, _d: &[i64], c: &[f64], _e: Option<&str>) -> Self {
            Pt(c[0], c[1])
        }
        fn id(&self) -> String {
            "pt".to_string()
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

    struct FixedGenerator {
        id: String,
        produced_len: usize,
    }
    impl<S: Solution + 'static> Generator<S> for FixedGenerator {
        fn id(&self) -> &str {
            &self.id
        }
        fn generate(&self, _population: &Population<S>, count: usize) -> Vec<SolutionRoot> {
            (0..count.min(self.produced_len))
                .map(|_| SolutionRoot::new(vec![], vec![0.0], GeneratorTag::Named(self.id.clone())))
                .collect()
        }
    }

    #[test]
    fn every_generator_gets_at_least_the_floor() {
        let objectives = vec![
            Objective::new(0, "f1", ObjectiveKind::Minimize),
            Objective::new(1, "f2", ObjectiveKind::Minimize),
        ];
        let population: Population<Pt> = Population::new(objectives, PopulationConfig::default());

        let generators: Vec<Box<dyn Generator<Pt>>> = vec![
            Box::new(FixedGenerator {
                id: "a".to_string(),
                produced_len: 100,
            }),
            Box::new(FixedGenerator {
                id: "b".to_string(),
                produced_len: 100,
            }),
        ];
        let ensemble = Ensemble::new(generators, EnsembleConfig::default(), 20);
        let (roots, history) = ensemble.generate(&population);
        assert_eq!(history.len(), 2);
        assert!(!roots.is_empty());
        for row in &history {
            assert!(row.solutions_generated >= 1);
        }
    }
}
