use std::sync::Mutex;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::{ContinuousVariable, DiscreteVariable, GeneratorTag, Problem, Solution, SolutionRoot};
use crate::error::{MaestroError, Result};
use crate::generators::Generator;
use crate::population::Population;

/// Discrete mutation operator weights: random resample, +-1 adjacent step, or snap to a bound.
/// Non-scalar (labelled, non-ordinal) discrete variables always use the random operator regardless
/// of these weights, since "adjacent"/"boundary" are meaningless without an ordering.
#[derive(Clone, Debug)]
pub struct DiscreteMutationWeights {
    pub random: f64,
    pub adjacent: f64,
    pub boundary: f64,
}

impl Default for DiscreteMutationWeights {
    fn default() -> Self {
        Self {
            random: 0.5,
            adjacent: 0.35,
            boundary: 0.15,
        }
    }
}

/// Tunables for [`GeneticAlgorithm`].
#[derive(Clone, Debug)]
pub struct GeneticAlgorithmConfig {
    pub id: String,
    /// Greed passed to `population.select(2, greed)` when drawing parents.
    pub parent_greed: f64,
    /// Number of crossover split points; yields `points + 1` partitions.
    pub points: usize,
    /// Probability a partition uses point-mode crossover instead of uniform-mode.
    pub point_uniform: f64,
    /// In uniform-mode, per-variable probability of inheriting from parent 1.
    pub p_uniform: f64,
    /// Which continuous uniform-crossover sub-method to use.
    pub continuous_uniform_method: ContinuousUniformMethod,
    /// Scales the extended-range epsilon / normal stddev for continuous uniform crossover.
    pub unif_dist_param: f64,
    /// Per-position mutation probability.
    pub mutation_prob: f64,
    pub discrete_mutation_weights: DiscreteMutationWeights,
    /// Continuous mutation stddev as a fraction of variable range; `NaN` means uniform mutation
    /// across the whole range instead of a Gaussian perturbation.
    pub gaussian_mutation: f64,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            id: "ga".to_string(),
            parent_greed: 0.5,
            points: 1,
            point_uniform: 0.5,
            p_uniform: 0.5,
            continuous_uniform_method: ContinuousUniformMethod::EitherOr,
            unif_dist_param: 0.5,
            mutation_prob: 0.1,
            discrete_mutation_weights: DiscreteMutationWeights::default(),
            gaussian_mutation: f64::NAN,
        }
    }
}

/// The three continuous uniform-crossover sub-methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContinuousUniformMethod {
    /// Pick one parent's value outright.
    EitherOr,
    /// Sample uniformly in `[min(v1,v2) - eps, max(v1,v2) + eps]`, clamped to bounds.
    ExtendedRange,
    /// Sample normally, mean = the chosen parent's value, stddev scaled by `|v2 - v1|`, clamped.
    Normal,
}

/// Genetic-algorithm generator: draws two parents via rank-weighted selection, recombines their
/// decision vectors by partitioned crossover, then mutates the result.
///
/// Grounded on the same crossover/mutation split the teacher crate uses for its SBX/polynomial
/// operators (`operators::crossover`/`operators::mutation`), adapted to the simpler partitioned
/// discrete/continuous scheme this search uses instead of simulated binary crossover.
pub struct GeneticAlgorithm {
    config: GeneticAlgorithmConfig,
    discrete_vars: Vec<DiscreteVariable>,
    continuous_vars: Vec<ContinuousVariable>,
    rng: Mutex<ChaCha8Rng>,
}

impl GeneticAlgorithm {
    pub fn new(problem: &Problem, config: GeneticAlgorithmConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.point_uniform) {
            return Err(MaestroError::InvalidConfiguration(
                "point_uniform".to_string(),
                "must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.mutation_prob) {
            return Err(MaestroError::InvalidConfiguration(
                "mutation_prob".to_string(),
                "must be between 0 and 1".to_string(),
            ));
        }
        Ok(Self {
            config,
            discrete_vars: problem.discrete_vars().to_vec(),
            continuous_vars: problem.continuous_vars().to_vec(),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        })
    }

    fn partitions(&self, rng: &mut impl Rng, len: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        let mut splits: Vec<f64> = (0..self.config.points).map(|_| rng.gen_range(0.0..1.0)).collect();
        splits.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut boundaries: Vec<usize> = splits
            .iter()
            .map(|f| ((f * len as f64).floor() as usize).min(len))
            .collect();
        boundaries.push(len);
        boundaries.dedup();
        boundaries
    }

    fn crossover_discrete(&self, rng: &mut impl Rng, p1: &[i64], p2: &[i64]) -> Vec<i64> {
        let boundaries = self.partitions(rng, p1.len());
        let mut child = vec![0i64; p1.len()];
        let mut start = 0usize;
        for (part_idx, &end) in boundaries.iter().enumerate() {
            let point_mode = rng.gen_range(0.0..1.0) < self.config.point_uniform;
            for i in start..end {
                let from_parent1 = if point_mode {
                    part_idx % 2 == 0
                } else {
                    rng.gen_range(0.0..1.0) < self.config.p_uniform
                };
                child[i] = if from_parent1 { p1[i] } else { p2[i] };
            }
            start = end;
        }
        child
    }

    fn crossover_continuous(&self, rng: &mut impl Rng, p1: &[f64], p2: &[f64]) -> Vec<f64> {
        let boundaries = self.partitions(rng, p1.len());
        let mut child = vec![0.0; p1.len()];
        let mut start = 0usize;
        for (part_idx, &end) in boundaries.iter().enumerate() {
            let point_mode = rng.gen_range(0.0..1.0) < self.config.point_uniform;
            for i in start..end {
                child[i] = if point_mode {
                    if part_idx % 2 == 0 {
                        p1[i]
                    } else {
                        p2[i]
                    }
                } else {
                    self.uniform_continuous_value(rng, p1[i], p2[i], &self.continuous_vars[i])
                };
            }
            start = end;
        }
        child
    }

    fn uniform_continuous_value(&self, rng: &mut impl Rng, v1: f64, v2: f64, var: &ContinuousVariable) -> f64 {
        let from_parent1 = rng.gen_range(0.0..1.0) < self.config.p_uniform;
        match self.config.continuous_uniform_method {
            ContinuousUniformMethod::EitherOr => {
                if from_parent1 {
                    v1
                } else {
                    v2
                }
            }
            ContinuousUniformMethod::ExtendedRange => {
                let lo = v1.min(v2);
                let hi = v1.max(v2);
                let eps = self.config.unif_dist_param * (v2 - v1).abs() / 2.0;
                var.validate(rng.gen_range((lo - eps)..=(hi + eps)))
            }
            ContinuousUniformMethod::Normal => {
                // Resolved fall-through: emit this sample unconditionally, never fall into a
                // second branch.
                let mean = if from_parent1 { v1 } else { v2 };
                let stddev = self.config.unif_dist_param * (v2 - v1).abs();
                let sample = if stddev > 0.0 {
                    mean + sample_standard_normal(rng) * stddev
                } else {
                    mean
                };
                var.validate(sample)
            }
        }
    }

    fn mutate_discrete(&self, rng: &mut impl Rng, values: &mut [i64]) {
        for (i, var) in self.discrete_vars.iter().enumerate() {
            if rng.gen_range(0.0..1.0) >= self.config.mutation_prob {
                continue;
            }
            if !var.ordinal() {
                values[i] = var.sample(rng);
                continue;
            }
            let w = &self.config.discrete_mutation_weights;
            let total = w.random + w.adjacent + w.boundary;
            let pick = rng.gen_range(0.0..total);
            values[i] = if pick < w.random {
                var.sample(rng)
            } else if pick < w.random + w.adjacent {
                let delta = if rng.gen_bool(0.5) { 1 } else { -1 };
                var.validate(values[i] + delta)
            } else if rng.gen_bool(0.5) {
                var.min()
            } else {
                var.max() - 1
            };
        }
    }

    fn mutate_continuous(&self, rng: &mut impl Rng, values: &mut [f64]) {
        for (i, var) in self.continuous_vars.iter().enumerate() {
            if rng.gen_range(0.0..1.0) >= self.config.mutation_prob {
                continue;
            }
            values[i] = if self.config.gaussian_mutation.is_nan() {
                var.sample(rng)
            } else {
                let stddev = self.config.gaussian_mutation * var.range();
                var.validate(values[i] + sample_standard_normal(rng) * stddev)
            };
        }
    }
}

impl<S: Solution + 'static> Generator<S> for GeneticAlgorithm {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn generate(&self, population: &Population<S>, count: usize) -> Vec<SolutionRoot> {
        let mut rng = self.rng.lock().unwrap();
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let parents = population.select(2, &mut rng);
            if parents.len() < 2 {
                break;
            }
            let (p1, p2) = (&parents[0], &parents[1]);

            let mut disc_values = if p1.disc_values.is_empty() {
                Vec::new()
            } else {
                self.crossover_discrete(&mut *rng, &p1.disc_values, &p2.disc_values)
            };
            let mut cont_values = if p1.cont_values.is_empty() {
                Vec::new()
            } else {
                self.crossover_continuous(&mut *rng, &p1.cont_values, &p2.cont_values)
            };

            self.mutate_discrete(&mut *rng, &mut disc_values);
            self.mutate_continuous(&mut *rng, &mut cont_values);

            out.push(SolutionRoot::new(
                disc_values,
                cont_values,
                GeneratorTag::Named(self.config.id.clone()),
            ));
        }
        out
    }
}

/// Box-Muller standard normal sample, shared by the mutation and crossover operators.
fn sample_standard_normal(rng: &mut impl Rng) -> f64 {
    crate::utils::sampling::standard_normal(rng)
}
