use std::sync::Mutex;

use log::warn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::{ContinuousVariable, GeneratorTag, Problem, Solution, SolutionRoot};
use crate::generators::Generator;
use crate::population::Population;
use crate::utils::algebra::{cosine_similarity, solve_linear_system, LinearSolverTolerance};
use crate::utils::sampling::{normal, normalize_weights};

/// Tunables for [`Vicinity`].
#[derive(Clone, Debug)]
pub struct VicinityConfig {
    pub id: String,
    /// Step length along the blended gradient direction, as a fraction of each variable's range.
    pub step_size: f64,
    /// Gaussian spread multiplier applied on top of the gradient step, as a fraction of each
    /// variable's range. `NaN` disables the spread.
    pub amplitude: f64,
    /// Cosine-similarity threshold (to 1.0) above which a candidate neighbor delta is treated as
    /// collinear with the existing basis and rejected.
    pub collinearity_eps: f64,
    /// Greed used when drawing the base and neighbor candidates from the population; 1.0 draws
    /// exclusively from the first front.
    pub parent_greed: f64,
}

impl Default for VicinityConfig {
    fn default() -> Self {
        Self {
            id: "vicinity".to_string(),
            step_size: 0.1,
            amplitude: f64::NAN,
            collinearity_eps: 1e-16,
            parent_greed: 1.0,
        }
    }
}

/// Gradient-descent kernel: estimates a local gradient per objective from a basis of nearby
/// population members, then samples candidates by stepping from a base solution along a random
/// convex combination of those gradients.
///
/// Grounded on the teacher crate's `nalgebra`-backed least-squares solver (`utils::algebra`); the
/// finite-difference basis-building and collinearity rejection is this crate's own scheme for
/// keeping the delta matrix full rank before handing it to that solver.
pub struct Vicinity {
    config: VicinityConfig,
    continuous_vars: Vec<ContinuousVariable>,
    num_objectives: usize,
    rng: Mutex<ChaCha8Rng>,
}

impl Vicinity {
    pub fn new(problem: &Problem, config: VicinityConfig) -> Self {
        Self {
            config,
            continuous_vars: problem.continuous_vars().to_vec(),
            num_objectives: problem.num_objectives(),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// Build a full-rank basis of neighbor deltas, rejecting any candidate whose delta is
    /// near-collinear with an already-accepted delta or with the difference between two already
    /// accepted neighbors.
    fn build_basis(&self, base: &[f64], candidates: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let max_basis = self.continuous_vars.len();
        let mut accepted: Vec<Vec<f64>> = Vec::new();

        for candidate in candidates {
            if accepted.len() >= max_basis {
                break;
            }
            let delta: Vec<f64> = candidate.iter().zip(base).map(|(c, b)| c - b).collect();
            if vector_is_zero(&delta) {
                continue;
            }

            let collinear = accepted.iter().any(|existing| {
                cosine_similarity(&delta, existing).abs() > 1.0 - self.config.collinearity_eps
            }) || accepted.iter().enumerate().any(|(i, a)| {
                accepted[i + 1..].iter().any(|b| {
                    let diff: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
                    !vector_is_zero(&diff) && cosine_similarity(&delta, &diff).abs() > 1.0 - self.config.collinearity_eps
                })
            });

            if !collinear {
                accepted.push(delta);
            }
        }
        accepted
    }
}

fn vector_is_zero(v: &[f64]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

impl<S: Solution + 'static> Generator<S> for Vicinity {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn generate(&self, population: &Population<S>, count: usize) -> Vec<SolutionRoot> {
        if self.continuous_vars.is_empty() {
            return Vec::new();
        }
        let mut rng = self.rng.lock().unwrap();

        let pool = population.select_greedy(self.continuous_vars.len() + 1, self.config.parent_greed, &mut *rng);
        if pool.len() < 2 {
            return Vec::new();
        }
        let base = &pool[0];
        let candidate_conts: Vec<Vec<f64>> = pool[1..].iter().map(|p| p.cont_values.clone()).collect();

        let basis = self.build_basis(&base.cont_values, &candidate_conts);
        if basis.is_empty() {
            warn!(
                "vicinity generator '{}': no independent neighbor deltas, skipping this cycle",
                self.config.id
            );
            return Vec::new();
        }

        let neighbor_fitness: Vec<&Vec<f64>> = pool[1..1 + basis.len()].iter().map(|p| &p.fitness).collect();
        let tolerances = Some(LinearSolverTolerance::default());

        let mut gradients: Vec<Vec<f64>> = Vec::with_capacity(self.num_objectives);
        for obj in 0..self.num_objectives {
            let delta_f: Vec<f64> = neighbor_fitness.iter().map(|f| f[obj] - base.fitness[obj]).collect();
            match solve_linear_system(&self.config.id, &basis, &delta_f, tolerances.clone()) {
                Ok(g) => gradients.push(g),
                Err(e) => {
                    warn!("vicinity generator '{}': {e}", self.config.id);
                    return Vec::new();
                }
            }
        }

        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let raw_weights: Vec<f64> = (0..self.num_objectives).map(|_| rng.gen_range(0.0..1.0)).collect();
            let weights = normalize_weights(&raw_weights);

            let mut cont_values = base.cont_values.clone();
            for (j, var) in self.continuous_vars.iter().enumerate() {
                let blended: f64 = weights.iter().zip(&gradients).map(|(w, g)| w * g[j]).sum();
                let mut value = base.cont_values[j] - self.config.step_size * blended * var.range();
                if !self.config.amplitude.is_nan() {
                    value = normal(&mut *rng, value, self.config.amplitude * var.range());
                }
                cont_values[j] = var.validate(value);
            }

            out.push(SolutionRoot::new(
                base.disc_values.clone(),
                cont_values,
                GeneratorTag::Named(self.config.id.clone()),
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContinuousVariable, GeneratorTag as Tag, Objective, ObjectiveKind};
    use crate::population::{Population, PopulationConfig};

    #[derive(Debug, Clone)]
    struct Pt {
        c: Vec<f64>,
    }
    impl Solution for Pt {
        fn create_new(_i: usize, _d: &[i64], c: &[f64], _e: Option<&str>) -> Self {
            Pt { c: c.to_vec() }
        }
        fn id(&self) -> String {
            "pt".to_string()
        }
        fn disc_values(&self) -> &[i64] {
            &[]
        }
        fn cont_values(&self) -> &[f64] {
            &self.c
        }
        fn fitness(&self, obj_index: usize) -> f64 {
            self.c[obj_index]
        }
    }

    fn problem() -> Problem {
        Problem::new(
            vec![],
            vec![
                ContinuousVariable::new("x", 0.0, 10.0).unwrap(),
                ContinuousVariable::new("y", 0.0, 10.0).unwrap(),
            ],
            vec![
                Objective::new(0, "f1", ObjectiveKind::Minimize),
                Objective::new(1, "f2", ObjectiveKind::Minimize),
            ],
        )
        .unwrap()
    }

    #[test]
    fn stays_within_bounds_with_a_well_conditioned_basis() {
        let prob = problem();
        let vicinity = Vicinity::new(&prob, VicinityConfig::default());
        let population: Population<Pt> = Population::new(prob.objectives().to_vec(), PopulationConfig::default());
        population.offer(Pt { c: vec![5.0, 5.0] }, Tag::Random);
        population.offer(Pt { c: vec![5.5, 4.0] }, Tag::Random);
        population.offer(Pt { c: vec![4.0, 6.0] }, Tag::Random);
        population.merge();

        let children = vicinity.generate(&population, 20);
        for child in &children {
            for &v in &child.cont_values {
                assert!((0.0..=10.0).contains(&v));
            }
        }
    }

    #[test]
    fn too_few_candidates_yields_no_offspring() {
        let prob = problem();
        let vicinity = Vicinity::new(&prob, VicinityConfig::default());
        let population: Population<Pt> = Population::new(prob.objectives().to_vec(), PopulationConfig::default());
        population.offer(Pt { c: vec![5.0, 5.0] }, Tag::Random);
        population.merge();
        assert!(vicinity.generate(&population, 10).is_empty());
    }
}
