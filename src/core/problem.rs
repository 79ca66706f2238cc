use log::info;
use rand::Rng;

use crate::core::{ContinuousVariable, DiscreteVariable, GeneratorTag, Objective, SolutionRoot};
use crate::error::{MaestroError, Result};

/// The decision space and objective set the optimizer searches over.
///
/// A `Problem` owns no evaluation logic: the user's fitness function lives entirely in their
/// [`crate::core::Solution::create_new`] implementation. The problem only describes the shape of
/// the search (how many variables of each kind, their bounds, and the objective directions) so
/// generators can sample and validate decision vectors.
#[derive(Debug)]
pub struct Problem {
    discrete_vars: Vec<DiscreteVariable>,
    continuous_vars: Vec<ContinuousVariable>,
    objectives: Vec<Objective>,
}

impl Problem {
    /// Build a new problem. Returns [`MaestroError::NoVariables`] if both variable vectors are
    /// empty, or [`MaestroError::NoObjectives`] if no objectives are given.
    pub fn new(
        discrete_vars: Vec<DiscreteVariable>,
        continuous_vars: Vec<ContinuousVariable>,
        objectives: Vec<Objective>,
    ) -> Result<Self> {
        if discrete_vars.is_empty() && continuous_vars.is_empty() {
            return Err(MaestroError::NoVariables);
        }
        if objectives.is_empty() {
            return Err(MaestroError::NoObjectives);
        }

        for v in &discrete_vars {
            info!("Adding discrete variable '{}' - {}", v.name(), v);
        }
        for v in &continuous_vars {
            info!("Adding continuous variable '{}' - {}", v.name(), v);
        }
        for o in &objectives {
            info!("Adding {o}");
        }

        Ok(Self {
            discrete_vars,
            continuous_vars,
            objectives,
        })
    }

    pub fn discrete_vars(&self) -> &[DiscreteVariable] {
        &self.discrete_vars
    }

    pub fn continuous_vars(&self) -> &[ContinuousVariable] {
        &self.continuous_vars
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn num_objectives(&self) -> usize {
        self.objectives.len()
    }

    pub fn num_discrete(&self) -> usize {
        self.discrete_vars.len()
    }

    pub fn num_continuous(&self) -> usize {
        self.continuous_vars.len()
    }

    /// Sample a uniformly random candidate, tagged with `generator_tag`.
    pub fn sample_root(&self, rng: &mut impl Rng, generator_tag: GeneratorTag) -> SolutionRoot {
        let disc_values = self.discrete_vars.iter().map(|v| v.sample(rng)).collect();
        let cont_values = self.continuous_vars.iter().map(|v| v.sample(rng)).collect();
        SolutionRoot::new(disc_values, cont_values, generator_tag)
    }

    /// Clamp a candidate's values into each variable's bounds, in place.
    pub fn validate_root(&self, root: &mut SolutionRoot) {
        for (v, value) in self.discrete_vars.iter().zip(root.disc_values.iter_mut()) {
            *value = v.validate(*value);
        }
        for (v, value) in self.continuous_vars.iter().zip(root.cont_values.iter_mut()) {
            *value = v.validate(*value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObjectiveKind;

    #[test]
    fn rejects_empty_variables() {
        let objectives = vec![Objective::new(0, "f1", ObjectiveKind::Minimize)];
        assert!(matches!(
            Problem::new(vec![], vec![], objectives),
            Err(MaestroError::NoVariables)
        ));
    }

    #[test]
    fn rejects_empty_objectives() {
        let cont = vec![ContinuousVariable::new("x", 0.0, 1.0).unwrap()];
        assert!(matches!(
            Problem::new(vec![], cont, vec![]),
            Err(MaestroError::NoObjectives)
        ));
    }

    #[test]
    fn sampling_respects_bounds() {
        let disc = vec![DiscreteVariable::new("d", 0, 3, true).unwrap()];
        let cont = vec![ContinuousVariable::new("c", -1.0, 1.0).unwrap()];
        let objectives = vec![Objective::new(0, "f1", ObjectiveKind::Minimize)];
        let problem = Problem::new(disc, cont, objectives).unwrap();

        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let root = problem.sample_root(&mut rng, GeneratorTag::Random);
            assert!(root.disc_values[0] >= 0 && root.disc_values[0] < 3);
            assert!(root.cont_values[0] >= -1.0 && root.cont_values[0] <= 1.0);
        }
    }
}
