pub mod handle;
pub mod objective;
pub mod problem;
pub mod solution;
pub mod variable;

pub use handle::SolutionHandle;
pub use objective::{Objective, ObjectiveKind};
pub use problem::Problem;
pub use solution::{GeneratorTag, Solution, SolutionRoot};
pub use variable::{ContinuousVariable, DiscreteVariable};

/// A decision variable, either discrete or continuous.
#[derive(Clone, Debug)]
pub enum DecisionVariable {
    Discrete(DiscreteVariable),
    Continuous(ContinuousVariable),
}

impl DecisionVariable {
    pub fn name(&self) -> &str {
        match self {
            DecisionVariable::Discrete(v) => v.name(),
            DecisionVariable::Continuous(v) => v.name(),
        }
    }
}

impl std::fmt::Display for DecisionVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionVariable::Discrete(v) => write!(f, "{v}"),
            DecisionVariable::Continuous(v) => write!(f, "{v}"),
        }
    }
}
