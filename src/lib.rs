//! A multi-objective global optimization framework built around an ensemble of candidate
//! generators feeding a Pareto-archive population, driven by a pool of worker threads.
//!
//! A user plugs in a problem's decision variables and objectives (see [`core::Problem`]), a
//! [`core::Solution`] implementation whose [`core::Solution::create_new`] doubles as the fitness
//! function, and one or more [`generators::Generator`]s (the crate ships [`generators::GeneticAlgorithm`]
//! and [`generators::Vicinity`]). [`optimizer::Optimizer::start`] then runs until a wall-clock
//! limit, a solution-count limit, or a solution's own [`core::Solution::converged`] fires.

pub mod core;
pub mod ensemble;
pub mod error;
pub mod generators;
pub mod optimizer;
pub mod population;
pub mod report;
pub mod utils;

pub use crate::core::{
    ContinuousVariable, DecisionVariable, DiscreteVariable, GeneratorTag, Objective, ObjectiveKind,
    Problem, Solution, SolutionHandle, SolutionRoot,
};
pub use crate::ensemble::{Ensemble, EnsembleConfig, GenerationHistoryRow};
pub use crate::error::{MaestroError, Result};
pub use crate::generators::{Generator, GeneticAlgorithm, GeneticAlgorithmConfig, Vicinity, VicinityConfig};
pub use crate::optimizer::{AllSolutionsRow, Monitor, NullMonitor, Optimizer, OptimizerConfig, RunSummary};
pub use crate::population::{Front, HallOfFame, HallOfFameEntry, OfferOutcome, Population, PopulationConfig, SelectedParent};
pub use crate::report::{open_hall_of_fame_log, Export, ExportedSolution, HallOfFameLog};
