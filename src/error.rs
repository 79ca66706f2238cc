use thiserror::Error;

/// The crate-wide result alias.
pub type Result<T> = std::result::Result<T, MaestroError>;

/// All error kinds the optimizer core can produce.
#[derive(Error, Debug)]
pub enum MaestroError {
    /// Raised at start-up when the problem has no decision variables.
    #[error("the problem must define at least one decision variable")]
    NoVariables,

    /// Raised at start-up when the problem has no objectives.
    #[error("the problem must define at least one objective")]
    NoObjectives,

    /// A refill was requested but the buffer and all fronts are empty.
    #[error("cannot refill the generation buffer: the population is completely empty")]
    EmptyPopulation,

    /// Internal dispatch received a tag it does not recognise.
    #[error("internal dispatch received an unknown process id '{0}'")]
    InvalidProcessId(String),

    /// The user evaluator returned an error for a candidate.
    #[error("evaluation of solution {0} failed: {1}")]
    EvaluationFailure(String, String),

    /// The user evaluator exceeded the configured time limit.
    #[error("evaluation of solution {0} exceeded the {1:?} time limit")]
    EvaluationTimeout(String, std::time::Duration),

    /// The report file could not be written.
    #[error("failed to write report: {0}")]
    ReportIoError(#[from] std::io::Error),

    /// The JSON export could not be serialized.
    #[error("failed to serialize JSON export: {0}")]
    ExportSerializationError(#[from] serde_json::Error),

    /// The gradient kernel's delta matrix is singular or the solve is outside tolerance.
    #[error("the delta matrix for generator '{0}' is singular: {1}")]
    SolverSingular(String, String),

    /// A named object (variable, objective, generator) does not exist.
    #[error("the {0} named '{1}' does not exist")]
    NonExistingName(String, String),

    /// A configuration value was outside its valid range.
    #[error("invalid configuration for '{0}': {1}")]
    InvalidConfiguration(String, String),
}
