use std::cmp::Ordering;
use std::fmt::Debug;

/// Tag identifying which generator produced a solution. The two reserved values
/// [`GeneratorTag::Random`] and [`GeneratorTag::UserPredefined`] are used for roots the optimizer
/// injects itself, before any generator has run.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeneratorTag {
    /// Sampled uniformly at random during start-up to seed the initial buffer.
    Random,
    /// Supplied by the user before optimization started.
    UserPredefined,
    /// Produced by a registered [`crate::generators::Generator`], identified by its id.
    Named(String),
}

impl std::fmt::Display for GeneratorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorTag::Random => write!(f, "random"),
            GeneratorTag::UserPredefined => write!(f, "user_predefined"),
            GeneratorTag::Named(id) => write!(f, "{id}"),
        }
    }
}

/// An unevaluated candidate: a decision vector produced by a generator (or injected by the user)
/// and not yet passed through the user evaluator.
#[derive(Clone, Debug)]
pub struct SolutionRoot {
    pub disc_values: Vec<i64>,
    pub cont_values: Vec<f64>,
    pub generator_tag: GeneratorTag,
    pub label: Option<String>,
    pub extra: Option<String>,
}

impl SolutionRoot {
    pub fn new(disc_values: Vec<i64>, cont_values: Vec<f64>, generator_tag: GeneratorTag) -> Self {
        Self {
            disc_values,
            cont_values,
            generator_tag,
            label: None,
            extra: None,
        }
    }

    pub fn with_label(mut self, label: String) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_extra(mut self, extra: String) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// The contract a user implements to plug their problem into the optimizer.
///
/// [`Solution::create_new`] doubles as the evaluation routine: given a candidate's index and
/// decision vector, it must compute and return the fully evaluated solution (this is where the
/// user's fitness function runs). Everything else is read-only access to the result.
pub trait Solution: Debug + Send + Sync {
    /// Evaluate a candidate and produce the solution. `index` is the solution's permanent,
    /// monotonically-assigned identifier (see [`crate::core::handle::SolutionHandle`]).
    fn create_new(index: usize, disc_values: &[i64], cont_values: &[f64], extra: Option<&str>) -> Self
    where
        Self: Sized;

    /// A non-empty, unique identifier for this solution.
    fn id(&self) -> String;

    fn disc_values(&self) -> &[i64];

    fn cont_values(&self) -> &[f64];

    /// Whether the solution is valid. Invalid solutions are discarded and never count toward
    /// `solution_limit`.
    fn valid(&self) -> bool {
        true
    }

    /// Column headers for [`Solution::report`], in the same order.
    fn report_header() -> Vec<String>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Tab-separated report fields describing this solution beyond its decision/fitness values.
    fn report(&self) -> Vec<String> {
        Vec::new()
    }

    /// The fitness for objective `obj_index`. May be `f64::NAN` to indicate "worst possible".
    fn fitness(&self, obj_index: usize) -> f64;

    /// Comparator used by [`crate::core::objective::ObjectiveKind::Custom`] objectives.
    /// `Ordering::Less` means `self` is preferred over `other` on this objective.
    fn compare_to(&self, _obj_index: usize, _other: &Self) -> Ordering
    where
        Self: Sized,
    {
        Ordering::Equal
    }

    /// Whether this solution satisfies a user-defined early-stopping condition.
    fn converged(&self) -> bool {
        false
    }
}
