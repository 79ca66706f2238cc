pub mod algebra;
pub mod sampling;

pub use algebra::{cosine_similarity, dot_product, solve_linear_system, vector_magnitude, LinearSolverTolerance};
pub use sampling::{normal, normalize_weights, standard_normal};
