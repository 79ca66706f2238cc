use nalgebra::{DMatrix, SVD};

use crate::error::{MaestroError, Result};

/// Tolerances used to check whether [`solve_linear_system`]'s solution is acceptable.
#[derive(Clone, Debug)]
pub struct LinearSolverTolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Default for LinearSolverTolerance {
    fn default() -> Self {
        Self {
            relative: 1e-5,
            absolute: 1e-8,
        }
    }
}

/// Whether every pair of elements in `a` and `b` is close within the given tolerances
/// (`|a - b| <= absolute + relative * |b|`), the same rule `numpy.allclose` uses.
pub fn all_close(a: &[f64], b: &[f64], relative: f64, absolute: f64) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| (x - y).abs() <= absolute + relative * y.abs())
}

/// Least-squares solution of `a * x = b` via singular value decomposition, used by the gradient
/// kernel to fit `g_i` from a basis of neighbor deltas. Returns [`MaestroError::SolverSingular`]
/// (tagged with `label`) if the basis is empty/ragged or the solution falls outside tolerance.
pub fn solve_linear_system(
    label: &str,
    a: &[Vec<f64>],
    b: &[f64],
    tolerances: Option<LinearSolverTolerance>,
) -> Result<Vec<f64>> {
    let num_rows = a.len();
    if num_rows == 0 {
        return Err(MaestroError::SolverSingular(
            label.to_string(),
            "the coefficient matrix has no rows".to_string(),
        ));
    }
    let num_cols = a[0].len();
    if num_cols == 0 || a.iter().any(|row| row.len() != num_cols) {
        return Err(MaestroError::SolverSingular(
            label.to_string(),
            "the coefficient matrix is empty or ragged".to_string(),
        ));
    }
    if b.len() != num_rows {
        return Err(MaestroError::SolverSingular(
            label.to_string(),
            "the number of rows in A must match the length of b".to_string(),
        ));
    }

    let flat_a: Vec<f64> = a.iter().flatten().copied().collect();
    let matrix_a = DMatrix::from_row_slice(num_rows, num_cols, &flat_a);
    let matrix_b = DMatrix::from_row_slice(num_rows, 1, b);

    let svd = SVD::new(matrix_a.clone(), true, true);
    let solution = svd.solve(&matrix_b, f64::EPSILON).map_err(|e| {
        MaestroError::SolverSingular(label.to_string(), format!("SVD solve failed: {e}"))
    })?;

    let found_b = &matrix_a * &solution;
    if let Some(tol) = tolerances {
        if !all_close(found_b.as_slice(), matrix_b.as_slice(), tol.relative, tol.absolute) {
            return Err(MaestroError::SolverSingular(
                label.to_string(),
                "the least-squares solution is outside the tolerance limits".to_string(),
            ));
        }
    }

    Ok(solution.as_slice().to_vec())
}

/// Dot product of two equal-length vectors.
pub fn dot_product(label: &str, a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(MaestroError::SolverSingular(
            label.to_string(),
            format!("vector length mismatch: {} vs {}", a.len(), b.len()),
        ));
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Euclidean magnitude of a vector.
pub fn vector_magnitude(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Cosine of the angle between two vectors, used by the gradient kernel to reject a candidate
/// neighbor whose delta is near-collinear with an existing basis vector.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let mag_a = vector_magnitude(a);
    let mag_b = vector_magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot_product("cosine_similarity", a, b).unwrap_or(0.0) / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn linear_system_recovers_exact_solution() {
        let a = vec![
            vec![1.0, 9.0, -5.0],
            vec![-3.0, -5.0, -5.0],
            vec![-2.0, -7.0, 1.0],
        ];
        let b = vec![-32.0, -10.0, 13.0];
        let x = solve_linear_system("test", &a, &b, Some(LinearSolverTolerance::default())).unwrap();
        assert_approx_eq!(f64, x[0], 5.0, epsilon = 1e-6);
        assert_approx_eq!(f64, x[1], -3.0, epsilon = 1e-6);
        assert_approx_eq!(f64, x[2], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn linear_regression_matches_numpy_example() {
        let x = vec![
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![3.0, 1.0],
        ];
        let y = vec![-1.0, 0.2, 0.9, 2.1];
        let fit = solve_linear_system("test", &x, &y, Some(LinearSolverTolerance::default())).unwrap();
        assert_approx_eq!(f64, fit[0], 1.0, epsilon = 1e-3);
        assert_approx_eq!(f64, fit[1], -0.95, epsilon = 1e-3);
    }

    #[test]
    fn empty_matrix_is_singular() {
        let result = solve_linear_system("test", &[], &[], None);
        assert!(matches!(result, Err(MaestroError::SolverSingular(_, _))));
    }

    #[test]
    fn collinear_vectors_have_unit_cosine() {
        assert_approx_eq!(f64, cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]), 1.0, epsilon = 1e-9);
        assert_approx_eq!(f64, cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0, epsilon = 1e-9);
    }
}
