use rand::Rng;

/// Sample from the standard normal distribution (mean 0, stddev 1) via the Box-Muller transform.
/// Shared by the genetic algorithm's normal crossover/mutation sub-methods and the gradient
/// kernel's Gaussian spread, so there is exactly one place that owns the `rand` version of this.
pub fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Sample from a normal distribution with the given mean/stddev.
pub fn normal(rng: &mut impl Rng, mean: f64, stddev: f64) -> f64 {
    mean + standard_normal(rng) * stddev
}

/// Normalize a vector of non-negative weights so they sum to 1. Returns a uniform distribution if
/// every weight is zero.
pub fn normalize_weights(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        let n = weights.len().max(1) as f64;
        return vec![1.0 / n; weights.len()];
    }
    weights.iter().map(|w| w / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_normal_has_roughly_unit_variance() {
        let mut rng = rand::thread_rng();
        let samples: Vec<f64> = (0..20_000).map(|_| standard_normal(&mut rng)).collect();
        let mean: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
        let var: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 0.05, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.1, "var = {var}");
    }

    #[test]
    fn normalize_weights_sums_to_one() {
        let w = normalize_weights(&[1.0, 2.0, 3.0, 4.0]);
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_all_zero_weights_is_uniform() {
        let w = normalize_weights(&[0.0, 0.0, 0.0]);
        assert_eq!(w, vec![1.0 / 3.0; 3]);
    }
}
