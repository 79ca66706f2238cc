use std::fmt;
use std::fmt::{Display, Formatter};

use rand::Rng;

use crate::error::{MaestroError, Result};

/// A discrete decision variable: an integer range `[min, min + count)`.
///
/// `ordinal` records whether the integer encodes an ordered quantity (so neighbouring values are
/// "close", as used by the adjacent mutation operator) or a plain categorical index. Optional
/// `labels` give each value a human-readable name used by the report writer.
#[derive(Clone, Debug)]
pub struct DiscreteVariable {
    name: String,
    min: i64,
    count: u64,
    ordinal: bool,
    labels: Option<Vec<String>>,
}

impl DiscreteVariable {
    /// Create a new discrete variable spanning `[min, min + count)`.
    pub fn new(name: &str, min: i64, count: u64, ordinal: bool) -> Result<Self> {
        if count == 0 {
            return Err(MaestroError::InvalidConfiguration(
                name.to_string(),
                "a discrete variable must have at least one value".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            min,
            count,
            ordinal,
            labels: None,
        })
    }

    /// Attach textual labels, one per value in `[min, min + count)`.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() as u64 != self.count {
            return Err(MaestroError::InvalidConfiguration(
                self.name.clone(),
                format!(
                    "expected {} labels, got {}",
                    self.count,
                    labels.len()
                ),
            ));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal(&self) -> bool {
        self.ordinal
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    /// Exclusive upper bound: the variable's value is always `< max()`.
    pub fn max(&self) -> i64 {
        self.min + self.count as i64
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample a value uniformly from `[min, min + count)`.
    pub fn sample(&self, rng: &mut impl Rng) -> i64 {
        rng.gen_range(self.min..self.max())
    }

    /// Clamp a value into `[min, min + count)`.
    pub fn validate(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max() - 1)
    }

    /// The textual label for a value, falling back to the raw integer.
    pub fn label(&self, value: i64) -> String {
        match &self.labels {
            Some(labels) => {
                let idx = (value - self.min) as usize;
                labels
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| value.to_string())
            }
            None => value.to_string(),
        }
    }
}

impl Display for DiscreteVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "discrete '{}' in [{}, {})",
            self.name,
            self.min,
            self.max()
        )
    }
}

/// A continuous decision variable: a closed interval `[min, max]`.
#[derive(Clone, Debug)]
pub struct ContinuousVariable {
    name: String,
    min: f64,
    max: f64,
}

impl ContinuousVariable {
    /// Create a new continuous variable bounded by `[min, max]`.
    pub fn new(name: &str, min: f64, max: f64) -> Result<Self> {
        if !(min < max) {
            return Err(MaestroError::InvalidConfiguration(
                name.to_string(),
                format!("min ({min}) must be strictly smaller than max ({max})"),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            min,
            max,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Sample a value uniformly from `[min, max]`.
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        rng.gen_range(self.min..=self.max)
    }

    /// Clamp a value into `[min, max]`. Idempotent: `validate(validate(x)) == validate(x)`.
    pub fn validate(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Display for ContinuousVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "continuous '{}' in [{}, {}]", self.name, self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_bounds_and_clamp() {
        let v = DiscreteVariable::new("x", 2, 4, true).unwrap();
        assert_eq!(v.min(), 2);
        assert_eq!(v.max(), 6);
        assert_eq!(v.validate(-10), 2);
        assert_eq!(v.validate(100), 5);
        assert_eq!(v.validate(4), 4);
    }

    #[test]
    fn discrete_labels_must_match_count() {
        let v = DiscreteVariable::new("x", 0, 2, false).unwrap();
        assert!(v.with_labels(vec!["a".to_string()]).is_err());
    }

    #[test]
    fn continuous_validate_is_idempotent() {
        let v = ContinuousVariable::new("y", 0.0, 5.0).unwrap();
        for raw in [-100.0, -0.0001, 2.5, 5.0, 5.00001, 1e9] {
            let once = v.validate(raw);
            let twice = v.validate(once);
            assert_eq!(once, twice);
            assert!((v.min()..=v.max()).contains(&once));
        }
    }

    #[test]
    fn continuous_rejects_bad_bounds() {
        assert!(ContinuousVariable::new("y", 5.0, 5.0).is_err());
        assert!(ContinuousVariable::new("y", 5.0, 1.0).is_err());
    }

    #[test]
    fn sampling_stays_in_bounds() {
        let mut rng = rand::thread_rng();
        let d = DiscreteVariable::new("x", -3, 7, true).unwrap();
        let c = ContinuousVariable::new("y", -1.0, 1.0).unwrap();
        for _ in 0..1000 {
            let dv = d.sample(&mut rng);
            assert!(dv >= d.min() && dv < d.max());
            let cv = c.sample(&mut rng);
            assert!(cv >= c.min() && cv <= c.max());
        }
    }
}
