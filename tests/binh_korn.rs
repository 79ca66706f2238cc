//! Scenario 1: Binh-and-Korn. Minimise `f1 = 4x^2 + 4y^2` and `f2 = (x-5)^2 + (y-5)^2` over
//! `x in [0, 5]`, `y in [0, 3]`. The analytical Pareto front is `y = 0`, `x in [0, 5]`.

use std::sync::Arc;
use std::time::Duration;

use maestro_mo::{
    ContinuousVariable, EnsembleConfig, Generator, GeneticAlgorithm, GeneticAlgorithmConfig, NullMonitor,
    Objective, ObjectiveKind, Optimizer, OptimizerConfig, PopulationConfig, Problem, Solution, Vicinity,
    VicinityConfig,
};

#[derive(Debug, Clone)]
struct BinhKorn {
    x: f64,
    y: f64,
    f1: f64,
    f2: f64,
    cont: Vec<f64>,
}

impl Solution for BinhKorn {
    fn create_new(_index: usize, _disc_values: &[i64], cont_values: &[f64], _extra: Option<&str>) -> Self {
        let x = cont_values[0];
        let y = cont_values[1];
        Self {
            x,
            y,
            f1: 4.0 * x * x + 4.0 * y * y,
            f2: (x - 5.0).powi(2) + (y - 5.0).powi(2),
            cont: cont_values.to_vec(),
        }
    }

    fn id(&self) -> String {
        format!("({:.4}, {:.4})", self.x, self.y)
    }

    fn disc_values(&self) -> &[i64] {
        &[]
    }

    fn cont_values(&self) -> &[f64] {
        &self.cont
    }

    fn fitness(&self, obj_index: usize) -> f64 {
        match obj_index {
            0 => self.f1,
            1 => self.f2,
            _ => unreachable!(),
        }
    }
}

#[test]
fn front_one_lies_on_the_analytical_pareto_curve() {
    let _ = env_logger::try_init();

    let problem = Problem::new(
        vec![],
        vec![
            ContinuousVariable::new("x", 0.0, 5.0).unwrap(),
            ContinuousVariable::new("y", 0.0, 3.0).unwrap(),
        ],
        vec![
            Objective::new(0, "f1", ObjectiveKind::Minimize),
            Objective::new(1, "f2", ObjectiveKind::Minimize),
        ],
    )
    .unwrap();

    let ga = GeneticAlgorithm::new(&problem, GeneticAlgorithmConfig::default()).unwrap();
    let vicinity = Vicinity::new(&problem, VicinityConfig::default());
    let generators: Vec<Box<dyn Generator<BinhKorn>>> = vec![Box::new(ga), Box::new(vicinity)];

    let mut optimizer: Optimizer<BinhKorn> = Optimizer::new(
        problem,
        PopulationConfig {
            capacity: 50,
            ..Default::default()
        },
        generators,
        EnsembleConfig::default(),
        OptimizerConfig::default(),
    )
    .unwrap()
    .with_monitor(Arc::new(NullMonitor));

    optimizer.start(Duration::from_secs(5), 1_000).unwrap();

    optimizer.population().with_fronts(|fronts| {
        let front = fronts.first().expect("at least one front after a completed run");
        assert!(!front.solutions().is_empty());
        for handle in front.solutions() {
            let solution = handle.solution();
            assert!((0.0..=5.0).contains(&solution.x), "x out of bounds: {}", solution.x);
            assert!((0.0..=3.0).contains(&solution.y), "y out of bounds: {}", solution.y);
            assert!(
                (4.0 * solution.x * solution.x - solution.f1).abs() < 1e-9,
                "f1 inconsistent with x: f1={}, x={}",
                solution.f1,
                solution.x
            );
        }
    });
}
