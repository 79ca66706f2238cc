//! Scenario 6: termination convergence. The evaluator reports `converged() == true` on the 42nd
//! valid solution it produces. `thread_count = 1` so evaluation order is the completion order and
//! `eval_count` lands on exactly 42.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use maestro_mo::{
    ContinuousVariable, EnsembleConfig, Generator, GeneticAlgorithm, GeneticAlgorithmConfig, Monitor,
    Objective, ObjectiveKind, Optimizer, OptimizerConfig, PopulationConfig, Problem, Solution, Vicinity,
    VicinityConfig,
};

static VALID_COUNT: AtomicUsize = AtomicUsize::new(0);
const CONVERGE_AT: usize = 42;

#[derive(Debug, Clone)]
struct CountToFortyTwo {
    x: f64,
    cont: Vec<f64>,
    n: usize,
}

impl Solution for CountToFortyTwo {
    fn create_new(_index: usize, _disc_values: &[i64], cont_values: &[f64], _extra: Option<&str>) -> Self {
        let n = VALID_COUNT.fetch_add(1, Ordering::SeqCst) + 1;
        Self { x: cont_values[0], cont: cont_values.to_vec(), n }
    }

    fn id(&self) -> String {
        self.n.to_string()
    }

    fn disc_values(&self) -> &[i64] {
        &[]
    }

    fn cont_values(&self) -> &[f64] {
        &self.cont
    }

    fn fitness(&self, obj_index: usize) -> f64 {
        match obj_index {
            0 => self.x,
            1 => 1.0 - self.x,
            _ => unreachable!(),
        }
    }

    fn converged(&self) -> bool {
        self.n == CONVERGE_AT
    }
}

#[derive(Default)]
struct CountingMonitor {
    calls: Mutex<usize>,
}

impl Monitor for CountingMonitor {
    fn terminate(&self, _reason: &str) {
        *self.calls.lock().unwrap() += 1;
    }
}

#[test]
fn terminates_exactly_on_the_converged_solution() {
    let _ = env_logger::try_init();
    VALID_COUNT.store(0, Ordering::SeqCst);

    let problem = Problem::new(
        vec![],
        vec![ContinuousVariable::new("x", 0.0, 1.0).unwrap()],
        vec![
            Objective::new(0, "f1", ObjectiveKind::Minimize),
            Objective::new(1, "f2", ObjectiveKind::Minimize),
        ],
    )
    .unwrap();

    let ga = GeneticAlgorithm::new(&problem, GeneticAlgorithmConfig::default()).unwrap();
    let vicinity = Vicinity::new(&problem, VicinityConfig::default());
    let generators: Vec<Box<dyn Generator<CountToFortyTwo>>> = vec![Box::new(ga), Box::new(vicinity)];

    let config = OptimizerConfig {
        thread_count: 1,
        ..Default::default()
    };

    let monitor = Arc::new(CountingMonitor::default());

    let mut optimizer: Optimizer<CountToFortyTwo> = Optimizer::new(
        problem,
        PopulationConfig::default(),
        generators,
        EnsembleConfig::default(),
        config,
    )
    .unwrap()
    .with_monitor(monitor.clone());

    let summary = optimizer.start(Duration::from_secs(30), usize::MAX).unwrap();

    assert_eq!(summary.eval_count, CONVERGE_AT);
    assert!(
        summary.termination_reason.contains("converged"),
        "unexpected termination reason: {}",
        summary.termination_reason
    );
    assert_eq!(*monitor.calls.lock().unwrap(), 1);
}
